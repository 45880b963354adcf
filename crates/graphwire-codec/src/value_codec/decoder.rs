//! Value graph decoding.
//!
//! The decoder reads one tag byte, dispatches to the matching reader, and
//! recurses. Aggregate readers append the empty aggregate to the identifier
//! registry *before* reading children, so a back-reference inside those
//! children resolves even when it points at the aggregate currently under
//! construction. All failures abort the decode with the innermost cursor
//! offset; the one recoverable case (a domain constructor rejecting its
//! decoded fields) can be downgraded to a placeholder table by
//! configuration.

use std::{
    cell::RefCell,
    io::{Cursor, Read},
    rc::Rc,
};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use tracing::debug;

use graphwire_core::{
    config::CodecConfig,
    constants::{
        PLACEHOLDER_FIELDS_KEY, PLACEHOLDER_KIND_KEY, TAG_ARRAY_END, TAG_ARRAY_START,
        TAG_BOOLEAN_FALSE, TAG_BOOLEAN_TRUE, TAG_BRICKCOLOR, TAG_CFRAME, TAG_COLOR3,
        TAG_COLORSEQUENCE, TAG_DATETIME, TAG_ENUM, TAG_INSTANCE_REF, TAG_KEY_VALUE_SEPARATOR,
        TAG_NIL, TAG_NUMBERSEQUENCE, TAG_NUMBER_FLOAT, TAG_NUMBER_INT, TAG_RECT, TAG_REFERENCE,
        TAG_STRING_LONG, TAG_STRING_SHORT, TAG_TABLE_END, TAG_TABLE_START, TAG_UDIM2,
        TAG_VECTOR2, TAG_VECTOR3,
    },
    error::{CodecError, CodecResult},
};

use crate::value::{
    ArrayRef, BrickColor, CFrame, Color3, ColorKeypoint, ColorSequence, DateTime, EnumItem,
    InstanceRef, NumberKeypoint, NumberSequence, Rect, Table, TableKey, TableRef, UDim2, Value,
    Vector2, Vector3,
};

/// Deserializes one payload back into a value graph.
///
/// One decoder instance performs exactly one decode; the identifier registry
/// it owns is scoped to that call.
pub struct ValueDecoder<'a> {
    config: &'a CodecConfig,
    cursor: Cursor<&'a [u8]>,
    // Aggregates in registration order; identifier = index + 1.
    registry: Vec<Value>,
}

impl<'a> ValueDecoder<'a> {
    /// Creates a decoder over the given payload.
    pub fn new(bytes: &'a [u8], config: &'a CodecConfig) -> Self {
        Self { config, cursor: Cursor::new(bytes), registry: Vec::new() }
    }

    /// Consumes the decoder and returns the top-level value.
    ///
    /// The payload must contain exactly one value; trailing bytes fail with
    /// [`CodecError::TrailingBytes`].
    pub fn decode(mut self) -> CodecResult<Value> {
        let value = self.read_value(0)?;
        let offset = self.offset();
        let len = self.cursor.get_ref().len();
        if offset < len {
            return Err(CodecError::TrailingBytes { remaining: len - offset, offset });
        }
        Ok(value)
    }

    fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    fn read_value(&mut self, depth: usize) -> CodecResult<Value> {
        let tag_offset = self.offset();
        let tag = self.read_u8()?;
        self.read_value_from_tag(tag, tag_offset, depth)
    }

    fn read_value_from_tag(&mut self, tag: u8, tag_offset: usize, depth: usize) -> CodecResult<Value> {
        match tag {
            TAG_NIL => Ok(Value::Nil),
            TAG_BOOLEAN_FALSE => Ok(Value::Bool(false)),
            TAG_BOOLEAN_TRUE => Ok(Value::Bool(true)),
            TAG_NUMBER_INT => self.read_int_body().map(Value::Int),
            TAG_NUMBER_FLOAT => self.read_f64_raw().map(Value::Float),
            TAG_STRING_SHORT => {
                let len = self.read_u8()? as usize;
                self.read_exact(len).map(Value::Bytes)
            }
            TAG_STRING_LONG => {
                let len_offset = self.offset();
                let len = self.read_u32_be()? as usize;
                if len > self.config.max_bytes_len {
                    return Err(CodecError::SizeLimit {
                        what: "byte string",
                        len: len as i64,
                        limit: self.config.max_bytes_len,
                        offset: len_offset,
                    });
                }
                self.read_exact(len).map(Value::Bytes)
            }
            TAG_ARRAY_START => self.read_sequence(tag_offset, depth),
            TAG_TABLE_START => self.read_mapping(tag_offset, depth),
            TAG_REFERENCE => self.read_reference(tag_offset),
            TAG_VECTOR3 => {
                let [x, y, z] = self.read_f64_fields()?;
                Ok(Value::Vector3(Vector3 { x, y, z }))
            }
            TAG_VECTOR2 => {
                let [x, y] = self.read_f64_fields()?;
                Ok(Value::Vector2(Vector2 { x, y }))
            }
            TAG_COLOR3 => {
                let [r, g, b] = self.read_f64_fields()?;
                Ok(Value::Color3(Color3 { r, g, b }))
            }
            TAG_UDIM2 => {
                let [x_scale, x_offset, y_scale, y_offset] = self.read_f64_fields()?;
                Ok(Value::UDim2(UDim2 { x_scale, x_offset, y_scale, y_offset }))
            }
            TAG_RECT => {
                let [min_x, min_y, max_x, max_y] = self.read_f64_fields()?;
                Ok(Value::Rect(Rect { min_x, min_y, max_x, max_y }))
            }
            TAG_CFRAME => {
                let [x, y, z] = self.read_f64_fields()?;
                let rotation = self.read_f64_fields::<9>()?;
                Ok(Value::CFrame(CFrame { x, y, z, rotation }))
            }
            TAG_ENUM => {
                let enum_type = self.read_bytes_frame()?;
                let member = self.read_bytes_frame()?;
                match EnumItem::try_new(enum_type.clone(), member.clone()) {
                    Ok(item) => Ok(Value::Enum(item)),
                    Err(reason) => self.domain_failure(
                        "Enum",
                        reason,
                        tag_offset,
                        vec![Value::Bytes(enum_type), Value::Bytes(member)],
                    ),
                }
            }
            TAG_INSTANCE_REF => {
                let path = self.read_bytes_frame()?;
                Ok(Value::InstanceRef(InstanceRef { path }))
            }
            TAG_DATETIME => {
                let millis = self.read_f64_raw()?;
                match DateTime::try_from_wire_millis(millis) {
                    Ok(dt) => Ok(Value::DateTime(dt)),
                    Err(reason) => {
                        self.domain_failure("DateTime", reason, tag_offset, vec![Value::Float(millis)])
                    }
                }
            }
            TAG_BRICKCOLOR => {
                let number = self.read_int_frame("a palette number INT frame")?;
                match BrickColor::try_from_number(number) {
                    Ok(bc) => Ok(Value::BrickColor(bc)),
                    Err(reason) => {
                        self.domain_failure("BrickColor", reason, tag_offset, vec![Value::Int(number)])
                    }
                }
            }
            TAG_NUMBERSEQUENCE => {
                let count = self.read_keyframe_count()?;
                let mut keypoints = Vec::with_capacity(count);
                for _ in 0..count {
                    let [time, value, envelope] = self.read_f64_fields()?;
                    keypoints.push(NumberKeypoint { time, value, envelope });
                }
                match NumberSequence::try_new(keypoints.clone()) {
                    Ok(seq) => Ok(Value::NumberSequence(seq)),
                    Err(reason) => {
                        let raw = keypoints
                            .iter()
                            .flat_map(|k| [k.time, k.value, k.envelope])
                            .map(Value::Float)
                            .collect();
                        self.domain_failure("NumberSequence", reason, tag_offset, raw)
                    }
                }
            }
            TAG_COLORSEQUENCE => {
                let count = self.read_keyframe_count()?;
                let mut keypoints = Vec::with_capacity(count);
                for _ in 0..count {
                    let [time, r, g, b] = self.read_f64_fields()?;
                    keypoints.push(ColorKeypoint { time, r, g, b });
                }
                match ColorSequence::try_new(keypoints.clone()) {
                    Ok(seq) => Ok(Value::ColorSequence(seq)),
                    Err(reason) => {
                        let raw = keypoints
                            .iter()
                            .flat_map(|k| [k.time, k.r, k.g, k.b])
                            .map(Value::Float)
                            .collect();
                        self.domain_failure("ColorSequence", reason, tag_offset, raw)
                    }
                }
            }
            found => Err(CodecError::TagMismatch {
                found,
                offset: tag_offset,
                expected: "a value tag",
            }),
        }
    }

    fn read_sequence(&mut self, tag_offset: usize, depth: usize) -> CodecResult<Value> {
        self.check_depth(depth, tag_offset)?;
        // Register before reading children so back-references inside them
        // can resolve to this aggregate.
        let cell: ArrayRef = Rc::new(RefCell::new(Vec::new()));
        let value = Value::Array(cell.clone());
        self.registry.push(value.clone());
        loop {
            let child_offset = self.offset();
            let tag = self.read_u8()?;
            if tag == TAG_ARRAY_END {
                break;
            }
            let child = self.read_value_from_tag(tag, child_offset, depth + 1)?;
            cell.borrow_mut().push(child);
        }
        Ok(value)
    }

    fn read_mapping(&mut self, tag_offset: usize, depth: usize) -> CodecResult<Value> {
        self.check_depth(depth, tag_offset)?;
        let cell: TableRef = Rc::new(RefCell::new(Table::new()));
        let value = Value::Table(cell.clone());
        self.registry.push(value.clone());
        loop {
            let key_offset = self.offset();
            let tag = self.read_u8()?;
            if tag == TAG_TABLE_END {
                break;
            }
            let key = self.read_value_from_tag(tag, key_offset, depth + 1)?;
            let sep_offset = self.offset();
            let sep = self.read_u8()?;
            if sep != TAG_KEY_VALUE_SEPARATOR {
                return Err(CodecError::MissingSeparator { found: sep, offset: sep_offset });
            }
            let child = self.read_value(depth + 1)?;
            // Keys outside the byte-string/integer domain are dropped, the
            // entry's bytes having been consumed either way.
            cell.borrow_mut().set(&key, child);
        }
        Ok(value)
    }

    fn read_reference(&mut self, tag_offset: usize) -> CodecResult<Value> {
        let id = self.read_int_frame("a reference identifier INT frame")?;
        if id < 1 || id as usize > self.registry.len() {
            return Err(CodecError::DanglingReference { id, offset: tag_offset });
        }
        Ok(self.registry[id as usize - 1].clone())
    }

    /// Reads a complete INT frame (tag, width, magnitude).
    fn read_int_frame(&mut self, expected: &'static str) -> CodecResult<i64> {
        let tag_offset = self.offset();
        let tag = self.read_u8()?;
        if tag != TAG_NUMBER_INT {
            return Err(CodecError::TagMismatch { found: tag, offset: tag_offset, expected });
        }
        self.read_int_body()
    }

    /// Reads the width byte and magnitude of an INT frame, sign-extending
    /// the leading byte.
    fn read_int_body(&mut self) -> CodecResult<i64> {
        let width_offset = self.offset();
        let width = self.read_u8()?;
        let offset = self.offset();
        match width {
            1 => self
                .cursor
                .read_i8()
                .map(i64::from)
                .map_err(|_| CodecError::Truncated { offset }),
            2 => self
                .cursor
                .read_i16::<BigEndian>()
                .map(i64::from)
                .map_err(|_| CodecError::Truncated { offset }),
            4 => self
                .cursor
                .read_i32::<BigEndian>()
                .map(i64::from)
                .map_err(|_| CodecError::Truncated { offset }),
            found => Err(CodecError::TagMismatch {
                found,
                offset: width_offset,
                expected: "integer width 1, 2 or 4",
            }),
        }
    }

    /// Reads a complete string frame (short or long) and returns its bytes.
    fn read_bytes_frame(&mut self) -> CodecResult<Vec<u8>> {
        let tag_offset = self.offset();
        let tag = self.read_u8()?;
        match tag {
            TAG_STRING_SHORT => {
                let len = self.read_u8()? as usize;
                self.read_exact(len)
            }
            TAG_STRING_LONG => {
                let len_offset = self.offset();
                let len = self.read_u32_be()? as usize;
                if len > self.config.max_bytes_len {
                    return Err(CodecError::SizeLimit {
                        what: "byte string",
                        len: len as i64,
                        limit: self.config.max_bytes_len,
                        offset: len_offset,
                    });
                }
                self.read_exact(len)
            }
            found => Err(CodecError::TagMismatch {
                found,
                offset: tag_offset,
                expected: "a string frame",
            }),
        }
    }

    fn read_keyframe_count(&mut self) -> CodecResult<usize> {
        let count_offset = self.offset();
        let count = self.read_int_frame("a keypoint count INT frame")?;
        if count < 0 || count as usize > self.config.max_keyframes {
            return Err(CodecError::SizeLimit {
                what: "keyframe list",
                len: count,
                limit: self.config.max_keyframes,
                offset: count_offset,
            });
        }
        Ok(count as usize)
    }

    fn domain_failure(
        &self,
        kind: &'static str,
        reason: &'static str,
        offset: usize,
        raw_fields: Vec<Value>,
    ) -> CodecResult<Value> {
        if !self.config.placeholder_on_domain_error {
            return Err(CodecError::DomainReconstruction { kind, reason, offset });
        }
        debug!(kind, reason, offset, "domain constructor rejected decoded fields, emitting placeholder");
        let mut table = Table::new();
        table.insert(
            TableKey::Bytes(PLACEHOLDER_KIND_KEY.to_vec()),
            Value::Bytes(kind.as_bytes().to_vec()),
        );
        table.insert(TableKey::Bytes(PLACEHOLDER_FIELDS_KEY.to_vec()), Value::array(raw_fields));
        Ok(Value::table(table))
    }

    fn check_depth(&self, depth: usize, offset: usize) -> CodecResult<()> {
        if depth >= self.config.max_depth {
            return Err(CodecError::DepthLimit { limit: self.config.max_depth, offset });
        }
        Ok(())
    }

    fn read_u8(&mut self) -> CodecResult<u8> {
        let offset = self.offset();
        self.cursor.read_u8().map_err(|_| CodecError::Truncated { offset })
    }

    fn read_u32_be(&mut self) -> CodecResult<u32> {
        let offset = self.offset();
        self.cursor.read_u32::<BigEndian>().map_err(|_| CodecError::Truncated { offset })
    }

    fn read_f64_raw(&mut self) -> CodecResult<f64> {
        let offset = self.offset();
        self.cursor.read_f64::<LittleEndian>().map_err(|_| CodecError::Truncated { offset })
    }

    fn read_f64_fields<const N: usize>(&mut self) -> CodecResult<[f64; N]> {
        let mut fields = [0.0; N];
        for field in &mut fields {
            *field = self.read_f64_raw()?;
        }
        Ok(fields)
    }

    /// Reads exactly `len` bytes, checking the declared length against the
    /// bytes actually remaining before allocating.
    fn read_exact(&mut self, len: usize) -> CodecResult<Vec<u8>> {
        let offset = self.offset();
        let remaining = self.cursor.get_ref().len() - offset;
        if len > remaining {
            return Err(CodecError::Truncated { offset });
        }
        let mut buf = vec![0u8; len];
        self.cursor
            .read_exact(&mut buf)
            .map_err(|_| CodecError::Truncated { offset })?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> CodecResult<Value> {
        ValueDecoder::new(bytes, &CodecConfig::default()).decode()
    }

    #[test]
    fn test_atom_frames() {
        assert_eq!(decode(&[0x00]).unwrap(), Value::Nil);
        assert_eq!(decode(&[0x01]).unwrap(), Value::Bool(false));
        assert_eq!(decode(&[0x02]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_int_sign_extension() {
        assert_eq!(decode(&[0x03, 0x01, 0xff]).unwrap(), Value::Int(-1));
        assert_eq!(decode(&[0x03, 0x01, 0x7f]).unwrap(), Value::Int(127));
        assert_eq!(decode(&[0x03, 0x02, 0x80, 0x00]).unwrap(), Value::Int(-32768));
        assert_eq!(
            decode(&[0x03, 0x04, 0x00, 0x01, 0x86, 0xa0]).unwrap(),
            Value::Int(100_000)
        );
    }

    #[test]
    fn test_bad_int_width() {
        let err = decode(&[0x03, 0x03, 0x00, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, CodecError::TagMismatch { found: 3, offset: 1, .. }));
    }

    #[test]
    fn test_string_frame() {
        assert_eq!(decode(&[0x05, 0x02, 0x68, 0x69]).unwrap(), Value::str("hi"));
    }

    #[test]
    fn test_unknown_tag() {
        let err = decode(&[0xff]).unwrap_err();
        assert!(matches!(err, CodecError::TagMismatch { found: 0xff, offset: 0, .. }));
    }

    #[test]
    fn test_empty_payload_truncated() {
        let err = decode(&[]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { offset: 0 }));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let err = decode(&[0x00, 0x00]).unwrap_err();
        assert!(matches!(err, CodecError::TrailingBytes { remaining: 1, offset: 1 }));
    }

    #[test]
    fn test_missing_separator() {
        // TABLE_START, key int(1), then a value tag where the separator belongs
        let err = decode(&[0x07, 0x03, 0x01, 0x01, 0x00, 0x08]).unwrap_err();
        assert!(matches!(err, CodecError::MissingSeparator { found: 0x00, offset: 4 }));
    }

    #[test]
    fn test_dangling_reference() {
        let err = decode(&[0x09, 0x0c, 0x03, 0x01, 0x02, 0x0a]).unwrap_err();
        assert!(matches!(err, CodecError::DanglingReference { id: 2, .. }));
    }

    #[test]
    fn test_self_cycle_resolves() {
        let value = decode(&[0x09, 0x0c, 0x03, 0x01, 0x01, 0x0a]).unwrap();
        let cell = match &value {
            Value::Array(cell) => cell.clone(),
            other => panic!("expected array, got {}", other.kind_name()),
        };
        assert_eq!(cell.borrow().len(), 1);
        assert!(cell.borrow()[0].ptr_eq(&value));
    }

    #[test]
    fn test_oversized_string_length_rejected() {
        // STRING_LONG declaring 2^31 bytes
        let err = decode(&[0x06, 0x80, 0x00, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, CodecError::SizeLimit { what: "byte string", .. }));
    }

    #[test]
    fn test_strict_domain_failure() {
        // BRICKCOLOR with palette number 0
        let err = decode(&[0x16, 0x03, 0x01, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::DomainReconstruction { kind: "BrickColor", offset: 0, .. }
        ));
    }

    #[test]
    fn test_placeholder_domain_failure() {
        let config =
            CodecConfig { placeholder_on_domain_error: true, ..CodecConfig::default() };
        let value = ValueDecoder::new(&[0x16, 0x03, 0x01, 0x00], &config).decode().unwrap();
        let cell = match &value {
            Value::Table(cell) => cell.clone(),
            other => panic!("expected placeholder table, got {}", other.kind_name()),
        };
        let table = cell.borrow();
        assert_eq!(
            table.get(&TableKey::Bytes(PLACEHOLDER_KIND_KEY.to_vec())),
            Some(&Value::str("BrickColor"))
        );
        assert_eq!(
            table.get(&TableKey::Bytes(PLACEHOLDER_FIELDS_KEY.to_vec())),
            Some(&Value::array(vec![Value::Int(0)]))
        );
    }

    #[test]
    fn test_depth_limit() {
        let config = CodecConfig { max_depth: 4, ..CodecConfig::default() };
        let deep = vec![TAG_ARRAY_START; 6];
        let err = ValueDecoder::new(&deep, &config).decode().unwrap_err();
        assert!(matches!(err, CodecError::DepthLimit { limit: 4, offset: 4 }));
    }
}
