//! Value graph encoding.
//!
//! The encoder walks the input graph depth-first, writing one tag-framed
//! value per node. Aggregates are registered in a per-call reference map on
//! first visit; a revisit emits a back-reference instead of re-serializing,
//! which both deduplicates shared substructure and terminates cycles.

use std::{collections::HashMap, io::Write};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use tracing::trace;

use graphwire_core::{
    config::CodecConfig,
    constants::{
        TAG_ARRAY_END, TAG_ARRAY_START, TAG_BOOLEAN_FALSE, TAG_BOOLEAN_TRUE, TAG_BRICKCOLOR,
        TAG_CFRAME, TAG_COLOR3, TAG_COLORSEQUENCE, TAG_DATETIME, TAG_ENUM, TAG_INSTANCE_REF,
        TAG_KEY_VALUE_SEPARATOR, TAG_NIL, TAG_NUMBERSEQUENCE, TAG_NUMBER_FLOAT, TAG_NUMBER_INT,
        TAG_RECT, TAG_REFERENCE, TAG_STRING_LONG, TAG_STRING_SHORT, TAG_TABLE_END,
        TAG_TABLE_START, TAG_UDIM2, TAG_VECTOR2, TAG_VECTOR3,
    },
    error::{CodecError, CodecResult},
};

use crate::value::{Table, TableKey, Value};

/// Serializes a value graph into a self-describing byte stream.
///
/// One encoder instance performs exactly one encode; the reference map it
/// owns is scoped to that call.
pub struct ValueEncoder<'a> {
    config: &'a CodecConfig,
    buffer: Vec<u8>,
    // Aggregate allocation address -> identifier, ids assigned in pre-order
    // of first visit starting at 1.
    refs: HashMap<usize, i64>,
}

impl<'a> ValueEncoder<'a> {
    /// Creates an encoder with the given configuration.
    pub fn new(config: &'a CodecConfig) -> Self {
        Self { config, buffer: Vec::new(), refs: HashMap::new() }
    }

    /// Consumes the encoder and returns the encoded payload.
    pub fn encode(mut self, value: &Value) -> CodecResult<Vec<u8>> {
        self.write_value(value, 0)?;
        Ok(self.buffer)
    }

    fn write_value(&mut self, value: &Value, depth: usize) -> CodecResult<()> {
        match value {
            Value::Nil => self.buffer.write_u8(TAG_NIL)?,
            Value::Bool(false) => self.buffer.write_u8(TAG_BOOLEAN_FALSE)?,
            Value::Bool(true) => self.buffer.write_u8(TAG_BOOLEAN_TRUE)?,
            Value::Int(n) => self.write_int_frame(*n)?,
            Value::Float(f) => self.write_float_frame(*f)?,
            Value::Bytes(b) => self.write_bytes_frame(b)?,
            Value::Array(cell) => {
                if self.write_reference_if_seen(value)? {
                    return Ok(());
                }
                self.check_depth(depth)?;
                self.register(value);
                self.buffer.write_u8(TAG_ARRAY_START)?;
                for child in cell.borrow().iter() {
                    self.write_value(child, depth + 1)?;
                }
                self.buffer.write_u8(TAG_ARRAY_END)?;
            }
            Value::Table(cell) => {
                if self.write_reference_if_seen(value)? {
                    return Ok(());
                }
                self.check_depth(depth)?;
                self.register(value);
                let table = cell.borrow();
                if table.is_sequence() {
                    self.write_sequence_frame(&table, depth)?;
                } else {
                    self.write_mapping_frame(&table, depth)?;
                }
            }
            Value::Vector3(v) => {
                self.buffer.write_u8(TAG_VECTOR3)?;
                self.write_f64_fields(&[v.x, v.y, v.z])?;
            }
            Value::Vector2(v) => {
                self.buffer.write_u8(TAG_VECTOR2)?;
                self.write_f64_fields(&[v.x, v.y])?;
            }
            Value::Color3(c) => {
                self.buffer.write_u8(TAG_COLOR3)?;
                self.write_f64_fields(&[c.r, c.g, c.b])?;
            }
            Value::UDim2(u) => {
                self.buffer.write_u8(TAG_UDIM2)?;
                self.write_f64_fields(&[u.x_scale, u.x_offset, u.y_scale, u.y_offset])?;
            }
            Value::Rect(r) => {
                self.buffer.write_u8(TAG_RECT)?;
                self.write_f64_fields(&[r.min_x, r.min_y, r.max_x, r.max_y])?;
            }
            Value::CFrame(cf) => {
                self.buffer.write_u8(TAG_CFRAME)?;
                self.write_f64_fields(&[cf.x, cf.y, cf.z])?;
                self.write_f64_fields(&cf.rotation)?;
            }
            Value::Enum(e) => {
                self.buffer.write_u8(TAG_ENUM)?;
                self.write_bytes_frame(&e.enum_type)?;
                self.write_bytes_frame(&e.member)?;
            }
            Value::InstanceRef(i) => {
                self.buffer.write_u8(TAG_INSTANCE_REF)?;
                self.write_bytes_frame(&i.path)?;
            }
            Value::DateTime(dt) => {
                self.buffer.write_u8(TAG_DATETIME)?;
                self.buffer.write_f64::<LittleEndian>(dt.unix_millis as f64)?;
            }
            Value::BrickColor(bc) => {
                self.buffer.write_u8(TAG_BRICKCOLOR)?;
                self.write_int_frame(bc.number as i64)?;
            }
            Value::NumberSequence(seq) => {
                self.check_keyframes(seq.keypoints.len())?;
                self.buffer.write_u8(TAG_NUMBERSEQUENCE)?;
                self.write_int_frame(seq.keypoints.len() as i64)?;
                for kp in &seq.keypoints {
                    self.write_f64_fields(&[kp.time, kp.value, kp.envelope])?;
                }
            }
            Value::ColorSequence(seq) => {
                self.check_keyframes(seq.keypoints.len())?;
                self.buffer.write_u8(TAG_COLORSEQUENCE)?;
                self.write_int_frame(seq.keypoints.len() as i64)?;
                for kp in &seq.keypoints {
                    self.write_f64_fields(&[kp.time, kp.r, kp.g, kp.b])?;
                }
            }
        }

        Ok(())
    }

    /// Emits a back-reference if this aggregate was already visited.
    /// Returns true when a reference was written.
    fn write_reference_if_seen(&mut self, value: &Value) -> CodecResult<bool> {
        let addr = match value.aggregate_identity() {
            Some(addr) => addr,
            None => return Ok(false),
        };
        if let Some(&id) = self.refs.get(&addr) {
            self.buffer.write_u8(TAG_REFERENCE)?;
            self.write_int_frame(id)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn register(&mut self, value: &Value) {
        if let Some(addr) = value.aggregate_identity() {
            let id = self.refs.len() as i64 + 1;
            self.refs.insert(addr, id);
        }
    }

    // A table whose key set is exactly 1..=n is framed as a sequence, values
    // in key order.
    fn write_sequence_frame(&mut self, table: &Table, depth: usize) -> CodecResult<()> {
        self.buffer.write_u8(TAG_ARRAY_START)?;
        for (_, child) in table.iter() {
            self.write_value(child, depth + 1)?;
        }
        self.buffer.write_u8(TAG_ARRAY_END)?;
        Ok(())
    }

    fn write_mapping_frame(&mut self, table: &Table, depth: usize) -> CodecResult<()> {
        self.buffer.write_u8(TAG_TABLE_START)?;
        for (key, child) in table.iter() {
            match key {
                TableKey::Int(n) => self.write_int_frame(*n)?,
                TableKey::Bytes(b) => self.write_bytes_frame(b)?,
            }
            self.buffer.write_u8(TAG_KEY_VALUE_SEPARATOR)?;
            self.write_value(child, depth + 1)?;
        }
        self.buffer.write_u8(TAG_TABLE_END)?;
        Ok(())
    }

    /// Writes an INT frame with the smallest width containing the value.
    /// Values outside the 32-bit signed range reroute through the float
    /// frame, which is lossless up to 2^53.
    fn write_int_frame(&mut self, n: i64) -> CodecResult<()> {
        if n < i32::MIN as i64 || n > i32::MAX as i64 {
            trace!(value = n, "integer outside the 32-bit wire range, rerouting through the float frame");
            return self.write_float_frame(n as f64);
        }
        self.buffer.write_u8(TAG_NUMBER_INT)?;
        if (-128..=127).contains(&n) {
            self.buffer.write_u8(1)?;
            self.buffer.write_i8(n as i8)?;
        } else if (-32768..=32767).contains(&n) {
            self.buffer.write_u8(2)?;
            self.buffer.write_i16::<BigEndian>(n as i16)?;
        } else {
            self.buffer.write_u8(4)?;
            self.buffer.write_i32::<BigEndian>(n as i32)?;
        }
        Ok(())
    }

    fn write_float_frame(&mut self, f: f64) -> CodecResult<()> {
        self.buffer.write_u8(TAG_NUMBER_FLOAT)?;
        self.buffer.write_f64::<LittleEndian>(f)?;
        Ok(())
    }

    fn write_bytes_frame(&mut self, bytes: &[u8]) -> CodecResult<()> {
        if bytes.len() < 255 {
            self.buffer.write_u8(TAG_STRING_SHORT)?;
            self.buffer.write_u8(bytes.len() as u8)?;
        } else {
            if bytes.len() > u32::MAX as usize {
                return Err(CodecError::SizeLimit {
                    what: "byte string",
                    len: bytes.len() as i64,
                    limit: u32::MAX as usize,
                    offset: self.buffer.len(),
                });
            }
            self.buffer.write_u8(TAG_STRING_LONG)?;
            self.buffer.write_u32::<BigEndian>(bytes.len() as u32)?;
        }
        self.buffer.write_all(bytes)?;
        Ok(())
    }

    fn write_f64_fields(&mut self, fields: &[f64]) -> CodecResult<()> {
        for f in fields {
            self.buffer.write_f64::<LittleEndian>(*f)?;
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> CodecResult<()> {
        if depth >= self.config.max_depth {
            return Err(CodecError::DepthLimit {
                limit: self.config.max_depth,
                offset: self.buffer.len(),
            });
        }
        Ok(())
    }

    fn check_keyframes(&self, count: usize) -> CodecResult<()> {
        if count > self.config.max_keyframes {
            return Err(CodecError::SizeLimit {
                what: "keyframe list",
                len: count as i64,
                limit: self.config.max_keyframes,
                offset: self.buffer.len(),
            });
        }
        Ok(())
    }
}
