//! Round-trip tests for value graph encoding and decoding.

#[cfg(test)]
mod tests {
    use graphwire_core::{config::CodecConfig, error::CodecError};

    use crate::value::{
        BrickColor, CFrame, Color3, ColorKeypoint, ColorSequence, DateTime, EnumItem,
        InstanceRef, NumberKeypoint, NumberSequence, Rect, Table, TableKey, UDim2, Value,
        Vector2, Vector3,
    };
    use super::super::{decode, decode_with, encode, encode_with};

    fn round_trip(value: &Value) -> Value {
        decode(&encode(value).unwrap()).unwrap()
    }

    #[test]
    fn test_round_trip_atoms() {
        for value in [
            Value::Nil,
            Value::Bool(false),
            Value::Bool(true),
            Value::Int(0),
            Value::Int(-1),
            Value::Int(127),
            Value::Int(-128),
            Value::Int(128),
            Value::Int(32767),
            Value::Int(-32768),
            Value::Int(i32::MAX as i64),
            Value::Int(i32::MIN as i64),
            Value::Float(0.5),
            Value::Float(-1234.25),
            Value::Float(f64::INFINITY),
            Value::Float(f64::NEG_INFINITY),
            Value::Float(f64::MIN_POSITIVE / 2.0), // subnormal
        ] {
            assert_eq!(round_trip(&value), value);
        }
    }

    #[test]
    fn test_round_trip_signed_zero_and_nan_by_bits() {
        for bits in [0.0f64.to_bits(), (-0.0f64).to_bits(), f64::NAN.to_bits()] {
            let value = Value::Float(f64::from_bits(bits));
            match round_trip(&value) {
                Value::Float(f) => assert_eq!(f.to_bits(), bits),
                other => panic!("expected float, got {}", other.kind_name()),
            }
        }
    }

    #[test]
    fn test_out_of_range_int_round_trips_as_float() {
        let wide = 1_i64 << 40;
        assert_eq!(round_trip(&Value::Int(wide)), Value::Float(wide as f64));
    }

    #[test]
    fn test_round_trip_byte_strings() {
        for len in [0usize, 1, 254, 255, 256, 65_537] {
            let value = Value::Bytes(vec![0xab; len]);
            assert_eq!(round_trip(&value), value, "length {}", len);
        }
    }

    #[test]
    fn test_round_trip_nested_aggregates() {
        let mut inner = Table::new();
        inner.insert(TableKey::str("name"), Value::str("part"));
        inner.insert(TableKey::Int(-3), Value::Float(0.25));

        let value = Value::array(vec![
            Value::Nil,
            Value::table(inner),
            Value::array(vec![Value::Int(1), Value::array(vec![])]),
        ]);
        assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn test_round_trip_domain_tuples() {
        for value in [
            Value::Vector3(Vector3 { x: 1.0, y: -2.0, z: 0.5 }),
            Value::Vector2(Vector2 { x: 3.5, y: 4.5 }),
            Value::Color3(Color3 { r: 0.1, g: 0.2, b: 0.3 }),
            Value::UDim2(UDim2 { x_scale: 0.5, x_offset: 10.0, y_scale: 1.0, y_offset: -4.0 }),
            Value::Rect(Rect { min_x: 0.0, min_y: 0.0, max_x: 100.0, max_y: 50.0 }),
            Value::CFrame(CFrame::at(1.0, 2.0, 3.0)),
            Value::Enum(EnumItem::try_new(b"Material".to_vec(), b"Neon".to_vec()).unwrap()),
            Value::InstanceRef(InstanceRef { path: b"game.Workspace.Part".to_vec() }),
            Value::DateTime(DateTime { unix_millis: 1_700_000_000_123 }),
            Value::BrickColor(BrickColor::try_from_number(194).unwrap()),
            Value::NumberSequence(
                NumberSequence::try_new(vec![
                    NumberKeypoint { time: 0.0, value: 1.0, envelope: 0.0 },
                    NumberKeypoint { time: 0.5, value: 2.0, envelope: 0.25 },
                    NumberKeypoint { time: 1.0, value: 0.0, envelope: 0.0 },
                ])
                .unwrap(),
            ),
            Value::ColorSequence(
                ColorSequence::try_new(vec![
                    ColorKeypoint { time: 0.0, r: 1.0, g: 0.0, b: 0.0 },
                    ColorKeypoint { time: 1.0, r: 0.0, g: 0.0, b: 1.0 },
                ])
                .unwrap(),
            ),
        ] {
            assert_eq!(round_trip(&value), value);
        }
    }

    #[test]
    fn test_shared_substructure_preserves_identity() {
        let shared = Value::array(vec![Value::Int(7)]);
        let outer = Value::array(vec![shared.clone(), shared.clone()]);

        let decoded = round_trip(&outer);
        let cell = match &decoded {
            Value::Array(cell) => cell.clone(),
            other => panic!("expected array, got {}", other.kind_name()),
        };
        let children = cell.borrow();
        assert_eq!(children.len(), 2);
        assert!(children[0].ptr_eq(&children[1]));
    }

    #[test]
    fn test_mutual_cycle_round_trips() {
        let a = Value::array(vec![]);
        let b = Value::array(vec![]);
        if let (Value::Array(a_cell), Value::Array(b_cell)) = (&a, &b) {
            a_cell.borrow_mut().push(b.clone());
            b_cell.borrow_mut().push(a.clone());
        }

        let decoded = round_trip(&a);
        let a_cell = match &decoded {
            Value::Array(cell) => cell.clone(),
            other => panic!("expected array, got {}", other.kind_name()),
        };
        let b_decoded = a_cell.borrow()[0].clone();
        let b_cell = match &b_decoded {
            Value::Array(cell) => cell.clone(),
            other => panic!("expected array, got {}", other.kind_name()),
        };
        assert!(b_cell.borrow()[0].ptr_eq(&decoded));
        assert!(!decoded.ptr_eq(&b_decoded));
    }

    #[test]
    fn test_cyclic_table_round_trips() {
        let value = Value::table(Table::new());
        if let Value::Table(cell) = &value {
            cell.borrow_mut().insert(TableKey::str("me"), value.clone());
        }

        let decoded = round_trip(&value);
        let cell = match &decoded {
            Value::Table(cell) => cell.clone(),
            other => panic!("expected table, got {}", other.kind_name()),
        };
        let me = cell.borrow().get(&TableKey::str("me")).cloned().unwrap();
        assert!(me.ptr_eq(&decoded));
    }

    #[test]
    fn test_sequence_table_decodes_as_array() {
        let mut t = Table::new();
        t.insert(TableKey::Int(1), Value::str("a"));
        t.insert(TableKey::Int(2), Value::str("b"));

        let decoded = round_trip(&Value::table(t));
        assert_eq!(decoded, Value::array(vec![Value::str("a"), Value::str("b")]));
    }

    #[test]
    fn test_mixed_key_table_keeps_every_entry() {
        let mut t = Table::new();
        t.insert(TableKey::Int(1), Value::str("a"));
        t.insert(TableKey::Int(2), Value::str("b"));
        t.insert(TableKey::str("extra"), Value::str("c"));

        let decoded = round_trip(&Value::table(t.clone()));
        assert_eq!(decoded, Value::table(t));
    }

    #[test]
    fn test_round_trip_deep_nesting_within_bound() {
        let config = CodecConfig::default();
        let mut value = Value::Int(0);
        for _ in 0..config.max_depth {
            value = Value::array(vec![value]);
        }
        let bytes = encode_with(&value, &config).unwrap();
        assert_eq!(decode_with(&bytes, &config).unwrap(), value);
    }

    #[test]
    fn test_keyframe_limit_enforced_both_ways() {
        let config = CodecConfig { max_keyframes: 2, ..CodecConfig::default() };
        let seq = Value::NumberSequence(
            NumberSequence::try_new(vec![
                NumberKeypoint { time: 0.0, value: 0.0, envelope: 0.0 },
                NumberKeypoint { time: 0.5, value: 0.0, envelope: 0.0 },
                NumberKeypoint { time: 1.0, value: 0.0, envelope: 0.0 },
            ])
            .unwrap(),
        );
        let err = encode_with(&seq, &config).unwrap_err();
        assert!(matches!(err, CodecError::SizeLimit { what: "keyframe list", .. }));

        let bytes = encode(&seq).unwrap();
        let err = decode_with(&bytes, &config).unwrap_err();
        assert!(matches!(err, CodecError::SizeLimit { what: "keyframe list", .. }));
    }

    #[test]
    fn test_string_limit_enforced_on_decode() {
        let config = CodecConfig { max_bytes_len: 300, ..CodecConfig::default() };
        let bytes = encode(&Value::Bytes(vec![0; 400])).unwrap();
        let err = decode_with(&bytes, &config).unwrap_err();
        assert!(matches!(err, CodecError::SizeLimit { what: "byte string", .. }));
    }
}
