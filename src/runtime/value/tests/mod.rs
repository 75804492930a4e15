//! Value 单元测试

use crate::runtime::value::{Opaque, Value};

#[derive(Debug, PartialEq)]
struct Position {
    x: i32,
    y: i32,
}

#[cfg(test)]
mod primitive_tests {
    use super::*;

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(()), Value::Unit);
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(7i32).as_int(), Some(7));
        assert_eq!(Value::from(7u32).as_int(), Some(7));
        assert_eq!(Value::from(1.5).as_float(), Some(1.5));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::from(vec![1u8, 2]).as_bytes(), Some(&[1u8, 2][..]));
    }

    #[test]
    fn test_accessors_reject_other_kinds() {
        let v = Value::from("text");
        assert_eq!(v.as_int(), None);
        assert_eq!(v.as_bool(), None);
        assert!(v.as_list().is_none());
        assert!(v.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_int_widens_to_float() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Unit.type_name(), "unit");
        assert_eq!(Value::from(vec![Value::Unit]).type_name(), "list");
        assert!(Value::opaque(Position { x: 0, y: 0 })
            .type_name()
            .ends_with("Position"));
    }

    #[test]
    fn test_display() {
        let v = Value::List(vec![Value::Int(1), Value::from("a"), Value::Unit]);
        assert_eq!(v.to_string(), "[1, \"a\", ()]");
        assert_eq!(Value::Bytes(vec![0; 4]).to_string(), "<4 bytes>");
    }
}

#[cfg(test)]
mod opaque_tests {
    use super::*;

    #[test]
    fn test_downcast() {
        let v = Value::opaque(Position { x: 1, y: 2 });
        assert_eq!(v.downcast_ref::<Position>(), Some(&Position { x: 1, y: 2 }));
        assert!(v.downcast_ref::<u32>().is_none());
    }

    #[test]
    fn test_clone_shares_payload() {
        let v = Value::opaque(Position { x: 1, y: 2 });
        let w = v.clone();
        assert_eq!(v, w);
        match (&v, &w) {
            (Value::Opaque(a), Value::Opaque(b)) => {
                assert_eq!(a.ref_count(), 2);
                assert_eq!(b.ref_count(), 2);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_distinct_payloads_are_not_equal() {
        let a = Opaque::new(5u8);
        let b = Opaque::new(5u8);
        assert_ne!(a, b);
        assert_eq!(format!("{:?}", a), "Opaque<u8>");
    }

    #[test]
    fn test_serializable() {
        assert!(Value::List(vec![Value::Int(1)]).is_serializable());
        assert!(!Value::List(vec![Value::opaque(1u8)]).is_serializable());
    }
}

#[cfg(test)]
mod serde_tests {
    use super::*;

    #[test]
    fn test_tagged_json_shape() {
        let json = serde_json::to_string(&Value::Int(4)).unwrap();
        assert_eq!(json, r#"{"type":"int","value":4}"#);
        let unit = serde_json::to_string(&Value::Unit).unwrap();
        assert_eq!(unit, r#"{"type":"unit"}"#);
    }

    #[test]
    fn test_opaque_refuses_to_serialize() {
        assert!(serde_json::to_string(&Value::opaque(1u8)).is_err());
    }

    #[test]
    fn test_nested_list_from_json() {
        let v: Value = serde_json::from_str(
            r#"{"type":"list","value":[{"type":"bool","value":true},{"type":"string","value":"x"}]}"#,
        )
        .unwrap();
        assert_eq!(v, Value::List(vec![Value::Bool(true), Value::from("x")]));
    }
}
