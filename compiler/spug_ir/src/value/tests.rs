use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_truthiness() {
    assert!(!Value::Null.as_bool());
    assert!(!Value::Int(0).as_bool());
    assert!(Value::Int(-3).as_bool());
    assert!(!Value::Float(f64::NAN).as_bool());
    assert!(!Value::from("").as_bool());
    assert!(Value::from("0").as_bool());
    assert!(!Value::empty_array().as_bool());
    assert!(Value::from(vec![Value::Null]).as_bool());
}

#[test]
fn test_numeric_coercion() {
    assert_eq!(Value::from("42").as_int(), 42);
    assert_eq!(Value::from(" 2.5 ").as_float(), 2.5);
    assert_eq!(Value::from("2.9").as_int(), 2);
    assert_eq!(Value::from("abc").as_int(), 0);
    assert_eq!(Value::Bool(true).as_float(), 1.0);
    assert_eq!(Value::Float(-7.8).as_int(), -7);
}

#[test]
fn test_to_text() {
    assert_eq!(Value::Null.to_text(), "");
    assert_eq!(Value::Float(2.0).to_text(), "2");
    assert_eq!(Value::Float(0.5).to_text(), "0.5");
    assert_eq!(Value::Float(f64::INFINITY).to_text(), "inf");
    assert_eq!(Value::Float(f64::NAN).to_text(), "nan");
    assert_eq!(Value::Bool(false).to_text(), "false");
}

#[test]
fn test_json_encoding_is_key_ordered() {
    let value: Value = [
        ("b", Value::Int(1)),
        ("a", Value::from(vec![Value::Bool(true), Value::Null])),
    ]
    .into_iter()
    .collect();
    assert_eq!(value.to_json(), r#"{"a":[true,null],"b":1}"#);
}

#[test]
fn test_mixed_number_equality() {
    assert_eq!(Value::Int(2), Value::Float(2.0));
    assert_ne!(Value::Int(2), Value::from("2"));
    assert_ne!(Value::Null, Value::Bool(false));
}

#[test]
fn test_from_serde_json() {
    let json: serde_json::Value =
        serde_json::from_str(r#"{"n": 3, "f": 1.5, "s": "x", "l": [null]}"#).unwrap_or_default();
    let value = Value::from(json);
    assert_eq!(value.get("n"), Some(&Value::Int(3)));
    assert_eq!(value.get("f"), Some(&Value::Float(1.5)));
    assert_eq!(value.get("s"), Some(&Value::from("x")));
    assert_eq!(value.get("l").map(Value::size), Some(1));
}

#[test]
fn test_container_access() {
    let mut value = Value::empty_dict();
    assert!(value.insert("list", Value::from(vec![Value::Int(1), Value::Int(2)])));
    assert!(!Value::Int(1).insert("x", Value::Null));
    if let Some(slot) = value.get_mut("list").and_then(|l| l.get_index_mut(1)) {
        *slot = Value::Int(20);
    }
    assert_eq!(
        value.get("list").and_then(|l| l.get_index(1)),
        Some(&Value::Int(20))
    );
    assert_eq!(value.size(), 1);
    assert_eq!(Value::from("abc").size(), 0);
}
