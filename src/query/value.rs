//! Query Value Module
//!
//! Tagged representation of the value kinds a query can inspect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Value ==
/// A queryable value.
///
/// Queries never inspect arbitrary types at runtime. Stored values either are
/// a `Value` or expose their fields as `Value`s through
/// [`Fields`](crate::query::Fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Byte(u8),
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    TextList(Vec<String>),
    BytesList(Vec<Vec<u8>>),
    TimeList(Vec<DateTime<Utc>>),
}

impl Value {
    /// Short name of the value kind, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Bytes(_) => "bytes",
            Value::Time(_) => "time",
            Value::IntList(_) => "int_list",
            Value::FloatList(_) => "float_list",
            Value::TextList(_) => "text_list",
            Value::BytesList(_) => "bytes_list",
            Value::TimeList(_) => "time_list",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Byte(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntList(v)
    }
}

impl From<Vec<i32>> for Value {
    fn from(v: Vec<i32>) -> Self {
        Value::IntList(v.into_iter().map(i64::from).collect())
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::FloatList(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::TextList(v)
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::TextList(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<Vec<u8>>> for Value {
    fn from(v: Vec<Vec<u8>>) -> Self {
        Value::BytesList(v)
    }
}

impl From<Vec<DateTime<Utc>>> for Value {
    fn from(v: Vec<DateTime<Utc>>) -> Self {
        Value::TimeList(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_pick_expected_kind() {
        assert_eq!(Value::from(5).kind(), "int");
        assert_eq!(Value::from("x").kind(), "text");
        assert_eq!(Value::from(vec![1, 5, 9]).kind(), "int_list");
        assert_eq!(Value::from(b"ab".to_vec()).kind(), "bytes");
        assert_eq!(Value::from(7u8).kind(), "byte");
    }

    #[test]
    fn test_serde_is_tagged() {
        let json = serde_json::to_string(&Value::Int(3)).unwrap();
        assert_eq!(json, r#"{"kind":"int","value":3}"#);

        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Int(3));
    }
}
