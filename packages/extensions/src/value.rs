//! Dynamic values exchanged with the data model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Any value a data model can produce or store.
///
/// `Null` is the sentinel for "no value": a line read at end of input
/// stores `Null`, never an empty string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null/absent value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object/Map of values
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get value as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Canonical textual form used when an attribute expects a string.
    ///
    /// Strings are returned verbatim, scalars use their canonical rendering
    /// (`true`, `42`, `1.5`; whole floats drop the fraction), collections
    /// render as compact JSON. `Null` has no textual form.
    pub fn to_attribute_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Array(_) | Value::Object(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_string_scalars() {
        assert_eq!(Value::from("x").to_attribute_string(), Some("x".to_string()));
        assert_eq!(Value::Bool(true).to_attribute_string(), Some("true".to_string()));
        assert_eq!(Value::Int(8080).to_attribute_string(), Some("8080".to_string()));
        assert_eq!(Value::Float(1.5).to_attribute_string(), Some("1.5".to_string()));
        assert_eq!(Value::Float(3.0).to_attribute_string(), Some("3".to_string()));
        assert_eq!(Value::Null.to_attribute_string(), None);
    }

    #[test]
    fn test_attribute_string_collections() {
        let arr = Value::from(vec![1, 2]);
        assert_eq!(arr.to_attribute_string(), Some("[1,2]".to_string()));

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::from("b"));
        assert_eq!(
            Value::Object(map).to_attribute_string(),
            Some(r#"{"a":"b"}"#.to_string())
        );
    }

    #[test]
    fn test_null_distinct_from_empty_string() {
        assert_ne!(Value::Null, Value::from(""));
        assert!(Value::from(None::<String>).is_null());
    }

    #[test]
    fn test_value_serde_untagged() {
        let json = serde_json::to_string(&Value::from(vec![Value::Null, Value::Bool(false)]))
            .unwrap();
        assert_eq!(json, "[null,false]");
        let back: Value = serde_json::from_str(r#"{"n":1}"#).unwrap();
        assert_eq!(back.type_name(), "object");
    }
}
