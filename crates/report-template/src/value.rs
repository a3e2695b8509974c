//! Request payload values

use crate::{ReportError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Leaf payload value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    /// Integers beyond `i64::MAX`
    Unsigned(u64),
    Float(f64),
    Text(String),
}

/// A record: ordered mapping of key to value
pub type Record = IndexMap<String, Value>;

/// Caller-supplied request data, in the order the caller sent it
pub type Payload = IndexMap<String, Value>;

/// Dynamically shaped payload value
///
/// Declared shapes are checked by matching on the variant: a table entry must
/// be a `Sequence` of `Record`s, a field entry may be anything but null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Record(Record),
}

impl Value {
    /// Shorthand for a text scalar
    pub fn text(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Text(s.into()))
    }

    /// Check if this is the null scalar
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Null))
    }

    /// Get the text if this is a text scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Get the elements if this is a sequence
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Get the record if this is a record
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Short shape name used in error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Scalar(Scalar::Null) => "null",
            Value::Scalar(_) => "scalar",
            Value::Sequence(_) => "sequence",
            Value::Record(_) => "record",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(Scalar::Integer(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(i) => Value::Scalar(Scalar::Integer(i)),
            Err(_) => Value::Scalar(Scalar::Unsigned(n)),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Scalar(Scalar::Float(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Scalar(Scalar::Null),
            serde_json::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Scalar(Scalar::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Scalar(Scalar::Unsigned(u))
                } else {
                    Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => Value::Scalar(Scalar::Text(s)),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Record(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Integer(n) => write!(f, "{n}"),
            Scalar::Unsigned(n) => write!(f, "{n}"),
            Scalar::Float(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Parse a request payload from JSON text
///
/// The top level must be a JSON object; key order is preserved.
pub fn parse_payload(json: &str) -> Result<Payload> {
    serde_json::from_str(json).map_err(|e| ReportError::ParseError(e.to_string()))
}

/// Convert a value to display text
///
/// Scalars render bare (no quotes, null as empty); sequences and records
/// render as compact JSON.
pub fn value_to_string(value: &Value) -> Result<String> {
    match value {
        Value::Scalar(s) => Ok(s.to_string()),
        Value::Sequence(_) | Value::Record(_) => serde_json::to_string(value)
            .map_err(|e| ReportError::MalformedAdHocDataSource(e.to_string())),
    }
}
