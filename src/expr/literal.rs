//! Literal values carried by predicates

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

use crate::errors::{AggError, AggResult};

/// A literal operand of a comparison or equality
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Enum variant, sent to the engine by name
    Enum(String),
    DateTime(DateTime<Utc>),
    /// Raw bytes; no query lowering exists
    Bytes(Vec<u8>),
    /// Collection literal; no query lowering exists
    List(Vec<Literal>),
}

impl Literal {
    /// Literal for an enum variant, using its `Display` name
    pub fn enum_value(variant: impl fmt::Display) -> Self {
        Literal::Enum(variant.to_string())
    }

    /// Returns the kind name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "integer",
            Literal::Float(_) => "float",
            Literal::Str(_) => "string",
            Literal::Enum(_) => "enum",
            Literal::DateTime(_) => "datetime",
            Literal::Bytes(_) => "bytes",
            Literal::List(_) => "list",
        }
    }

    /// Returns true for `Literal::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Wire value for term and range queries
    pub fn to_json(&self, context: &str) -> AggResult<Value> {
        match self {
            Literal::Null => Ok(Value::Null),
            Literal::Bool(b) => Ok(Value::Bool(*b)),
            Literal::Int(i) => Ok(Value::from(*i)),
            Literal::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| AggError::unsupported_literal("non-finite float", context)),
            Literal::Str(s) | Literal::Enum(s) => Ok(Value::String(s.clone())),
            Literal::DateTime(dt) => Ok(Value::String(format_datetime(dt))),
            Literal::Bytes(_) | Literal::List(_) => {
                Err(AggError::unsupported_literal(self.kind_name(), context))
            }
        }
    }

    /// Text form used inside predicate signatures
    pub fn signature_text(&self, context: &str) -> AggResult<String> {
        match self {
            Literal::Null => Ok("null".to_string()),
            Literal::Bool(b) => Ok(b.to_string()),
            Literal::Int(i) => Ok(i.to_string()),
            Literal::Float(f) => Ok(f.to_string()),
            Literal::Str(s) | Literal::Enum(s) => Ok(s.clone()),
            Literal::DateTime(dt) => Ok(format_datetime(dt)),
            Literal::Bytes(_) | Literal::List(_) => {
                Err(AggError::unsupported_literal(self.kind_name(), context))
            }
        }
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Str(s) => write!(f, "\"{}\"", s),
            Literal::Enum(s) => write!(f, "{}", s),
            Literal::DateTime(dt) => write!(f, "{}", format_datetime(dt)),
            Literal::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Literal::List(items) => write!(f, "<list of {}>", items.len()),
        }
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Int(v as i64)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}

impl From<u32> for Literal {
    fn from(v: u32) -> Self {
        Literal::Int(v as i64)
    }
}

impl From<f32> for Literal {
    fn from(v: f32) -> Self {
        Literal::Float(v as f64)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Str(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Str(v)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(v: DateTime<Utc>) -> Self {
        Literal::DateTime(v)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(v: Option<T>) -> Self {
        v.map_or(Literal::Null, Into::into)
    }
}
