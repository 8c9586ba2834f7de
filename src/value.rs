//! Bound parameter values.
//!
//! Every user-supplied value that is not an identifier flows through `Value`
//! and is appended to the parameter list returned alongside SQL text. The
//! serializer never inlines a `Value` into the SQL string itself.

use chrono::{DateTime, Utc};

/// A single bound parameter value.
///
/// `Value` is dialect-agnostic; dialects only influence how the *placeholder*
/// for a value is rendered (`$1`, `?`, `:1`), never how the value itself is
/// represented, since values are handed to the driver out-of-band.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
    Timestamp(DateTime<Utc>),
    Uuid(uuid::Uuid),
    Bytes(Vec<u8>),
}

impl Value {
    /// True for Rust's notion of a "zero value" on the wrapped type, used by
    /// the `OmitZero` update mode and by the auto-column id hook to detect an
    /// unset primary key.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !*b,
            Value::Int(n) => *n == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty(),
            Value::Json(v) => v.is_null(),
            Value::Timestamp(_) => false,
            Value::Uuid(u) => u.is_nil(),
            Value::Bytes(b) => b.is_empty(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
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

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_value_detection() {
        assert!(Value::Text(String::new()).is_zero());
        assert!(Value::Int(0).is_zero());
        assert!(!Value::Int(1).is_zero());
        assert!(Value::Null.is_zero());
    }

    #[test]
    fn option_conversion() {
        let v: Value = Some(5i64).into();
        assert_eq!(v, Value::Int(5));
        let v: Value = None::<i64>.into();
        assert_eq!(v, Value::Null);
    }
}
