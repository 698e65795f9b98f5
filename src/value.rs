//! Value module - the tagged union used for bound parameters and fetched cells

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::ValueError;

/// A driver-native scalar. Parameters are bound from it and cells are read into it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    /// A date-like cell or parameter.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Short name of the variant, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
            Value::Timestamp(_) => "TIMESTAMP",
        }
    }
}

macro_rules! value_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

value_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

/// Naive date-times are taken to be UTC.
impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(Utc.from_utc_datetime(&v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Convert a JSON parameter to a bindable value.
///
/// Arrays and objects have no scalar counterpart and are bound as their JSON text.
impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Real(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

/// Convert a list of JSON parameters to positional values
pub fn params_from_json(params: &[serde_json::Value]) -> Vec<Value> {
    params.iter().map(Value::from).collect()
}

/// Build an array of positional [`Value`] parameters.
///
/// ```
/// use sqlite_rowmap::{params, Value};
///
/// let bound = params![1, "alice", None::<i64>];
/// assert_eq!(bound[1], Value::Text("alice".to_string()));
/// assert_eq!(bound[2], Value::Null);
/// ```
#[macro_export]
macro_rules! params {
    () => {{
        let empty: [$crate::Value; 0] = [];
        empty
    }};
    ($($param:expr),+ $(,)?) => {
        [$($crate::Value::from($param)),+]
    };
}

/// Extraction of a Rust value from a cell, limited to the driver's native representation.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(ValueError::new("INTEGER", other.kind())),
        }
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    let wide = i64::from_value(value)?;
                    <$ty>::try_from(wide)
                        .map_err(|_| ValueError::new(stringify!($ty), "out-of-range INTEGER"))
                }
            }
        )*
    };
}

narrow_integer!(i32, i16, i8, u32, u16, u8, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Real(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(ValueError::new("REAL", other.kind())),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

/// SQLite has no boolean storage class; 0 and 1 integers are accepted as well.
impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Integer(_) => Err(ValueError::new("BOOLEAN", "non-boolean INTEGER")),
            other => Err(ValueError::new("BOOLEAN", other.kind())),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ValueError::new("TEXT", other.kind())),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Blob(b) => Ok(b),
            other => Err(ValueError::new("BLOB", other.kind())),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(ValueError::new("TIMESTAMP", other.kind())),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_macro() {
        let bound = params![7, 2.5, "x", true];
        assert_eq!(
            bound,
            [
                Value::Integer(7),
                Value::Real(2.5),
                Value::Text("x".to_string()),
                Value::Bool(true)
            ]
        );
        assert!(params![].is_empty());
    }

    #[test]
    fn test_json_params() {
        let values = params_from_json(&[
            serde_json::json!(null),
            serde_json::json!(42),
            serde_json::json!(1.5),
            serde_json::json!("s"),
            serde_json::json!([1, 2]),
            serde_json::json!({"a": 1}),
        ]);
        assert_eq!(values[0], Value::Null);
        assert_eq!(values[1], Value::Integer(42));
        assert_eq!(values[2], Value::Real(1.5));
        assert_eq!(values[3], Value::Text("s".to_string()));
        assert_eq!(values[4], Value::Text("[1,2]".to_string()));
        assert_eq!(values[5], Value::Text("{\"a\":1}".to_string()));
    }

    #[test]
    fn test_narrowing() {
        assert_eq!(i32::from_value(Value::Integer(12)), Ok(12));
        assert!(i32::from_value(Value::Integer(i64::MAX)).is_err());
        assert_eq!(
            u8::from_value(Value::Integer(-1)),
            Err(ValueError::new("u8", "out-of-range INTEGER"))
        );
    }

    #[test]
    fn test_null_handling() {
        assert_eq!(Option::<String>::from_value(Value::Null), Ok(None));
        assert_eq!(
            String::from_value(Value::Null),
            Err(ValueError::new("TEXT", "NULL"))
        );
    }

    #[test]
    fn test_widening_and_bool() {
        assert_eq!(f64::from_value(Value::Integer(3)), Ok(3.0));
        assert_eq!(bool::from_value(Value::Integer(1)), Ok(true));
        assert!(bool::from_value(Value::Integer(2)).is_err());
    }
}
