use crate::core::data_type::DataType;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A scalar value flowing from the warehouse into a local destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::String(v) => v.parse::<i64>().ok(),
            Value::Boolean(v) => Some(i64::from(*v)),
            Value::Timestamp(_) => None,
            Value::Date(_) => None,
            Value::Time(_) => None,
            Value::Null => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.parse::<f64>().ok(),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Timestamp(_) => None,
            Value::Date(_) => None,
            Value::Time(_) => None,
            Value::Null => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Int(v) => Some(*v != 0),
            Value::Float(v) => Some(*v != 0.0),
            Value::String(v) => match v.to_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            Value::Boolean(v) => Some(*v),
            Value::Timestamp(_) => None,
            Value::Date(_) => None,
            Value::Time(_) => None,
            Value::Null => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339()),
            Value::Date(v) => Some(v.to_string()),
            Value::Time(v) => Some(v.to_string()),
            Value::Null => None,
        }
    }
}

impl DataType {
    /// Conversion applied to every raw field value before it reaches a sink.
    ///
    /// Keyed by the destination type; inputs that do not match a known shape
    /// pass through unchanged. Notably, case-insensitive `"true"`/`"false"`
    /// strings destined for a boolean column become booleans, and numeric
    /// strings destined for numeric columns are parsed.
    pub fn coerce(&self, value: Value) -> Value {
        match (self, value) {
            (DataType::Boolean, Value::String(s)) => match s.to_lowercase().as_str() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                _ => Value::String(s),
            },
            (DataType::BigInt, Value::String(s)) => match s.parse::<i64>() {
                Ok(v) => Value::Int(v),
                Err(_) => Value::String(s),
            },
            (DataType::BigInt, Value::Float(v)) => Value::Int(v as i64),
            (DataType::Double, Value::String(s)) => match s.parse::<f64>() {
                Ok(v) => Value::Float(v),
                Err(_) => Value::String(s),
            },
            (DataType::Double, Value::Int(v)) => Value::Float(v as f64),
            (_, value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_boolean_from_strings() {
        assert_eq!(
            DataType::Boolean.coerce(Value::String("TRUE".into())),
            Value::Boolean(true)
        );
        assert_eq!(
            DataType::Boolean.coerce(Value::String("false".into())),
            Value::Boolean(false)
        );
        // any other string passes through unmodified
        assert_eq!(
            DataType::Boolean.coerce(Value::String("yes".into())),
            Value::String("yes".into())
        );
    }

    #[test]
    fn test_coerce_bigint() {
        assert_eq!(
            DataType::BigInt.coerce(Value::String("12500".into())),
            Value::Int(12500)
        );
        assert_eq!(DataType::BigInt.coerce(Value::Float(3.0)), Value::Int(3));
        assert_eq!(
            DataType::BigInt.coerce(Value::String("n/a".into())),
            Value::String("n/a".into())
        );
    }

    #[test]
    fn test_coerce_double() {
        assert_eq!(
            DataType::Double.coerce(Value::String("1.5".into())),
            Value::Float(1.5)
        );
        assert_eq!(DataType::Double.coerce(Value::Int(2)), Value::Float(2.0));
    }

    #[test]
    fn test_coerce_string_is_identity() {
        assert_eq!(
            DataType::String.coerce(Value::String("TRUE".into())),
            Value::String("TRUE".into())
        );
        assert_eq!(DataType::String.coerce(Value::Int(1)), Value::Int(1));
    }

    #[test]
    fn test_coerce_temporal_is_identity() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(DataType::Date.coerce(Value::Date(date)), Value::Date(date));
        assert_eq!(
            DataType::Timestamp.coerce(Value::Null),
            Value::Null
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(7).as_f64(), Some(7.0));
        assert_eq!(Value::String("42".into()).as_i64(), Some(42));
        assert_eq!(Value::String("TRUE".into()).as_bool(), Some(true));
        assert!(Value::Null.as_string().is_none());
    }
}
