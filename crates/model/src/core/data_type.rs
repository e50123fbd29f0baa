use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, str::FromStr};

/// Column types reported by the warehouse schema API.
///
/// The set is closed: a type name outside this enumeration is a parse error,
/// never a silent fallback to a string column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RemoteType {
    String,
    Bytes,
    Integer,
    Float,
    Numeric,
    BigNumeric,
    Boolean,
    Timestamp,
    Date,
    Time,
    Datetime,
    Geography,
    Json,
    Record,
}

impl FromStr for RemoteType {
    type Err = String;

    fn from_str(type_name: &str) -> Result<Self, Self::Err> {
        let normalized = type_name.trim().to_uppercase();
        let remote_type = match normalized.as_str() {
            "STRING" => RemoteType::String,
            "BYTES" => RemoteType::Bytes,
            "INTEGER" | "INT64" => RemoteType::Integer,
            "FLOAT" | "FLOAT64" => RemoteType::Float,
            "NUMERIC" => RemoteType::Numeric,
            "BIGNUMERIC" => RemoteType::BigNumeric,
            "BOOLEAN" | "BOOL" => RemoteType::Boolean,
            "TIMESTAMP" => RemoteType::Timestamp,
            "DATE" => RemoteType::Date,
            "TIME" => RemoteType::Time,
            "DATETIME" => RemoteType::Datetime,
            "GEOGRAPHY" => RemoteType::Geography,
            "JSON" => RemoteType::Json,
            "RECORD" | "STRUCT" => RemoteType::Record,
            _ => return Err(format!("Unknown warehouse column type: {type_name}")),
        };
        Ok(remote_type)
    }
}

impl RemoteType {
    /// Destination type for a scalar remote column.
    ///
    /// `Record` has no scalar mapping; the schema translator flattens the
    /// metadata container before this is consulted.
    pub fn destination_type(&self) -> Result<DataType, String> {
        let mapped = match self {
            RemoteType::String | RemoteType::Bytes | RemoteType::Geography | RemoteType::Json => {
                DataType::String
            }
            RemoteType::Integer => DataType::BigInt,
            RemoteType::Float | RemoteType::Numeric | RemoteType::BigNumeric => DataType::Double,
            RemoteType::Boolean => DataType::Boolean,
            RemoteType::Timestamp | RemoteType::Datetime => DataType::Timestamp,
            RemoteType::Date => DataType::Date,
            RemoteType::Time => DataType::Time,
            RemoteType::Record => {
                return Err("RECORD columns have no scalar destination type".to_string());
            }
        };
        Ok(mapped)
    }
}

impl fmt::Display for RemoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteType::String => "STRING",
            RemoteType::Bytes => "BYTES",
            RemoteType::Integer => "INTEGER",
            RemoteType::Float => "FLOAT",
            RemoteType::Numeric => "NUMERIC",
            RemoteType::BigNumeric => "BIGNUMERIC",
            RemoteType::Boolean => "BOOLEAN",
            RemoteType::Timestamp => "TIMESTAMP",
            RemoteType::Date => "DATE",
            RemoteType::Time => "TIME",
            RemoteType::Datetime => "DATETIME",
            RemoteType::Geography => "GEOGRAPHY",
            RemoteType::Json => "JSON",
            RemoteType::Record => "RECORD",
        };
        write!(f, "{name}")
    }
}

/// Column types of a local destination (engine table or columnar file).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataType {
    BigInt,
    Double,
    Boolean,
    Timestamp,
    Date,
    Time,
    String,
}

impl DataType {
    /// DDL type name understood by the embedded table engine.
    pub fn engine_name(&self) -> Cow<'_, str> {
        match self {
            DataType::BigInt => Cow::Borrowed("BIGINT"),
            DataType::Double => Cow::Borrowed("DOUBLE"),
            DataType::Boolean => Cow::Borrowed("BOOLEAN"),
            DataType::Timestamp => Cow::Borrowed("TIMESTAMP"),
            DataType::Date => Cow::Borrowed("DATE"),
            DataType::Time => Cow::Borrowed("TIME"),
            DataType::String => Cow::Borrowed("VARCHAR"),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.engine_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_type_names() {
        assert_eq!("STRING".parse::<RemoteType>(), Ok(RemoteType::String));
        assert_eq!("integer".parse::<RemoteType>(), Ok(RemoteType::Integer));
        assert_eq!(" Boolean ".parse::<RemoteType>(), Ok(RemoteType::Boolean));
        assert_eq!("STRUCT".parse::<RemoteType>(), Ok(RemoteType::Record));
    }

    #[test]
    fn test_parse_unknown_remote_type_fails() {
        let err = "INTERVAL".parse::<RemoteType>().unwrap_err();
        assert!(err.contains("INTERVAL"));
    }

    #[test]
    fn test_destination_mapping_is_total_for_scalars() {
        assert_eq!(
            RemoteType::Integer.destination_type(),
            Ok(DataType::BigInt)
        );
        assert_eq!(
            RemoteType::BigNumeric.destination_type(),
            Ok(DataType::Double)
        );
        assert_eq!(RemoteType::Bytes.destination_type(), Ok(DataType::String));
        assert_eq!(
            RemoteType::Datetime.destination_type(),
            Ok(DataType::Timestamp)
        );
        assert!(RemoteType::Record.destination_type().is_err());
    }

    #[test]
    fn test_engine_names() {
        assert_eq!(DataType::BigInt.engine_name(), "BIGINT");
        assert_eq!(DataType::String.engine_name(), "VARCHAR");
        assert_eq!(DataType::Timestamp.to_string(), "TIMESTAMP");
    }
}
