use crate::core::{data_type::DataType, value::Value};
use serde::{Deserialize, Serialize};

/// One decoded cell: the column it belongs to, its declared destination type
/// and the value itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
    pub data_type: DataType,
}

/// One decoded row, fields in destination column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(field_values: Vec<FieldValue>) -> Self {
        RowData { field_values }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_is_case_insensitive() {
        let row = RowData::new(vec![FieldValue {
            name: "source_timestamp".to_string(),
            value: Value::Int(42),
            data_type: DataType::BigInt,
        }]);

        assert_eq!(row.get_value("SOURCE_TIMESTAMP"), Value::Int(42));
        assert_eq!(row.get_value("missing"), Value::Null);
    }
}
