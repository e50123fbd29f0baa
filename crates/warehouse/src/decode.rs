//! Decoding of REST result rows into typed [`RowData`].
//!
//! The query API returns each row as `{"f": [{"v": <cell>}, ...]}` with every
//! scalar cell rendered as a JSON string, in projection order. Decoding uses
//! the translated schema's declared types plus the typed coercion table.

use crate::error::WarehouseError;
use chrono::{DateTime, NaiveDate, NaiveTime};
use model::{
    core::{data_type::DataType, value::Value},
    records::row::{FieldValue, RowData},
    schema::field::ColumnDef,
};

pub fn decode_row(columns: &[ColumnDef], row: &serde_json::Value) -> Result<RowData, WarehouseError> {
    let cells = row
        .get("f")
        .and_then(|f| f.as_array())
        .ok_or_else(|| WarehouseError::Payload("result row is missing the 'f' cell array".into()))?;

    if cells.len() != columns.len() {
        return Err(WarehouseError::Payload(format!(
            "result row has {} cells but the schema has {} columns",
            cells.len(),
            columns.len()
        )));
    }

    let mut field_values = Vec::with_capacity(columns.len());
    for (column, cell) in columns.iter().zip(cells) {
        let value = decode_cell(column, cell.get("v").unwrap_or(&serde_json::Value::Null))?;
        field_values.push(FieldValue {
            name: column.name.clone(),
            value,
            data_type: column.data_type,
        });
    }
    Ok(RowData::new(field_values))
}

fn decode_cell(column: &ColumnDef, raw: &serde_json::Value) -> Result<Value, WarehouseError> {
    let text = match raw {
        serde_json::Value::Null => return Ok(Value::Null),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let value = match column.data_type {
        // timestamps arrive as epoch seconds with a fractional part,
        // e.g. "1.6945632E9"
        DataType::Timestamp => {
            let seconds = text.parse::<f64>().map_err(|_| payload(column, &text))?;
            let micros = (seconds * 1_000_000.0) as i64;
            DateTime::from_timestamp_micros(micros)
                .map(Value::Timestamp)
                .ok_or_else(|| payload(column, &text))?
        }
        DataType::Date => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| payload(column, &text))?,
        DataType::Time => NaiveTime::parse_from_str(&text, "%H:%M:%S%.f")
            .map(Value::Time)
            .map_err(|_| payload(column, &text))?,
        _ => column.data_type.coerce(Value::String(text)),
    };
    Ok(value)
}

fn payload(column: &ColumnDef, text: &str) -> WarehouseError {
    WarehouseError::Payload(format!(
        "cell '{text}' cannot be decoded as {:?} for column '{}'",
        column.data_type, column.name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", DataType::BigInt),
            ColumnDef::new("active", DataType::Boolean),
            ColumnDef::new("name", DataType::String),
            ColumnDef::new("source_timestamp", DataType::BigInt),
        ]
    }

    #[test]
    fn test_decode_row_by_declared_types() {
        let row = json!({"f": [
            {"v": "42"},
            {"v": "true"},
            {"v": "alice"},
            {"v": "12500"}
        ]});

        let decoded = decode_row(&columns(), &row).unwrap();
        assert_eq!(decoded.get_value("id"), Value::Int(42));
        assert_eq!(decoded.get_value("active"), Value::Boolean(true));
        assert_eq!(decoded.get_value("name"), Value::String("alice".into()));
        assert_eq!(decoded.get_value("source_timestamp"), Value::Int(12500));
    }

    #[test]
    fn test_decode_null_cells() {
        let row = json!({"f": [{"v": null}, {"v": null}, {}, {"v": "1"}]});
        let decoded = decode_row(&columns(), &row).unwrap();
        assert_eq!(decoded.get_value("id"), Value::Null);
        assert_eq!(decoded.get_value("name"), Value::Null);
    }

    #[test]
    fn test_decode_timestamp_from_epoch_seconds() {
        let cols = vec![ColumnDef::new("at", DataType::Timestamp)];
        let row = json!({"f": [{"v": "1.6945632E9"}]});

        let decoded = decode_row(&cols, &row).unwrap();
        match decoded.get_value("at") {
            Value::Timestamp(ts) => assert_eq!(ts.timestamp(), 1_694_563_200),
            other => panic!("expected timestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_cell_count_mismatch() {
        let row = json!({"f": [{"v": "42"}]});
        assert!(decode_row(&columns(), &row).is_err());
    }
}
