//! Embedded table-engine sink.
//!
//! The engine is opened once per process and shared by all per-table
//! operations; statement execution is serialized through a single connection
//! behind an async mutex.

use crate::{error::SinkError, sink::Sink};
use async_trait::async_trait;
use chrono::{Datelike, Timelike};
use duckdb::{Connection, ToSql, types::ToSqlOutput};
use model::{
    core::value::Value,
    records::page::Page,
    schema::field::ColumnDef,
    schema::translate::WATERMARK_COLUMN,
};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

/// Days between 0001-01-01 (CE) and the Unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub struct DuckDbSink {
    conn: Mutex<Connection>,
}

impl DuckDbSink {
    /// Open (or create) the database file backing all destinations.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        Ok(DuckDbSink {
            conn: Mutex::new(Connection::open(path)?),
        })
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        Ok(DuckDbSink {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }
}

#[async_trait]
impl Sink for DuckDbSink {
    async fn ensure_destination(
        &self,
        table: &str,
        schema: &[ColumnDef],
    ) -> Result<(), SinkError> {
        let conn = self.conn.lock().await;
        if !destination_exists(&conn, table)? {
            debug!(table, "Creating destination table");
            conn.execute_batch(&create_table_ddl(table, schema, false))?;
        }
        Ok(())
    }

    async fn current_watermark(&self, table: &str) -> Result<i64, SinkError> {
        let conn = self.conn.lock().await;
        if !destination_exists(&conn, table)? {
            return Ok(0);
        }
        let max: Option<i64> = conn.query_row(
            &format!(
                "SELECT MAX({WATERMARK_COLUMN}) FROM {}",
                quote_ident(table)
            ),
            [],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }

    async fn write_page(
        &self,
        table: &str,
        schema: &[ColumnDef],
        page: &Page,
    ) -> Result<usize, SinkError> {
        if page.is_empty() {
            return Ok(0);
        }

        let conn = self.conn.lock().await;
        let stage = format!("lakesync_stage_{table}");

        // materialize the page as a transient staging relation, then move it
        // into the destination with a single INSERT .. SELECT
        conn.execute_batch(&create_table_ddl(&stage, schema, true))?;
        {
            let mut appender = conn.appender(&stage)?;
            for row in &page.rows {
                let cells: Vec<SqlCell> = schema
                    .iter()
                    .map(|col| SqlCell::from_value(col.data_type.coerce(row.get_value(&col.name))))
                    .collect();
                appender.append_row(duckdb::appender_params_from_iter(cells))?;
            }
            appender.flush()?;
        }
        conn.execute_batch(&format!(
            "INSERT INTO {dest} SELECT * FROM {stage}; DROP TABLE {stage};",
            dest = quote_ident(table),
            stage = quote_ident(&stage),
        ))?;

        Ok(page.row_count())
    }
}

fn destination_exists(conn: &Connection, table: &str) -> Result<bool, SinkError> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM information_schema.tables WHERE table_name = ?",
        duckdb::params![table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn create_table_ddl(table: &str, schema: &[ColumnDef], or_replace: bool) -> String {
    let columns = schema
        .iter()
        .map(|col| format!("{} {}", quote_ident(&col.name), col.data_type.engine_name()))
        .collect::<Vec<_>>()
        .join(", ");
    let create = if or_replace {
        "CREATE OR REPLACE TABLE"
    } else {
        "CREATE TABLE"
    };
    format!("{create} {} ({columns});", quote_ident(table))
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// A page cell bound as a statement or appender parameter.
struct SqlCell(duckdb::types::Value);

impl SqlCell {
    fn from_value(value: Value) -> Self {
        use duckdb::types::{TimeUnit, Value as SqlValue};
        let cell = match value {
            Value::Int(v) => SqlValue::BigInt(v),
            Value::Float(v) => SqlValue::Double(v),
            Value::String(v) => SqlValue::Text(v),
            Value::Boolean(v) => SqlValue::Boolean(v),
            Value::Timestamp(v) => {
                SqlValue::Timestamp(TimeUnit::Microsecond, v.timestamp_micros())
            }
            Value::Date(v) => SqlValue::Date32(v.num_days_from_ce() - EPOCH_DAYS_FROM_CE),
            Value::Time(v) => SqlValue::Time64(
                TimeUnit::Microsecond,
                i64::from(v.num_seconds_from_midnight()) * 1_000_000
                    + i64::from(v.nanosecond() / 1_000),
            ),
            Value::Null => SqlValue::Null,
        };
        SqlCell(cell)
    }
}

impl ToSql for SqlCell {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(self.0.clone()))
    }
}
