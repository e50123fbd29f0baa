//! Columnar file sink: one parquet file per table.
//!
//! The format has no in-place append primitive, so every page write is a
//! whole-file read-modify-rewrite: read the existing file, cast the new rows
//! to the file's concrete column types, concatenate old-then-new and rewrite.

use crate::{error::SinkError, sink::Sink};
use arrow::{
    array::{
        ArrayRef, BooleanBuilder, Date32Builder, Float64Builder, Int64Array, Int64Builder,
        StringBuilder, Time64MicrosecondBuilder, TimestampMicrosecondBuilder, new_null_array,
    },
    compute,
    datatypes::{DataType as ArrowType, Field, Schema, SchemaRef, TimeUnit},
    record_batch::RecordBatch,
};
use async_trait::async_trait;
use chrono::{Datelike, Timelike};
use model::{
    core::{data_type::DataType, value::Value},
    records::page::Page,
    schema::field::ColumnDef,
    schema::translate::WATERMARK_COLUMN,
};
use parquet::arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, arrow_writer::ArrowWriter};
use std::{
    collections::HashMap,
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Days between 0001-01-01 (CE) and the Unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub struct ParquetSink {
    output_dir: PathBuf,
    /// File name suffix. Sampling output lands in a distinct artifact so an
    /// ad-hoc export can never corrupt an incremental destination.
    suffix: &'static str,
    /// One write lock per destination; read-modify-rewrite must never run
    /// concurrently against the same file.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ParquetSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        ParquetSink {
            output_dir: output_dir.into(),
            suffix: "parquet",
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// A sink for sampling exports, writing `<table>.sample.parquet`.
    pub fn sampling(output_dir: impl Into<PathBuf>) -> Self {
        ParquetSink {
            suffix: "sample.parquet",
            ..ParquetSink::new(output_dir)
        }
    }

    pub fn path_for(&self, table: &str) -> PathBuf {
        self.output_dir.join(format!("{table}.{}", self.suffix))
    }

    async fn write_lock(&self, table: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(table.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl Sink for ParquetSink {
    async fn ensure_destination(
        &self,
        _table: &str,
        _schema: &[ColumnDef],
    ) -> Result<(), SinkError> {
        // files themselves are created lazily on the first page write
        std::fs::create_dir_all(&self.output_dir).map_err(|err| io_err(&self.output_dir, err))
    }

    async fn current_watermark(&self, table: &str) -> Result<i64, SinkError> {
        let path = self.path_for(table);
        if !path.exists() {
            return Ok(0);
        }

        let (schema, batches) = read_file(&path)?;
        let Ok(column) = schema.index_of(WATERMARK_COLUMN) else {
            return Ok(0);
        };

        let mut max = 0_i64;
        for batch in &batches {
            let casted = compute::cast(batch.column(column), &ArrowType::Int64)?;
            let ints = casted
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| {
                    SinkError::Unexpected("watermark column did not cast to Int64".to_string())
                })?;
            if let Some(batch_max) = compute::max(ints) {
                max = max.max(batch_max);
            }
        }
        Ok(max)
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

        let lock = self.write_lock(table).await;
        let _guard = lock.lock().await;

        std::fs::create_dir_all(&self.output_dir).map_err(|err| io_err(&self.output_dir, err))?;
        let path = self.path_for(table);
        let batch = page_to_batch(schema, page)?;

        let (file_schema, batches) = if path.exists() {
            let (existing_schema, mut existing) = read_file(&path)?;
            let aligned = align_to_existing(&path, &existing_schema, &batch)?;
            existing.push(aligned);
            (existing_schema, existing)
        } else {
            (batch.schema(), vec![batch])
        };

        let combined = compute::concat_batches(&file_schema, &batches)?;
        write_file(&path, file_schema, &combined)?;

        debug!(
            table,
            page = page.number,
            rows = page.row_count(),
            path = %path.display(),
            "Rewrote destination file"
        );
        Ok(page.row_count())
    }
}

fn page_to_batch(schema: &[ColumnDef], page: &Page) -> Result<RecordBatch, SinkError> {
    let mut fields = Vec::with_capacity(schema.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.len());
    for col in schema {
        arrays.push(column_array(col, page));
        fields.push(Field::new(
            col.name.clone(),
            arrow_type(col.data_type),
            true,
        ));
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

fn column_array(col: &ColumnDef, page: &Page) -> ArrayRef {
    let values = page
        .rows
        .iter()
        .map(|row| col.data_type.coerce(row.get_value(&col.name)));

    match col.data_type {
        DataType::BigInt => {
            let mut builder = Int64Builder::with_capacity(page.row_count());
            for value in values {
                builder.append_option(value.as_i64());
            }
            Arc::new(builder.finish())
        }
        DataType::Double => {
            let mut builder = Float64Builder::with_capacity(page.row_count());
            for value in values {
                builder.append_option(value.as_f64());
            }
            Arc::new(builder.finish())
        }
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(page.row_count());
            for value in values {
                builder.append_option(value.as_bool());
            }
            Arc::new(builder.finish())
        }
        DataType::Timestamp => {
            let mut builder = TimestampMicrosecondBuilder::with_capacity(page.row_count());
            for value in values {
                builder.append_option(match value {
                    Value::Timestamp(ts) => Some(ts.timestamp_micros()),
                    _ => None,
                });
            }
            Arc::new(builder.finish())
        }
        DataType::Date => {
            let mut builder = Date32Builder::with_capacity(page.row_count());
            for value in values {
                builder.append_option(match value {
                    Value::Date(date) => Some(date.num_days_from_ce() - EPOCH_DAYS_FROM_CE),
                    _ => None,
                });
            }
            Arc::new(builder.finish())
        }
        DataType::Time => {
            let mut builder = Time64MicrosecondBuilder::with_capacity(page.row_count());
            for value in values {
                builder.append_option(match value {
                    Value::Time(time) => Some(
                        i64::from(time.num_seconds_from_midnight()) * 1_000_000
                            + i64::from(time.nanosecond() / 1_000),
                    ),
                    _ => None,
                });
            }
            Arc::new(builder.finish())
        }
        DataType::String => {
            let mut builder = StringBuilder::new();
            for value in values {
                builder.append_option(value.as_string());
            }
            Arc::new(builder.finish())
        }
    }
}

fn arrow_type(data_type: DataType) -> ArrowType {
    match data_type {
        DataType::BigInt => ArrowType::Int64,
        DataType::Double => ArrowType::Float64,
        DataType::Boolean => ArrowType::Boolean,
        DataType::Timestamp => ArrowType::Timestamp(TimeUnit::Microsecond, None),
        DataType::Date => ArrowType::Date32,
        DataType::Time => ArrowType::Time64(TimeUnit::Microsecond),
        DataType::String => ArrowType::Utf8,
    }
}

/// Cast the new batch to the pre-existing file schema, column by column, so
/// appending never widens established types. Columns absent from the new
/// rows are null-filled; columns unknown to the existing file are dropped.
fn align_to_existing(
    path: &Path,
    existing: &SchemaRef,
    batch: &RecordBatch,
) -> Result<RecordBatch, SinkError> {
    let mut arrays = Vec::with_capacity(existing.fields().len());
    for field in existing.fields() {
        let array = match batch.schema().index_of(field.name()) {
            Ok(idx) => compute::cast(batch.column(idx), field.data_type()).map_err(|source| {
                SinkError::Cast {
                    path: path.display().to_string(),
                    column: field.name().clone(),
                    source,
                }
            })?,
            Err(_) => {
                warn!(
                    column = %field.name(),
                    path = %path.display(),
                    "Column absent from new rows; filling with nulls"
                );
                new_null_array(field.data_type(), batch.num_rows())
            }
        };
        arrays.push(array);
    }
    for field in batch.schema().fields() {
        if existing.index_of(field.name()).is_err() {
            warn!(
                column = %field.name(),
                path = %path.display(),
                "Column not present in existing file; dropped"
            );
        }
    }
    Ok(RecordBatch::try_new(existing.clone(), arrays)?)
}

fn read_file(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>), SinkError> {
    let file = File::open(path).map_err(|err| io_err(path, err))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let batches = builder.build()?.collect::<Result<Vec<_>, _>>()?;
    Ok((schema, batches))
}

fn write_file(path: &Path, schema: SchemaRef, batch: &RecordBatch) -> Result<(), SinkError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("destination");
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    let file = File::create(&tmp).map_err(|err| io_err(&tmp, err))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(batch)?;
    writer.close()?;

    // the rewrite lands atomically; a crash mid-write leaves the previous
    // fully-written file in place
    std::fs::rename(&tmp, path).map_err(|err| io_err(path, err))
}

fn io_err(path: &Path, source: std::io::Error) -> SinkError {
    SinkError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::records::row::{FieldValue, RowData};

    fn orders_schema() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", DataType::BigInt),
            ColumnDef::new("paid", DataType::Boolean),
            ColumnDef::new(WATERMARK_COLUMN, DataType::BigInt),
        ]
    }

    fn order_row(id: i64, paid: &str, watermark: i64) -> RowData {
        RowData::new(vec![
            FieldValue {
                name: "id".to_string(),
                value: Value::Int(id),
                data_type: DataType::BigInt,
            },
            FieldValue {
                name: "paid".to_string(),
                value: Value::String(paid.to_string()),
                data_type: DataType::Boolean,
            },
            FieldValue {
                name: WATERMARK_COLUMN.to_string(),
                value: Value::Int(watermark),
                data_type: DataType::BigInt,
            },
        ])
    }

    #[tokio::test]
    async fn test_missing_file_yields_zero_watermark() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ParquetSink::new(dir.path());
        assert_eq!(sink.current_watermark("orders").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_then_append_rewrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ParquetSink::new(dir.path());
        let schema = orders_schema();

        let first = Page::new(1, vec![order_row(1, "TRUE", 10)]);
        assert_eq!(sink.write_page("orders", &schema, &first).await.unwrap(), 1);

        let second = Page::new(2, vec![order_row(2, "false", 25)]);
        assert_eq!(
            sink.write_page("orders", &schema, &second).await.unwrap(),
            1
        );

        let (file_schema, batches) = read_file(&sink.path_for("orders")).unwrap();
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 2);
        assert_eq!(
            file_schema.field_with_name("paid").unwrap().data_type(),
            &ArrowType::Boolean
        );
        assert_eq!(sink.current_watermark("orders").await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_boolean_strings_are_coerced() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ParquetSink::new(dir.path());
        let schema = orders_schema();

        let page = Page::new(1, vec![order_row(1, "TRUE", 1), order_row(2, "false", 2)]);
        sink.write_page("orders", &schema, &page).await.unwrap();

        let (_, batches) = read_file(&sink.path_for("orders")).unwrap();
        let paid = batches[0]
            .column(1)
            .as_any()
            .downcast_ref::<arrow::array::BooleanArray>()
            .unwrap();
        assert!(paid.value(0));
        assert!(!paid.value(1));
    }

    #[tokio::test]
    async fn test_append_casts_to_existing_column_types() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ParquetSink::new(dir.path());

        let int_schema = vec![ColumnDef::new(WATERMARK_COLUMN, DataType::BigInt)];
        let mark = |v: i64| {
            RowData::new(vec![FieldValue {
                name: WATERMARK_COLUMN.to_string(),
                value: Value::Int(v),
                data_type: DataType::BigInt,
            }])
        };
        sink.write_page("orders", &int_schema, &Page::new(1, vec![mark(5)]))
            .await
            .unwrap();

        // drifted schema declares the column as Double; the file's Int64 wins
        let drifted = vec![ColumnDef::new(WATERMARK_COLUMN, DataType::Double)];
        let float_row = RowData::new(vec![FieldValue {
            name: WATERMARK_COLUMN.to_string(),
            value: Value::Float(9.0),
            data_type: DataType::Double,
        }]);
        sink.write_page("orders", &drifted, &Page::new(1, vec![float_row]))
            .await
            .unwrap();

        let (file_schema, _) = read_file(&sink.path_for("orders")).unwrap();
        assert_eq!(
            file_schema
                .field_with_name(WATERMARK_COLUMN)
                .unwrap()
                .data_type(),
            &ArrowType::Int64
        );
        assert_eq!(sink.current_watermark("orders").await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_empty_page_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ParquetSink::new(dir.path());

        let written = sink
            .write_page("orders", &orders_schema(), &Page::new(1, Vec::new()))
            .await
            .unwrap();
        assert_eq!(written, 0);
        assert!(!sink.path_for("orders").exists());
    }

    #[tokio::test]
    async fn test_watermark_without_column_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ParquetSink::new(dir.path());

        let schema = vec![ColumnDef::new("id", DataType::BigInt)];
        let row = RowData::new(vec![FieldValue {
            name: "id".to_string(),
            value: Value::Int(1),
            data_type: DataType::BigInt,
        }]);
        sink.write_page("plain", &schema, &Page::new(1, vec![row]))
            .await
            .unwrap();

        assert_eq!(sink.current_watermark("plain").await.unwrap(), 0);
    }

    #[test]
    fn test_sampling_sink_uses_a_distinct_artifact() {
        let sink = ParquetSink::sampling("/tmp/exports");
        assert!(
            sink.path_for("orders")
                .to_string_lossy()
                .ends_with("orders.sample.parquet")
        );
    }
}
