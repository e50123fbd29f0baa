use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Table engine error: {0}")]
    Engine(#[from] duckdb::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Columnar file error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to cast column '{column}' to the existing type in '{path}': {source}")]
    Cast {
        path: String,
        column: String,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("Unexpected sink state: {0}")]
    Unexpected(String),
}
