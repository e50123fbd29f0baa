use model::schema::translate::TranslateError;
use sinks::error::SinkError;
use thiserror::Error;
use warehouse::error::WarehouseError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Schema translation failed for table '{table}': {source}")]
    Translate {
        table: String,
        #[source]
        source: TranslateError,
    },

    #[error("Sync of table '{table}' failed: {source}")]
    Table {
        table: String,
        #[source]
        source: Box<SyncError>,
    },
}
