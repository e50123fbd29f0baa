use engine::error::SyncError;
use sinks::error::SinkError;
use thiserror::Error;
use warehouse::error::WarehouseError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
