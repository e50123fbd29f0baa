use thiserror::Error;

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("Request to warehouse failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Warehouse returned an unexpected payload: {0}")]
    Payload(String),

    #[error("Query job '{job_id}' failed: {reason}")]
    Query { job_id: String, reason: String },

    #[error("Unknown column type '{type_name}' on table '{table}'")]
    UnknownType { table: String, type_name: String },

    #[error("Credentials file '{path}': {reason}")]
    Credentials { path: String, reason: String },
}
