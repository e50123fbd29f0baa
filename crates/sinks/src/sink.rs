use crate::error::SinkError;
use async_trait::async_trait;
use model::{records::page::Page, schema::field::ColumnDef};

/// The local persistent representation of a remote table.
///
/// Destinations are created lazily on first sync and are append-only
/// thereafter.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Create the destination for `table` if it does not exist yet.
    async fn ensure_destination(
        &self,
        table: &str,
        schema: &[ColumnDef],
    ) -> Result<(), SinkError>;

    /// Maximum watermark value already persisted for `table`.
    ///
    /// Returns the sentinel 0 when the destination does not exist, holds no
    /// rows, or has no watermark column; "no data yet" is never an error.
    async fn current_watermark(&self, table: &str) -> Result<i64, SinkError>;

    /// Append one page of rows, returning the number of rows written.
    ///
    /// An empty page is a no-op, not an error. Pages of one table must be
    /// written in the order they were received.
    async fn write_page(
        &self,
        table: &str,
        schema: &[ColumnDef],
        page: &Page,
    ) -> Result<usize, SinkError>;
}
