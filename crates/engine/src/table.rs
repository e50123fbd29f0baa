//! The per-table sync step: translate schema, ensure the destination, bound
//! the fetch by the current watermark and write pages in arrival order.

use crate::{error::SyncError, orchestrator::SyncOptions, report::TableReport};
use model::schema::translate;
use sinks::sink::Sink;
use tracing::info;
use warehouse::{
    api::{TableRef, Warehouse},
    query::{FetchMode, fetch_query},
};

pub(crate) async fn sync_table(
    warehouse: &dyn Warehouse,
    sink: &dyn Sink,
    project: &str,
    options: &SyncOptions,
    table: &str,
    index: usize,
    total: usize,
) -> Result<TableReport, SyncError> {
    info!(table, index, total, "Starting table sync");

    let table_ref = TableRef::new(&options.dataset, table);
    let fields = warehouse.table_schema(&table_ref).await?;
    let columns = translate::translate(&fields).map_err(|source| SyncError::Translate {
        table: table.to_string(),
        source,
    })?;
    let projection = translate::projection(&fields).map_err(|source| SyncError::Translate {
        table: table.to_string(),
        source,
    })?;

    sink.ensure_destination(table, &columns).await?;

    let mode = if options.sample {
        FetchMode::Sample
    } else {
        let watermark = sink.current_watermark(table).await?;
        FetchMode::Incremental { watermark }
    };

    let sql = fetch_query(&table_ref.qualified(project), &projection, mode);
    let mut pages = warehouse.query(&sql, &columns, options.page_size).await?;

    let mut rows_written = 0;
    let mut page_count = 0;
    while let Some(page) = pages.next_page().await? {
        page_count += 1;
        if page.is_empty() {
            info!(table, index, total, page = page.number, "No new rows");
            continue;
        }
        let written = sink.write_page(table, &columns, &page).await?;
        rows_written += written;
        info!(table, index, total, page = page.number, rows = written, "Synced page");
    }

    let watermark = if options.sample {
        0
    } else {
        sink.current_watermark(table).await?
    };

    info!(table, index, total, rows = rows_written, watermark, "Table sync completed");
    Ok(TableReport {
        table: table.to_string(),
        pages: page_count,
        rows_written,
        watermark,
    })
}
