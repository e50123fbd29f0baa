//! Cycle orchestration: gate, table enumeration and per-table dispatch.

use crate::{
    cycle::CycleGate,
    error::SyncError,
    report::{CycleOutcome, TableReport},
    table,
};
use futures::{StreamExt, stream};
use sinks::sink::Sink;
use std::{collections::HashSet, sync::Arc};
use tracing::{error, info, warn};
use warehouse::api::Warehouse;

/// Rows per fetch page, bounding memory per round-trip.
pub const DEFAULT_PAGE_SIZE: usize = 10_000;

/// What happens when one table's sync step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failed table and continue with the rest of the cycle.
    Contain,
    /// Propagate the first per-table failure to the caller.
    Abort,
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub dataset: String,
    /// Sync only this table instead of the full dataset listing.
    pub table: Option<String>,
    /// Worker-pool size for per-table tasks; 1 means sequential.
    pub concurrency: usize,
    pub page_size: usize,
    /// Fetch a bounded random sample instead of the incremental delta.
    pub sample: bool,
    pub failure_policy: FailurePolicy,
}

impl SyncOptions {
    pub fn new(dataset: &str) -> Self {
        SyncOptions {
            dataset: dataset.to_string(),
            table: None,
            concurrency: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sample: false,
            failure_policy: FailurePolicy::Contain,
        }
    }
}

pub struct SyncOrchestrator {
    warehouse: Arc<dyn Warehouse>,
    sink: Arc<dyn Sink>,
    project: String,
    options: SyncOptions,
    gate: CycleGate,
}

impl SyncOrchestrator {
    pub fn new(
        warehouse: Arc<dyn Warehouse>,
        sink: Arc<dyn Sink>,
        project: &str,
        options: SyncOptions,
    ) -> Self {
        SyncOrchestrator {
            warehouse,
            sink,
            project: project.to_string(),
            options,
            gate: CycleGate::new(),
        }
    }

    /// The gate serializing cycles, for trigger-side introspection.
    pub fn gate(&self) -> &CycleGate {
        &self.gate
    }

    /// Run one sync cycle over the target tables.
    ///
    /// If a cycle is already in flight the trigger is dropped, with no remote
    /// calls made. The gate clears on every exit path, including failure.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, SyncError> {
        let Some(_guard) = self.gate.try_begin() else {
            warn!("Another sync cycle is already running. Skipping this cycle.");
            return Ok(CycleOutcome::Skipped);
        };

        info!(dataset = %self.options.dataset, "Starting data sync");
        let tables = self.target_tables().await?;
        let total = tables.len();

        let concurrency = self.options.concurrency.max(1);
        let mut results = stream::iter(tables.into_iter().enumerate().map(|(idx, table)| {
            let this = &*self;
            async move {
                let result = this.sync_one(idx + 1, total, &table).await;
                (table, result)
            }
        }))
        .buffer_unordered(concurrency);

        let mut reports: Vec<TableReport> = Vec::with_capacity(total);
        let mut failed = Vec::new();
        while let Some((table, result)) = results.next().await {
            match result {
                Ok(report) => reports.push(report),
                Err(err) => match self.options.failure_policy {
                    FailurePolicy::Contain => {
                        error!(table = %table, error = %err, "Table sync failed; continuing with remaining tables");
                        failed.push(table);
                    }
                    FailurePolicy::Abort => {
                        return Err(SyncError::Table {
                            table,
                            source: Box::new(err),
                        });
                    }
                },
            }
        }

        info!(
            tables = reports.len(),
            failed = failed.len(),
            "Data sync completed"
        );
        Ok(CycleOutcome::Completed { reports, failed })
    }

    async fn sync_one(&self, index: usize, total: usize, table: &str) -> Result<TableReport, SyncError> {
        table::sync_table(
            self.warehouse.as_ref(),
            self.sink.as_ref(),
            &self.project,
            &self.options,
            table,
            index,
            total,
        )
        .await
    }

    /// Target tables for one cycle: the explicit override or the full dataset
    /// listing, with duplicate identifiers removed so no two tasks of a cycle
    /// ever share a destination.
    async fn target_tables(&self) -> Result<Vec<String>, SyncError> {
        let mut tables = match &self.options.table {
            Some(table) => vec![table.clone()],
            None => self.warehouse.list_tables(&self.options.dataset).await?,
        };
        let mut seen = HashSet::new();
        tables.retain(|table| seen.insert(table.clone()));
        Ok(tables)
    }
}
