/// Result of syncing one table within a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    /// Pages consumed, including empty ones.
    pub pages: usize,
    pub rows_written: usize,
    /// Watermark persisted after the table's sync step (0 for sample runs).
    pub watermark: i64,
}

/// Outcome of one orchestrated sync cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Completed {
        reports: Vec<TableReport>,
        /// Tables whose failure was contained within the cycle.
        failed: Vec<String>,
    },
    /// Another cycle was already running; nothing was done.
    Skipped,
}
