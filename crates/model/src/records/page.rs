use crate::records::row::RowData;

/// One bounded batch of rows returned by a single remote query round-trip.
///
/// Transient: a page exists only while one table's sync step consumes it.
/// A page with zero rows is a valid intermediate or terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based position of this page within the query result.
    pub number: usize,
    pub rows: Vec<RowData>,
}

impl Page {
    pub fn new(number: usize, rows: Vec<RowData>) -> Self {
        Page { number, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
