use crate::error::WarehouseError;
use async_trait::async_trait;
use model::{records::page::Page, schema::field::{ColumnDef, FieldDescriptor}};

/// A dataset-qualified table reference in the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(dataset: &str, table: &str) -> Self {
        TableRef {
            dataset: dataset.to_string(),
            table: table.to_string(),
        }
    }

    /// Fully qualified name as used in query text.
    pub fn qualified(&self, project: &str) -> String {
        format!("{}.{}.{}", project, self.dataset, self.table)
    }
}

/// A lazily produced, finite, non-restartable sequence of result pages.
#[async_trait]
pub trait RowPages: Send {
    /// Next page of the result set, `None` once exhausted.
    ///
    /// A page with zero rows is a valid intermediate or terminal state and
    /// must not be treated as an error.
    async fn next_page(&mut self) -> Result<Option<Page>, WarehouseError>;
}

/// The remote source boundary: table listing, schema fetch and query
/// execution with bounded-size result pages.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Enumerate the tables of one dataset.
    async fn list_tables(&self, dataset: &str) -> Result<Vec<String>, WarehouseError>;

    /// Fetch the column schema of one table.
    async fn table_schema(
        &self,
        table: &TableRef,
    ) -> Result<Vec<FieldDescriptor>, WarehouseError>;

    /// Execute `sql`, decoding result rows against `columns` and consuming
    /// them in pages of at most `page_size` rows.
    async fn query(
        &self,
        sql: &str,
        columns: &[ColumnDef],
        page_size: usize,
    ) -> Result<Box<dyn RowPages>, WarehouseError>;
}
