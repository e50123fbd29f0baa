//! Rendering of the per-table fetch query.

use model::schema::translate::{METADATA_CONTAINER, WATERMARK_COLUMN};

/// Upper bound on rows returned by a sampling query.
pub const SAMPLE_LIMIT: usize = 1000;

/// How a table fetch selects rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Rows whose watermark strictly exceeds the bound.
    Incremental { watermark: i64 },
    /// A bounded random sample, ignoring the watermark entirely. For ad-hoc
    /// exports, not unattended sync.
    Sample,
}

/// Render the fetch query for one fully qualified table.
pub fn fetch_query(qualified_table: &str, projection: &[String], mode: FetchMode) -> String {
    let columns = projection.join(", ");
    match mode {
        FetchMode::Incremental { watermark } => format!(
            "SELECT {columns} FROM `{qualified_table}` \
             WHERE {METADATA_CONTAINER}.{WATERMARK_COLUMN} > {watermark}"
        ),
        FetchMode::Sample => {
            format!("SELECT {columns} FROM `{qualified_table}` ORDER BY RAND() LIMIT {SAMPLE_LIMIT}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_projection() -> Vec<String> {
        vec![
            "id".to_string(),
            "datastream_metadata.source_timestamp AS source_timestamp".to_string(),
        ]
    }

    #[test]
    fn test_incremental_query_bounds_on_the_watermark() {
        let sql = fetch_query(
            "lens-public-data.v2_polygon.orders",
            &orders_projection(),
            FetchMode::Incremental { watermark: 12500 },
        );

        assert_eq!(
            sql,
            "SELECT id, datastream_metadata.source_timestamp AS source_timestamp \
             FROM `lens-public-data.v2_polygon.orders` \
             WHERE datastream_metadata.source_timestamp > 12500"
        );
    }

    #[test]
    fn test_sample_query_ignores_the_watermark() {
        let sql = fetch_query(
            "lens-public-data.v2_polygon.orders",
            &orders_projection(),
            FetchMode::Sample,
        );

        assert_eq!(
            sql,
            "SELECT id, datastream_metadata.source_timestamp AS source_timestamp \
             FROM `lens-public-data.v2_polygon.orders` ORDER BY RAND() LIMIT 1000"
        );
    }
}
