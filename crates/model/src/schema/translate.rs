//! Translation of a remote table schema into a local destination schema.
//!
//! Translation is deterministic and pure: the same remote schema always
//! produces the same destination schema and the same fetch projection.

use crate::core::data_type::{DataType, RemoteType};
use crate::schema::field::{ColumnDef, FieldDescriptor};
use thiserror::Error;

/// Name of the nested metadata container carried by replicated tables.
pub const METADATA_CONTAINER: &str = "datastream_metadata";

/// Sub-field of the metadata container holding the sync watermark.
pub const WATERMARK_COLUMN: &str = "source_timestamp";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Metadata container '{0}' is missing the '{WATERMARK_COLUMN}' sub-field")]
    MalformedMetadata(String),

    #[error("Unsupported column '{name}': {reason}")]
    UnsupportedColumn { name: String, reason: String },
}

/// Map remote field descriptors to destination columns.
///
/// The metadata container flattens to exactly one column named after its
/// watermark sub-field, typed as a 64-bit integer; every other field maps
/// 1:1 by name through the exhaustive type mapping.
pub fn translate(fields: &[FieldDescriptor]) -> Result<Vec<ColumnDef>, TranslateError> {
    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        if is_metadata_container(field) {
            let watermark = watermark_subfield(field)?;
            columns.push(ColumnDef::new(&watermark.name, DataType::BigInt));
        } else {
            let data_type = field.remote_type.destination_type().map_err(|reason| {
                TranslateError::UnsupportedColumn {
                    name: field.name.clone(),
                    reason,
                }
            })?;
            columns.push(ColumnDef::new(&field.name, data_type));
        }
    }
    Ok(columns)
}

/// Build the projection list for the fetch query.
///
/// The metadata container reference is replaced, in place, by a single
/// projection of its watermark sub-field aliased to the flattened name, so
/// the projection order always matches the translated schema order.
pub fn projection(fields: &[FieldDescriptor]) -> Result<Vec<String>, TranslateError> {
    let mut projected = Vec::with_capacity(fields.len());
    for field in fields {
        if is_metadata_container(field) {
            let watermark = watermark_subfield(field)?;
            projected.push(format!(
                "{}.{} AS {}",
                field.name, watermark.name, watermark.name
            ));
        } else {
            projected.push(field.name.clone());
        }
    }
    Ok(projected)
}

fn is_metadata_container(field: &FieldDescriptor) -> bool {
    field.remote_type == RemoteType::Record && field.name == METADATA_CONTAINER
}

fn watermark_subfield(field: &FieldDescriptor) -> Result<&FieldDescriptor, TranslateError> {
    field
        .fields
        .iter()
        .find(|sub| sub.name == WATERMARK_COLUMN)
        .ok_or_else(|| TranslateError::MalformedMetadata(field.name.clone()))
}
