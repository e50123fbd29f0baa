use crate::core::data_type::{DataType, RemoteType};

/// One column descriptor from a remote table schema, as fetched per cycle.
///
/// Immutable snapshot; the remote schema may drift between cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub remote_type: RemoteType,
    /// Sub-fields; non-empty only for `Record` columns.
    pub fields: Vec<FieldDescriptor>,
}

impl FieldDescriptor {
    pub fn new(name: &str, remote_type: RemoteType) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            remote_type,
            fields: Vec::new(),
        }
    }

    pub fn record(name: &str, fields: Vec<FieldDescriptor>) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            remote_type: RemoteType::Record,
            fields,
        }
    }
}

/// One translated destination column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDef {
    pub fn new(name: &str, data_type: DataType) -> Self {
        ColumnDef {
            name: name.to_string(),
            data_type,
        }
    }
}
