//! # Recordstore - Reflection-driven relational persistence
//!
//! Persists instances of reflectively described record types into SQLite
//! without per-type schema or marshaling code.
//!
//! Recordstore provides:
//! - Type descriptors (`TypeDescriptor`) describing fields, kinds, cardinality and keys
//! - Dynamic records (`Record`, `Value`) checked against their descriptor
//! - Schema synthesis: main tables, side tables for repeated/map fields,
//!   uniqueness constraints, foreign keys and cascade triggers
//! - Insert / upsert of nested record graphs, key and content lookups,
//!   full-graph reads and key-based deletion

pub mod descriptor;
pub mod record;
pub mod json;
pub mod registry;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use descriptor::{Cardinality, FieldDescriptor, FieldKind, TypeDescriptor};
pub use record::{Record, Value};
pub use registry::{DescriptorProvider, DescriptorRegistry};
pub use storage::{RecordStore, RowId, SideTableCascade, StoreOptions};

/// Result type alias for Recordstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Recordstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Missing key: {0}")]
    MissingKey(String),

    #[error("Field '{field}' is not a key of {type_name}")]
    NotAKey { type_name: String, field: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Cyclic type graph: {0}")]
    Cycle(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Row {id} not found in table {table}")]
    RowNotFound { table: String, id: i64 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::Conflict(message.unwrap_or_else(|| code.to_string()))
            }
            other => Error::Storage(other),
        }
    }
}

impl Error {
    /// Whether this error came from a uniqueness/key constraint
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}
