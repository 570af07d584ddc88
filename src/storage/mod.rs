//! Storage Layer - SQLite-backed record persistence
//!
//! For every record type the engine derives:
//! - a main table named after the type (`id` plus one column per singular field)
//! - one side table per repeated or map field (`field_table_<Type>_<field>`)
//! - UNIQUE constraints for key fields, foreign keys and cascade triggers
//!
//! `RecordStore` is the entry point; the components below it each borrow
//! the connection for the duration of one operation.

pub mod schema;
pub mod catalog;
pub mod synthesizer;
pub mod codec;
pub mod identity;
pub mod marshal;
pub mod unmarshal;
pub mod delete;
pub mod sqlite;

use serde::{Deserialize, Serialize};

pub use catalog::TypeCatalog;
pub use delete::DeletionCoordinator;
pub use identity::IdentityResolver;
pub use marshal::RecordMarshaler;
pub use sqlite::{RecordStore, StoreStats, TableStats};
pub use synthesizer::SchemaSynthesizer;
pub use unmarshal::{RecordUnmarshaler, Records};

/// Row identity assigned by SQLite
pub type RowId = i64;

/// What happens to an owner's side table rows when the owner row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideTableCascade {
    /// Side rows stay behind, orphaned
    #[default]
    Orphan,
    /// A trigger per side table deletes the owner's rows
    Delete,
}

/// Behavior switches for a `RecordStore`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub side_table_cascade: SideTableCascade,
}
