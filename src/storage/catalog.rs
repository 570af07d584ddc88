//! Type catalog - which tables already exist
//!
//! Schema creation is idempotent at the SQL level (`IF NOT EXISTS`), but a
//! type whose whole table set has been committed once in this session is
//! skipped entirely on later writes. The set is only extended after the
//! creating transaction commits, so a rolled-back synthesis is retried.

use super::schema;
use crate::Result;
use rusqlite::Connection;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct TypeCatalog {
    synthesized: HashSet<String>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the type and everything it depends on was created in this session
    pub fn is_synthesized(&self, type_name: &str) -> bool {
        self.synthesized.contains(type_name)
    }

    /// Record types whose tables were created by a committed transaction
    pub fn remember<I>(&mut self, type_names: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.synthesized.extend(type_names);
    }

    /// Snapshot of the synthesized set, for a synthesizer to consult
    pub fn synthesized(&self) -> &HashSet<String> {
        &self.synthesized
    }

    pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
        let exists: bool = conn.query_row(schema::TABLE_EXISTS, [table], |row| row.get(0))?;
        Ok(exists)
    }

    /// Whether the table declares a UNIQUE constraint; for a keyless type
    /// that means its rows are content-addressed
    pub fn has_unique_constraint(conn: &Connection, table: &str) -> Result<bool> {
        let unique: bool = conn.query_row(schema::HAS_UNIQUE_CONSTRAINT, [table], |row| row.get(0))?;
        Ok(unique)
    }

    /// Names of all tables in the database, sorted
    pub fn tables(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(schema::LIST_TABLES)?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    pub fn table_count(conn: &Connection) -> Result<usize> {
        let count: i64 = conn.query_row(schema::COUNT_TABLES, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Number of rows in a table; the name must come from the catalog or a descriptor
    pub fn row_count(conn: &Connection, table: &str) -> Result<usize> {
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
