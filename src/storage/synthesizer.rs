//! Schema synthesis - descriptors to DDL
//!
//! Every type reachable from a root descriptor gets a main table; every
//! repeated or map field gets a side table. Key fields get one UNIQUE
//! constraint each. A type without keys that is nested under a key field
//! is content-addressed: one UNIQUE constraint spans all of its singular
//! columns. Singular nested fields become foreign keys with an
//! `AFTER DELETE` trigger that removes the referenced row.

use super::catalog::TypeCatalog;
use super::schema::{self, TableDefinition};
use super::{SideTableCascade, StoreOptions};
use crate::descriptor::{Cardinality, FieldDescriptor, FieldKind, TypeDescriptor};
use crate::{Error, Result};
use rusqlite::Connection;
use std::collections::HashSet;

pub struct SchemaSynthesizer<'a> {
    conn: &'a Connection,
    known: &'a HashSet<String>,
    cascade: SideTableCascade,
    /// Types currently being synthesized, outermost first
    in_progress: Vec<String>,
    /// Types completed by this synthesizer, in creation order
    created: Vec<String>,
}

impl<'a> SchemaSynthesizer<'a> {
    pub fn new(conn: &'a Connection, catalog: &'a TypeCatalog, options: &StoreOptions) -> Self {
        Self {
            conn,
            known: catalog.synthesized(),
            cascade: options.side_table_cascade,
            in_progress: Vec::new(),
            created: Vec::new(),
        }
    }

    /// Create the type's table and, first, every table it depends on
    pub fn ensure(&mut self, descriptor: &TypeDescriptor, requires_identity: bool) -> Result<()> {
        let name = descriptor.name();
        if self.known.contains(name) || self.created.iter().any(|n| n == name) {
            return Ok(());
        }
        if self.in_progress.iter().any(|n| n == name) {
            let mut path = self.in_progress.clone();
            path.push(name.to_string());
            return Err(Error::Cycle(path.join(" -> ")));
        }

        self.in_progress.push(name.to_string());
        let result = self.create_tables(descriptor, requires_identity);
        self.in_progress.pop();
        result?;

        self.created.push(name.to_string());
        Ok(())
    }

    /// Types created by this synthesizer, for the catalog once committed
    pub fn into_created(self) -> Vec<String> {
        self.created
    }

    fn create_tables(&mut self, descriptor: &TypeDescriptor, requires_identity: bool) -> Result<()> {
        tracing::debug!("Synthesizing schema for {}", descriptor.name());

        let mut table = TableDefinition::new(descriptor.name());
        let mut singular_columns = Vec::new();
        let mut has_key = false;
        let mut triggers = Vec::new();

        for field in descriptor.fields() {
            match field.cardinality() {
                Cardinality::Map { key } => {
                    let side = self.create_map_table(descriptor, field, key)?;
                    self.queue_side_trigger(descriptor, side, &mut triggers);
                }
                Cardinality::Repeated => {
                    let side = self.create_list_table(descriptor, field)?;
                    self.queue_side_trigger(descriptor, side, &mut triggers);
                }
                Cardinality::Singular => {
                    let column = schema::column_name(field.name());

                    if let FieldKind::Message(nested) = field.kind() {
                        self.ensure(nested, field.is_key())?;
                        table.foreign_key(&column, nested.name());
                        triggers.push(schema::cascade_trigger(
                            descriptor.name(),
                            field.name(),
                            &column,
                            nested.name(),
                        ));
                    }

                    table.column(&column, schema::sql_type(field.kind()));
                    if field.is_key() {
                        table.unique(std::slice::from_ref(&column));
                        has_key = true;
                    }
                    singular_columns.push(column);
                }
            }
        }

        if !has_key && requires_identity && !singular_columns.is_empty() {
            table.unique(&singular_columns);
        }

        self.execute(&table.to_sql())?;
        for trigger in &triggers {
            self.execute(trigger)?;
        }
        Ok(())
    }

    fn create_map_table(
        &mut self,
        owner: &TypeDescriptor,
        field: &FieldDescriptor,
        key: &FieldKind,
    ) -> Result<String> {
        let name = schema::side_table_name(owner, field);
        let key_column = schema::side_key_column();
        let value_column = schema::side_value_column(field);

        let mut table = TableDefinition::new(name.as_str());
        table.column(&key_column, schema::sql_type(key));
        table.column(&value_column, schema::sql_type(field.kind()));
        table.column(schema::OWNER_COLUMN, "INTEGER");
        table.unique(&[schema::OWNER_COLUMN.to_string(), key_column]);
        table.foreign_key(schema::OWNER_COLUMN, owner.name());

        if let FieldKind::Message(nested) = field.kind() {
            self.ensure(nested, false)?;
            table.foreign_key(&value_column, nested.name());
        }

        self.execute(&table.to_sql())?;
        Ok(name)
    }

    fn create_list_table(&mut self, owner: &TypeDescriptor, field: &FieldDescriptor) -> Result<String> {
        let name = schema::side_table_name(owner, field);
        let value_column = schema::side_value_column(field);

        let mut table = TableDefinition::new(name.as_str());
        table.column(&value_column, schema::sql_type(field.kind()));
        table.column(schema::OWNER_COLUMN, "INTEGER");
        table.unique(&[schema::OWNER_COLUMN.to_string(), value_column.clone()]);
        table.foreign_key(schema::OWNER_COLUMN, owner.name());

        if let FieldKind::Message(nested) = field.kind() {
            self.ensure(nested, false)?;
            table.foreign_key(&value_column, nested.name());
        }

        self.execute(&table.to_sql())?;
        Ok(name)
    }

    fn queue_side_trigger(&self, owner: &TypeDescriptor, side: String, triggers: &mut Vec<String>) {
        if self.cascade == SideTableCascade::Delete {
            triggers.push(schema::side_table_trigger(owner.name(), &side));
        }
    }

    fn execute(&self, sql: &str) -> Result<()> {
        tracing::debug!("{}", sql);
        self.conn.execute(sql, [])?;
        Ok(())
    }
}
