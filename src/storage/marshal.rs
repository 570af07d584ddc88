//! Write path - records to rows
//!
//! A record is persisted bottom-up: nested records first (to obtain the row
//! ids their foreign-key columns hold), then one INSERT over the singular
//! columns, then the side tables, which are cleared for the owner and
//! refilled in element order.
//!
//! Nested records follow the conflict mode of the outer call: under `write`
//! a nested type with declared keys is upserted, under `insert` it is a
//! plain insert and a key collision is a conflict. A keyless type whose
//! table is content-addressed is looked up by content before it is
//! inserted, however it is reached. Any other nested value gets a fresh row.
//!
//! Callers are expected to run this inside a transaction.

use super::catalog::TypeCatalog;
use super::codec;
use super::identity::{require_keys, IdentityResolver};
use super::schema;
use super::RowId;
use crate::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::record::{Record, Value};
use crate::{Error, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};

pub struct RecordMarshaler<'a> {
    conn: &'a Connection,
    identity: IdentityResolver<'a>,
}

impl<'a> RecordMarshaler<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            identity: IdentityResolver::new(conn),
        }
    }

    /// Insert a new row; any unique constraint hit is a conflict
    pub fn insert(&self, record: &Record) -> Result<RowId> {
        self.persist(record, false)
    }

    /// Insert, or update the non-key columns of the row a key collides with
    pub fn write(&self, record: &Record) -> Result<RowId> {
        self.persist(record, true)
    }

    fn persist(&self, record: &Record, resolve_conflicts: bool) -> Result<RowId> {
        let descriptor = record.descriptor();
        require_keys(record)?;

        let mut columns = Vec::new();
        let mut updates = Vec::new();
        let mut params = Vec::new();
        let mut collections = Vec::new();

        for (index, field) in descriptor.fields().iter().enumerate() {
            if !field.is_singular() {
                collections.push((index, field));
                continue;
            }

            let column = schema::column_name(field.name());
            let bound = match record.get_at(index) {
                None => SqlValue::Null,
                Some(Value::Message(nested)) => {
                    SqlValue::Integer(self.persist_nested(nested, field.is_key(), resolve_conflicts)?)
                }
                Some(value) => codec::encode(value)?,
            };
            if !field.is_key() {
                updates.push(format!("{column} = excluded.{column}"));
            }
            columns.push(column);
            params.push(bound);
        }

        let sql = insert_sql(descriptor.name(), &columns, resolve_conflicts.then_some(updates.as_slice()));
        let id: RowId = self
            .conn
            .query_row(&sql, params_from_iter(params), |row| row.get(0))
            .map_err(|e| {
                let err = Error::from(e);
                if err.is_conflict() {
                    tracing::warn!("Write to {} rejected: {}", descriptor.name(), err);
                }
                err
            })?;
        tracing::debug!("Persisted {} row {}", descriptor.name(), id);

        for (index, field) in collections {
            let value = record.get_at(index);
            if field.map_key().is_some() {
                self.replace_map(descriptor, field, id, value, resolve_conflicts)?;
            } else {
                self.replace_list(descriptor, field, id, value, resolve_conflicts)?;
            }
        }

        Ok(id)
    }

    fn persist_nested(&self, record: &Record, via_key_field: bool, resolve_conflicts: bool) -> Result<RowId> {
        let descriptor = record.descriptor();
        if descriptor.has_keys() {
            return self.persist(record, resolve_conflicts);
        }
        if via_key_field || TypeCatalog::has_unique_constraint(self.conn, descriptor.name())? {
            if let Some(id) = self.identity.find_row_id(record)? {
                return Ok(id);
            }
        }
        self.persist(record, false)
    }

    /// SQL form of a collection element; nested elements are persisted first
    fn element(&self, value: &Value, resolve_conflicts: bool) -> Result<SqlValue> {
        match value {
            Value::Message(nested) => Ok(SqlValue::Integer(self.persist_nested(nested, false, resolve_conflicts)?)),
            scalar => codec::encode(scalar),
        }
    }

    fn replace_list(
        &self,
        owner: &TypeDescriptor,
        field: &FieldDescriptor,
        owner_id: RowId,
        value: Option<&Value>,
        resolve_conflicts: bool,
    ) -> Result<()> {
        let table = schema::side_table_name(owner, field);
        self.clear_side_rows(&table, owner_id)?;

        let items = value.and_then(Value::as_list).unwrap_or_default();
        if items.is_empty() {
            return Ok(());
        }

        let bound = items
            .iter()
            .map(|item| self.element(item, resolve_conflicts))
            .collect::<Result<Vec<_>>>()?;

        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            table,
            schema::side_value_column(field),
            schema::OWNER_COLUMN
        );
        let mut stmt = self.conn.prepare(&sql)?;
        for element in bound {
            stmt.execute(params![element, owner_id])?;
        }
        Ok(())
    }

    fn replace_map(
        &self,
        owner: &TypeDescriptor,
        field: &FieldDescriptor,
        owner_id: RowId,
        value: Option<&Value>,
        resolve_conflicts: bool,
    ) -> Result<()> {
        let table = schema::side_table_name(owner, field);
        self.clear_side_rows(&table, owner_id)?;

        let entries = value.and_then(Value::as_map).unwrap_or_default();
        if entries.is_empty() {
            return Ok(());
        }

        let mut bound = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            bound.push((codec::encode(key)?, self.element(value, resolve_conflicts)?));
        }

        let sql = format!(
            "INSERT INTO {} ({}, {}, {}) VALUES (?1, ?2, ?3)",
            table,
            schema::side_key_column(),
            schema::side_value_column(field),
            schema::OWNER_COLUMN
        );
        let mut stmt = self.conn.prepare(&sql)?;
        for (key, value) in bound {
            stmt.execute(params![key, value, owner_id])?;
        }
        Ok(())
    }

    fn clear_side_rows(&self, table: &str, owner_id: RowId) -> Result<()> {
        self.conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", table, schema::OWNER_COLUMN),
            [owner_id],
        )?;
        Ok(())
    }
}

/// `INSERT ... RETURNING id`, optionally as an upsert over `updates`
fn insert_sql(table: &str, columns: &[String], updates: Option<&[String]>) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, schema::ID_COLUMN);
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let mut sql = format!("INSERT INTO {} ({}) VALUES ({})", table, columns.join(", "), placeholders);
    if let Some(updates) = updates {
        // a no-op update still lets RETURNING report the existing row
        let assignments = if updates.is_empty() {
            format!("{id} = {id}", id = schema::ID_COLUMN)
        } else {
            updates.join(", ")
        };
        sql.push_str(" ON CONFLICT DO UPDATE SET ");
        sql.push_str(&assignments);
    }
    sql.push_str(&format!(" RETURNING {}", schema::ID_COLUMN));
    sql
}
