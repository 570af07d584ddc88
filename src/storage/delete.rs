//! Deletion by key
//!
//! Only main table rows are deleted here. Singular nested rows go with them
//! through the cascade triggers; side table rows stay unless the schema was
//! synthesized with `SideTableCascade::Delete`.

use super::identity::{key_values, require_key_field, IdentityResolver};
use super::schema;
use crate::descriptor::TypeDescriptor;
use crate::record::{Record, Value};
use crate::{Error, Result};
use rusqlite::{params_from_iter, Connection};

pub struct DeletionCoordinator<'a> {
    conn: &'a Connection,
    identity: IdentityResolver<'a>,
}

impl<'a> DeletionCoordinator<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            identity: IdentityResolver::new(conn),
        }
    }

    /// Delete rows whose key `field` equals `key`; returns the number removed
    pub fn delete_by_key(&self, descriptor: &TypeDescriptor, field: &str, key: &Value) -> Result<usize> {
        let field = require_key_field(descriptor, field, key)?;
        let Some(bound) = self.identity.bind(key)? else {
            // nested key with no stored row: nothing can reference it
            return Ok(0);
        };

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            descriptor.name(),
            schema::column_name(field.name())
        );
        let deleted = self.conn.execute(&sql, [bound])?;
        tracing::debug!("Deleted {} row(s) from {} by {}", deleted, descriptor.name(), field.name());
        Ok(deleted)
    }

    /// Delete the row sharing all of `record`'s key values
    pub fn delete_record(&self, record: &Record) -> Result<usize> {
        let descriptor = record.descriptor();
        if !descriptor.has_keys() {
            return Err(Error::MissingKey(format!(
                "{} declares no key fields; refusing to delete by value",
                descriptor.name()
            )));
        }

        let mut conditions = Vec::new();
        let mut params = Vec::new();
        for (field, value) in key_values(record)? {
            let Some(bound) = self.identity.bind(value)? else {
                return Ok(0);
            };
            conditions.push(format!("{} = ?", schema::column_name(field.name())));
            params.push(bound);
        }

        let sql = format!(
            "DELETE FROM {} WHERE {}",
            descriptor.name(),
            conditions.join(" AND ")
        );
        let deleted = self.conn.execute(&sql, params_from_iter(params))?;
        tracing::debug!("Deleted {} row(s) from {}", deleted, descriptor.name());
        Ok(deleted)
    }

    /// Delete every row of the type
    pub fn clear_table(&self, descriptor: &TypeDescriptor) -> Result<usize> {
        let deleted = self.conn.execute(&format!("DELETE FROM {}", descriptor.name()), [])?;
        tracing::debug!("Cleared {} row(s) from {}", deleted, descriptor.name());
        Ok(deleted)
    }
}
