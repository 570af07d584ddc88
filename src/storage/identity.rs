//! Identity resolution - finding the row behind a record
//!
//! A type with declared keys is identified by its key columns. A type
//! without keys is identified by the full tuple of its singular columns.
//! Nested values are resolved to their own row ids first; if a nested value
//! has no row, the owner cannot have one either.

use super::codec;
use super::schema;
use super::RowId;
use crate::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::record::{Record, Value};
use crate::{Error, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

pub struct IdentityResolver<'a> {
    conn: &'a Connection,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Row id of the stored record matching `record`'s identity, if any
    pub fn find_row_id(&self, record: &Record) -> Result<Option<RowId>> {
        let descriptor = record.descriptor();
        let fields: Vec<(usize, &FieldDescriptor)> = if descriptor.has_keys() {
            require_keys(record)?
        } else {
            descriptor.singular_fields().collect()
        };

        let mut conditions = Vec::with_capacity(fields.len());
        let mut params = Vec::with_capacity(fields.len());
        for (index, field) in fields {
            let bound = match record.get_at(index) {
                None => SqlValue::Null,
                Some(value) => match self.bind(value)? {
                    Some(bound) => bound,
                    None => return Ok(None),
                },
            };
            conditions.push(format!("{} IS ?", schema::column_name(field.name())));
            params.push(bound);
        }

        let mut sql = format!("SELECT {} FROM {}", schema::ID_COLUMN, descriptor.name());
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY {} LIMIT 1", schema::ID_COLUMN));

        let id = self
            .conn
            .query_row(&sql, params_from_iter(params), |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    /// Row id of the record of type `descriptor` whose key `field` equals `key`
    pub fn find_by_key(&self, descriptor: &TypeDescriptor, field: &str, key: &Value) -> Result<Option<RowId>> {
        let field = require_key_field(descriptor, field, key)?;
        let Some(bound) = self.bind(key)? else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {id} FROM {table} WHERE {column} = ?1 ORDER BY {id} LIMIT 1",
            id = schema::ID_COLUMN,
            table = descriptor.name(),
            column = schema::column_name(field.name()),
        );
        let id = self.conn.query_row(&sql, [bound], |row| row.get(0)).optional()?;
        Ok(id)
    }

    /// SQL form of a singular value; nested records become their row id,
    /// or `None` when the nested record is not stored.
    pub fn bind(&self, value: &Value) -> Result<Option<SqlValue>> {
        match value {
            Value::Message(nested) => Ok(self.find_row_id(nested)?.map(SqlValue::Integer)),
            scalar => codec::encode(scalar).map(Some),
        }
    }
}

/// Key fields of the record's type, all of which must be set
pub fn require_keys(record: &Record) -> Result<Vec<(usize, &FieldDescriptor)>> {
    let keys: Vec<(usize, &FieldDescriptor)> = record.descriptor().key_fields().collect();
    if let Some((_, unset)) = keys.iter().find(|(index, _)| record.get_at(*index).is_none()) {
        return Err(missing_key(record, unset));
    }
    Ok(keys)
}

/// Key fields paired with their values
pub fn key_values(record: &Record) -> Result<Vec<(&FieldDescriptor, &Value)>> {
    record
        .descriptor()
        .key_fields()
        .map(|(index, field)| match record.get_at(index) {
            Some(value) => Ok((field, value)),
            None => Err(missing_key(record, field)),
        })
        .collect()
}

fn missing_key(record: &Record, field: &FieldDescriptor) -> Error {
    Error::MissingKey(format!("key field {}.{} is not set", record.type_name(), field.name()))
}

/// Look up `field` and check it is a key that `key` can match
pub fn require_key_field<'d>(descriptor: &'d TypeDescriptor, field: &str, key: &Value) -> Result<&'d FieldDescriptor> {
    let (_, field) = descriptor.require_field(field)?;
    if !field.is_key() {
        return Err(Error::NotAKey {
            type_name: descriptor.name().to_string(),
            field: field.name().to_string(),
        });
    }
    if !key.matches_kind(field.kind()) {
        return Err(Error::InvalidValue(format!(
            "{}.{} expects {}, got {}",
            descriptor.name(),
            field.name(),
            field.kind(),
            key.kind_name()
        )));
    }
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, FieldKind};
    use crate::storage::{SchemaSynthesizer, StoreOptions, TypeCatalog};
    use std::sync::Arc;

    fn setup() -> (Connection, Arc<TypeDescriptor>, Arc<TypeDescriptor>) {
        let pos = TypeDescriptor::builder("Pos")
            .field(FieldDescriptor::singular("x", FieldKind::Int32))
            .field(FieldDescriptor::singular("y", FieldKind::Int32))
            .build()
            .unwrap();
        let item = TypeDescriptor::builder("Item")
            .field(FieldDescriptor::singular("pos", FieldKind::Message(Arc::clone(&pos))).key())
            .field(FieldDescriptor::singular("data", FieldKind::String))
            .build()
            .unwrap();

        let conn = Connection::open_in_memory().unwrap();
        let catalog = TypeCatalog::new();
        SchemaSynthesizer::new(&conn, &catalog, &StoreOptions::default())
            .ensure(&item, false)
            .unwrap();
        conn.execute("INSERT INTO Pos (field_x, field_y) VALUES (4, 8)", []).unwrap();
        conn.execute("INSERT INTO Item (field_pos, field_data) VALUES (1, 'a')", []).unwrap();
        (conn, pos, item)
    }

    fn pos_record(pos: &Arc<TypeDescriptor>, x: i32, y: i32) -> Record {
        Record::new(Arc::clone(pos)).with("x", x).unwrap().with("y", y).unwrap()
    }

    #[test]
    fn test_content_match() {
        let (conn, pos, _) = setup();
        let resolver = IdentityResolver::new(&conn);
        assert_eq!(resolver.find_row_id(&pos_record(&pos, 4, 8)).unwrap(), Some(1));
        assert_eq!(resolver.find_row_id(&pos_record(&pos, 4, 9)).unwrap(), None);
    }

    #[test]
    fn test_unset_fields_match_null() {
        let (conn, pos, _) = setup();
        conn.execute("INSERT INTO Pos (field_x) VALUES (7)", []).unwrap();
        let resolver = IdentityResolver::new(&conn);
        let partial = Record::new(pos).with("x", 7).unwrap();
        assert_eq!(resolver.find_row_id(&partial).unwrap(), Some(2));
    }

    #[test]
    fn test_find_by_nested_key() {
        let (conn, pos, item) = setup();
        let resolver = IdentityResolver::new(&conn);
        let key = Value::Message(pos_record(&pos, 4, 8));
        assert_eq!(resolver.find_by_key(&item, "pos", &key).unwrap(), Some(1));

        let missing = Value::Message(pos_record(&pos, 1, 1));
        assert_eq!(resolver.find_by_key(&item, "pos", &missing).unwrap(), None);
    }

    #[test]
    fn test_find_by_non_key_field() {
        let (conn, _, item) = setup();
        let resolver = IdentityResolver::new(&conn);
        let err = resolver.find_by_key(&item, "data", &Value::from("a")).unwrap_err();
        assert!(matches!(err, Error::NotAKey { .. }));
    }

    #[test]
    fn test_keyed_lookup_requires_keys() {
        let (conn, _, item) = setup();
        let resolver = IdentityResolver::new(&conn);
        let err = resolver.find_row_id(&Record::new(item)).unwrap_err();
        assert!(matches!(err, Error::MissingKey(_)));
    }

    #[test]
    fn test_key_values() {
        let (_, pos, item) = setup();
        let record = Record::new(Arc::clone(&item))
            .with("pos", pos_record(&pos, 4, 8))
            .unwrap()
            .with("data", "a")
            .unwrap();

        let keys = key_values(&record).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].0.name(), "pos");
        assert_eq!(keys[0].1, &Value::Message(pos_record(&pos, 4, 8)));

        let unset = Record::new(item).with("data", "a").unwrap();
        assert!(matches!(key_values(&unset), Err(Error::MissingKey(_))));
    }
}
