//! Read path - rows back to records

use super::codec;
use super::schema;
use super::RowId;
use crate::descriptor::{FieldDescriptor, FieldKind, TypeDescriptor};
use crate::record::{Record, Value};
use crate::{Error, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension};
use std::sync::Arc;

pub struct RecordUnmarshaler<'a> {
    conn: &'a Connection,
}

impl<'a> RecordUnmarshaler<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Rebuild the record stored at `id`, following nested references and side tables
    pub fn fetch(&self, descriptor: &Arc<TypeDescriptor>, id: RowId) -> Result<Record> {
        let fields: Vec<(usize, &FieldDescriptor)> = descriptor.singular_fields().collect();
        let columns = if fields.is_empty() {
            schema::ID_COLUMN.to_string()
        } else {
            fields
                .iter()
                .map(|(_, field)| schema::column_name(field.name()))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            columns,
            descriptor.name(),
            schema::ID_COLUMN
        );

        let raw: Vec<SqlValue> = self
            .conn
            .query_row(&sql, [id], |row| {
                (0..fields.len()).map(|i| row.get(i)).collect()
            })
            .optional()?
            .ok_or_else(|| Error::RowNotFound {
                table: descriptor.name().to_string(),
                id,
            })?;

        let mut record = Record::new(Arc::clone(descriptor));
        for ((index, field), raw) in fields.into_iter().zip(raw) {
            if let Some(value) = self.read_value(field.kind(), raw)? {
                record.set_at(index, value);
            }
        }

        for (index, field) in descriptor.fields().iter().enumerate() {
            if field.is_singular() {
                continue;
            }
            let value = if field.map_key().is_some() {
                self.read_map(descriptor, field, id)?
            } else {
                self.read_list(descriptor, field, id)?
            };
            record.set_at(index, value);
        }

        Ok(record)
    }

    /// Every set value of one singular field, in row id order
    pub fn column_values(&self, descriptor: &TypeDescriptor, field: &str) -> Result<Vec<Value>> {
        let (_, field) = descriptor.require_field(field)?;
        if !field.is_singular() {
            return Err(Error::Schema(format!(
                "{}.{} is a collection and has no column",
                descriptor.name(),
                field.name()
            )));
        }

        let sql = format!(
            "SELECT {column} FROM {table} ORDER BY {id}",
            column = schema::column_name(field.name()),
            table = descriptor.name(),
            id = schema::ID_COLUMN,
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raw = stmt
            .query_map([], |row| row.get::<_, SqlValue>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut values = Vec::with_capacity(raw.len());
        for raw in raw {
            if let Some(value) = self.read_value(field.kind(), raw)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    fn read_value(&self, kind: &FieldKind, raw: SqlValue) -> Result<Option<Value>> {
        match kind {
            FieldKind::Message(nested) => match codec::decode_row_id(raw)? {
                Some(id) => Ok(Some(Value::Message(self.fetch(nested, id)?))),
                None => Ok(None),
            },
            scalar => codec::decode(scalar, raw),
        }
    }

    /// A side table value must be present; NULL there is corruption
    fn read_element(&self, kind: &FieldKind, raw: SqlValue, table: &str) -> Result<Value> {
        self.read_value(kind, raw)?
            .ok_or_else(|| Error::Decode(format!("NULL element in {}", table)))
    }

    fn read_list(&self, owner: &TypeDescriptor, field: &FieldDescriptor, owner_id: RowId) -> Result<Value> {
        let table = schema::side_table_name(owner, field);
        let sql = format!(
            "SELECT {value} FROM {table} WHERE {owner} = ?1 ORDER BY {id}",
            value = schema::side_value_column(field),
            table = table,
            owner = schema::OWNER_COLUMN,
            id = schema::ID_COLUMN,
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raw = stmt
            .query_map([owner_id], |row| row.get::<_, SqlValue>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let items = raw
            .into_iter()
            .map(|raw| self.read_element(field.kind(), raw, &table))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::List(items))
    }

    fn read_map(&self, owner: &TypeDescriptor, field: &FieldDescriptor, owner_id: RowId) -> Result<Value> {
        let table = schema::side_table_name(owner, field);
        let key_kind = field
            .map_key()
            .ok_or_else(|| Error::Schema(format!("{}.{} is not a map", owner.name(), field.name())))?;
        let sql = format!(
            "SELECT {key}, {value} FROM {table} WHERE {owner} = ?1 ORDER BY {id}",
            key = schema::side_key_column(),
            value = schema::side_value_column(field),
            table = table,
            owner = schema::OWNER_COLUMN,
            id = schema::ID_COLUMN,
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raw = stmt
            .query_map([owner_id], |row| {
                Ok((row.get::<_, SqlValue>(0)?, row.get::<_, SqlValue>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut entries = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let key = self.read_element(key_kind, key, &table)?;
            let value = self.read_element(field.kind(), value, &table)?;
            entries.push((key, value));
        }
        Ok(Value::Map(entries))
    }
}

/// Lazy scan over every record of one type in row id order.
///
/// Each step re-queries for the next id after the last one returned, so
/// rows written between steps are seen if their id is higher.
pub struct Records<'a> {
    conn: &'a Connection,
    descriptor: Arc<TypeDescriptor>,
    last_id: Option<RowId>,
    done: bool,
}

impl<'a> Records<'a> {
    pub fn new(conn: &'a Connection, descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            conn,
            descriptor,
            last_id: None,
            done: false,
        }
    }

    /// A scan over a type with no table yet
    pub(crate) fn empty(conn: &'a Connection, descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            done: true,
            ..Self::new(conn, descriptor)
        }
    }

    fn next_id(&self) -> Result<Option<RowId>> {
        let sql = format!(
            "SELECT {id} FROM {table} WHERE {id} > ?1 ORDER BY {id} LIMIT 1",
            id = schema::ID_COLUMN,
            table = self.descriptor.name(),
        );
        let after = self.last_id.unwrap_or(RowId::MIN);
        let id = self.conn.query_row(&sql, [after], |row| row.get(0)).optional()?;
        Ok(id)
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let step = self.next_id().and_then(|id| match id {
            Some(id) => {
                self.last_id = Some(id);
                RecordUnmarshaler::new(self.conn).fetch(&self.descriptor, id).map(Some)
            }
            None => Ok(None),
        });

        match step {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
