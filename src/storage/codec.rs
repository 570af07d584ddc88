//! Scalar coercion between `Value` and SQLite storage classes
//!
//! Integers, enums and bools are stored as INTEGER, floats as REAL, strings
//! as TEXT. UInt64 is stored as decimal TEXT so the full range survives.
//! Nested records never pass through here; their columns hold row ids.

use crate::descriptor::FieldKind;
use crate::record::Value;
use crate::{Error, Result};
use rusqlite::types::Value as SqlValue;

/// Convert a scalar value to its bound SQL form
pub fn encode(value: &Value) -> Result<SqlValue> {
    let encoded = match value {
        Value::Int32(v) | Value::Enum(v) => SqlValue::Integer(i64::from(*v)),
        Value::Int64(v) => SqlValue::Integer(*v),
        Value::UInt32(v) => SqlValue::Integer(i64::from(*v)),
        Value::UInt64(v) => SqlValue::Text(v.to_string()),
        Value::Float(v) => SqlValue::Real(f64::from(*v)),
        Value::Double(v) => SqlValue::Real(*v),
        Value::Bool(v) => SqlValue::Integer(i64::from(*v)),
        Value::String(v) => SqlValue::Text(v.clone()),
        Value::Message(_) | Value::List(_) | Value::Map(_) => {
            return Err(Error::InvalidValue(format!(
                "{} cannot be stored in a scalar column",
                value.kind_name()
            )));
        }
    };
    Ok(encoded)
}

/// Convert a stored column back into a scalar of `kind`; NULL means unset
pub fn decode(kind: &FieldKind, raw: SqlValue) -> Result<Option<Value>> {
    if matches!(raw, SqlValue::Null) {
        return Ok(None);
    }

    let value = match (kind, raw) {
        (FieldKind::Int32, SqlValue::Integer(i)) => Value::Int32(narrow(kind, i)?),
        (FieldKind::Enum, SqlValue::Integer(i)) => Value::Enum(narrow(kind, i)?),
        (FieldKind::Int64, SqlValue::Integer(i)) => Value::Int64(i),
        (FieldKind::UInt32, SqlValue::Integer(i)) => Value::UInt32(narrow(kind, i)?),
        (FieldKind::UInt64, SqlValue::Text(s)) => Value::UInt64(
            s.trim()
                .parse()
                .map_err(|_| Error::Decode(format!("'{}' is not a uint64", s)))?,
        ),
        (FieldKind::UInt64, SqlValue::Integer(i)) => Value::UInt64(narrow(kind, i)?),
        (FieldKind::Float, SqlValue::Real(f)) => Value::Float(f as f32),
        (FieldKind::Float, SqlValue::Integer(i)) => Value::Float(i as f32),
        (FieldKind::Double, SqlValue::Real(f)) => Value::Double(f),
        (FieldKind::Double, SqlValue::Integer(i)) => Value::Double(i as f64),
        (FieldKind::Bool, SqlValue::Integer(i)) => Value::Bool(i != 0),
        (FieldKind::String, SqlValue::Text(s)) => Value::String(s),
        (kind, raw) => {
            return Err(Error::Decode(format!(
                "cannot read {:?} as {}",
                raw.data_type(),
                kind
            )));
        }
    };
    Ok(Some(value))
}

/// Read a stored row id reference; NULL means the nested field is unset
pub fn decode_row_id(raw: SqlValue) -> Result<Option<i64>> {
    match raw {
        SqlValue::Null => Ok(None),
        SqlValue::Integer(id) => Ok(Some(id)),
        other => Err(Error::Decode(format!("row reference stored as {:?}", other.data_type()))),
    }
}

fn narrow<T: TryFrom<i64>>(kind: &FieldKind, i: i64) -> Result<T> {
    T::try_from(i).map_err(|_| Error::Decode(format!("{} out of range for {}", i, kind)))
}
