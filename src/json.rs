//! JSON conversion for records
//!
//! Records are exchanged with the outside world (the CLI) as JSON objects.
//! The descriptor drives the conversion: unset singular fields are omitted,
//! repeated fields become arrays, maps become objects keyed by the
//! stringified map key, and nested records become nested objects.

use crate::descriptor::{Cardinality, FieldKind, TypeDescriptor};
use crate::record::{Record, Value};
use crate::{Error, Result};
use serde_json::{Map, Value as Json};
use std::sync::Arc;

/// Render a record as a JSON object
pub fn to_json(record: &Record) -> Json {
    let mut object = Map::new();
    for (field, value) in record.entries() {
        if let Some(value) = value {
            object.insert(field.name().to_string(), value_to_json(value));
        }
    }
    Json::Object(object)
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Int32(v) | Value::Enum(v) => Json::from(*v),
        Value::Int64(v) => Json::from(*v),
        Value::UInt32(v) => Json::from(*v),
        Value::UInt64(v) => Json::from(*v),
        Value::Float(v) => Json::from(*v),
        Value::Double(v) => Json::from(*v),
        Value::Bool(v) => Json::from(*v),
        Value::String(v) => Json::from(v.as_str()),
        Value::Message(record) => to_json(record),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) => {
            let mut object = Map::new();
            for (key, value) in entries {
                let key = match key {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                object.insert(key, value_to_json(value));
            }
            Json::Object(object)
        }
    }
}

/// Build a record of type `descriptor` from a JSON object
pub fn from_json(descriptor: &Arc<TypeDescriptor>, json: &Json) -> Result<Record> {
    let object = json.as_object().ok_or_else(|| {
        Error::InvalidValue(format!("{} must be a JSON object", descriptor.name()))
    })?;

    let mut record = Record::new(Arc::clone(descriptor));
    for (name, value) in object {
        if value.is_null() {
            continue;
        }
        let (_, field) = descriptor.require_field(name)?;
        let decoded = match field.cardinality() {
            Cardinality::Singular => value_from_json(field.kind(), value)?,
            Cardinality::Repeated => {
                let items = value.as_array().ok_or_else(|| {
                    Error::InvalidValue(format!("{}.{} must be an array", descriptor.name(), name))
                })?;
                Value::List(
                    items
                        .iter()
                        .map(|item| value_from_json(field.kind(), item))
                        .collect::<Result<_>>()?,
                )
            }
            Cardinality::Map { key } => {
                let entries = value.as_object().ok_or_else(|| {
                    Error::InvalidValue(format!("{}.{} must be an object", descriptor.name(), name))
                })?;
                let mut decoded = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    decoded.push((key_from_str(key, k)?, value_from_json(field.kind(), v)?));
                }
                Value::Map(decoded)
            }
        };
        record.set(name, decoded)?;
    }
    Ok(record)
}

/// Decode a single value of `kind`, e.g. a lookup key given on the command line
pub fn value_from_json(kind: &FieldKind, json: &Json) -> Result<Value> {
    let invalid = || Error::InvalidValue(format!("expected {}, got {}", kind, json));

    let value = match kind {
        FieldKind::Int32 => Value::Int32(json.as_i64().and_then(|v| i32::try_from(v).ok()).ok_or_else(invalid)?),
        FieldKind::Int64 => Value::Int64(json.as_i64().ok_or_else(invalid)?),
        FieldKind::UInt32 => Value::UInt32(json.as_u64().and_then(|v| u32::try_from(v).ok()).ok_or_else(invalid)?),
        FieldKind::UInt64 => match json {
            Json::String(s) => Value::UInt64(s.parse().map_err(|_| invalid())?),
            _ => Value::UInt64(json.as_u64().ok_or_else(invalid)?),
        },
        FieldKind::Float => Value::Float(json.as_f64().ok_or_else(invalid)? as f32),
        FieldKind::Double => Value::Double(json.as_f64().ok_or_else(invalid)?),
        FieldKind::Bool => Value::Bool(json.as_bool().ok_or_else(invalid)?),
        FieldKind::String => Value::String(json.as_str().ok_or_else(invalid)?.to_string()),
        FieldKind::Enum => Value::Enum(json.as_i64().and_then(|v| i32::try_from(v).ok()).ok_or_else(invalid)?),
        FieldKind::Message(nested) => Value::Message(from_json(nested, json)?),
    };
    Ok(value)
}

/// Parse a JSON object key back into a map key of the given kind
fn key_from_str(kind: &FieldKind, key: &str) -> Result<Value> {
    let invalid = || Error::InvalidValue(format!("map key '{}' is not a valid {}", key, kind));

    let value = match kind {
        FieldKind::Int32 => Value::Int32(key.parse().map_err(|_| invalid())?),
        FieldKind::Int64 => Value::Int64(key.parse().map_err(|_| invalid())?),
        FieldKind::UInt32 => Value::UInt32(key.parse().map_err(|_| invalid())?),
        FieldKind::UInt64 => Value::UInt64(key.parse().map_err(|_| invalid())?),
        FieldKind::Bool => Value::Bool(key.parse().map_err(|_| invalid())?),
        FieldKind::String => Value::String(key.to_string()),
        _ => return Err(invalid()),
    };
    Ok(value)
}
