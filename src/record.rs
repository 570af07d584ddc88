//! Records - dynamic instances of a `TypeDescriptor`
//!
//! A `Record` holds one optional `Value` per declared field, in declaration
//! order. Singular fields may be unset; repeated and map fields are always
//! present and start out empty. Every value is checked against its field's
//! kind and cardinality when it is set.

use crate::descriptor::{Cardinality, FieldDescriptor, FieldKind, TypeDescriptor};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// A single field value.
///
/// Scalars map one-to-one onto `FieldKind`; `List` and `Map` carry the
/// contents of repeated and map fields.
#[derive(Debug, Clone)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Enum(i32),
    Message(Record),
    List(Vec<Value>),
    /// Entries in insertion order; equality ignores order
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Short name of the value's variant, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::Message(_) => "message",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Whether this value is a single element of the given kind
    pub fn matches_kind(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (Value::Int32(_), FieldKind::Int32)
            | (Value::Int64(_), FieldKind::Int64)
            | (Value::UInt32(_), FieldKind::UInt32)
            | (Value::UInt64(_), FieldKind::UInt64)
            | (Value::Float(_), FieldKind::Float)
            | (Value::Double(_), FieldKind::Double)
            | (Value::Bool(_), FieldKind::Bool)
            | (Value::String(_), FieldKind::String)
            | (Value::Enum(_), FieldKind::Enum) => true,
            (Value::Message(record), FieldKind::Message(nested)) => record.type_name() == nested.name(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Any integral value widened to i64 (u64 only if it fits)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) | Value::Enum(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            Value::UInt32(v) => Some(i64::from(*v)),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Message(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::UInt32(a), Value::UInt32(b)) => a == b,
            (Value::UInt64(a), Value::UInt64(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Message(a), Value::Message(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len() && a.iter().all(|entry| b.contains(entry))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) | Value::Enum(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::Message(record) => write!(f, "{}", record),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Message(v)
    }
}

/// A concrete instance of a `TypeDescriptor`.
#[derive(Debug, Clone)]
pub struct Record {
    descriptor: Arc<TypeDescriptor>,
    values: Vec<Option<Value>>,
}

impl Record {
    /// Create an empty record: singular fields unset, collections empty
    pub fn new(descriptor: Arc<TypeDescriptor>) -> Self {
        let values = descriptor
            .fields()
            .iter()
            .map(|field| match field.cardinality() {
                Cardinality::Singular => None,
                Cardinality::Repeated => Some(Value::List(Vec::new())),
                Cardinality::Map { .. } => Some(Value::Map(Vec::new())),
            })
            .collect();
        Self { descriptor, values }
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    /// Set a field, checking the value against the field's kind and cardinality
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let (index, descriptor) = self.descriptor.require_field(field)?;
        check_field_value(self.descriptor.name(), descriptor, &value)?;
        self.values[index] = Some(value);
        Ok(())
    }

    /// Builder-style `set`
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(field, value)?;
        Ok(self)
    }

    /// Unset a singular field or empty a collection
    pub fn clear(&mut self, field: &str) -> Result<()> {
        let (index, descriptor) = self.descriptor.require_field(field)?;
        self.values[index] = match descriptor.cardinality() {
            Cardinality::Singular => None,
            Cardinality::Repeated => Some(Value::List(Vec::new())),
            Cardinality::Map { .. } => Some(Value::Map(Vec::new())),
        };
        Ok(())
    }

    /// Append an element to a repeated field
    pub fn push(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let type_name = self.descriptor.name().to_string();
        let (index, descriptor) = self.descriptor.require_field(field)?;
        if !descriptor.is_repeated() {
            return Err(Error::InvalidValue(format!("{}.{} is not repeated", type_name, field)));
        }
        if !value.matches_kind(descriptor.kind()) {
            return Err(mismatch(&type_name, descriptor, &value));
        }
        if let Some(Value::List(items)) = &mut self.values[index] {
            items.push(value);
        }
        Ok(())
    }

    /// Insert or replace a map entry
    pub fn insert_entry(&mut self, field: &str, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        let (key, value) = (key.into(), value.into());
        let type_name = self.descriptor.name().to_string();
        let (index, descriptor) = self.descriptor.require_field(field)?;
        let Some(key_kind) = descriptor.map_key() else {
            return Err(Error::InvalidValue(format!("{}.{} is not a map", type_name, field)));
        };
        if !key.matches_kind(key_kind) {
            return Err(mismatch(&type_name, descriptor, &key));
        }
        if !value.matches_kind(descriptor.kind()) {
            return Err(mismatch(&type_name, descriptor, &value));
        }
        if let Some(Value::Map(entries)) = &mut self.values[index] {
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        let index = self.descriptor.field_index(field)?;
        self.values[index].as_ref()
    }

    /// Value at a declaration position
    pub fn get_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub fn is_set(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Store a value decoded from the database; the caller guarantees it fits the field.
    pub(crate) fn set_at(&mut self, index: usize, value: Value) {
        self.values[index] = Some(value);
    }

    /// Fields paired with their current values, in declaration order
    pub fn entries(&self) -> impl Iterator<Item = (&FieldDescriptor, Option<&Value>)> {
        self.descriptor
            .fields()
            .iter()
            .zip(self.values.iter().map(Option::as_ref))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.name() == other.descriptor.name() && self.values == other.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name())?;
        let mut first = true;
        for (field, value) in self.entries() {
            if let Some(value) = value {
                if !first {
                    write!(f, ",")?;
                }
                write!(f, " {}: {}", field.name(), value)?;
                first = false;
            }
        }
        write!(f, " }}")
    }
}

fn mismatch(type_name: &str, field: &FieldDescriptor, value: &Value) -> Error {
    Error::InvalidValue(format!(
        "{}.{} expects {}, got {}",
        type_name,
        field.name(),
        field.kind(),
        value.kind_name()
    ))
}

fn check_field_value(type_name: &str, field: &FieldDescriptor, value: &Value) -> Result<()> {
    match (field.cardinality(), value) {
        (Cardinality::Singular, v) if v.matches_kind(field.kind()) => Ok(()),
        (Cardinality::Repeated, Value::List(items)) => {
            match items.iter().find(|item| !item.matches_kind(field.kind())) {
                Some(bad) => Err(mismatch(type_name, field, bad)),
                None => Ok(()),
            }
        }
        (Cardinality::Map { key }, Value::Map(entries)) => {
            for (i, (k, v)) in entries.iter().enumerate() {
                if !k.matches_kind(key) {
                    return Err(mismatch(type_name, field, k));
                }
                if !v.matches_kind(field.kind()) {
                    return Err(mismatch(type_name, field, v));
                }
                if entries[..i].iter().any(|(earlier, _)| earlier == k) {
                    return Err(Error::InvalidValue(format!(
                        "{}.{} has duplicate map key {}",
                        type_name,
                        field.name(),
                        k
                    )));
                }
            }
            Ok(())
        }
        _ => Err(mismatch(type_name, field, value)),
    }
}
