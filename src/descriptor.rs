//! Type descriptors - runtime metadata for record types
//!
//! A `TypeDescriptor` is a named, ordered list of `FieldDescriptor`s. Each
//! field has a kind (scalar, enum or a nested type), a cardinality
//! (singular, repeated or map) and a key flag. Descriptors are immutable
//! once built and are shared through `Arc`; identity is by name.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The kind of a single field value.
///
/// `Message` refers to another record type; everything else is stored
/// directly in a column.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float,
    Double,
    Bool,
    String,
    Enum,
    Message(Arc<TypeDescriptor>),
}

impl FieldKind {
    /// Get the string representation of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::UInt32 => "uint32",
            FieldKind::UInt64 => "uint64",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Enum => "enum",
            FieldKind::Message(_) => "message",
        }
    }

    /// Nested type, if this is a message kind
    pub fn message_type(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            FieldKind::Message(nested) => Some(nested),
            _ => None,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, FieldKind::Message(_))
    }

    /// Whether values of this kind may be used as map keys
    pub fn is_map_key(&self) -> bool {
        matches!(
            self,
            FieldKind::Int32
                | FieldKind::Int64
                | FieldKind::UInt32
                | FieldKind::UInt64
                | FieldKind::Bool
                | FieldKind::String
        )
    }
}

impl PartialEq for FieldKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldKind::Message(a), FieldKind::Message(b)) => a.name() == b.name(),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl FromStr for FieldKind {
    type Err = Error;

    /// Parses scalar kind names. Nested kinds are resolved by the registry.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "int32" | "sint32" | "sfixed32" => Ok(FieldKind::Int32),
            "int64" | "sint64" | "sfixed64" => Ok(FieldKind::Int64),
            "uint32" | "fixed32" => Ok(FieldKind::UInt32),
            "uint64" | "fixed64" => Ok(FieldKind::UInt64),
            "float" => Ok(FieldKind::Float),
            "double" => Ok(FieldKind::Double),
            "bool" => Ok(FieldKind::Bool),
            "string" => Ok(FieldKind::String),
            "enum" => Ok(FieldKind::Enum),
            _ => Err(Error::Schema(format!("Unknown scalar kind: {}", s))),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Message(nested) => write!(f, "{}", nested.name()),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// How many values a field holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Cardinality {
    Singular,
    /// Ordered sequence of values of the field's kind
    Repeated,
    /// Associative map from `key` kind to the field's kind
    Map { key: FieldKind },
}

/// Metadata for one field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    cardinality: Cardinality,
    is_key: bool,
}

impl FieldDescriptor {
    /// A single-valued field
    pub fn singular(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            cardinality: Cardinality::Singular,
            is_key: false,
        }
    }

    /// A repeated field; `kind` is the element kind
    pub fn repeated(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            cardinality: Cardinality::Repeated,
            is_key: false,
        }
    }

    /// A map field from `key` to `value`
    pub fn map(name: impl Into<String>, key: FieldKind, value: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind: value,
            cardinality: Cardinality::Map { key },
            is_key: false,
        }
    }

    /// Mark the field as carrying the record's identity
    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value kind (element kind for repeated fields, value kind for maps)
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn cardinality(&self) -> &Cardinality {
        &self.cardinality
    }

    pub fn is_key(&self) -> bool {
        self.is_key
    }

    pub fn is_singular(&self) -> bool {
        matches!(self.cardinality, Cardinality::Singular)
    }

    pub fn is_repeated(&self) -> bool {
        matches!(self.cardinality, Cardinality::Repeated)
    }

    /// Map key kind, if this is a map field
    pub fn map_key(&self) -> Option<&FieldKind> {
        match &self.cardinality {
            Cardinality::Map { key } => Some(key),
            _ => None,
        }
    }
}

/// Runtime description of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Build and validate a descriptor from its fields
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Arc<Self>> {
        let descriptor = Self {
            name: name.into(),
            fields,
        };
        descriptor.validate()?;
        Ok(Arc::new(descriptor))
    }

    /// Start a builder for a descriptor named `name`
    pub fn builder(name: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Position of a field in declaration order
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field, failing with a schema error if it does not exist
    pub fn require_field(&self, name: &str) -> Result<(usize, &FieldDescriptor)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
            .ok_or_else(|| Error::Schema(format!("{} has no field '{}'", self.name, name)))
    }

    /// Singular fields with their positions, in declaration order
    pub fn singular_fields(&self) -> impl Iterator<Item = (usize, &FieldDescriptor)> {
        self.fields.iter().enumerate().filter(|(_, f)| f.is_singular())
    }

    /// Key fields with their positions, in declaration order
    pub fn key_fields(&self) -> impl Iterator<Item = (usize, &FieldDescriptor)> {
        self.fields.iter().enumerate().filter(|(_, f)| f.is_key)
    }

    pub fn has_keys(&self) -> bool {
        self.fields.iter().any(|f| f.is_key)
    }

    fn validate(&self) -> Result<()> {
        if !is_identifier(&self.name) {
            return Err(Error::Schema(format!("Invalid type name: '{}'", self.name)));
        }

        for (i, field) in self.fields.iter().enumerate() {
            if !is_identifier(&field.name) {
                return Err(Error::Schema(format!(
                    "Invalid field name '{}' in {}",
                    field.name, self.name
                )));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::Schema(format!(
                    "Duplicate field '{}' in {}",
                    field.name, self.name
                )));
            }
            if field.is_key && !field.is_singular() {
                return Err(Error::Schema(format!(
                    "Collection field {}.{} cannot be a key",
                    self.name, field.name
                )));
            }
            if let Some(key) = field.map_key() {
                if !key.is_map_key() {
                    return Err(Error::Schema(format!(
                        "Map field {}.{} has unsupported key kind {}",
                        self.name, field.name, key
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Incremental builder for `TypeDescriptor`
pub struct TypeDescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptorBuilder {
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<Arc<TypeDescriptor>> {
        TypeDescriptor::new(self.name, self.fields)
    }
}

/// Type and field names are spliced into SQL, so only plain identifiers are accepted.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> Arc<TypeDescriptor> {
        TypeDescriptor::builder("Pos")
            .field(FieldDescriptor::singular("x", FieldKind::Int32).key())
            .field(FieldDescriptor::singular("y", FieldKind::Int32))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_and_lookup() {
        let pos = pos();
        assert_eq!(pos.name(), "Pos");
        assert_eq!(pos.field_index("y"), Some(1));
        assert!(pos.has_keys());
        let keys: Vec<_> = pos.key_fields().map(|(_, f)| f.name().to_string()).collect();
        assert_eq!(keys, vec!["x"]);
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        let err = TypeDescriptor::builder("bad name").build().unwrap_err();
        assert!(matches!(err, Error::Schema(_)));

        let err = TypeDescriptor::builder("T")
            .field(FieldDescriptor::singular("x;drop", FieldKind::Int32))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_rejects_collection_keys_and_float_map_keys() {
        let err = TypeDescriptor::builder("T")
            .field(FieldDescriptor::repeated("xs", FieldKind::Int32).key())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));

        let err = TypeDescriptor::builder("T")
            .field(FieldDescriptor::map("m", FieldKind::Double, FieldKind::Int32))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));

        let err = TypeDescriptor::builder("T")
            .field(FieldDescriptor::map("m", FieldKind::Message(pos()), FieldKind::Int32))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_rejects_duplicate_fields() {
        let err = TypeDescriptor::builder("T")
            .field(FieldDescriptor::singular("a", FieldKind::Int32))
            .field(FieldDescriptor::singular("a", FieldKind::String))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(FieldKind::from_str("int32").unwrap(), FieldKind::Int32);
        assert_eq!(FieldKind::from_str("Fixed64").unwrap(), FieldKind::UInt64);
        assert!(FieldKind::from_str("Pos").is_err());
        assert_eq!(FieldKind::Message(pos()), FieldKind::Message(pos()));
        assert_ne!(FieldKind::Int32, FieldKind::Int64);
    }
}
