//! Descriptor registry - resolves type names to descriptors
//!
//! The storage engine only ever sees `TypeDescriptor`s; where they come from
//! is the business of a `DescriptorProvider`. `DescriptorRegistry` is the
//! stock provider. It can be filled programmatically or loaded from a TOML
//! type catalog:
//!
//! ```toml
//! [[types]]
//! name = "Pos"
//! fields = [ { name = "x", kind = "int32", key = true }, { name = "y", kind = "int32" } ]
//!
//! [[types]]
//! name = "Item"
//! fields = [
//!   { name = "pos", kind = "Pos", key = true },
//!   { name = "tags", kind = "string", repeated = true },
//!   { name = "attrs", kind = "int64", map_key = "string" },
//! ]
//! ```

use crate::descriptor::{FieldDescriptor, FieldKind, TypeDescriptor};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Supplies type descriptors by name
pub trait DescriptorProvider {
    fn descriptor(&self, name: &str) -> Option<Arc<TypeDescriptor>>;

    /// Like `descriptor`, but an unknown name is a schema error
    fn require(&self, name: &str) -> Result<Arc<TypeDescriptor>> {
        self.descriptor(name)
            .ok_or_else(|| Error::Schema(format!("Unknown type: {}", name)))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    types: Vec<TypeEntry>,
}

#[derive(Debug, Deserialize)]
struct TypeEntry {
    name: String,
    #[serde(default)]
    fields: Vec<FieldEntry>,
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    name: String,
    kind: String,
    #[serde(default)]
    key: bool,
    #[serde(default)]
    repeated: bool,
    map_key: Option<String>,
}

/// In-memory name → descriptor table
#[derive(Debug, Default, Clone)]
pub struct DescriptorRegistry {
    types: HashMap<String, Arc<TypeDescriptor>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor and every type nested in it
    pub fn register(&mut self, descriptor: Arc<TypeDescriptor>) {
        for field in descriptor.fields() {
            if let Some(nested) = field.kind().message_type() {
                if !self.types.contains_key(nested.name()) {
                    self.register(Arc::clone(nested));
                }
            }
        }
        self.types.insert(descriptor.name().to_string(), descriptor);
    }

    /// Load a TOML type catalog from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse a TOML type catalog
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let catalog: CatalogFile =
            toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;

        let mut entries: HashMap<&str, &TypeEntry> = HashMap::new();
        for entry in &catalog.types {
            if entries.insert(entry.name.as_str(), entry).is_some() {
                return Err(Error::Schema(format!("Type {} declared twice", entry.name)));
            }
        }

        let mut resolver = CatalogResolver {
            entries: &entries,
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        };
        for entry in &catalog.types {
            resolver.resolve(&entry.name)?;
        }

        Ok(Self {
            types: resolver.resolved,
        })
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl DescriptorProvider for DescriptorRegistry {
    fn descriptor(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).cloned()
    }
}

/// Depth-first resolution of catalog entries; nested types are built first.
struct CatalogResolver<'a> {
    entries: &'a HashMap<&'a str, &'a TypeEntry>,
    resolved: HashMap<String, Arc<TypeDescriptor>>,
    in_progress: Vec<String>,
}

impl<'a> CatalogResolver<'a> {
    fn resolve(&mut self, name: &str) -> Result<Arc<TypeDescriptor>> {
        if let Some(done) = self.resolved.get(name) {
            return Ok(Arc::clone(done));
        }
        if self.in_progress.iter().any(|n| n == name) {
            let mut path = self.in_progress.clone();
            path.push(name.to_string());
            return Err(Error::Cycle(path.join(" -> ")));
        }
        let entry = *self
            .entries
            .get(name)
            .ok_or_else(|| Error::Schema(format!("Unknown type: {}", name)))?;

        self.in_progress.push(name.to_string());
        let mut fields = Vec::with_capacity(entry.fields.len());
        for field in &entry.fields {
            fields.push(self.resolve_field(name, field)?);
        }
        self.in_progress.pop();

        let descriptor = TypeDescriptor::new(name, fields)?;
        self.resolved.insert(name.to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    fn resolve_field(&mut self, owner: &str, field: &FieldEntry) -> Result<FieldDescriptor> {
        let kind = match FieldKind::from_str(&field.kind) {
            Ok(scalar) => scalar,
            Err(_) => FieldKind::Message(self.resolve(&field.kind)?),
        };

        let descriptor = match (&field.map_key, field.repeated) {
            (Some(_), true) => {
                return Err(Error::Schema(format!(
                    "{}.{} cannot be both repeated and a map",
                    owner, field.name
                )));
            }
            (Some(key), false) => FieldDescriptor::map(&field.name, FieldKind::from_str(key)?, kind),
            (None, true) => FieldDescriptor::repeated(&field.name, kind),
            (None, false) => FieldDescriptor::singular(&field.name, kind),
        };

        Ok(if field.key { descriptor.key() } else { descriptor })
    }
}
