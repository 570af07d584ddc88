//! SQLite-backed record store

use std::path::Path;
use std::sync::Arc;
use rusqlite::Connection;
use crate::descriptor::TypeDescriptor;
use crate::record::{Record, Value};
use crate::Result;
use super::catalog::TypeCatalog;
use super::delete::DeletionCoordinator;
use super::identity::{require_key_field, IdentityResolver};
use super::marshal::RecordMarshaler;
use super::synthesizer::SchemaSynthesizer;
use super::unmarshal::{RecordUnmarshaler, Records};
use super::{RowId, StoreOptions};

/// Owns the connection and the set of types whose tables are known to exist
pub struct RecordStore {
    conn: Connection,
    catalog: TypeCatalog,
    options: StoreOptions,
}

impl RecordStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    pub fn open_with(path: &Path, options: StoreOptions) -> Result<Self> {
        let conn = Connection::open(path)?;
        tracing::debug!("Opened record store at {}", path.display());
        Ok(Self::with_connection(conn, options))
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(StoreOptions::default())
    }

    pub fn open_in_memory_with(options: StoreOptions) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::with_connection(conn, options))
    }

    fn with_connection(conn: Connection, options: StoreOptions) -> Self {
        Self {
            conn,
            catalog: TypeCatalog::new(),
            options,
        }
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    // ========== Schema ==========

    /// Create the tables for a type and everything it references
    pub fn ensure_schema(&mut self, descriptor: &TypeDescriptor) -> Result<()> {
        self.transact(descriptor, |_| Ok(()))
    }

    /// Number of tables in the database
    pub fn table_count(&self) -> Result<usize> {
        TypeCatalog::table_count(&self.conn)
    }

    /// Names of all tables, sorted
    pub fn tables(&self) -> Result<Vec<String>> {
        TypeCatalog::tables(&self.conn)
    }

    // ========== Writes ==========

    /// Insert a record graph; fails with `Error::Conflict` on any unique constraint hit
    pub fn insert(&mut self, record: &Record) -> Result<RowId> {
        self.transact(record.descriptor(), |conn| RecordMarshaler::new(conn).insert(record))
    }

    /// Insert a record graph, updating the non-key columns of a row with the same key
    pub fn write(&mut self, record: &Record) -> Result<RowId> {
        self.transact(record.descriptor(), |conn| RecordMarshaler::new(conn).write(record))
    }

    pub fn delete_by_key(&mut self, descriptor: &TypeDescriptor, field: &str, key: &Value) -> Result<usize> {
        self.transact(descriptor, |conn| {
            DeletionCoordinator::new(conn).delete_by_key(descriptor, field, key)
        })
    }

    pub fn delete_record(&mut self, record: &Record) -> Result<usize> {
        self.transact(record.descriptor(), |conn| {
            DeletionCoordinator::new(conn).delete_record(record)
        })
    }

    pub fn clear_table(&mut self, descriptor: &TypeDescriptor) -> Result<usize> {
        self.transact(descriptor, |conn| DeletionCoordinator::new(conn).clear_table(descriptor))
    }

    // ========== Reads ==========

    /// Row id of the stored record with the same identity as `record`
    pub fn find_row_id(&self, record: &Record) -> Result<Option<RowId>> {
        if !self.has_table(record.descriptor())? {
            return Ok(None);
        }
        IdentityResolver::new(&self.conn).find_row_id(record)
    }

    /// The record whose key `field` equals `key`
    pub fn find_by_key(
        &self,
        descriptor: &Arc<TypeDescriptor>,
        field: &str,
        key: &Value,
    ) -> Result<Option<Record>> {
        if !self.has_table(descriptor)? {
            require_key_field(descriptor, field, key)?;
            return Ok(None);
        }

        match IdentityResolver::new(&self.conn).find_by_key(descriptor, field, key)? {
            Some(id) => RecordUnmarshaler::new(&self.conn).fetch(descriptor, id).map(Some),
            None => Ok(None),
        }
    }

    /// Lazy scan over all records of a type, in insertion order
    pub fn get_all(&self, descriptor: &Arc<TypeDescriptor>) -> Result<Records<'_>> {
        if !self.has_table(descriptor)? {
            return Ok(Records::empty(&self.conn, Arc::clone(descriptor)));
        }
        Ok(Records::new(&self.conn, Arc::clone(descriptor)))
    }

    pub fn get_all_vec(&self, descriptor: &Arc<TypeDescriptor>) -> Result<Vec<Record>> {
        self.get_all(descriptor)?.collect()
    }

    /// All set values of one singular field, in insertion order
    pub fn column_values(&self, descriptor: &TypeDescriptor, field: &str) -> Result<Vec<Value>> {
        if !self.has_table(descriptor)? {
            descriptor.require_field(field)?;
            return Ok(Vec::new());
        }
        RecordUnmarshaler::new(&self.conn).column_values(descriptor, field)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let mut tables = Vec::new();
        for name in self.tables()? {
            let rows = TypeCatalog::row_count(&self.conn, &name)?;
            tables.push(TableStats { name, rows });
        }
        Ok(StoreStats { tables })
    }

    fn has_table(&self, descriptor: &TypeDescriptor) -> Result<bool> {
        if self.catalog.is_synthesized(descriptor.name()) {
            return Ok(true);
        }
        TypeCatalog::table_exists(&self.conn, descriptor.name())
    }

    /// Run `op` in one transaction, after making sure the type's tables exist
    fn transact<T>(
        &mut self,
        descriptor: &TypeDescriptor,
        op: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let tx = self.conn.transaction()?;

        let mut synthesizer = SchemaSynthesizer::new(&tx, &self.catalog, &self.options);
        synthesizer.ensure(descriptor, false)?;
        let created = synthesizer.into_created();

        let out = op(&tx)?;
        tx.commit()?;

        if !created.is_empty() {
            tracing::info!("Created tables for {}", created.join(", "));
        }
        self.catalog.remember(created);
        Ok(out)
    }
}

/// Row counts per table
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub tables: Vec<TableStats>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStats {
    pub name: String,
    pub rows: usize,
}

impl StoreStats {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for table in &self.tables {
            writeln!(f, "  {}: {}", table.name, table.rows)?;
        }
        write!(f, "  Total rows: {}", self.total_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, FieldKind};
    use crate::storage::SideTableCascade;
    use crate::Error;

    fn pos_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::builder("Pos")
            .field(FieldDescriptor::singular("x", FieldKind::Int32).key())
            .field(FieldDescriptor::singular("y", FieldKind::Int32))
            .build()
            .unwrap()
    }

    fn item_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::builder("Item")
            .field(FieldDescriptor::singular("pos", FieldKind::Message(pos_type())).key())
            .field(FieldDescriptor::singular("data", FieldKind::String))
            .build()
            .unwrap()
    }

    fn pos(x: i32, y: i32) -> Record {
        Record::new(pos_type()).with("x", x).unwrap().with("y", y).unwrap()
    }

    fn item(item: &Arc<TypeDescriptor>, x: i32, y: i32, data: &str) -> Record {
        Record::new(Arc::clone(item))
            .with("pos", pos(x, y))
            .unwrap()
            .with("data", data)
            .unwrap()
    }

    fn bag_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::builder("Bag")
            .field(FieldDescriptor::repeated("values", FieldKind::Int32))
            .build()
            .unwrap()
    }

    fn bag(values: &[i32]) -> Record {
        let mut record = Record::new(bag_type());
        for v in values {
            record.push("values", *v).unwrap();
        }
        record
    }

    fn everything_type() -> Arc<TypeDescriptor> {
        let inner = TypeDescriptor::builder("Inner")
            .field(FieldDescriptor::singular("label", FieldKind::String))
            .build()
            .unwrap();
        TypeDescriptor::builder("Everything")
            .field(FieldDescriptor::singular("i32", FieldKind::Int32))
            .field(FieldDescriptor::singular("i64", FieldKind::Int64))
            .field(FieldDescriptor::singular("u32", FieldKind::UInt32))
            .field(FieldDescriptor::singular("u64", FieldKind::UInt64))
            .field(FieldDescriptor::singular("f32", FieldKind::Float))
            .field(FieldDescriptor::singular("f64", FieldKind::Double))
            .field(FieldDescriptor::singular("flag", FieldKind::Bool))
            .field(FieldDescriptor::singular("text", FieldKind::String))
            .field(FieldDescriptor::singular("state", FieldKind::Enum))
            .field(FieldDescriptor::singular("inner", FieldKind::Message(Arc::clone(&inner))))
            .field(FieldDescriptor::repeated("children", FieldKind::Message(Arc::clone(&inner))))
            .field(FieldDescriptor::map("scores", FieldKind::String, FieldKind::Double))
            .field(FieldDescriptor::map("by_id", FieldKind::Int64, FieldKind::Message(inner)))
            .build()
            .unwrap()
    }

    fn inner(descriptor: &Arc<TypeDescriptor>, label: &str) -> Record {
        let inner = descriptor.field("inner").and_then(|f| f.kind().message_type()).unwrap();
        Record::new(Arc::clone(inner)).with("label", label).unwrap()
    }

    #[test]
    fn test_round_trip_every_kind() {
        let descriptor = everything_type();
        let mut record = Record::new(Arc::clone(&descriptor))
            .with("i32", -5)
            .unwrap()
            .with("i64", i64::MIN)
            .unwrap()
            .with("u32", u32::MAX)
            .unwrap()
            .with("u64", u64::MAX)
            .unwrap()
            .with("f32", 1.5f32)
            .unwrap()
            .with("f64", -2.25)
            .unwrap()
            .with("flag", true)
            .unwrap()
            .with("text", "hello")
            .unwrap()
            .with("state", Value::Enum(3))
            .unwrap()
            .with("inner", inner(&descriptor, "solo"))
            .unwrap();
        record.push("children", inner(&descriptor, "first")).unwrap();
        record.push("children", inner(&descriptor, "second")).unwrap();
        record.insert_entry("scores", "a", 0.5).unwrap();
        record.insert_entry("scores", "b", 1.0).unwrap();
        record.insert_entry("by_id", 7i64, inner(&descriptor, "seven")).unwrap();

        let mut store = RecordStore::open_in_memory().unwrap();
        store.insert(&record).unwrap();

        let all = store.get_all_vec(&descriptor).unwrap();
        assert_eq!(all, vec![record]);
    }

    #[test]
    fn test_unset_fields_round_trip() {
        let descriptor = everything_type();
        let record = Record::new(Arc::clone(&descriptor)).with("text", "only").unwrap();

        let mut store = RecordStore::open_in_memory().unwrap();
        store.insert(&record).unwrap();

        let loaded = store.get_all_vec(&descriptor).unwrap().remove(0);
        assert_eq!(loaded, record);
        assert!(!loaded.is_set("inner"));
        assert!(!loaded.is_set("u64"));
    }

    #[test]
    fn test_idempotent_schema() {
        let mut store = RecordStore::open_in_memory().unwrap();
        store.ensure_schema(&item_type()).unwrap();
        let once = store.table_count().unwrap();
        assert_eq!(once, 2);

        store.ensure_schema(&item_type()).unwrap();
        assert_eq!(store.table_count().unwrap(), once);
        assert_eq!(store.tables().unwrap(), vec!["Item", "Pos"]);
    }

    #[test]
    fn test_key_uniqueness() {
        let descriptor = pos_type();
        let mut store = RecordStore::open_in_memory().unwrap();
        store.insert(&pos(1, 2)).unwrap();
        let err = store.insert(&pos(1, 3)).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(err.is_conflict());
        assert_eq!(store.get_all_vec(&descriptor).unwrap().len(), 1);
    }

    #[test]
    fn test_upsert() {
        let descriptor = pos_type();
        let mut store = RecordStore::open_in_memory().unwrap();
        let first = store.write(&pos(1, 2)).unwrap();
        let second = store.write(&pos(1, 9)).unwrap();
        assert_eq!(first, second);

        let all = store.get_all_vec(&descriptor).unwrap();
        assert_eq!(all, vec![pos(1, 9)]);
    }

    #[test]
    fn test_nested_key_scenario() {
        let descriptor = item_type();
        let mut store = RecordStore::open_in_memory().unwrap();
        store.insert(&item(&descriptor, 4, 8, "a")).unwrap();

        let err = store.insert(&item(&descriptor, 4, 8, "b")).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        store.write(&item(&descriptor, 4, 8, "b")).unwrap();
        let found = store
            .find_by_key(&descriptor, "pos", &Value::Message(pos(4, 8)))
            .unwrap()
            .unwrap();
        assert_eq!(found.get("data"), Some(&Value::from("b")));
        assert_eq!(store.get_all_vec(&descriptor).unwrap().len(), 1);
        assert_eq!(store.stats().unwrap().total_rows(), 2);
    }

    fn owner_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::builder("Owner")
            .field(FieldDescriptor::singular("name", FieldKind::String).key())
            .field(FieldDescriptor::singular("pos", FieldKind::Message(pos_type())))
            .build()
            .unwrap()
    }

    fn owner(owner: &Arc<TypeDescriptor>, name: &str, x: i32, y: i32) -> Record {
        Record::new(Arc::clone(owner))
            .with("name", name)
            .unwrap()
            .with("pos", pos(x, y))
            .unwrap()
    }

    #[test]
    fn test_insert_does_not_overwrite_keyed_nested() {
        let descriptor = owner_type();
        let mut store = RecordStore::open_in_memory().unwrap();
        store.insert(&owner(&descriptor, "a", 4, 8)).unwrap();

        let err = store.insert(&owner(&descriptor, "b", 4, 9)).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let a = store
            .find_by_key(&descriptor, "name", &Value::from("a"))
            .unwrap()
            .unwrap();
        assert_eq!(a.get("pos"), Some(&Value::Message(pos(4, 8))));
        assert!(store
            .find_by_key(&descriptor, "name", &Value::from("b"))
            .unwrap()
            .is_none());
        assert_eq!(store.get_all_vec(&pos_type()).unwrap(), vec![pos(4, 8)]);
    }

    #[test]
    fn test_write_refreshes_keyed_nested() {
        let descriptor = owner_type();
        let mut store = RecordStore::open_in_memory().unwrap();
        store.write(&owner(&descriptor, "a", 4, 8)).unwrap();
        store.write(&owner(&descriptor, "b", 4, 9)).unwrap();

        assert_eq!(store.get_all_vec(&pos_type()).unwrap(), vec![pos(4, 9)]);
        let a = store
            .find_by_key(&descriptor, "name", &Value::from("a"))
            .unwrap()
            .unwrap();
        assert_eq!(a.get("pos"), Some(&Value::Message(pos(4, 9))));
        assert_eq!(store.get_all_vec(&descriptor).unwrap().len(), 2);
    }

    #[test]
    fn test_key_fields_are_independently_unique() {
        let descriptor = TypeDescriptor::builder("Pair")
            .field(FieldDescriptor::singular("a", FieldKind::Int32).key())
            .field(FieldDescriptor::singular("b", FieldKind::Int32).key())
            .build()
            .unwrap();
        let pair = |a: i32, b: i32| {
            Record::new(Arc::clone(&descriptor))
                .with("a", a)
                .unwrap()
                .with("b", b)
                .unwrap()
        };

        let mut store = RecordStore::open_in_memory().unwrap();
        store.insert(&pair(1, 1)).unwrap();
        assert!(matches!(store.insert(&pair(1, 2)), Err(Error::Conflict(_))));
        assert!(matches!(store.insert(&pair(2, 1)), Err(Error::Conflict(_))));
        store.insert(&pair(2, 2)).unwrap();
        assert_eq!(store.get_all_vec(&descriptor).unwrap(), vec![pair(1, 1), pair(2, 2)]);
    }

    #[test]
    fn test_content_addressed_rows_shared_through_lists() {
        let point = TypeDescriptor::builder("Point")
            .field(FieldDescriptor::singular("x", FieldKind::Int32))
            .field(FieldDescriptor::singular("y", FieldKind::Int32))
            .build()
            .unwrap();
        let route = TypeDescriptor::builder("Route")
            .field(FieldDescriptor::singular("from", FieldKind::Message(Arc::clone(&point))).key())
            .build()
            .unwrap();
        let trip = TypeDescriptor::builder("Trip")
            .field(FieldDescriptor::singular("name", FieldKind::String))
            .field(FieldDescriptor::repeated("stops", FieldKind::Message(Arc::clone(&point))))
            .build()
            .unwrap();
        let at = |x: i32, y: i32| Record::new(Arc::clone(&point)).with("x", x).unwrap().with("y", y).unwrap();

        let mut store = RecordStore::open_in_memory().unwrap();
        store
            .insert(&Record::new(Arc::clone(&route)).with("from", at(0, 0)).unwrap())
            .unwrap();

        let mut record = Record::new(Arc::clone(&trip)).with("name", "loop").unwrap();
        record.push("stops", at(0, 0)).unwrap();
        record.push("stops", at(1, 1)).unwrap();
        store.insert(&record).unwrap();

        assert_eq!(store.get_all_vec(&point).unwrap(), vec![at(0, 0), at(1, 1)]);
        assert_eq!(store.get_all_vec(&trip).unwrap(), vec![record]);
    }

    #[test]
    fn test_content_addressing() {
        let point = TypeDescriptor::builder("Point")
            .field(FieldDescriptor::singular("x", FieldKind::Int32))
            .field(FieldDescriptor::singular("y", FieldKind::Int32))
            .build()
            .unwrap();
        let route = TypeDescriptor::builder("Route")
            .field(FieldDescriptor::singular("from", FieldKind::Message(Arc::clone(&point))).key())
            .field(FieldDescriptor::singular("name", FieldKind::String))
            .build()
            .unwrap();
        let waypoint = TypeDescriptor::builder("Waypoint")
            .field(FieldDescriptor::singular("at", FieldKind::Message(Arc::clone(&point))).key())
            .build()
            .unwrap();

        let origin = || Record::new(Arc::clone(&point)).with("x", 0).unwrap().with("y", 0).unwrap();
        let mut store = RecordStore::open_in_memory().unwrap();
        store
            .insert(&Record::new(Arc::clone(&route)).with("from", origin()).unwrap())
            .unwrap();
        store
            .insert(&Record::new(Arc::clone(&waypoint)).with("at", origin()).unwrap())
            .unwrap();

        assert_eq!(store.get_all_vec(&point).unwrap().len(), 1);
        let stored = store.column_values(&route, "from").unwrap();
        assert_eq!(stored, vec![Value::Message(origin())]);
        assert_eq!(store.find_row_id(&origin()).unwrap(), Some(1));
    }

    #[test]
    fn test_bag_scenario() {
        let descriptor = bag_type();
        let mut store = RecordStore::open_in_memory().unwrap();
        store.write(&bag(&[1, 2])).unwrap();

        let all = store.get_all_vec(&descriptor).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(
            all[0].get("values"),
            Some(&Value::List(vec![Value::Int32(1), Value::Int32(2)]))
        );

        let err = store.write(&bag(&[1, 1])).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_failed_write_leaves_no_partial_state() {
        let descriptor = bag_type();
        let mut store = RecordStore::open_in_memory().unwrap();
        store.write(&bag(&[1, 1])).unwrap_err();

        assert!(store.get_all_vec(&descriptor).unwrap().is_empty());
        let side_rows = store
            .stats()
            .unwrap()
            .tables
            .into_iter()
            .find(|t| t.name == "field_table_Bag_values")
            .map(|t| t.rows);
        assert_eq!(side_rows.unwrap_or(0), 0);

        // the rolled-back schema is created again on the next write
        store.write(&bag(&[3])).unwrap();
        assert_eq!(store.get_all_vec(&descriptor).unwrap().len(), 1);
    }

    #[test]
    fn test_cascade_delete_orphans_side_rows() {
        let inner = TypeDescriptor::builder("Leaf")
            .field(FieldDescriptor::singular("v", FieldKind::Int32))
            .build()
            .unwrap();
        let owner = TypeDescriptor::builder("Tree")
            .field(FieldDescriptor::singular("name", FieldKind::String).key())
            .field(FieldDescriptor::singular("leaf", FieldKind::Message(Arc::clone(&inner))))
            .field(FieldDescriptor::repeated("tags", FieldKind::String))
            .build()
            .unwrap();
        let mut record = Record::new(Arc::clone(&owner))
            .with("name", "oak")
            .unwrap()
            .with("leaf", Record::new(Arc::clone(&inner)).with("v", 1).unwrap())
            .unwrap();
        record.push("tags", "tall").unwrap();

        let mut store = RecordStore::open_in_memory().unwrap();
        store.insert(&record).unwrap();
        assert_eq!(store.delete_by_key(&owner, "name", &Value::from("oak")).unwrap(), 1);

        let rows = |store: &RecordStore, table: &str| {
            store
                .stats()
                .unwrap()
                .tables
                .into_iter()
                .find(|t| t.name == table)
                .map(|t| t.rows)
                .unwrap()
        };
        assert_eq!(rows(&store, "Tree"), 0);
        assert_eq!(rows(&store, "Leaf"), 0);
        assert_eq!(rows(&store, "field_table_Tree_tags"), 1);

        let options = StoreOptions {
            side_table_cascade: SideTableCascade::Delete,
        };
        let mut store = RecordStore::open_in_memory_with(options).unwrap();
        store.insert(&record).unwrap();
        assert_eq!(store.delete_record(&record).unwrap(), 1);
        assert_eq!(rows(&store, "field_table_Tree_tags"), 0);
    }

    #[test]
    fn test_lookups_on_missing_tables() {
        let descriptor = item_type();
        let store = RecordStore::open_in_memory().unwrap();
        assert!(store.get_all_vec(&descriptor).unwrap().is_empty());
        assert!(store.column_values(&descriptor, "data").unwrap().is_empty());
        assert_eq!(store.find_row_id(&pos(1, 1)).unwrap(), None);
        assert!(store
            .find_by_key(&descriptor, "pos", &Value::Message(pos(1, 1)))
            .unwrap()
            .is_none());
        assert!(matches!(
            store.find_by_key(&descriptor, "data", &Value::from("a")),
            Err(Error::NotAKey { .. })
        ));
        assert_eq!(store.table_count().unwrap(), 0);
    }

    #[test]
    fn test_delete_by_value_requires_keys() {
        let descriptor = bag_type();
        let mut store = RecordStore::open_in_memory().unwrap();
        store.write(&bag(&[1])).unwrap();
        let err = store.delete_record(&bag(&[1])).unwrap_err();
        assert!(matches!(err, Error::MissingKey(_)));
        assert_eq!(store.clear_table(&descriptor).unwrap(), 1);
        assert!(store.get_all_vec(&descriptor).unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");
        let descriptor = item_type();
        {
            let mut store = RecordStore::open(&path).unwrap();
            store.insert(&item(&descriptor, 1, 2, "kept")).unwrap();
        }

        let mut store = RecordStore::open(&path).unwrap();
        let all = store.get_all_vec(&descriptor).unwrap();
        assert_eq!(all, vec![item(&descriptor, 1, 2, "kept")]);

        // tables already on disk are reused, not recreated
        store.write(&item(&descriptor, 1, 2, "updated")).unwrap();
        assert_eq!(store.table_count().unwrap(), 2);
        assert_eq!(store.column_values(&descriptor, "data").unwrap(), vec![Value::from("updated")]);
    }
}
