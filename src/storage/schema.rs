//! Database schema definitions
//!
//! Naming conventions are part of the on-disk contract:
//! - main table: the type name
//! - column for singular field `f`: `field_f`
//! - side table for field `f` of type `T`: `field_table_T_f`
//! - map side table columns: `field_key`, `field_value`, `owner_id`
//! - repeated side table columns: `field_<name>`, `owner_id`

use crate::descriptor::{FieldDescriptor, FieldKind, TypeDescriptor};

/// Row identity column, assigned by SQLite
pub const ID_COLUMN: &str = "id";

/// Side table column linking an element to its owner row
pub const OWNER_COLUMN: &str = "owner_id";

/// Sub-field names of a map entry
pub const MAP_KEY_NAME: &str = "key";
pub const MAP_VALUE_NAME: &str = "value";

/// SQL to list every table in the database
pub const LIST_TABLES: &str = "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name";

/// SQL to count every table in the database
pub const COUNT_TABLES: &str = "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'";

/// SQL to test whether a table carries any UNIQUE constraint
pub const HAS_UNIQUE_CONSTRAINT: &str =
    "SELECT EXISTS(SELECT 1 FROM pragma_index_list(?1) WHERE \"unique\" = 1 AND origin = 'u')";

/// SQL to test for one table
pub const TABLE_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)";

pub fn column_name(field_name: &str) -> String {
    format!("field_{}", field_name)
}

pub fn side_table_name(owner: &TypeDescriptor, field: &FieldDescriptor) -> String {
    format!("field_table_{}_{}", owner.name(), field.name())
}

/// Column holding the element of a repeated field, or the value of a map entry
pub fn side_value_column(field: &FieldDescriptor) -> String {
    if field.map_key().is_some() {
        column_name(MAP_VALUE_NAME)
    } else {
        column_name(field.name())
    }
}

pub fn side_key_column() -> String {
    column_name(MAP_KEY_NAME)
}

/// Declared SQL type for a column of the given kind
pub fn sql_type(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Int32
        | FieldKind::Int64
        | FieldKind::UInt32
        | FieldKind::Enum
        | FieldKind::Message(_) => "INTEGER",
        // decimal text keeps the full u64 range
        FieldKind::UInt64 => "TEXT",
        FieldKind::Float | FieldKind::Double => "REAL",
        FieldKind::Bool => "BOOLEAN",
        FieldKind::String => "TEXT",
    }
}

/// Accumulates the parts of one `CREATE TABLE` statement
#[derive(Debug, Default)]
pub struct TableDefinition {
    name: String,
    columns: Vec<String>,
    constraints: Vec<String>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn column(&mut self, name: &str, sql_type: &str) {
        self.columns.push(format!("{} {}", name, sql_type));
    }

    pub fn unique(&mut self, columns: &[String]) {
        self.constraints.push(format!("UNIQUE({})", columns.join(", ")));
    }

    pub fn foreign_key(&mut self, column: &str, table: &str) {
        self.constraints
            .push(format!("FOREIGN KEY({}) REFERENCES {}({})", column, table, ID_COLUMN));
    }

    pub fn to_sql(&self) -> String {
        let mut parts = vec![format!("{} INTEGER PRIMARY KEY", ID_COLUMN)];
        parts.extend(self.columns.iter().cloned());
        parts.extend(self.constraints.iter().cloned());
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.name, parts.join(", "))
    }
}

/// Trigger deleting the nested row referenced by `column` when an owner row goes away
pub fn cascade_trigger(owner_table: &str, field_name: &str, column: &str, nested_table: &str) -> String {
    format!(
        "CREATE TRIGGER IF NOT EXISTS on_delete_{owner}_{field} AFTER DELETE ON {owner} \
         BEGIN DELETE FROM {nested} WHERE {id} = old.{column}; END",
        owner = owner_table,
        field = field_name,
        nested = nested_table,
        id = ID_COLUMN,
        column = column,
    )
}

/// Trigger deleting an owner's side table rows when the owner row goes away
pub fn side_table_trigger(owner_table: &str, side_table: &str) -> String {
    format!(
        "CREATE TRIGGER IF NOT EXISTS on_delete_{side} AFTER DELETE ON {owner} \
         BEGIN DELETE FROM {side} WHERE {owner_col} = old.{id}; END",
        owner = owner_table,
        side = side_table,
        owner_col = OWNER_COLUMN,
        id = ID_COLUMN,
    )
}
