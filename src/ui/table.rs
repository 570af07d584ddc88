use crate::storage::StoreStats;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Table")]
    pub table: String,
    #[tabled(rename = "Rows")]
    pub rows: usize,
}

/// Render per-table row counts; empty when the database has no tables
pub fn stats_table(stats: &StoreStats) -> String {
    if stats.tables.is_empty() {
        return String::new();
    }

    let rows: Vec<TableRow> = stats
        .tables
        .iter()
        .map(|t| TableRow {
            table: t.name.clone(),
            rows: t.rows,
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}
