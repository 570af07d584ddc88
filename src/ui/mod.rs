pub mod table;

pub use table::stats_table;
