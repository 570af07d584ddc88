//! Recordstore CLI - store JSON records of catalog-described types in SQLite

use anyhow::Context;
use clap::{Parser, Subcommand};
use recordstore::config::{self, StoreConfig};
use recordstore::json;
use recordstore::ui;
use recordstore::{DescriptorProvider, TypeDescriptor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "recordstore")]
#[command(version = "0.0.1")]
#[command(about = "Reflection-driven relational persistence - records in, tables out")]
#[command(long_about = r#"
Recordstore derives a SQLite schema from a catalog of record types and
stores nested records as rows, side tables and foreign keys.

Example usage:
  recordstore --types types.toml init Item
  recordstore --types types.toml put Item '{"pos": {"x": 4, "y": 8}, "data": "a"}'
  recordstore --types types.toml get Item pos '{"x": 4, "y": 8}'
  recordstore tables
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (default: recordstore.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the TOML type catalog
    #[arg(short, long, global = true)]
    types: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with the current settings
    Config {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// List tables and their row counts
    Tables,

    /// Create the tables for a type
    Init {
        /// Type name from the catalog
        type_name: String,
    },

    /// Store a record given as a JSON object (upsert unless --insert)
    Put {
        type_name: String,
        json: String,

        /// Fail on a key collision instead of updating the existing row
        #[arg(long)]
        insert: bool,
    },

    /// Print every record of a type as JSON, one per line
    Dump { type_name: String },

    /// Look up a record by one of its key fields
    Get {
        type_name: String,
        field: String,
        /// Key value as JSON, e.g. '"abc"', '42' or '{"x": 1}'
        key: String,
    },

    /// Delete the records whose key field matches
    Delete {
        type_name: String,
        field: String,
        /// Key value as JSON
        key: String,
    },

    /// Delete every record of a type
    Clear { type_name: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let settings = config::load_config(Some(&config_path))?
        .unwrap_or_default()
        .with_overrides(cli.database.clone(), cli.types.clone());

    match cli.command {
        Commands::Config { force } => {
            let config = StoreConfig {
                database: Some(settings.database_path().display().to_string()),
                ..settings
            };
            config::write_config(&config_path, &config, force)?;
            println!("Wrote {}", config_path.display());
        }

        Commands::Tables => {
            let store = settings.open_store()?;
            let stats = store.stats()?;
            if stats.tables.is_empty() {
                println!("No tables in {}", settings.database_path().display());
            } else {
                println!("{}", ui::stats_table(&stats));
            }
        }

        Commands::Init { type_name } => {
            let descriptor = resolve_type(&settings, &type_name)?;
            let mut store = settings.open_store()?;
            store.ensure_schema(&descriptor)?;
            println!("Tables ready for {} ({} total)", type_name, store.table_count()?);
        }

        Commands::Put { type_name, json, insert } => {
            let descriptor = resolve_type(&settings, &type_name)?;
            let value: serde_json::Value = serde_json::from_str(&json).context("record is not valid JSON")?;
            let record = json::from_json(&descriptor, &value)?;

            let mut store = settings.open_store()?;
            let id = if insert {
                store.insert(&record)?
            } else {
                store.write(&record)?
            };
            println!("{} row {}", type_name, id);
        }

        Commands::Dump { type_name } => {
            let descriptor = resolve_type(&settings, &type_name)?;
            let store = settings.open_store()?;
            for record in store.get_all(&descriptor)? {
                println!("{}", json::to_json(&record?));
            }
        }

        Commands::Get { type_name, field, key } => {
            let descriptor = resolve_type(&settings, &type_name)?;
            let key = parse_key(&descriptor, &field, &key)?;
            let store = settings.open_store()?;
            match store.find_by_key(&descriptor, &field, &key)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&json::to_json(&record))?),
                None => println!("No {} with {} = {}", type_name, field, key),
            }
        }

        Commands::Delete { type_name, field, key } => {
            let descriptor = resolve_type(&settings, &type_name)?;
            let key = parse_key(&descriptor, &field, &key)?;
            let mut store = settings.open_store()?;
            let deleted = store.delete_by_key(&descriptor, &field, &key)?;
            println!("Deleted {} {} row(s)", deleted, type_name);
        }

        Commands::Clear { type_name } => {
            let descriptor = resolve_type(&settings, &type_name)?;
            let mut store = settings.open_store()?;
            let deleted = store.clear_table(&descriptor)?;
            println!("Cleared {} {} row(s)", deleted, type_name);
        }
    }

    Ok(())
}

fn resolve_type(settings: &StoreConfig, name: &str) -> anyhow::Result<Arc<TypeDescriptor>> {
    Ok(settings.load_registry()?.require(name)?)
}

fn parse_key(descriptor: &TypeDescriptor, field: &str, key: &str) -> anyhow::Result<recordstore::Value> {
    let (_, field) = descriptor.require_field(field)?;
    let json: serde_json::Value = serde_json::from_str(key).context("key is not valid JSON")?;
    Ok(json::value_from_json(field.kind(), &json)?)
}
