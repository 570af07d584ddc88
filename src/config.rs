//! CLI settings: where the database and type catalog live, and how
//! deletes treat side tables.
//!
//! Relative paths in a config file are taken relative to the file's own
//! directory; paths given on the command line are used as given.

use crate::registry::DescriptorRegistry;
use crate::storage::{RecordStore, SideTableCascade, StoreOptions};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StoreConfig {
    pub database: Option<String>,
    pub types: Option<String>,
    #[serde(default)]
    pub side_table_cascade: SideTableCascade,
}

impl StoreConfig {
    /// Command-line paths win over the ones from the file
    pub fn with_overrides(mut self, database: Option<PathBuf>, types: Option<PathBuf>) -> Self {
        if let Some(database) = database {
            self.database = Some(database.display().to_string());
        }
        if let Some(types) = types {
            self.types = Some(types.display().to_string());
        }
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_database_path_in(Path::new(".")))
    }

    pub fn types_path(&self) -> Option<PathBuf> {
        self.types.as_ref().map(PathBuf::from)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            side_table_cascade: self.side_table_cascade,
        }
    }

    /// Open the configured database, creating its directory if needed
    pub fn open_store(&self) -> anyhow::Result<RecordStore> {
        let path = self.database_path();
        ensure_db_dir(&path)?;
        RecordStore::open_with(&path, self.store_options())
            .with_context(|| format!("failed to open {}", path.display()))
    }

    /// Load the configured type catalog
    pub fn load_registry(&self) -> anyhow::Result<DescriptorRegistry> {
        let Some(path) = self.types_path() else {
            anyhow::bail!("no type catalog configured (pass --types or set `types` in the config)");
        };
        DescriptorRegistry::load(&path).with_context(|| format!("failed to load type catalog {}", path.display()))
    }

    fn relative_to(mut self, dir: &Path) -> Self {
        let rebase = |p: String| {
            if Path::new(&p).is_absolute() {
                p
            } else {
                dir.join(p).display().to_string()
            }
        };
        self.database = self.database.map(rebase);
        self.types = self.types.map(rebase);
        self
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("recordstore.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".recordstore").join("records.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<StoreConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let config: StoreConfig = toml::from_str(&contents).with_context(|| format!("invalid config {}", path.display()))?;
    let dir = path.parent().unwrap_or(Path::new(""));
    Ok(Some(config.relative_to(dir)))
}

pub fn write_config(path: &Path, config: &StoreConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
