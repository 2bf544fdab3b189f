//! Database configuration
//!
//! Controls where the catalog lives, how wide B+Tree nodes are, and whether
//! table rows are mirrored into per-table record files.

use crate::error::{MiniSqlError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default B+Tree order (max children per internal node)
pub const DEFAULT_INDEX_ORDER: usize = 4;

/// Default catalog snapshot file name
pub const DEFAULT_CATALOG_FILE: &str = "catalog.bin";

/// Per-table record file configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowStorageConfig {
    /// Directory holding one record file per table
    pub dir: PathBuf,

    /// Record file extension (without the dot)
    pub extension: String,
}

impl RowStorageConfig {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            extension: "jsonl".to_string(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DBConfig {
    /// Data directory. `None` keeps the catalog purely in memory.
    pub data_dir: Option<PathBuf>,

    /// Catalog snapshot file name inside `data_dir`
    pub catalog_file: String,

    /// B+Tree order used for every index (>= 3)
    pub index_order: usize,

    /// Persist the full catalog after every mutating statement
    ///
    /// 注意：每次写入都是全量覆盖，没有增量写路径。
    pub persist_on_write: bool,

    /// Continue with an empty catalog when the snapshot is corrupt
    /// (logged as a warning) instead of failing `Database::open`
    pub recover_corrupt_catalog: bool,

    /// Optional per-table record files mirrored from the catalog
    pub row_storage: Option<RowStorageConfig>,
}

impl Default for DBConfig {
    fn default() -> Self {
        Self {
            data_dir: Some(PathBuf::from("minisql_data")),
            catalog_file: DEFAULT_CATALOG_FILE.to_string(),
            index_order: DEFAULT_INDEX_ORDER,
            persist_on_write: true,
            recover_corrupt_catalog: true,
            row_storage: None,
        }
    }
}

impl DBConfig {
    /// Purely in-memory configuration: nothing touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            persist_on_write: false,
            ..Default::default()
        }
    }

    /// Configuration for tests rooted at `dir`; corrupt catalogs are errors
    pub fn for_testing<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            data_dir: Some(dir.into()),
            recover_corrupt_catalog: false,
            ..Default::default()
        }
    }

    pub fn with_data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_index_order(mut self, order: usize) -> Self {
        self.index_order = order;
        self
    }

    pub fn with_persist_on_write(mut self, enabled: bool) -> Self {
        self.persist_on_write = enabled;
        self
    }

    pub fn with_recover_corrupt_catalog(mut self, enabled: bool) -> Self {
        self.recover_corrupt_catalog = enabled;
        self
    }

    pub fn with_row_storage(mut self, storage: RowStorageConfig) -> Self {
        self.row_storage = Some(storage);
        self
    }

    /// Full path of the catalog snapshot, if the catalog is persisted
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(&self.catalog_file))
    }

    /// Check invariants that the engine relies on
    pub fn validate(&self) -> Result<()> {
        if self.index_order < 3 {
            return Err(MiniSqlError::Config(format!(
                "index_order must be >= 3, got {}",
                self.index_order
            )));
        }
        if self.catalog_file.trim().is_empty() {
            return Err(MiniSqlError::Config("catalog_file must not be empty".into()));
        }
        if let Some(storage) = &self.row_storage {
            if storage.extension.is_empty() || storage.extension.contains('.') {
                return Err(MiniSqlError::Config(format!(
                    "invalid row storage extension '{}'",
                    storage.extension
                )));
            }
        }
        Ok(())
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        let config: DBConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as pretty-printed JSON
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_presets() {
        let mem = DBConfig::in_memory();
        assert!(mem.data_dir.is_none());
        assert!(mem.catalog_path().is_none());
        assert!(!mem.persist_on_write);

        let test = DBConfig::for_testing("/tmp/x");
        assert_eq!(test.catalog_path(), Some(PathBuf::from("/tmp/x/catalog.bin")));
        assert!(!test.recover_corrupt_catalog);
        assert!(test.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_small_order() {
        let config = DBConfig::in_memory().with_index_order(2);
        assert!(matches!(config.validate(), Err(MiniSqlError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_extension() {
        let mut storage = RowStorageConfig::new("/tmp/rows");
        storage.extension = "tar.gz".into();
        let config = DBConfig::in_memory().with_row_storage(storage);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minisql.json");

        let config = DBConfig::for_testing(dir.path())
            .with_index_order(8)
            .with_row_storage(RowStorageConfig::new(dir.path().join("rows")));
        config.to_json_file(&path).unwrap();

        let loaded = DBConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded.index_order, 8);
        assert_eq!(loaded.row_storage, config.row_storage);
    }
}
