/// Table registry: table schemas plus their live rows
use crate::error::{MiniSqlError, Result};
use crate::types::{ColumnDef, TableSchema};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CATALOG_MAGIC: &[u8; 4] = b"MSQL";
const CATALOG_VERSION: u32 = 1;
/// magic + version + crc32 + payload length
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Registry of every table in the database.
///
/// Persistence is a full-state overwrite: `save` rewrites the whole file
/// through a temp file and an atomic rename, so a crash leaves either the
/// previous or the new catalog on disk.
pub struct TableRegistry {
    tables: HashMap<String, TableSchema>,
    /// Catalog file; `None` keeps the registry purely in memory
    persist_path: Option<PathBuf>,
}

impl TableRegistry {
    /// Registry that never touches disk
    pub fn in_memory() -> Self {
        Self {
            tables: HashMap::new(),
            persist_path: None,
        }
    }

    /// Empty registry bound to `path`. Nothing is read yet; call `load`.
    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let persist_path = path.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        if let Some(parent) = persist_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(Self {
            tables: HashMap::new(),
            persist_path: Some(persist_path),
        })
    }

    /// Bind to `path` and load it. A missing file gives an empty catalog.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut registry = Self::with_path(path)?;
        registry.load()?;
        Ok(registry)
    }

    pub fn path(&self) -> Option<&Path> {
        self.persist_path.as_deref()
    }

    /// Register a new, empty table
    pub fn create(&mut self, name: &str, columns: Vec<ColumnDef>) -> Result<&mut TableSchema> {
        if self.tables.contains_key(name) {
            return Err(MiniSqlError::schema(format!("Table '{}' already exists", name)));
        }
        if columns.is_empty() {
            return Err(MiniSqlError::schema(format!("Table '{}' has no columns", name)));
        }

        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(MiniSqlError::schema(format!(
                    "Duplicate column '{}' in table '{}'",
                    col.name, name
                )));
            }
        }
        if columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(MiniSqlError::schema(format!(
                "Table '{}' declares more than one primary key",
                name
            )));
        }

        let schema = TableSchema::new(name.to_string(), columns);
        debug!(table = name, columns = schema.column_count(), "table registered");
        Ok(self.tables.entry(name.to_string()).or_insert(schema))
    }

    /// Remove a table and return its schema and rows
    pub fn drop(&mut self, name: &str) -> Result<TableSchema> {
        self.tables.remove(name).ok_or_else(|| Self::missing(name))
    }

    pub fn get(&self, name: &str) -> Result<&TableSchema> {
        self.tables.get(name).ok_or_else(|| Self::missing(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut TableSchema> {
        self.tables.get_mut(name).ok_or_else(|| Self::missing(name))
    }

    /// Table names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn missing(name: &str) -> MiniSqlError {
        MiniSqlError::schema(format!("Table '{}' does not exist", name))
    }

    /// Persist the full catalog. No-op for an in-memory registry.
    pub fn save(&self) -> Result<()> {
        let path = match &self.persist_path {
            Some(path) => path,
            None => return Ok(()),
        };

        let mut schemas: Vec<&TableSchema> = self.tables.values().collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        let payload = bincode::serialize(&schemas)?;

        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.extend_from_slice(CATALOG_MAGIC);
        buf.extend_from_slice(&CATALOG_VERSION.to_le_bytes());
        buf.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        buf.extend_from_slice(&payload);

        let temp_path = path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&temp_path)?;
            file.write_all(&buf)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;
        sync_parent_dir(path)?;

        info!(path = %path.display(), tables = schemas.len(), bytes = buf.len(), "catalog saved");
        Ok(())
    }

    /// Replace the in-memory catalog with the persisted one.
    ///
    /// A missing file yields an empty catalog. A file that fails the
    /// header, checksum or decode checks is `Corruption`, and the current
    /// state is left untouched.
    pub fn load(&mut self) -> Result<()> {
        let path = match &self.persist_path {
            Some(path) => path.clone(),
            None => return Ok(()),
        };

        if !path.exists() {
            self.tables.clear();
            debug!(path = %path.display(), "no catalog file, starting empty");
            return Ok(());
        }

        let data = fs::read(&path)?;
        let schemas = decode(&data).map_err(|msg| MiniSqlError::Corruption(path.clone(), msg))?;

        self.tables = schemas
            .into_iter()
            .map(|mut schema| {
                // Rebuild column maps after deserialization
                schema.rebuild_column_map();
                (schema.name.clone(), schema)
            })
            .collect();

        info!(path = %path.display(), tables = self.tables.len(), "catalog loaded");
        Ok(())
    }
}

fn decode(data: &[u8]) -> std::result::Result<Vec<TableSchema>, String> {
    if data.len() < HEADER_LEN {
        return Err(format!("file too short ({} bytes)", data.len()));
    }
    if &data[0..4] != CATALOG_MAGIC {
        return Err("bad magic".to_string());
    }

    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != CATALOG_VERSION {
        return Err(format!("unsupported format version {}", version));
    }

    let crc = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&data[12..HEADER_LEN]);
    let len = u64::from_le_bytes(len_bytes) as usize;

    let payload = &data[HEADER_LEN..];
    if payload.len() != len {
        return Err(format!("payload length {} does not match header {}", payload.len(), len));
    }
    if crc32fast::hash(payload) != crc {
        return Err("checksum mismatch".to_string());
    }

    bincode::deserialize(payload).map_err(|e| e.to_string())
}

/// fsync the directory holding `path` so the rename itself is durable
fn sync_parent_dir(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let dir = File::open(parent)?;
            if unsafe { libc::fsync(dir.as_raw_fd()) } != 0 {
                return Err(std::io::Error::last_os_error().into());
            }
        }
    }

    #[cfg(not(unix))]
    {
        File::open(path)?.sync_all()?;
    }

    Ok(())
}
