//! Record Manager
//!
//! One append-only JSON-lines file per table. Every row is a single line.
//! Inserts append; updates and deletes rewrite the whole file.

use crate::config::RowStorageConfig;
use crate::error::{MiniSqlError, Result};
use crate::types::SqlRow;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Per-table row files
pub struct RecordManager {
    config: RowStorageConfig,
}

impl RecordManager {
    /// Create the manager, creating its directory if needed
    pub fn new(config: RowStorageConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir)?;
        Ok(Self { config })
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.config.dir.join(format!("{}.{}", table, self.config.extension))
    }

    /// Append `row`, rejecting a primary key value already in the file.
    ///
    /// The whole file is re-read for the uniqueness check.
    pub fn insert(&self, table: &str, row: &SqlRow, pk_column: Option<&str>) -> Result<()> {
        if let Some(pk) = pk_column {
            if let Some(pk_value) = row.get(pk) {
                if self.load_rows(table)?.iter().any(|r| r.get(pk) == Some(pk_value)) {
                    return Err(MiniSqlError::DuplicateKey {
                        table: table.to_string(),
                        column: pk.to_string(),
                        value: pk_value.to_string(),
                    });
                }
            }
        }

        let mut line = serde_json::to_string(row)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.table_path(table))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Every row in file order.
    ///
    /// A missing file is an empty table; so is an unreadable or corrupt one,
    /// which is logged.
    pub fn select_all(&self, table: &str) -> Vec<SqlRow> {
        self.load_rows(table).unwrap_or_else(|e| {
            warn!(
                table,
                path = %self.table_path(table).display(),
                error = %e,
                "unreadable row file treated as empty"
            );
            Vec::new()
        })
    }

    /// Apply `assignments` to every row matching `predicate`; returns the count.
    ///
    /// A corrupt file is an error here and is left untouched.
    pub fn update_where<P>(
        &self,
        table: &str,
        predicate: P,
        assignments: &SqlRow,
    ) -> Result<usize>
    where
        P: Fn(&SqlRow) -> bool,
    {
        let mut rows = self.load_rows(table)?;
        let mut updated = 0;
        for row in rows.iter_mut().filter(|r| predicate(r)) {
            for (column, value) in assignments {
                row.insert(column.clone(), value.clone());
            }
            updated += 1;
        }
        self.write_rows(table, &rows)?;
        Ok(updated)
    }

    /// Remove every row matching `predicate`; returns the count.
    ///
    /// A corrupt file is an error here and is left untouched.
    pub fn delete_where<P>(&self, table: &str, predicate: P) -> Result<usize>
    where
        P: Fn(&SqlRow) -> bool,
    {
        let rows = self.load_rows(table)?;
        let before = rows.len();
        let kept: Vec<SqlRow> = rows.into_iter().filter(|r| !predicate(r)).collect();
        self.write_rows(table, &kept)?;
        Ok(before - kept.len())
    }

    /// Delete the table's file; returns whether one existed
    pub fn drop_table(&self, table: &str) -> Result<bool> {
        match fs::remove_file(self.table_path(table)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Rows in the file; a missing file is empty, a bad line is `Corruption`
    fn load_rows(&self, table: &str) -> Result<Vec<SqlRow>> {
        let path = self.table_path(table);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| {
                    MiniSqlError::Corruption(path.clone(), format!("line {}: {}", n + 1, e))
                })
            })
            .collect()
    }

    fn write_rows(&self, table: &str, rows: &[SqlRow]) -> Result<()> {
        let path = self.table_path(table);
        let temp_path = path.with_extension(format!("{}.tmp", self.config.extension));
        {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&temp_path)?;
            let mut writer = BufWriter::new(file);
            for row in rows {
                serde_json::to_writer(&mut writer, row)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, &path)?;
        debug!(table, rows = rows.len(), "row file rewritten");
        Ok(())
    }
}
