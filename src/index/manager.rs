//! Index manager: owns one B+Tree per (table, column)

use super::btree::BPlusTree;
use crate::config::DEFAULT_INDEX_ORDER;
use crate::error::{MiniSqlError, Result};
use crate::types::{IndexKey, SqlRow, TableSchema, Value};
use ahash::AHashMap;
use tracing::debug;

/// Key of an index entry
type IndexId = (String, String);

/// Tree type backing every column index
pub type RowIndex = BPlusTree<IndexKey, SqlRow>;

/// Process-local column indexes. Trees are built lazily and never persisted.
pub struct IndexManager {
    order: usize,
    indexes: AHashMap<IndexId, RowIndex>,
}

impl Default for IndexManager {
    fn default() -> Self {
        Self {
            order: DEFAULT_INDEX_ORDER,
            indexes: AHashMap::new(),
        }
    }
}

impl IndexManager {
    /// Create a manager whose trees use `order`
    pub fn new(order: usize) -> Result<Self> {
        // fail early instead of on first create_index
        BPlusTree::<IndexKey, SqlRow>::new(order)?;
        Ok(Self {
            order,
            indexes: AHashMap::new(),
        })
    }

    fn id(table: &str, column: &str) -> IndexId {
        (table.to_string(), column.to_lowercase())
    }

    /// Create the index if missing and backfill it from every current row.
    ///
    /// Idempotent: returns `Ok(false)` without touching an existing index.
    pub fn create_index(
        &mut self,
        table: &str,
        column: &str,
        schema: &TableSchema,
    ) -> Result<bool> {
        let id = Self::id(table, column);
        if self.indexes.contains_key(&id) {
            return Ok(false);
        }
        if schema.get_column(column).is_none() {
            return Err(MiniSqlError::column_not_found(table, column));
        }

        let mut tree = BPlusTree::new(self.order)?;
        for row in &schema.rows {
            if let Some(value) = row.get(&id.1) {
                tree.insert(IndexKey::from(value), row.clone());
            }
        }
        debug!(table, column, rows = tree.len(), "index created");
        self.indexes.insert(id, tree);
        Ok(true)
    }

    /// Insert into an existing index. Never creates one; returns whether
    /// an index received the entry.
    pub fn insert(&mut self, table: &str, column: &str, key: &Value, value: SqlRow) -> bool {
        match self.indexes.get_mut(&Self::id(table, column)) {
            Some(tree) => {
                tree.insert(IndexKey::from(key), value);
                true
            }
            None => false,
        }
    }

    pub fn drop_index(&mut self, table: &str, column: &str) -> Result<()> {
        self.indexes
            .remove(&Self::id(table, column))
            .map(|_| ())
            .ok_or_else(|| MiniSqlError::Index(format!("No index found on {}.{}", table, column)))
    }

    /// Drop every index of `table`; returns how many were removed
    pub fn drop_table_indexes(&mut self, table: &str) -> usize {
        let before = self.indexes.len();
        self.indexes.retain(|(t, _), _| t != table);
        before - self.indexes.len()
    }

    /// Point lookup; `None` when the index or the key is absent
    pub fn search_index(&self, table: &str, column: &str, key: &Value) -> Option<&SqlRow> {
        self.indexes
            .get(&Self::id(table, column))?
            .search(&IndexKey::from(key))
    }

    pub fn has_index(&self, table: &str, column: &str) -> bool {
        self.indexes.contains_key(&Self::id(table, column))
    }

    pub fn get(&self, table: &str, column: &str) -> Option<&RowIndex> {
        self.indexes.get(&Self::id(table, column))
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}
