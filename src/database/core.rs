//! Database Core - the `Database` handle
//!
//! Wires the catalog, the index manager and the optional record files into
//! one `ExecutionContext` and serializes statements through a mutex.

use crate::catalog::TableRegistry;
use crate::config::DBConfig;
use crate::error::{MiniSqlError, Result};
use crate::index::IndexManager;
use crate::sql::{parse_sql, ExecutionContext, QueryExecutor, QueryResult, Statement};
use crate::storage::RecordManager;
use crate::types::{SqlRow, Value};
use parking_lot::Mutex;

/// MiniSQL database instance
///
/// ```no_run
/// use minisql::{Database, DBConfig};
///
/// let db = Database::open(DBConfig::default())?;
/// db.execute("CREATE TABLE users (id INT PRIMARY KEY, name STRING)")?;
/// db.execute("INSERT INTO users (id, name) VALUES (1, 'Alice')")?;
/// let result = db.execute("SELECT * FROM users WHERE id = 1")?;
/// println!("{}", result);
/// # Ok::<(), minisql::MiniSqlError>(())
/// ```
pub struct Database {
    ctx: Mutex<ExecutionContext>,
    config: DBConfig,
}

impl Database {
    /// Open (or create) the database described by `config`
    pub fn open(config: DBConfig) -> Result<Self> {
        config.validate()?;

        let catalog = match config.catalog_path() {
            Some(path) => {
                let mut catalog = TableRegistry::with_path(&path)?;
                match catalog.load() {
                    Ok(()) => {}
                    Err(e @ MiniSqlError::Corruption(..)) if config.recover_corrupt_catalog => {
                        tracing::warn!(error = %e, "corrupt catalog, continuing with an empty one");
                    }
                    Err(e) => return Err(e),
                }
                catalog
            }
            None => TableRegistry::in_memory(),
        };

        let mut ctx = ExecutionContext::new(catalog)
            .with_indexes(IndexManager::new(config.index_order)?)
            .with_persist_on_write(config.persist_on_write);
        if let Some(storage) = &config.row_storage {
            ctx = ctx.with_records(RecordManager::new(storage.clone())?);
        }

        tracing::info!(
            tables = ctx.catalog.len(),
            persisted = ctx.catalog.path().is_some(),
            "database opened"
        );

        Ok(Self {
            ctx: Mutex::new(ctx),
            config,
        })
    }

    /// Database that never touches disk
    pub fn in_memory() -> Result<Self> {
        Self::open(DBConfig::in_memory())
    }

    pub fn config(&self) -> &DBConfig {
        &self.config
    }

    /// Lex, parse and execute one statement
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        let statement = parse_sql(sql)?;
        self.execute_statement(statement)
    }

    /// Execute a statement built without going through the parser
    pub fn execute_statement(&self, statement: Statement) -> Result<QueryResult> {
        let mut ctx = self.ctx.lock();
        QueryExecutor::new(&mut ctx).execute(statement)
    }

    /// Table names, sorted
    pub fn list_tables(&self) -> Vec<String> {
        self.ctx.lock().catalog.list()
    }

    /// Save the full catalog now
    pub fn save(&self) -> Result<()> {
        self.ctx.lock().catalog.save()
    }

    /// Point lookup through the index on `table.column`.
    ///
    /// Returns `None` when no index exists yet (indexes are built by INSERT
    /// on the primary key) or the key is absent. SELECT never uses this.
    pub fn index_lookup(&self, table: &str, column: &str, key: &Value) -> Option<SqlRow> {
        let ctx = self.ctx.lock();
        ctx.indexes.as_ref()?.search_index(table, column, key).cloned()
    }
}
