//! MiniSQL
//!
//! A small SQL-like statement engine over an in-memory table catalog.
//!
//! ## 架构
//! - 查询层: Lexer -> recursive-descent Parser -> typed AST -> Executor
//! - 索引层: arena-backed B+Tree, one per (table, column), built lazily
//! - 目录层: TableRegistry, full-state snapshot with CRC + atomic rename
//! - 存储层: optional per-table JSON-lines record files
//!
//! ```no_run
//! use minisql::Database;
//!
//! let db = Database::in_memory()?;
//! db.execute("CREATE TABLE users (id INT PRIMARY KEY, name STRING, age INT)")?;
//! db.execute("INSERT INTO users (id, name, age) VALUES (1, 'Alice', 25)")?;
//! let result = db.execute("SELECT id, name FROM users WHERE age > 20")?;
//! assert_eq!(result.row_count(), 1);
//! # Ok::<(), minisql::MiniSqlError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod database;
pub mod index;
pub mod sql;
pub mod storage;
pub mod types;

mod error;

pub use catalog::TableRegistry;
pub use config::{DBConfig, RowStorageConfig};
pub use database::Database;
pub use error::{MiniSqlError, Result};
pub use index::{BPlusTree, IndexManager};
pub use sql::{execute_sql, parse_sql, ExecutionContext, QueryExecutor, QueryResult, Statement};
pub use storage::RecordManager;
pub use types::{ColumnDef, ColumnType, SqlRow, TableSchema, Value};
