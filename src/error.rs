//! Error types for the minisql engine

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MiniSqlError>;

#[derive(Error, Debug)]
pub enum MiniSqlError {
    #[error("Unexpected character '{ch}' at {line}:{column}")]
    Lex { ch: char, line: usize, column: usize },

    #[error("Unterminated string literal starting at {line}:{column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("Numeric literal '{text}' out of range at {line}:{column}")]
    InvalidNumber {
        text: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error: expected {expected}, found {found} at {line}:{column}")]
    Parse {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Duplicate entry '{value}' for primary key '{column}' in table '{table}'")]
    DuplicateKey {
        table: String,
        column: String,
        value: String,
    },

    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupted file {0}: {1}")]
    Corruption(PathBuf, String),
}

impl From<bincode::Error> for MiniSqlError {
    fn from(err: bincode::Error) -> Self {
        MiniSqlError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for MiniSqlError {
    fn from(err: serde_json::Error) -> Self {
        MiniSqlError::Serialization(err.to_string())
    }
}

impl MiniSqlError {
    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        MiniSqlError::Schema(msg.into())
    }

    pub(crate) fn column_not_found(table: &str, column: &str) -> Self {
        MiniSqlError::ColumnNotFound {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}
