/// Table metadata and schema definitions for the SQL engine
use super::{SqlRow, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Integer (INT / INTEGER)
    Integer,
    /// Float (FLOAT / REAL / DOUBLE)
    Float,
    /// Text (STRING / TEXT / VARCHAR)
    Text,
    /// Boolean (BOOL / BOOLEAN)
    Boolean,
}

impl ColumnType {
    /// Resolve a type word, case-insensitively
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" => Some(ColumnType::Integer),
            "FLOAT" | "REAL" | "DOUBLE" => Some(ColumnType::Float),
            "STRING" | "TEXT" | "VARCHAR" => Some(ColumnType::Text),
            "BOOL" | "BOOLEAN" => Some(ColumnType::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "INT",
            ColumnType::Float => "FLOAT",
            ColumnType::Text => "STRING",
            ColumnType::Boolean => "BOOL",
        };
        f.write_str(name)
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name (stored lower-cased)
    pub name: String,
    /// Column data type
    pub col_type: ColumnType,
    /// Position in the declared column order (0-indexed)
    pub position: usize,
    /// Whether this column is the table's primary key
    pub primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: &str, col_type: ColumnType, position: usize) -> Self {
        Self {
            name: name.to_lowercase(),
            col_type,
            position,
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// Table schema plus its live row set
///
/// Owned exclusively by the catalog; rows keep insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Column definitions (ordered)
    pub columns: Vec<ColumnDef>,
    /// Rows in insertion order
    pub rows: Vec<SqlRow>,
    /// Lower-cased column name -> position
    #[serde(skip)]
    column_map: HashMap<String, usize>,
}

impl TableSchema {
    /// Create an empty table
    pub fn new(name: String, columns: Vec<ColumnDef>) -> Self {
        let mut schema = Self {
            name,
            columns,
            rows: Vec::new(),
            column_map: HashMap::new(),
        };
        schema.rebuild_column_map();
        schema
    }

    /// Primary key column, if one was declared
    pub fn primary_key_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Get column by name (case-insensitive)
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.column_map
            .get(&name.to_lowercase())
            .and_then(|&pos| self.columns.get(pos))
    }

    /// Get number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in declared order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether any row already holds `value` in `column`
    pub fn contains_value(&self, column: &str, value: &Value) -> bool {
        self.rows.iter().any(|row| row.get(column) == Some(value))
    }

    /// Rebuild column map (call after deserialization)
    pub fn rebuild_column_map(&mut self) {
        self.column_map.clear();
        for (pos, col) in self.columns.iter().enumerate() {
            self.column_map.insert(col.name.to_lowercase(), pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableSchema {
        TableSchema::new(
            "users".into(),
            vec![
                ColumnDef::new("id", ColumnType::Integer, 0).primary_key(),
                ColumnDef::new("Name", ColumnType::Text, 1),
            ],
        )
    }

    #[test]
    fn test_column_type_names() {
        assert_eq!(ColumnType::from_type_name("int"), Some(ColumnType::Integer));
        assert_eq!(ColumnType::from_type_name("Varchar"), Some(ColumnType::Text));
        assert_eq!(ColumnType::from_type_name("bool"), Some(ColumnType::Boolean));
        assert_eq!(ColumnType::from_type_name("blob"), None);
        assert_eq!(ColumnType::Text.to_string(), "STRING");
    }

    #[test]
    fn test_table_schema() {
        let schema = users();
        assert_eq!(schema.column_count(), 2);
        assert_eq!(schema.column_names(), vec!["id", "name"]);
        assert_eq!(schema.get_column("NAME").map(|c| c.position), Some(1));
        assert_eq!(schema.primary_key_column().map(|c| c.name.as_str()), Some("id"));
        assert!(schema.get_column("age").is_none());
    }

    #[test]
    fn test_contains_value() {
        let mut schema = users();
        let mut row = SqlRow::new();
        row.insert("id".into(), Value::Integer(1));
        schema.rows.push(row);

        assert!(schema.contains_value("id", &Value::Integer(1)));
        assert!(!schema.contains_value("id", &Value::Integer(2)));
    }

    #[test]
    fn test_column_map_survives_serde() {
        let schema = users();
        let bytes = bincode::serialize(&schema).unwrap();
        let mut loaded: TableSchema = bincode::deserialize(&bytes).unwrap();
        assert!(loaded.get_column("id").is_none());
        loaded.rebuild_column_map();
        assert!(loaded.get_column("id").is_some());
    }
}
