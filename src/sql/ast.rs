/// Abstract Syntax Tree for SQL statements
use super::token::CompareOp;
use crate::error::{MiniSqlError, Result};
use crate::types::{ColumnType, Value};
use std::fmt;
use std::str::FromStr;

/// Top-level SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStmt),
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    CreateTable(CreateTableStmt),
    DropTable(DropTableStmt),
    /// Leading word that starts no supported statement
    Unknown(String),
}

impl Statement {
    /// Statement kind as an upper-case tag, e.g. `"CREATE_TABLE"`
    pub fn kind(&self) -> &str {
        match self {
            Statement::Select(_) => "SELECT",
            Statement::Insert(_) => "INSERT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::CreateTable(_) => "CREATE_TABLE",
            Statement::DropTable(_) => "DROP_TABLE",
            Statement::Unknown(word) => word,
        }
    }

    /// Whether executing this statement can change the catalog
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Statement::Select(_) | Statement::Unknown(_))
    }
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub columns: Projection,
    pub table: String,
    pub where_clause: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Star,                 // *
    Columns(Vec<String>), // col, col, ...
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Literal>,
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Condition>,
}

/// `column = value` inside SET
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Literal,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub table: String,
    pub where_clause: Option<Condition>,
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub table: String,
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: ColumnType,
    pub primary_key: bool,
}

/// DROP TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStmt {
    pub table: String,
}

/// Right-hand side of a VALUES list, assignment or condition.
///
/// A bare identifier in value position is kept as its text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Identifier(String),
}

impl Literal {
    /// Text form with quotes already stripped
    pub fn as_text(&self) -> String {
        match self {
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::String(s) | Literal::Identifier(s) => s.clone(),
        }
    }

    /// Untyped value, before any column coercion
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::String(s) | Literal::Identifier(s) => Value::Text(s.clone()),
        }
    }

    /// Read a literal from raw text: quoted -> string, numeric -> number,
    /// anything else -> identifier.
    fn from_raw(raw: &str) -> Self {
        let raw = raw.trim();
        let quoted = raw.len() >= 2
            && ((raw.starts_with('\'') && raw.ends_with('\''))
                || (raw.starts_with('"') && raw.ends_with('"')));
        if quoted {
            return Literal::String(raw[1..raw.len() - 1].to_string());
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Literal::Integer(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Literal::Float(f);
        }
        Literal::Identifier(raw.to_string())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s),
            other => f.write_str(&other.as_text()),
        }
    }
}

/// Single comparison clause: `column op value`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub value: Literal,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: CompareOp, value: Literal) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.value)
    }
}

impl FromStr for Condition {
    type Err = MiniSqlError;

    /// Parse `"<column> <op> <value>"`, trying operators in
    /// `CompareOp::SCAN_ORDER` so `>=` is never read as `=`.
    /// Only the text before the first quote is scanned.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |expected: &str| MiniSqlError::Parse {
            expected: expected.to_string(),
            found: format!("'{}'", s),
            line: 1,
            column: 1,
        };

        let head = &s[..s.find(|c: char| c == '\'' || c == '"').unwrap_or(s.len())];
        let (op, at) = CompareOp::SCAN_ORDER
            .iter()
            .find_map(|op| head.find(op.symbol()).map(|at| (*op, at)))
            .ok_or_else(|| invalid("comparison operator"))?;

        let column = s[..at].trim();
        let value = s[at + op.symbol().len()..].trim();
        if column.is_empty() {
            return Err(invalid("column name"));
        }
        if value.is_empty() {
            return Err(invalid("comparison value"));
        }

        Ok(Condition::new(column, op, Literal::from_raw(value)))
    }
}
