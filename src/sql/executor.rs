/// Query executor - runs parsed statements against the catalog
use super::ast::*;
use super::evaluator::{coerce_literal, evaluate};
use crate::catalog::TableRegistry;
use crate::error::{MiniSqlError, Result};
use crate::index::IndexManager;
use crate::storage::RecordManager;
use crate::types::{ColumnDef, SqlRow, TableSchema, Value};
use std::fmt;
use tracing::{debug, info};

/// Kind of row modification reported by INSERT/UPDATE/DELETE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationKind {
    Insert,
    Update,
    Delete,
}

/// Query result
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// SELECT result
    Select {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },

    /// INSERT/UPDATE/DELETE result
    Modification {
        kind: ModificationKind,
        affected_rows: usize,
    },

    /// CREATE/DROP result
    Definition {
        message: String,
    },
}

impl QueryResult {
    pub fn affected_rows(&self) -> usize {
        match self {
            QueryResult::Modification { affected_rows, .. } => *affected_rows,
            _ => 0,
        }
    }

    /// Get rows as maps (column_name -> value)
    /// Returns empty vec if not a SELECT result
    pub fn rows_as_maps(&self) -> Vec<SqlRow> {
        match self {
            QueryResult::Select { columns, rows } => rows
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .zip(row.iter())
                        .map(|(col, val)| (col.clone(), val.clone()))
                        .collect()
                })
                .collect(),
            _ => vec![],
        }
    }

    /// Get row count for SELECT results
    pub fn row_count(&self) -> usize {
        match self {
            QueryResult::Select { rows, .. } => rows.len(),
            QueryResult::Modification { affected_rows, .. } => *affected_rows,
            _ => 0,
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "row"
    } else {
        "rows"
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Select { columns, rows } => {
                let cells: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| row.iter().map(|v| v.to_string()).collect())
                    .collect();

                let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
                for row in &cells {
                    for (width, cell) in widths.iter_mut().zip(row) {
                        *width = (*width).max(cell.chars().count());
                    }
                }

                let line = |values: &[String]| {
                    values
                        .iter()
                        .zip(&widths)
                        .map(|(v, w)| format!("{:<width$}", v, width = *w))
                        .collect::<Vec<_>>()
                        .join(" | ")
                };

                writeln!(f, "{}", line(columns.as_slice()))?;
                let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
                writeln!(f, "{}", rule.join("-+-"))?;
                for row in &cells {
                    writeln!(f, "{}", line(row.as_slice()))?;
                }
                write!(f, "({} {})", rows.len(), plural(rows.len()))
            }
            QueryResult::Modification { kind, affected_rows } => {
                let verb = match kind {
                    ModificationKind::Insert => "Inserted",
                    ModificationKind::Update => "Updated",
                    ModificationKind::Delete => "Deleted",
                };
                write!(f, "{} {} {}", verb, affected_rows, plural(*affected_rows))
            }
            QueryResult::Definition { message } => f.write_str(message),
        }
    }
}

/// Mutable state every statement runs against.
///
/// The index manager and record manager are optional collaborators.
pub struct ExecutionContext {
    pub catalog: TableRegistry,
    pub indexes: Option<IndexManager>,
    pub records: Option<RecordManager>,
    /// Save the catalog after every mutating statement
    pub persist_on_write: bool,
}

impl ExecutionContext {
    pub fn new(catalog: TableRegistry) -> Self {
        Self {
            catalog,
            indexes: None,
            records: None,
            persist_on_write: true,
        }
    }

    /// In-memory catalog with a default index manager
    pub fn in_memory() -> Self {
        Self::new(TableRegistry::in_memory()).with_indexes(IndexManager::default())
    }

    pub fn with_indexes(mut self, indexes: IndexManager) -> Self {
        self.indexes = Some(indexes);
        self
    }

    pub fn with_records(mut self, records: RecordManager) -> Self {
        self.records = Some(records);
        self
    }

    pub fn with_persist_on_write(mut self, persist: bool) -> Self {
        self.persist_on_write = persist;
        self
    }
}

pub struct QueryExecutor<'a> {
    ctx: &'a mut ExecutionContext,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(ctx: &'a mut ExecutionContext) -> Self {
        Self { ctx }
    }

    /// Execute one statement. A mutating statement that succeeds is
    /// followed by a full catalog save when `persist_on_write` is set;
    /// a failed statement never reaches the save.
    pub fn execute(&mut self, stmt: Statement) -> Result<QueryResult> {
        debug!(kind = stmt.kind(), "executing statement");
        let mutation = stmt.is_mutation();

        let result = match stmt {
            Statement::Select(s) => self.execute_select(s),
            Statement::Insert(i) => self.execute_insert(i),
            Statement::Update(u) => self.execute_update(u),
            Statement::Delete(d) => self.execute_delete(d),
            Statement::CreateTable(c) => self.execute_create_table(c),
            Statement::DropTable(d) => self.execute_drop_table(d),
            Statement::Unknown(word) => Err(MiniSqlError::UnsupportedStatement(word)),
        }?;

        if mutation && self.ctx.persist_on_write {
            self.ctx.catalog.save()?;
        }

        Ok(result)
    }

    fn execute_create_table(&mut self, stmt: CreateTableStmt) -> Result<QueryResult> {
        let columns: Vec<ColumnDef> = stmt
            .columns
            .iter()
            .enumerate()
            .map(|(pos, spec)| {
                let col = ColumnDef::new(&spec.name, spec.data_type, pos);
                if spec.primary_key {
                    col.primary_key()
                } else {
                    col
                }
            })
            .collect();

        self.ctx.catalog.create(&stmt.table, columns)?;
        info!(table = %stmt.table, "table created");

        Ok(QueryResult::Definition {
            message: format!("Table '{}' created", stmt.table),
        })
    }

    fn execute_drop_table(&mut self, stmt: DropTableStmt) -> Result<QueryResult> {
        let ctx = &mut *self.ctx;
        let schema = ctx.catalog.drop(&stmt.table)?;

        if let Some(indexes) = ctx.indexes.as_mut() {
            indexes.drop_table_indexes(&stmt.table);
        }
        if let Some(records) = &ctx.records {
            records.drop_table(&stmt.table)?;
        }
        info!(table = %stmt.table, rows = schema.row_count(), "table dropped");

        Ok(QueryResult::Definition {
            message: format!("Table '{}' dropped", stmt.table),
        })
    }

    fn execute_insert(&mut self, stmt: InsertStmt) -> Result<QueryResult> {
        let ctx = &mut *self.ctx;
        let schema = ctx.catalog.get(&stmt.table)?;

        if stmt.columns.len() != stmt.values.len() {
            return Err(MiniSqlError::schema(format!(
                "INSERT into '{}' names {} columns but supplies {} values",
                stmt.table,
                stmt.columns.len(),
                stmt.values.len()
            )));
        }

        let mut row = SqlRow::with_capacity(stmt.columns.len());
        for (name, literal) in stmt.columns.iter().zip(&stmt.values) {
            let col = resolve_column(schema, name)?;
            let value = coerce_literal(literal, col)?;
            if row.insert(col.name.clone(), value).is_some() {
                return Err(MiniSqlError::schema(format!(
                    "Column '{}' specified more than once",
                    col.name
                )));
            }
        }

        // Primary key must be present and unique
        let pk = schema.primary_key_column().map(|c| c.name.clone());
        if let Some(pk) = &pk {
            let value = row.get(pk).ok_or_else(|| {
                MiniSqlError::schema(format!("Primary key column '{}' requires a value", pk))
            })?;
            if schema.contains_value(pk, value) {
                return Err(MiniSqlError::DuplicateKey {
                    table: stmt.table.clone(),
                    column: pk.clone(),
                    value: value.to_string(),
                });
            }
        }

        if let Some(records) = &ctx.records {
            records.insert(&stmt.table, &row, pk.as_deref())?;
        }

        let schema = ctx.catalog.get_mut(&stmt.table)?;
        schema.rows.push(row.clone());

        // Lazily (re)build the primary key index over all rows
        if let (Some(indexes), Some(pk)) = (ctx.indexes.as_mut(), &pk) {
            indexes.create_index(&stmt.table, pk, schema)?;
            if let Some(key) = row.get(pk) {
                indexes.insert(&stmt.table, pk, key, row.clone());
            }
        }

        Ok(QueryResult::Modification {
            kind: ModificationKind::Insert,
            affected_rows: 1,
        })
    }

    fn execute_select(&mut self, stmt: SelectStmt) -> Result<QueryResult> {
        let schema = self.ctx.catalog.get(&stmt.table)?;
        check_condition(schema, stmt.where_clause.as_ref())?;

        let columns = match &stmt.columns {
            Projection::Star => schema.column_names(),
            Projection::Columns(names) => names
                .iter()
                .map(|name| resolve_column(schema, name).map(|c| c.name.clone()))
                .collect::<Result<Vec<_>>>()?,
        };

        // Linear scan in insertion order
        let mut rows = Vec::new();
        for row in &schema.rows {
            if let Some(cond) = &stmt.where_clause {
                if !evaluate(row, cond, schema)? {
                    continue;
                }
            }
            rows.push(
                columns
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                    .collect(),
            );
        }

        Ok(QueryResult::Select { columns, rows })
    }

    fn execute_update(&mut self, stmt: UpdateStmt) -> Result<QueryResult> {
        let ctx = &mut *self.ctx;
        let schema = ctx.catalog.get(&stmt.table)?;
        check_condition(schema, stmt.where_clause.as_ref())?;

        let mut assignments = SqlRow::with_capacity(stmt.assignments.len());
        for assignment in &stmt.assignments {
            let col = resolve_column(schema, &assignment.column)?;
            assignments.insert(col.name.clone(), coerce_literal(&assignment.value, col)?);
        }

        let matches = matching_rows(schema, stmt.where_clause.as_ref())?;
        let updated = matches.iter().filter(|m| **m).count();

        // Setting the primary key must keep it unique
        if let Some(pk) = schema.primary_key_column() {
            if let Some(new_value) = assignments.get(&pk.name) {
                let clash = updated > 1
                    || schema
                        .rows
                        .iter()
                        .zip(&matches)
                        .any(|(row, matched)| !matched && row.get(&pk.name) == Some(new_value));
                if updated > 0 && clash {
                    return Err(MiniSqlError::DuplicateKey {
                        table: stmt.table.clone(),
                        column: pk.name.clone(),
                        value: new_value.to_string(),
                    });
                }
            }
        }

        if let Some(records) = &ctx.records {
            let cond = stmt.where_clause.as_ref();
            records.update_where(&stmt.table, |row| row_matches(row, cond, schema), &assignments)?;
        }

        let schema = ctx.catalog.get_mut(&stmt.table)?;
        for (row, _) in schema.rows.iter_mut().zip(&matches).filter(|(_, m)| **m) {
            for (column, value) in &assignments {
                row.insert(column.clone(), value.clone());
            }
        }

        if updated > 0 {
            invalidate_indexes(ctx.indexes.as_mut(), &stmt.table);
        }

        Ok(QueryResult::Modification {
            kind: ModificationKind::Update,
            affected_rows: updated,
        })
    }

    fn execute_delete(&mut self, stmt: DeleteStmt) -> Result<QueryResult> {
        let ctx = &mut *self.ctx;
        let schema = ctx.catalog.get(&stmt.table)?;
        check_condition(schema, stmt.where_clause.as_ref())?;

        let matches = matching_rows(schema, stmt.where_clause.as_ref())?;

        if let Some(records) = &ctx.records {
            let cond = stmt.where_clause.as_ref();
            records.delete_where(&stmt.table, |row| row_matches(row, cond, schema))?;
        }

        let schema = ctx.catalog.get_mut(&stmt.table)?;
        let before = schema.rows.len();
        if stmt.where_clause.is_none() {
            schema.rows.clear();
        } else {
            schema.rows = std::mem::take(&mut schema.rows)
                .into_iter()
                .zip(matches)
                .filter_map(|(row, matched)| (!matched).then_some(row))
                .collect();
        }
        let deleted = before - schema.rows.len();

        if deleted > 0 {
            invalidate_indexes(ctx.indexes.as_mut(), &stmt.table);
        }

        Ok(QueryResult::Modification {
            kind: ModificationKind::Delete,
            affected_rows: deleted,
        })
    }
}

fn resolve_column<'s>(schema: &'s TableSchema, name: &str) -> Result<&'s ColumnDef> {
    schema
        .get_column(name)
        .ok_or_else(|| MiniSqlError::column_not_found(&schema.name, name))
}

/// Reject a WHERE clause naming an unknown column, even on an empty table
fn check_condition(schema: &TableSchema, cond: Option<&Condition>) -> Result<()> {
    match cond {
        Some(cond) => resolve_column(schema, &cond.column).map(|_| ()),
        None => Ok(()),
    }
}

/// One flag per row, in row order; no condition matches everything
fn matching_rows(schema: &TableSchema, cond: Option<&Condition>) -> Result<Vec<bool>> {
    match cond {
        Some(cond) => schema.rows.iter().map(|row| evaluate(row, cond, schema)).collect(),
        None => Ok(vec![true; schema.rows.len()]),
    }
}

/// Predicate form used for row files; the column was already checked
fn row_matches(row: &SqlRow, cond: Option<&Condition>, schema: &TableSchema) -> bool {
    cond.map_or(true, |c| evaluate(row, c, schema).unwrap_or(false))
}

/// Drop a table's indexes after rows change; the next INSERT rebuilds them
fn invalidate_indexes(indexes: Option<&mut IndexManager>, table: &str) {
    if let Some(indexes) = indexes {
        let dropped = indexes.drop_table_indexes(table);
        if dropped > 0 {
            debug!(table, dropped, "indexes invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RowStorageConfig;
    use crate::sql::parse_sql;
    use tempfile::TempDir;

    fn run(ctx: &mut ExecutionContext, sql: &str) -> Result<QueryResult> {
        QueryExecutor::new(ctx).execute(parse_sql(sql)?)
    }

    fn users(ctx: &mut ExecutionContext) {
        run(ctx, "CREATE TABLE users (id INT PRIMARY KEY, name STRING, age INT)").unwrap();
        run(ctx, "INSERT INTO users (id, name, age) VALUES (1, 'Alice', 25)").unwrap();
        run(ctx, "INSERT INTO users (id, name, age) VALUES (2, 'Bob', 30)").unwrap();
        run(ctx, "INSERT INTO users (id, name, age) VALUES (3, 'Charlie', 40)").unwrap();
    }

    fn ids(result: &QueryResult) -> Vec<Value> {
        result.rows_as_maps().iter().map(|r| r["id"].clone()).collect()
    }

    #[test]
    fn test_create_insert_select() {
        let mut ctx = ExecutionContext::in_memory();
        run(&mut ctx, "CREATE TABLE t (id INT PRIMARY KEY, name STRING)").unwrap();
        let result = run(&mut ctx, "INSERT INTO t (id, name) VALUES (1, 'A')").unwrap();
        assert_eq!(
            result,
            QueryResult::Modification {
                kind: ModificationKind::Insert,
                affected_rows: 1
            }
        );

        let result = run(&mut ctx, "SELECT * FROM t WHERE id = 1").unwrap();
        let rows = result.rows_as_maps();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], Value::Integer(1));
        assert_eq!(rows[0]["name"], Value::Text("A".into()));
    }

    #[test]
    fn test_select_projection_and_order() {
        let mut ctx = ExecutionContext::in_memory();
        users(&mut ctx);

        let result = run(&mut ctx, "SELECT name, ID FROM users WHERE age > 29").unwrap();
        match &result {
            QueryResult::Select { columns, rows } => {
                assert_eq!(columns, &vec!["name".to_string(), "id".to_string()]);
                assert_eq!(rows[0], vec![Value::Text("Bob".into()), Value::Integer(2)]);
                assert_eq!(rows[1], vec![Value::Text("Charlie".into()), Value::Integer(3)]);
            }
            other => panic!("unexpected result {:?}", other),
        }

        let empty = run(&mut ctx, "SELECT * FROM users WHERE age > 100").unwrap();
        assert_eq!(empty.row_count(), 0);
    }

    #[test]
    fn test_duplicate_primary_key() {
        let mut ctx = ExecutionContext::in_memory();
        users(&mut ctx);

        let err =
            run(&mut ctx, "INSERT INTO users (id, name, age) VALUES (2, 'Bobby', 31)").unwrap_err();
        assert!(matches!(err, MiniSqlError::DuplicateKey { ref column, .. } if column == "id"));
        assert_eq!(ctx.catalog.get("users").unwrap().row_count(), 3);
    }

    #[test]
    fn test_float_primary_key_nan_is_unique() {
        let mut ctx = ExecutionContext::in_memory();
        run(&mut ctx, "CREATE TABLE f (k FLOAT PRIMARY KEY, v STRING)").unwrap();
        run(&mut ctx, "INSERT INTO f (k, v) VALUES ('NaN', 'a')").unwrap();

        let err = run(&mut ctx, "INSERT INTO f (k, v) VALUES ('NaN', 'b')").unwrap_err();
        assert!(matches!(err, MiniSqlError::DuplicateKey { ref column, .. } if column == "k"));
        assert_eq!(ctx.catalog.get("f").unwrap().row_count(), 1);
    }

    #[test]
    fn test_where_quoted_number_on_int_column() {
        let mut ctx = ExecutionContext::in_memory();
        run(&mut ctx, "CREATE TABLE t (id INT PRIMARY KEY, age INT)").unwrap();
        run(&mut ctx, "INSERT INTO t (id, age) VALUES (1, 10)").unwrap();
        run(&mut ctx, "INSERT INTO t (id, age) VALUES (2, 5)").unwrap();

        let quoted = run(&mut ctx, "SELECT id FROM t WHERE age > '9'").unwrap();
        assert_eq!(ids(&quoted), vec![Value::Integer(1)]);
        let bare = run(&mut ctx, "SELECT id FROM t WHERE age > 9").unwrap();
        assert_eq!(ids(&bare), vec![Value::Integer(1)]);
    }

    #[test]
    fn test_insert_errors() {
        let mut ctx = ExecutionContext::in_memory();
        users(&mut ctx);

        assert!(matches!(
            run(&mut ctx, "INSERT INTO nope (id) VALUES (1)"),
            Err(MiniSqlError::Schema(_))
        ));
        assert!(matches!(
            run(&mut ctx, "INSERT INTO users (id, name) VALUES (9)"),
            Err(MiniSqlError::Schema(_))
        ));
        assert!(matches!(
            run(&mut ctx, "INSERT INTO users (id, height) VALUES (9, 180)"),
            Err(MiniSqlError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            run(&mut ctx, "INSERT INTO users (id, age) VALUES (9, 'old')"),
            Err(MiniSqlError::TypeError(_))
        ));
        assert!(matches!(
            run(&mut ctx, "INSERT INTO users (name) VALUES ('nobody')"),
            Err(MiniSqlError::Schema(_))
        ));
        assert_eq!(ctx.catalog.get("users").unwrap().row_count(), 3);
    }

    #[test]
    fn test_insert_coerces_quoted_int() {
        let mut ctx = ExecutionContext::in_memory();
        run(&mut ctx, "CREATE TABLE m (k INT, f FLOAT, b BOOL, s STRING)").unwrap();
        run(&mut ctx, "INSERT INTO m (k, f, b, s) VALUES ('7', 2, 'true', 42)").unwrap();

        let rows = run(&mut ctx, "SELECT * FROM m").unwrap().rows_as_maps();
        assert_eq!(rows[0]["k"], Value::Integer(7));
        assert_eq!(rows[0]["f"], Value::Float(2.0));
        assert_eq!(rows[0]["b"], Value::Bool(true));
        assert_eq!(rows[0]["s"], Value::Text("42".into()));
    }

    #[test]
    fn test_update_without_where_touches_every_row() {
        let mut ctx = ExecutionContext::in_memory();
        users(&mut ctx);

        let result = run(&mut ctx, "UPDATE users SET age = '50'").unwrap();
        assert_eq!(result.affected_rows(), 3);
        let rows = run(&mut ctx, "SELECT age FROM users").unwrap();
        assert!(rows.rows_as_maps().iter().all(|r| r["age"] == Value::Integer(50)));
    }

    #[test]
    fn test_update_with_where_and_multiple_assignments() {
        let mut ctx = ExecutionContext::in_memory();
        users(&mut ctx);

        let result = run(
            &mut ctx,
            "UPDATE users SET name = 'Robert', age = 31 WHERE name = 'Bob'",
        )
        .unwrap();
        assert_eq!(result.affected_rows(), 1);

        let rows = run(&mut ctx, "SELECT name, age FROM users WHERE id = 2")
            .unwrap()
            .rows_as_maps();
        assert_eq!(rows[0]["name"], Value::Text("Robert".into()));
        assert_eq!(rows[0]["age"], Value::Integer(31));

        let none = run(&mut ctx, "UPDATE users SET age = 1 WHERE id = 99").unwrap();
        assert_eq!(none.affected_rows(), 0);
    }

    #[test]
    fn test_update_keeps_primary_key_unique() {
        let mut ctx = ExecutionContext::in_memory();
        users(&mut ctx);

        assert!(matches!(
            run(&mut ctx, "UPDATE users SET id = 1 WHERE id = 2"),
            Err(MiniSqlError::DuplicateKey { .. })
        ));
        assert!(matches!(
            run(&mut ctx, "UPDATE users SET id = 9"),
            Err(MiniSqlError::DuplicateKey { .. })
        ));
        // nothing changed
        let result = run(&mut ctx, "SELECT id FROM users").unwrap();
        assert_eq!(ids(&result), vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);

        run(&mut ctx, "UPDATE users SET id = 20 WHERE id = 2").unwrap();
        let result = run(&mut ctx, "SELECT id FROM users WHERE name = 'Bob'").unwrap();
        assert_eq!(ids(&result), vec![Value::Integer(20)]);
    }

    #[test]
    fn test_delete() {
        let mut ctx = ExecutionContext::in_memory();
        users(&mut ctx);

        let result = run(&mut ctx, "DELETE FROM users WHERE age < 30").unwrap();
        assert_eq!(result.affected_rows(), 1);
        let result = run(&mut ctx, "SELECT * FROM users").unwrap();
        assert_eq!(ids(&result), vec![Value::Integer(2), Value::Integer(3)]);

        let result = run(&mut ctx, "DELETE FROM users").unwrap();
        assert_eq!(result.affected_rows(), 2);
        assert_eq!(run(&mut ctx, "SELECT * FROM users").unwrap().row_count(), 0);
    }

    #[test]
    fn test_where_unknown_column() {
        let mut ctx = ExecutionContext::in_memory();
        run(&mut ctx, "CREATE TABLE t (id INT)").unwrap();
        assert!(matches!(
            run(&mut ctx, "SELECT * FROM t WHERE nope = 1"),
            Err(MiniSqlError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            run(&mut ctx, "DELETE FROM t WHERE nope = 1"),
            Err(MiniSqlError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_primary_key_index_lifecycle() {
        let mut ctx = ExecutionContext::in_memory();
        users(&mut ctx);

        let indexes = ctx.indexes.as_ref().unwrap();
        assert!(indexes.has_index("users", "id"));
        let row = indexes.search_index("users", "id", &Value::Integer(3)).unwrap();
        assert_eq!(row["name"], Value::Text("Charlie".into()));

        run(&mut ctx, "DELETE FROM users WHERE id = 3").unwrap();
        assert!(!ctx.indexes.as_ref().unwrap().has_index("users", "id"));

        // next insert rebuilds from the current rows
        run(&mut ctx, "INSERT INTO users (id, name, age) VALUES (4, 'Dan', 22)").unwrap();
        let indexes = ctx.indexes.as_ref().unwrap();
        assert_eq!(indexes.get("users", "id").unwrap().len(), 3);
        assert!(indexes.search_index("users", "id", &Value::Integer(3)).is_none());
        assert!(indexes.search_index("users", "id", &Value::Integer(4)).is_some());
    }

    #[test]
    fn test_create_and_drop_table() {
        let mut ctx = ExecutionContext::in_memory();
        assert!(matches!(
            run(&mut ctx, "DROP TABLE users"),
            Err(MiniSqlError::Schema(_))
        ));

        users(&mut ctx);
        assert!(matches!(
            run(&mut ctx, "CREATE TABLE users (id INT)"),
            Err(MiniSqlError::Schema(_))
        ));

        let result = run(&mut ctx, "DROP TABLE users").unwrap();
        assert_eq!(result.to_string(), "Table 'users' dropped");
        assert!(ctx.catalog.is_empty());
        assert!(ctx.indexes.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_statement() {
        let mut ctx = ExecutionContext::in_memory();
        let err = run(&mut ctx, "SHOW TABLES").unwrap_err();
        assert!(matches!(err, MiniSqlError::UnsupportedStatement(ref w) if w == "SHOW"));
    }

    #[test]
    fn test_mutations_persist_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.bin");

        let mut ctx = ExecutionContext::new(TableRegistry::open(&path).unwrap());
        users(&mut ctx);
        // a failed statement does not reach the save
        run(&mut ctx, "INSERT INTO users (id, name, age) VALUES (1, 'X', 1)").unwrap_err();

        let reloaded = TableRegistry::open(&path).unwrap();
        assert_eq!(reloaded.get("users").unwrap().row_count(), 3);
    }

    #[test]
    fn test_row_files_mirror_mutations() {
        let temp_dir = TempDir::new().unwrap();
        let records = RecordManager::new(RowStorageConfig::new(temp_dir.path())).unwrap();
        let mut ctx = ExecutionContext::in_memory().with_records(records);
        users(&mut ctx);

        run(&mut ctx, "UPDATE users SET age = 99 WHERE id = 1").unwrap();
        run(&mut ctx, "DELETE FROM users WHERE id = 2").unwrap();

        let records = ctx.records.as_ref().unwrap();
        let rows = records.select_all("users");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["age"], Value::Integer(99));
        assert_eq!(rows[1]["id"], Value::Integer(3));

        run(&mut ctx, "DROP TABLE users").unwrap();
        assert!(!ctx.records.as_ref().unwrap().table_path("users").exists());
    }

    #[test]
    fn test_row_files_survive_non_finite_float() {
        let temp_dir = TempDir::new().unwrap();
        let records = RecordManager::new(RowStorageConfig::new(temp_dir.path())).unwrap();
        let mut ctx = ExecutionContext::in_memory().with_records(records);
        run(&mut ctx, "CREATE TABLE m (id INT PRIMARY KEY, f FLOAT)").unwrap();
        run(&mut ctx, "INSERT INTO m (id, f) VALUES (1, 1.5)").unwrap();
        run(&mut ctx, "INSERT INTO m (id, f) VALUES (2, 'inf')").unwrap();
        assert_eq!(ctx.records.as_ref().unwrap().select_all("m").len(), 2);

        let result = run(&mut ctx, "DELETE FROM m WHERE id = 99").unwrap();
        assert_eq!(result.affected_rows(), 0);

        let rows = ctx.records.as_ref().unwrap().select_all("m");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["f"], Value::Text("inf".into()));
    }

    #[test]
    fn test_display() {
        let mut ctx = ExecutionContext::in_memory();
        users(&mut ctx);
        let result = run(&mut ctx, "SELECT id, name FROM users WHERE id = 1").unwrap();
        assert_eq!(result.to_string(), "id | name \n---+------\n1  | Alice\n(1 row)");

        let result = run(&mut ctx, "DELETE FROM users").unwrap();
        assert_eq!(result.to_string(), "Deleted 3 rows");
    }
}
