/// Condition evaluator - checks one comparison clause against a row
use super::ast::{Condition, Literal};
use super::token::CompareOp;
use crate::error::{MiniSqlError, Result};
use crate::types::{parse_bool, ColumnDef, ColumnType, SqlRow, TableSchema, Value};
use std::cmp::Ordering;

/// Evaluate `cond` against `row`.
///
/// The column is resolved case-insensitively through `schema`. A missing
/// (NULL) cell only satisfies `!=`.
pub fn evaluate(row: &SqlRow, cond: &Condition, schema: &TableSchema) -> Result<bool> {
    let column = schema
        .get_column(&cond.column)
        .ok_or_else(|| MiniSqlError::column_not_found(&schema.name, &cond.column))?;

    let actual = match row.get(&column.name) {
        Some(value) if !value.is_null() => value,
        _ => return Ok(cond.op == CompareOp::Ne),
    };

    let ordering = compare(actual, &cond.value, column.col_type);
    Ok(cond.op.matches(ordering))
}

/// Compare a stored cell with a literal under the column's declared type.
///
/// Numeric and boolean columns try to read both sides as their type first
/// and fall back to comparing text when either side does not parse.
fn compare(actual: &Value, target: &Literal, col_type: ColumnType) -> Ordering {
    let target_value = target.to_value();

    let typed = match col_type {
        ColumnType::Integer => match (actual.as_i64(), target_value.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => compare_f64(actual, &target_value),
        },
        ColumnType::Float => compare_f64(actual, &target_value),
        ColumnType::Boolean => match (actual.as_bool(), target_value.as_bool()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        },
        ColumnType::Text => None,
    };

    typed.unwrap_or_else(|| actual.to_string().cmp(&target.as_text()))
}

fn compare_f64(a: &Value, b: &Value) -> Option<Ordering> {
    Some(a.as_f64()?.total_cmp(&b.as_f64()?))
}

/// Convert a literal into the value stored for `column`.
///
/// INT columns must receive an integer; FLOAT and BOOL columns take the
/// typed value when the literal parses and keep the text otherwise.
/// Non-finite floats (`'NaN'`, `'inf'`) are kept as text.
pub fn coerce_literal(literal: &Literal, column: &ColumnDef) -> Result<Value> {
    let text = literal.as_text();
    let value = match column.col_type {
        ColumnType::Integer => match literal {
            Literal::Integer(i) => Value::Integer(*i),
            _ => text.trim().parse::<i64>().map(Value::Integer).map_err(|_| {
                MiniSqlError::TypeError(format!(
                    "column '{}' expects {}, got '{}'",
                    column.name, column.col_type, text
                ))
            })?,
        },
        ColumnType::Float => match literal {
            Literal::Integer(i) => Value::Float(*i as f64),
            Literal::Float(f) if f.is_finite() => Value::Float(*f),
            _ => match text.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Value::Float(f),
                _ => Value::Text(text),
            },
        },
        ColumnType::Boolean => match parse_bool(&text) {
            Some(b) => Value::Bool(b),
            None => Value::Text(text),
        },
        ColumnType::Text => Value::Text(text),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> TableSchema {
        TableSchema::new(
            "people".into(),
            vec![
                ColumnDef::new("id", ColumnType::Integer, 0).primary_key(),
                ColumnDef::new("name", ColumnType::Text, 1),
                ColumnDef::new("age", ColumnType::Integer, 2),
                ColumnDef::new("score", ColumnType::Float, 3),
                ColumnDef::new("active", ColumnType::Boolean, 4),
            ],
        )
    }

    fn row(id: i64, name: &str, age: i64) -> SqlRow {
        let mut row = SqlRow::new();
        row.insert("id".into(), Value::Integer(id));
        row.insert("name".into(), Value::Text(name.into()));
        row.insert("age".into(), Value::Integer(age));
        row.insert("score".into(), Value::Float(7.5));
        row.insert("active".into(), Value::Bool(true));
        row
    }

    fn eval(r: &SqlRow, cond: &str) -> bool {
        evaluate(r, &cond.parse().unwrap(), &people()).unwrap()
    }

    #[test]
    fn test_int_column_compares_numerically() {
        let r = row(1, "Al", 10);
        assert!(eval(&r, "age > 9"));
        assert!(eval(&r, "age > '9'"));
        assert!(!eval(&r, "age < '9'"));
        assert!(eval(&r, "AGE >= 10"));
        assert!(eval(&r, "age <= 10"));
        assert!(!eval(&r, "age != 10"));
    }

    #[test]
    fn test_int_column_falls_back_to_text() {
        let r = row(1, "Al", 10);
        // "10" vs "abc" lexically
        assert!(eval(&r, "age < abc"));
        assert!(!eval(&r, "age = abc"));
    }

    #[test]
    fn test_text_column_compares_lexically() {
        let r = row(1, "Bob", 30);
        assert!(eval(&r, "name = 'Bob'"));
        assert!(eval(&r, "name = Bob"));
        assert!(eval(&r, "name > 'Alice'"));
        assert!(!eval(&r, "name = 'bob'"));
    }

    #[test]
    fn test_float_and_bool_columns() {
        let r = row(1, "Al", 10);
        assert!(eval(&r, "score > 7"));
        assert!(eval(&r, "score = 7.5"));
        assert!(eval(&r, "active = true"));
        assert!(eval(&r, "active != 'false'"));
    }

    #[test]
    fn test_null_only_matches_not_equal() {
        let mut r = row(1, "Al", 10);
        r.remove("age");
        assert!(!eval(&r, "age = 10"));
        assert!(!eval(&r, "age < 10"));
        assert!(eval(&r, "age != 10"));
    }

    #[test]
    fn test_unknown_column() {
        let r = row(1, "Al", 10);
        let err = evaluate(&r, &"height > 1".parse().unwrap(), &people()).unwrap_err();
        assert!(matches!(err, MiniSqlError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_coerce_literal() {
        let schema = people();
        let age = schema.get_column("age").unwrap();
        let score = schema.get_column("score").unwrap();
        let active = schema.get_column("active").unwrap();
        let name = schema.get_column("name").unwrap();

        assert_eq!(
            coerce_literal(&Literal::String(" 42 ".into()), age).unwrap(),
            Value::Integer(42)
        );
        assert!(matches!(
            coerce_literal(&Literal::String("x".into()), age),
            Err(MiniSqlError::TypeError(_))
        ));
        assert_eq!(coerce_literal(&Literal::Integer(2), score).unwrap(), Value::Float(2.0));
        assert_eq!(
            coerce_literal(&Literal::String("n/a".into()), score).unwrap(),
            Value::Text("n/a".into())
        );
        assert_eq!(
            coerce_literal(&Literal::Identifier("FALSE".into()), active).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(coerce_literal(&Literal::Integer(5), name).unwrap(), Value::Text("5".into()));
    }

    #[test]
    fn test_coerce_non_finite_float_stays_text() {
        let schema = people();
        let score = schema.get_column("score").unwrap();
        for text in ["NaN", "inf", "-infinity"] {
            assert_eq!(
                coerce_literal(&Literal::String(text.into()), score).unwrap(),
                Value::Text(text.into())
            );
        }
        assert_eq!(
            coerce_literal(&Literal::Float(f64::NAN), score).unwrap(),
            Value::Text("NaN".into())
        );
    }
}
