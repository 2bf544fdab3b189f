/// MiniSQL statement engine
///
/// Architecture:
/// - Lexer: Tokenizes SQL strings
/// - Parser: Builds a typed AST from tokens
/// - Evaluator: Checks one WHERE clause against a row
/// - Executor: Runs statements against the catalog

pub mod ast;
pub mod evaluator;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{
    Assignment, ColumnSpec, Condition, CreateTableStmt, DeleteStmt, DropTableStmt, InsertStmt,
    Literal, Projection, SelectStmt, Statement, UpdateStmt,
};
pub use evaluator::evaluate;
pub use executor::{ExecutionContext, ModificationKind, QueryExecutor, QueryResult};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{CompareOp, Keyword, Token, TokenKind, TokenType};

use crate::error::Result;

/// Lex and parse one statement
pub fn parse_sql(sql: &str) -> Result<Statement> {
    let mut lexer = Lexer::new(sql);
    let tokens = lexer.tokenize()?;
    let mut parser = Parser::new(tokens);
    parser.parse()
}

/// Parse and execute a SQL statement
pub fn execute_sql(ctx: &mut ExecutionContext, sql: &str) -> Result<QueryResult> {
    let statement = parse_sql(sql)?;
    QueryExecutor::new(ctx).execute(statement)
}
