/// SQL Parser - converts tokens into AST
use super::ast::*;
use super::token::{CompareOp, Keyword, Token, TokenType};
use crate::error::{MiniSqlError, Result};
use crate::types::ColumnType;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// `tokens` must end with `Eof`, as produced by the lexer
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.token_type), Some(TokenType::Eof)) {
            let (line, column) = tokens
                .last()
                .map(|t| (t.line, t.column + t.text.len()))
                .unwrap_or((1, 1));
            tokens.push(Token::new(TokenType::Eof, String::new(), line, column));
        }
        Self { tokens, position: 0 }
    }

    /// Parse exactly one statement, optionally terminated by `;`
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = match &self.current().token_type {
            TokenType::Keyword(Keyword::Select) => Statement::Select(self.parse_select()?),
            TokenType::Keyword(Keyword::Insert) => Statement::Insert(self.parse_insert()?),
            TokenType::Keyword(Keyword::Update) => Statement::Update(self.parse_update()?),
            TokenType::Keyword(Keyword::Delete) => Statement::Delete(self.parse_delete()?),
            TokenType::Keyword(Keyword::Create) => {
                Statement::CreateTable(self.parse_create_table()?)
            }
            TokenType::Keyword(Keyword::Drop) => Statement::DropTable(self.parse_drop_table()?),
            TokenType::Keyword(keyword) => {
                let word = keyword.as_str().to_string();
                return Ok(self.unknown(word));
            }
            TokenType::Identifier(word) => {
                let word = word.to_uppercase();
                return Ok(self.unknown(word));
            }
            _ => return Err(self.error("statement")),
        };

        // Optionally consume semicolon
        self.match_token(&TokenType::Semicolon);

        if !matches!(self.current().token_type, TokenType::Eof) {
            return Err(self.error("end of input"));
        }

        Ok(stmt)
    }

    /// Unsupported statement: the rest of the input is not inspected
    fn unknown(&mut self, word: String) -> Statement {
        self.position = self.tokens.len() - 1;
        Statement::Unknown(word)
    }

    /// Parse SELECT statement
    fn parse_select(&mut self) -> Result<SelectStmt> {
        self.expect_keyword(Keyword::Select)?;

        let columns = if self.match_token(&TokenType::Star) {
            Projection::Star
        } else {
            Projection::Columns(self.parse_identifier_list()?)
        };

        self.expect_keyword(Keyword::From)?;
        let table = self.parse_identifier()?;
        let where_clause = self.parse_where()?;

        Ok(SelectStmt {
            columns,
            table,
            where_clause,
        })
    }

    /// Parse INSERT statement
    fn parse_insert(&mut self) -> Result<InsertStmt> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;

        let table = self.parse_identifier()?;

        self.expect(&TokenType::LParen, "'('")?;
        let columns = self.parse_identifier_list()?;
        self.expect(&TokenType::RParen, "')'")?;

        self.expect_keyword(Keyword::Values)?;

        self.expect(&TokenType::LParen, "'('")?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_literal()?);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        self.expect(&TokenType::RParen, "')'")?;

        Ok(InsertStmt { table, columns, values })
    }

    /// Parse UPDATE statement
    fn parse_update(&mut self) -> Result<UpdateStmt> {
        self.expect_keyword(Keyword::Update)?;
        let table = self.parse_identifier()?;
        self.expect_keyword(Keyword::Set)?;

        // Parse assignments
        let mut assignments = Vec::new();
        loop {
            let column = self.parse_identifier()?;
            self.expect(&TokenType::Operator(CompareOp::Eq), "'='")?;
            let value = self.parse_literal()?;
            assignments.push(Assignment { column, value });

            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }

        let where_clause = self.parse_where()?;

        Ok(UpdateStmt {
            table,
            assignments,
            where_clause,
        })
    }

    /// Parse DELETE statement
    fn parse_delete(&mut self) -> Result<DeleteStmt> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.parse_identifier()?;
        let where_clause = self.parse_where()?;

        Ok(DeleteStmt { table, where_clause })
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStmt> {
        self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.parse_identifier()?;

        self.expect(&TokenType::LParen, "'('")?;
        let columns = self.parse_column_defs()?;
        self.expect(&TokenType::RParen, "')'")?;

        Ok(CreateTableStmt { table, columns })
    }

    fn parse_column_defs(&mut self) -> Result<Vec<ColumnSpec>> {
        let mut columns = Vec::new();

        loop {
            let name = self.parse_identifier()?;
            let data_type = self.parse_data_type()?;

            let primary_key = if self.match_keyword(Keyword::Primary) {
                self.expect_keyword(Keyword::Key)?;
                true
            } else {
                false
            };

            columns.push(ColumnSpec {
                name,
                data_type,
                primary_key,
            });

            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }

        Ok(columns)
    }

    fn parse_data_type(&mut self) -> Result<ColumnType> {
        const EXPECTED: &str = "column type (INT, FLOAT, STRING or BOOL)";

        let data_type = match &self.current().token_type {
            TokenType::Identifier(word) => ColumnType::from_type_name(word),
            _ => None,
        };
        match data_type {
            Some(data_type) => {
                self.advance();
                Ok(data_type)
            }
            None => Err(self.error(EXPECTED)),
        }
    }

    fn parse_drop_table(&mut self) -> Result<DropTableStmt> {
        self.expect_keyword(Keyword::Drop)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.parse_identifier()?;
        Ok(DropTableStmt { table })
    }

    /// `(WHERE condition)?`
    fn parse_where(&mut self) -> Result<Option<Condition>> {
        if self.match_keyword(Keyword::Where) {
            Ok(Some(self.parse_condition()?))
        } else {
            Ok(None)
        }
    }

    /// condition := ident comparator litOrIdent
    fn parse_condition(&mut self) -> Result<Condition> {
        let column = self.parse_identifier()?;

        let op = match self.current().token_type {
            TokenType::Operator(op) => op,
            _ => return Err(self.error("comparison operator")),
        };
        self.advance();

        let value = self.parse_literal()?;
        Ok(Condition::new(column, op, value))
    }

    // Helper methods

    fn parse_literal(&mut self) -> Result<Literal> {
        let literal = match &self.current().token_type {
            TokenType::Integer(i) => Literal::Integer(*i),
            TokenType::Float(f) => Literal::Float(*f),
            TokenType::String(s) => Literal::String(s.clone()),
            TokenType::Identifier(s) => Literal::Identifier(s.clone()),
            _ => return Err(self.error("literal or identifier")),
        };
        self.advance();
        Ok(literal)
    }

    fn parse_identifier(&mut self) -> Result<String> {
        if let TokenType::Identifier(name) = &self.current().token_type {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error("identifier"))
        }
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        let mut list = Vec::new();
        loop {
            list.push(self.parse_identifier()?);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        Ok(list)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if &self.current().token_type == token_type {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, keyword: Keyword) -> bool {
        self.match_token(&TokenType::Keyword(keyword))
    }

    fn expect(&mut self, token_type: &TokenType, expected: &str) -> Result<()> {
        if self.match_token(token_type) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(keyword.as_str()))
        }
    }

    fn error(&self, expected: &str) -> MiniSqlError {
        let token = self.current();
        MiniSqlError::Parse {
            expected: expected.to_string(),
            found: token.describe(),
            line: token.line,
            column: token.column,
        }
    }
}
