/// SQL Lexer - converts SQL string into tokens
use super::token::{CompareOp, Keyword, Token, TokenType};
use crate::error::{MiniSqlError, Result};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let column = self.column;
        let start = self.position;

        if self.is_eof() {
            return Ok(Token::new(TokenType::Eof, String::new(), line, column));
        }

        let ch = self.current_char();

        let token_type = match ch {
            // String literals
            '\'' | '"' => self.read_string(ch)?,

            // Numbers, including a leading minus sign
            '0'..='9' => self.read_number()?,
            '-' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,

            // Identifiers and keywords
            c if c.is_alphabetic() || c == '_' => self.read_word(),

            // Comparison operators, two-character forms first
            '>' | '<' | '!' | '=' => self.read_operator(ch)?,

            '(' => self.single(TokenType::LParen),
            ')' => self.single(TokenType::RParen),
            ',' => self.single(TokenType::Comma),
            '*' => self.single(TokenType::Star),
            ';' => self.single(TokenType::Semicolon),

            _ => return Err(MiniSqlError::Lex { ch, line, column }),
        };

        let text: String = self.input[start..self.position].iter().collect();
        Ok(Token::new(token_type, text, line, column))
    }

    fn single(&mut self, token_type: TokenType) -> TokenType {
        self.advance();
        token_type
    }

    fn read_operator(&mut self, first: char) -> Result<TokenType> {
        let line = self.line;
        let column = self.column;
        self.advance();
        let followed_by_eq = !self.is_eof() && self.current_char() == '=';

        let op = match (first, followed_by_eq) {
            ('>', true) => CompareOp::Ge,
            ('<', true) => CompareOp::Le,
            ('!', true) => CompareOp::Ne,
            ('>', false) => CompareOp::Gt,
            ('<', false) => CompareOp::Lt,
            ('=', _) => CompareOp::Eq,
            _ => return Err(MiniSqlError::Lex { ch: first, line, column }),
        };
        if followed_by_eq && op != CompareOp::Eq {
            self.advance();
        }
        Ok(TokenType::Operator(op))
    }

    fn current_char(&self) -> char {
        if self.is_eof() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            if self.input[self.position] == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while !self.is_eof() && self.current_char().is_whitespace() {
                self.advance();
            }
            if self.current_char() == '-' && self.peek_char() == Some('-') {
                while !self.is_eof() && self.current_char() != '\n' {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<TokenType> {
        let line = self.line;
        let column = self.column;
        self.advance(); // skip opening quote
        let mut value = String::new();

        while !self.is_eof() && self.current_char() != quote {
            value.push(self.current_char());
            self.advance();
        }

        if self.is_eof() {
            return Err(MiniSqlError::UnterminatedString { line, column });
        }

        self.advance(); // skip closing quote
        Ok(TokenType::String(value))
    }

    fn read_number(&mut self) -> Result<TokenType> {
        let line = self.line;
        let column = self.column;
        let mut value = String::new();

        if self.current_char() == '-' {
            value.push('-');
            self.advance();
        }
        while !self.is_eof() && self.current_char().is_ascii_digit() {
            value.push(self.current_char());
            self.advance();
        }

        let is_float =
            self.current_char() == '.' && self.peek_char().is_some_and(|c| c.is_ascii_digit());
        if is_float {
            value.push('.');
            self.advance();
            while !self.is_eof() && self.current_char().is_ascii_digit() {
                value.push(self.current_char());
                self.advance();
            }
        }

        let parsed = if is_float {
            value
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(TokenType::Float)
        } else {
            value.parse::<i64>().ok().map(TokenType::Integer)
        };
        parsed.ok_or(MiniSqlError::InvalidNumber {
            text: value,
            line,
            column,
        })
    }

    fn read_word(&mut self) -> TokenType {
        let mut value = String::new();

        while !self.is_eof() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match Keyword::lookup(&value) {
            Some(keyword) => TokenType::Keyword(keyword),
            None => TokenType::Identifier(value),
        }
    }
}

/// Tokenize `text` in one call
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    Lexer::new(text).tokenize()
}
