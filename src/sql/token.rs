/// Token types for the SQL lexer
use phf::phf_map;
use std::fmt;

// Perfect hash map for O(1) keyword lookup (keys are lower-case)
static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "select" => Keyword::Select,
    "from" => Keyword::From,
    "where" => Keyword::Where,
    "insert" => Keyword::Insert,
    "into" => Keyword::Into,
    "values" => Keyword::Values,
    "update" => Keyword::Update,
    "set" => Keyword::Set,
    "delete" => Keyword::Delete,
    "create" => Keyword::Create,
    "table" => Keyword::Table,
    "drop" => Keyword::Drop,
    "primary" => Keyword::Primary,
    "key" => Keyword::Key,
};

/// Reserved words. Matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Create,
    Table,
    Drop,
    Primary,
    Key,
}

impl Keyword {
    pub fn lookup(word: &str) -> Option<Self> {
        KEYWORDS.get(word.to_ascii_lowercase().as_str()).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Update => "UPDATE",
            Keyword::Set => "SET",
            Keyword::Delete => "DELETE",
            Keyword::Create => "CREATE",
            Keyword::Table => "TABLE",
            Keyword::Drop => "DROP",
            Keyword::Primary => "PRIMARY",
            Keyword::Key => "KEY",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq, // =
    Ne, // !=
    Lt, // <
    Gt, // >
    Le, // <=
    Ge, // >=
}

impl CompareOp {
    /// Scan order: two-character operators first so `=` never matches
    /// inside `>=`
    pub const SCAN_ORDER: [CompareOp; 6] = [
        CompareOp::Ge,
        CompareOp::Le,
        CompareOp::Ne,
        CompareOp::Eq,
        CompareOp::Gt,
        CompareOp::Lt,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        }
    }

    /// Apply this operator to an ordering result
    pub fn matches(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Lt => ordering == Less,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Le => ordering != Greater,
            CompareOp::Ge => ordering != Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Coarse token category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Literal,
    Operator,
    Punctuation,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Keyword(Keyword),
    Identifier(String),

    // Literals
    Integer(i64),
    Float(f64),
    String(String),

    Operator(CompareOp),

    // Punctuation
    LParen,    // (
    RParen,    // )
    Comma,     // ,
    Star,      // *
    Semicolon, // ;

    Eof,
}

impl TokenType {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenType::Keyword(_) => TokenKind::Keyword,
            TokenType::Identifier(_) => TokenKind::Identifier,
            TokenType::Integer(_) | TokenType::Float(_) | TokenType::String(_) => {
                TokenKind::Literal
            }
            TokenType::Operator(_) => TokenKind::Operator,
            TokenType::LParen
            | TokenType::RParen
            | TokenType::Comma
            | TokenType::Star
            | TokenType::Semicolon => TokenKind::Punctuation,
            TokenType::Eof => TokenKind::Eof,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    /// Source text as written (case preserved, quotes included)
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(token_type: TokenType, text: String, line: usize, column: usize) -> Self {
        Self { token_type, text, line, column }
    }

    pub fn kind(&self) -> TokenKind {
        self.token_type.kind()
    }

    /// Human-readable form for error messages
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}
