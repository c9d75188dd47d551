//! SQL token types.
//!
//! This module defines the [`Token`] type produced by the lexer, including
//! keywords, operators, literals, identifiers and `?` placeholders.

use super::error::Span;

/// A SQL token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token kind.
    pub kind: TokenKind,
    /// The span of this token in the source.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an end-of-file token.
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// The kind of a SQL token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal (e.g., 42, -123).
    Integer(i64),
    /// Decimal literal kept as written (e.g., 3.14, -123.2).
    Decimal(String),
    /// String literal (e.g., 'hello').
    String(String),

    // Identifiers and keywords
    /// Unquoted identifier (e.g., foo, my_table).
    Identifier(String),
    /// Quoted identifier (e.g., "client.db").
    QuotedIdentifier(String),
    /// Bind placeholder `?`.
    Placeholder,

    Keyword(Keyword),

    // Operators
    /// *
    Asterisk,
    /// =
    Eq,
    /// <> or !=
    Neq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,

    // Punctuation
    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,

    /// Lexical error.
    Error(String),

    /// End of file/input.
    Eof,
}

impl TokenKind {
    /// Returns the display name for error messages.
    pub fn display_name(&self) -> String {
        match self {
            TokenKind::Integer(n) => format!("integer '{n}'"),
            TokenKind::Decimal(n) => format!("number '{n}'"),
            TokenKind::String(s) => format!("string '{s}'"),
            TokenKind::Identifier(s) => format!("identifier '{s}'"),
            TokenKind::QuotedIdentifier(s) => format!("identifier '\"{s}\"'"),
            TokenKind::Placeholder => "'?'".to_string(),
            TokenKind::Keyword(kw) => format!("keyword '{}'", kw.as_str()),
            TokenKind::Asterisk => "'*'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::Neq => "'<>'".to_string(),
            TokenKind::Lt => "'<'".to_string(),
            TokenKind::LtEq => "'<='".to_string(),
            TokenKind::Gt => "'>'".to_string(),
            TokenKind::GtEq => "'>='".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Error(msg) => format!("invalid token ({msg})"),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

/// SQL keywords.
///
/// Keywords are case-insensitive. Only words with grammatical meaning in a
/// SELECT are reserved, so column names such as `date` or `first` stay
/// plain identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Select,
    From,
    Where,
    As,
    Distinct,
    Group,
    Order,
    By,
    Asc,
    Desc,

    // JOIN
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    On,

    // Logical / Comparison
    And,
    Or,
    Not,
    Is,
    Null,
    True,
    False,
    Between,
    Like,
    Ilike,

    // CONVERT(value USING charset)
    Using,
}

impl Keyword {
    /// Returns the string representation of this keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::As => "AS",
            Keyword::Distinct => "DISTINCT",
            Keyword::Group => "GROUP",
            Keyword::Order => "ORDER",
            Keyword::By => "BY",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::Join => "JOIN",
            Keyword::Inner => "INNER",
            Keyword::Left => "LEFT",
            Keyword::Right => "RIGHT",
            Keyword::Full => "FULL",
            Keyword::Outer => "OUTER",
            Keyword::Cross => "CROSS",
            Keyword::On => "ON",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::Is => "IS",
            Keyword::Null => "NULL",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
            Keyword::Between => "BETWEEN",
            Keyword::Like => "LIKE",
            Keyword::Ilike => "ILIKE",
            Keyword::Using => "USING",
        }
    }

    /// Attempts to parse a keyword from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Some(Keyword::Select),
            "FROM" => Some(Keyword::From),
            "WHERE" => Some(Keyword::Where),
            "AS" => Some(Keyword::As),
            "DISTINCT" => Some(Keyword::Distinct),
            "GROUP" => Some(Keyword::Group),
            "ORDER" => Some(Keyword::Order),
            "BY" => Some(Keyword::By),
            "ASC" => Some(Keyword::Asc),
            "DESC" => Some(Keyword::Desc),
            "JOIN" => Some(Keyword::Join),
            "INNER" => Some(Keyword::Inner),
            "LEFT" => Some(Keyword::Left),
            "RIGHT" => Some(Keyword::Right),
            "FULL" => Some(Keyword::Full),
            "OUTER" => Some(Keyword::Outer),
            "CROSS" => Some(Keyword::Cross),
            "ON" => Some(Keyword::On),
            "AND" => Some(Keyword::And),
            "OR" => Some(Keyword::Or),
            "NOT" => Some(Keyword::Not),
            "IS" => Some(Keyword::Is),
            "NULL" => Some(Keyword::Null),
            "TRUE" => Some(Keyword::True),
            "FALSE" => Some(Keyword::False),
            "BETWEEN" => Some(Keyword::Between),
            "LIKE" => Some(Keyword::Like),
            "ILIKE" => Some(Keyword::Ilike),
            "USING" => Some(Keyword::Using),
            _ => None,
        }
    }
}
