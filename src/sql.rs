//! SQL parsing module.
//!
//! This module provides a handwritten recursive descent parser that converts
//! SQL SELECT text into an Abstract Syntax Tree (AST) for planning.

mod ast;
mod error;
mod expr;
mod lexer;
mod parser;
mod token;

pub use ast::*;
pub use error::{Span, SyntaxError, SyntaxErrorKind};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Keyword, Token, TokenKind};

/// Parses SQL text into its statements.
pub fn parse(sql: &str) -> Result<Vec<Statement>, SyntaxError> {
    Parser::new(sql).parse()
}
