//! SQL syntax error types.
//!
//! This module provides the [`SyntaxError`] type for representing SQL syntax errors
//! with source position information for user-friendly error messages.

use std::fmt;

/// A span in the source SQL string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset from the start of the input.
    pub start: usize,
    /// Byte offset of the end of the span (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Creates a zero-length span at the given position.
    pub fn at(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Extends this span to include another span.
    pub fn extend(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Category of a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// Malformed token sequence.
    Unexpected,
    /// `*` passed to a function that does not take it.
    AsteriskInFunction,
    /// Literal argument that cannot be interpreted (unknown charset or type).
    InvalidParameter,
}

/// SQL syntax error with source position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Error category.
    pub kind: SyntaxErrorKind,
    /// Error message.
    pub message: String,
    /// Position in the source where the error occurred.
    pub span: Span,
}

impl SyntaxError {
    /// Creates a new syntax error at the given position.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: SyntaxErrorKind::Unexpected,
            message: message.into(),
            span,
        }
    }

    /// Creates a new error for an unexpected token.
    pub fn unexpected_token(expected: &str, found: &str, span: Span) -> Self {
        Self::new(format!("expected {expected}, found {found}"), span)
    }

    /// Creates a new error for an unexpected end of input.
    pub fn unexpected_eof(expected: &str, pos: usize) -> Self {
        Self::new(
            format!("unexpected end of input, expected {expected}"),
            Span::at(pos),
        )
    }

    /// Creates a new error for `*` used as a function argument.
    pub fn asterisk_in_function(function: &str, span: Span) -> Self {
        Self {
            kind: SyntaxErrorKind::AsteriskInFunction,
            message: format!("'*' is not allowed as an argument of {function}"),
            span,
        }
    }

    /// Creates a new error for an argument literal that cannot be interpreted.
    pub fn invalid_parameter(value: &str, span: Span) -> Self {
        Self {
            kind: SyntaxErrorKind::InvalidParameter,
            message: format!("invalid parameter value '{value}'"),
            span,
        }
    }

    /// Returns the 1-based character position for error reporting.
    pub fn position(&self) -> usize {
        self.span.start + 1
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.message, self.position())
    }
}

impl std::error::Error for SyntaxError {}
