//! SQL lexer/tokenizer.
//!
//! The [`Lexer`] converts a SQL string into a stream of [`Token`]s.
//! It handles keywords, identifiers, literals, operators, and comments.

use super::error::Span;
use super::token::{Keyword, Token, TokenKind};

/// SQL lexer that tokenizes input strings.
///
/// The lexer implements `Iterator<Item = Token>`. It handles:
/// - Keywords (case-insensitive)
/// - Identifiers (unquoted and double-quoted)
/// - Numeric literals (integers and decimals, with an optional leading `-`)
/// - String literals (single-quoted with '' escape)
/// - Operators, punctuation and `?` placeholders
/// - Comments (-- line comments and /* */ block comments)
///
/// Lexical errors are returned as `TokenKind::Error` tokens rather than
/// being accumulated separately.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// Whether EOF has been returned.
    eof_returned: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            eof_returned: false,
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.pos..].starts_with(prefix)
    }

    /// Returns the character at `pos + offset` without consuming it.
    fn peek(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    /// Advances the position by `n` characters.
    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            if let Some(ch) = self.peek(0) {
                self.pos += ch.len_utf8();
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Option<Token> {
        loop {
            self.skip_whitespace();
            match self.skip_comment() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(token) => return Some(token),
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek(0).is_some_and(|ch| ch.is_whitespace()) {
            self.advance(1);
        }
    }

    /// Attempts to skip a comment.
    ///
    /// Returns `Ok(true)` if a comment was skipped, `Ok(false)` if no comment was present,
    /// or `Err(Token)` for an unterminated block comment.
    fn skip_comment(&mut self) -> Result<bool, Token> {
        if self.starts_with("--") {
            self.advance(2);
            while let Some(ch) = self.peek(0) {
                self.advance(1);
                if ch == '\n' {
                    break;
                }
            }
            return Ok(true);
        }

        if self.starts_with("/*") {
            let start = self.pos;
            self.advance(2);
            let mut depth = 1;
            while depth > 0 && !self.is_eof() {
                if self.starts_with("/*") {
                    depth += 1;
                    self.advance(2);
                } else if self.starts_with("*/") {
                    depth -= 1;
                    self.advance(2);
                } else {
                    self.advance(1);
                }
            }
            if depth > 0 {
                return Err(Token::new(
                    TokenKind::Error("unterminated block comment".to_string()),
                    Span::new(start, self.pos),
                ));
            }
            return Ok(true);
        }

        Ok(false)
    }

    /// Scans the next token from the input.
    fn scan_token(&mut self) -> Token {
        if let Some(error_token) = self.skip_whitespace_and_comments() {
            return error_token;
        }

        let start = self.pos;
        let Some(ch) = self.peek(0) else {
            return Token::new(TokenKind::Eof, Span::at(start));
        };

        if ch == '\'' {
            return self.scan_string_literal();
        }

        if ch == '"' {
            return self.scan_quoted_identifier();
        }

        if ch.is_ascii_digit()
            || (ch == '-' && self.peek(1).is_some_and(|c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if is_ident_start(ch) {
            return self.scan_identifier_or_keyword();
        }

        self.scan_operator_or_punctuation()
    }

    fn scan_string_literal(&mut self) -> Token {
        let start = self.pos;
        self.advance(1);

        let mut value = String::new();
        let mut unterminated = false;

        loop {
            match self.peek(0) {
                None => {
                    unterminated = true;
                    break;
                }
                Some('\'') => {
                    self.advance(1);
                    if self.peek(0) == Some('\'') {
                        value.push('\'');
                        self.advance(1);
                    } else {
                        break;
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance(1);
                }
            }
        }

        let span = Span::new(start, self.pos);
        if unterminated {
            Token::new(
                TokenKind::Error("unterminated string literal".to_string()),
                span,
            )
        } else {
            Token::new(TokenKind::String(value), span)
        }
    }

    fn scan_quoted_identifier(&mut self) -> Token {
        let start = self.pos;
        self.advance(1);

        let mut value = String::new();
        let mut unterminated = false;

        loop {
            match self.peek(0) {
                None => {
                    unterminated = true;
                    break;
                }
                Some('"') => {
                    self.advance(1);
                    if self.peek(0) == Some('"') {
                        value.push('"');
                        self.advance(1);
                    } else {
                        break;
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance(1);
                }
            }
        }

        let span = Span::new(start, self.pos);
        if unterminated {
            Token::new(
                TokenKind::Error("unterminated quoted identifier".to_string()),
                span,
            )
        } else {
            Token::new(TokenKind::QuotedIdentifier(value), span)
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;
        if self.peek(0) == Some('-') {
            self.advance(1);
        }
        self.skip_digits();

        let mut dots = 0;
        while self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            dots += 1;
            self.advance(1);
            self.skip_digits();
        }

        let text = &self.input[start..self.pos];
        let span = Span::new(start, self.pos);

        if dots > 1 || self.peek(0).is_some_and(is_ident_continue) {
            return Token::new(TokenKind::Error("invalid number literal".to_string()), span);
        }

        if dots == 1 {
            return Token::new(TokenKind::Decimal(text.to_string()), span);
        }
        match text.parse::<i64>() {
            Ok(n) => Token::new(TokenKind::Integer(n), span),
            Err(_) => Token::new(TokenKind::Decimal(text.to_string()), span),
        }
    }

    fn skip_digits(&mut self) {
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }
    }

    fn scan_identifier_or_keyword(&mut self) -> Token {
        let start = self.pos;

        while self.peek(0).is_some_and(is_ident_continue) {
            self.advance(1);
        }

        let ident = &self.input[start..self.pos];
        let span = Span::new(start, self.pos);

        match Keyword::parse(ident) {
            Some(kw) => Token::new(TokenKind::Keyword(kw), span),
            None => Token::new(TokenKind::Identifier(ident.to_string()), span),
        }
    }

    fn scan_operator_or_punctuation(&mut self) -> Token {
        let start = self.pos;

        for (text, kind) in [
            ("<>", TokenKind::Neq),
            ("!=", TokenKind::Neq),
            ("<=", TokenKind::LtEq),
            (">=", TokenKind::GtEq),
        ] {
            if self.starts_with(text) {
                self.advance(2);
                return Token::new(kind, Span::new(start, self.pos));
            }
        }

        let Some(ch) = self.peek(0) else {
            return Token::new(TokenKind::Eof, Span::at(start));
        };
        self.advance(1);
        let kind = match ch {
            '*' => TokenKind::Asterisk,
            '=' => TokenKind::Eq,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Placeholder,
            _ => TokenKind::Error(format!("unexpected character '{ch}'")),
        };

        Token::new(kind, Span::new(start, self.pos))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof_returned {
            return None;
        }

        let token = self.scan_token();
        if token.is_eof() {
            self.eof_returned = true;
        }
        Some(token)
    }
}

/// Returns true if the character can start an identifier.
fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

/// Returns true if the character can continue an identifier.
fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).map(|t| t.kind).collect()
    }

    fn kw(keyword: Keyword) -> TokenKind {
        TokenKind::Keyword(keyword)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
        assert_eq!(lex("  \n\t  "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            lex("select FROM WhErE"),
            vec![
                kw(Keyword::Select),
                kw(Keyword::From),
                kw(Keyword::Where),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            lex("foo bar_baz _test ação"),
            vec![
                TokenKind::Identifier("foo".to_string()),
                TokenKind::Identifier("bar_baz".to_string()),
                TokenKind::Identifier("_test".to_string()),
                TokenKind::Identifier("ação".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_identifiers() {
        assert_eq!(
            lex(r#""client.db" "has""quotes""#),
            vec![
                TokenKind::QuotedIdentifier("client.db".to_string()),
                TokenKind::QuotedIdentifier("has\"quotes".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex("0 42 -7 3.5 -123.2"),
            vec![
                TokenKind::Integer(0),
                TokenKind::Integer(42),
                TokenKind::Integer(-7),
                TokenKind::Decimal("3.5".to_string()),
                TokenKind::Decimal("-123.2".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_with_two_dots() {
        assert_eq!(
            lex("123.8.7"),
            vec![
                TokenKind::Error("invalid number literal".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            lex("'hello' 'it''s' ''"),
            vec![
                TokenKind::String("hello".to_string()),
                TokenKind::String("it's".to_string()),
                TokenKind::String(String::new()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators_and_punctuation() {
        assert_eq!(
            lex("* = <> != < <= > >= ( ) , ; . ?"),
            vec![
                TokenKind::Asterisk,
                TokenKind::Eq,
                TokenKind::Neq,
                TokenKind::Neq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Dot,
                TokenKind::Placeholder,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            lex("SELECT -- line\n/* outer /* nested */ */ FROM"),
            vec![kw(Keyword::Select), kw(Keyword::From), TokenKind::Eof]
        );
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(
            lex("geog.tblAC"),
            vec![
                TokenKind::Identifier("geog".to_string()),
                TokenKind::Dot,
                TokenKind::Identifier("tblAC".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            lex("'unterminated"),
            vec![
                TokenKind::Error("unterminated string literal".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(
            lex("SELECT /* unterminated"),
            vec![
                kw(Keyword::Select),
                TokenKind::Error("unterminated block comment".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(
            lex("SELECT @ FROM"),
            vec![
                kw(Keyword::Select),
                TokenKind::Error("unexpected character '@'".to_string()),
                kw(Keyword::From),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_token_spans() {
        let tokens: Vec<_> = Lexer::new("SELECT foo").collect();

        assert_eq!(tokens[0].span, Span::new(0, 6));
        assert_eq!(tokens[1].span, Span::new(7, 10));
        assert_eq!(tokens[2].span, Span::at(10));
    }

    #[test]
    fn test_iterator_stops_after_eof() {
        let mut lexer = Lexer::new("SELECT");
        assert!(lexer.next().is_some());
        assert!(lexer.next().is_some());
        assert!(lexer.next().is_none());
        assert!(lexer.next().is_none());
    }
}
