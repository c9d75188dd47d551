//! SQL parser using recursive descent.
//!
//! The [`Parser`] converts a stream of tokens into an Abstract Syntax Tree (AST).
//! It uses recursive descent for statements and precedence climbing for
//! conditions (see `expr.rs`).

use super::ast::*;
use super::error::{Span, SyntaxError};
use super::lexer::Lexer;
use super::token::{Keyword, Token, TokenKind};

/// SQL parser that converts tokens into an AST.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    input: &'a str,
    /// Placeholders seen in the statement being parsed.
    pub(crate) parameter_count: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given SQL input.
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: Lexer::new(input).collect(),
            pos: 0,
            input,
            parameter_count: 0,
        }
    }

    /// Parses the input into a list of statements separated by `;`.
    ///
    /// Empty input (whitespace, comments or bare semicolons) yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] if the input is not valid SQL.
    pub fn parse(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        if let Some(token) = self
            .tokens
            .iter()
            .find(|t| matches!(t.kind, TokenKind::Error(_)))
            && let TokenKind::Error(message) = &token.kind
        {
            return Err(SyntaxError::new(message.clone(), token.span));
        }

        let mut statements = Vec::new();
        loop {
            while self.consume_token(TokenKind::Semicolon) {}
            if self.is_eof() {
                break;
            }

            statements.push(self.parse_statement()?);

            if !self.consume_token(TokenKind::Semicolon) && !self.is_eof() {
                let span = self.current_span();
                return Err(SyntaxError::unexpected_token(
                    "';' or end of input",
                    &self.current_token_name(),
                    span,
                ));
            }
        }
        Ok(statements)
    }

    /// Parses a single statement.
    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        if self.check_keyword(Keyword::Select) {
            let select = self.parse_select_stmt()?;
            return Ok(Statement::Select(Box::new(select)));
        }

        let span = self.current_span();
        Err(SyntaxError::unexpected_token(
            "keyword 'SELECT'",
            &self.current_token_name(),
            span,
        ))
    }

    /// Parses a SELECT statement.
    pub(crate) fn parse_select_stmt(&mut self) -> Result<SelectStmt, SyntaxError> {
        self.expect_keyword(Keyword::Select)?;
        self.parameter_count = 0;

        let distinct = self.consume_keyword(Keyword::Distinct);

        // `SELECT` with nothing after it is left for the planner to reject.
        let columns = if self.is_eof()
            || self.check_keyword(Keyword::From)
            || self.check_token(TokenKind::Semicolon)
        {
            vec![]
        } else {
            self.parse_select_list()?
        };

        let from = if self.consume_keyword(Keyword::From) {
            self.parse_from_clause()?
        } else {
            vec![]
        };

        let where_clause = if self.consume_keyword(Keyword::Where) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let group_by = if self.consume_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By)?;
            self.parse_operand_list()?
        } else {
            vec![]
        };

        let order_by = if self.consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()?
        } else {
            vec![]
        };

        Ok(SelectStmt {
            distinct,
            columns,
            from,
            where_clause,
            group_by,
            order_by,
            parameter_count: self.parameter_count,
        })
    }

    /// Parses the select list (columns/expressions).
    fn parse_select_list(&mut self) -> Result<Vec<SelectItem>, SyntaxError> {
        let mut items = vec![self.parse_select_item()?];
        while self.consume_token(TokenKind::Comma) {
            items.push(self.parse_select_item()?);
        }
        Ok(items)
    }

    /// Parses a single select item.
    fn parse_select_item(&mut self) -> Result<SelectItem, SyntaxError> {
        let span = self.current_span();
        if self.consume_token(TokenKind::Asterisk) {
            return Ok(SelectItem::Wildcard { span });
        }

        if let Some(TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name)) =
            self.peek_kind()
            && self.peek_nth_kind(1) == Some(&TokenKind::Dot)
            && self.peek_nth_kind(2) == Some(&TokenKind::Asterisk)
        {
            let table = name.clone();
            self.advance();
            self.advance();
            self.advance();
            return Ok(SelectItem::QualifiedWildcard { table, span });
        }

        let expr = self.parse_operand()?;
        let alias = self.parse_alias()?;
        Ok(SelectItem::Expr { expr, alias })
    }

    /// Parses an optional alias, with or without `AS`.
    fn parse_alias(&mut self) -> Result<Option<String>, SyntaxError> {
        if self.consume_keyword(Keyword::As) {
            return Ok(Some(self.expect_identifier()?));
        }
        match self.peek_kind() {
            Some(TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name)) => {
                let alias = name.clone();
                self.advance();
                Ok(Some(alias))
            }
            _ => Ok(None),
        }
    }

    /// Parses the FROM clause: a driving table followed by joined tables.
    fn parse_from_clause(&mut self) -> Result<Vec<TableRef>, SyntaxError> {
        let mut tables = vec![self.parse_table_ref(JoinType::Cross)?];

        loop {
            let join_type = if self.consume_token(TokenKind::Comma) {
                JoinType::Cross
            } else if self.consume_keyword(Keyword::Cross) {
                self.expect_keyword(Keyword::Join)?;
                JoinType::Cross
            } else if self.consume_keyword(Keyword::Join) {
                JoinType::Inner
            } else if self.consume_keyword(Keyword::Inner) {
                self.expect_keyword(Keyword::Join)?;
                JoinType::Inner
            } else if let Some(join_type) = self.consume_outer_join_keyword() {
                self.consume_keyword(Keyword::Outer);
                self.expect_keyword(Keyword::Join)?;
                join_type
            } else {
                break;
            };

            let mut table = self.parse_table_ref(join_type)?;
            if join_type != JoinType::Cross {
                self.expect_keyword(Keyword::On)?;
                table.condition = Some(self.parse_expr()?);
            }
            tables.push(table);
        }

        Ok(tables)
    }

    fn consume_outer_join_keyword(&mut self) -> Option<JoinType> {
        [
            (Keyword::Left, JoinType::Left),
            (Keyword::Right, JoinType::Right),
            (Keyword::Full, JoinType::Full),
        ]
        .into_iter()
        .find_map(|(kw, join_type)| self.consume_keyword(kw).then_some(join_type))
    }

    /// Parses `[schema.]name [[AS] alias]`.
    fn parse_table_ref(&mut self, join_type: JoinType) -> Result<TableRef, SyntaxError> {
        let span = self.current_span();
        let first = self.expect_identifier()?;
        let (schema, name) = if self.consume_token(TokenKind::Dot) {
            (Some(first), self.expect_identifier()?)
        } else {
            (None, first)
        };
        let alias = self.parse_alias()?;

        Ok(TableRef {
            schema,
            name: strip_table_suffix(name),
            alias,
            join_type,
            condition: None,
            span,
        })
    }

    /// Parses the ORDER BY list.
    fn parse_order_by_list(&mut self) -> Result<Vec<OrderByItem>, SyntaxError> {
        let mut items = Vec::new();
        loop {
            let expr = self.parse_operand()?;
            let direction = if self.consume_keyword(Keyword::Desc) {
                SortDirection::Desc
            } else {
                self.consume_keyword(Keyword::Asc);
                SortDirection::Asc
            };
            items.push(OrderByItem { expr, direction });
            if !self.consume_token(TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    // ==================== Helper methods ====================

    /// Returns true if at end of tokens.
    pub(crate) fn is_eof(&self) -> bool {
        self.peek().is_none_or(|t| t.is_eof())
    }

    /// Peeks at the current token.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Peeks at the kind of the current token.
    pub(crate) fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    /// Peeks at the nth token ahead.
    pub(crate) fn peek_nth_kind(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    /// Advances to the next token.
    pub(crate) fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().map_or(Span::at(self.input.len()), |t| t.span)
    }

    /// Returns a display name for the current token.
    pub(crate) fn current_token_name(&self) -> String {
        self.peek()
            .map_or("end of input".to_string(), |t| t.kind.display_name())
    }

    /// Checks if the current token is a specific keyword.
    pub(crate) fn check_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Keyword(k)) if *k == kw)
    }

    /// Consumes the current token if it's a specific keyword.
    pub(crate) fn consume_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects a specific keyword, returning an error if not found.
    pub(crate) fn expect_keyword(&mut self, kw: Keyword) -> Result<(), SyntaxError> {
        if self.consume_keyword(kw) {
            Ok(())
        } else {
            let span = self.current_span();
            Err(SyntaxError::unexpected_token(
                &format!("keyword '{}'", kw.as_str()),
                &self.current_token_name(),
                span,
            ))
        }
    }

    /// Checks if the current token matches.
    pub(crate) fn check_token(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(&kind)
    }

    /// Consumes the current token if it matches.
    pub(crate) fn consume_token(&mut self, kind: TokenKind) -> bool {
        if self.check_token(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects a specific token, returning an error if not found.
    pub(crate) fn expect_token(&mut self, kind: TokenKind) -> Result<(), SyntaxError> {
        if self.consume_token(kind.clone()) {
            Ok(())
        } else {
            let span = self.current_span();
            Err(SyntaxError::unexpected_token(
                &kind.display_name(),
                &self.current_token_name(),
                span,
            ))
        }
    }

    /// Expects an identifier, returning its name.
    pub(crate) fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => {
                let span = self.current_span();
                Err(SyntaxError::unexpected_token(
                    "identifier",
                    &self.current_token_name(),
                    span,
                ))
            }
        }
    }

    /// Parses a comma-separated list of operands.
    fn parse_operand_list(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut list = vec![self.parse_operand()?];
        while self.consume_token(TokenKind::Comma) {
            list.push(self.parse_operand()?);
        }
        Ok(list)
    }
}

/// Removes a trailing `.db` file suffix from a table name.
fn strip_table_suffix(name: String) -> String {
    let len = name.len();
    if len > 3 && name.is_char_boundary(len - 3) && name[len - 3..].eq_ignore_ascii_case(".db") {
        name[..len - 3].to_string()
    } else {
        name
    }
}
