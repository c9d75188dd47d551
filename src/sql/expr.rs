//! Condition and operand parsing with precedence climbing.
//!
//! Conditions combine predicates with `NOT`, `AND` and `OR`. Chains of the
//! same connective written at one level are flattened into a single n-ary
//! node; parentheses return the inner node without a wrapper.

use super::ast::{CompareOp, ConvertTarget, Expr};
use super::error::SyntaxError;
use super::parser::Parser;
use super::token::{Keyword, TokenKind};
use crate::datum::Type;

/// Operator precedence levels (higher = binds tighter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest = 0,
    Or = 1,
    And = 2,
    Not = 3,
}

impl Precedence {
    /// Returns the next higher precedence level.
    pub fn next(self) -> Self {
        match self {
            Precedence::Lowest => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And | Precedence::Not => Precedence::Not,
        }
    }
}

/// Function that accepts `*` as its argument.
const ASTERISK_FUNCTION: &str = "COUNT";

impl Parser<'_> {
    /// Parses a condition.
    pub fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_expr_with_precedence(Precedence::Lowest)
    }

    /// Parses a condition whose connectives bind at least as tightly as `min_prec`.
    pub fn parse_expr_with_precedence(&mut self, min_prec: Precedence) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary_expr()?;

        loop {
            let (keyword, prec) = match self.peek_kind() {
                Some(TokenKind::Keyword(Keyword::Or)) => (Keyword::Or, Precedence::Or),
                Some(TokenKind::Keyword(Keyword::And)) => (Keyword::And, Precedence::And),
                _ => break,
            };
            if prec < min_prec {
                break;
            }

            let mut children = vec![left];
            while self.consume_keyword(keyword) {
                children.push(self.parse_expr_with_precedence(prec.next())?);
            }
            left = if keyword == Keyword::And {
                Expr::And(children)
            } else {
                Expr::Or(children)
            };
        }

        Ok(left)
    }

    /// Parses `NOT condition` or a predicate.
    fn parse_unary_expr(&mut self) -> Result<Expr, SyntaxError> {
        if self.consume_keyword(Keyword::Not) {
            let operand = self.parse_expr_with_precedence(Precedence::Not)?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_predicate()
    }

    /// Parses an operand optionally followed by a comparison, IS, BETWEEN or LIKE.
    fn parse_predicate(&mut self) -> Result<Expr, SyntaxError> {
        let expr = self.parse_operand()?;

        if let Some(op) = self.peek_compare_op() {
            self.advance();
            let right = self.parse_operand()?;
            return Ok(Expr::Compare {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            });
        }

        if self.consume_keyword(Keyword::Is) {
            let negated = self.consume_keyword(Keyword::Not);
            self.expect_keyword(Keyword::Null)?;
            return Ok(Expr::IsNull {
                expr: Box::new(expr),
                negated,
            });
        }

        let negated = self.consume_keyword(Keyword::Not);

        if self.consume_keyword(Keyword::Between) {
            let low = self.parse_operand()?;
            self.expect_keyword(Keyword::And)?;
            let high = self.parse_operand()?;
            return Ok(Expr::Between {
                expr: Box::new(expr),
                low: Box::new(low),
                high: Box::new(high),
                negated,
            });
        }

        let case_insensitive = self.consume_keyword(Keyword::Ilike);
        if case_insensitive || self.consume_keyword(Keyword::Like) {
            let pattern = self.parse_operand()?;
            return Ok(Expr::Like {
                expr: Box::new(expr),
                pattern: Box::new(pattern),
                negated,
                case_insensitive,
            });
        }

        if negated {
            let span = self.current_span();
            return Err(SyntaxError::unexpected_token(
                "BETWEEN, LIKE or ILIKE after NOT",
                &self.current_token_name(),
                span,
            ));
        }

        Ok(expr)
    }

    fn peek_compare_op(&self) -> Option<CompareOp> {
        match self.peek_kind()? {
            TokenKind::Eq => Some(CompareOp::Eq),
            TokenKind::Neq => Some(CompareOp::Neq),
            TokenKind::Lt => Some(CompareOp::Lt),
            TokenKind::LtEq => Some(CompareOp::LtEq),
            TokenKind::Gt => Some(CompareOp::Gt),
            TokenKind::GtEq => Some(CompareOp::GtEq),
            _ => None,
        }
    }

    /// Parses a value: literal, placeholder, column, function call or a
    /// parenthesized condition.
    pub(crate) fn parse_operand(&mut self) -> Result<Expr, SyntaxError> {
        let span = self.current_span();
        let Some(kind) = self.peek_kind().cloned() else {
            return Err(SyntaxError::unexpected_eof("expression", span.start));
        };

        match kind {
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Null)
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Boolean(true))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Boolean(false))
            }
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::Integer(n))
            }
            TokenKind::Decimal(text) => {
                self.advance();
                Ok(Expr::Decimal(text))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::String(s))
            }
            TokenKind::Placeholder => {
                self.advance();
                let index = self.parameter_count;
                self.parameter_count += 1;
                Ok(Expr::Parameter { index, span })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect_token(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Identifier(name) if self.peek_nth_kind(1) == Some(&TokenKind::LParen) => {
                self.advance();
                if name.eq_ignore_ascii_case("CONVERT") {
                    self.parse_convert(span)
                } else {
                    self.parse_function_call(name, span)
                }
            }
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => {
                self.advance();
                if self.consume_token(TokenKind::Dot) {
                    let column = self.expect_identifier()?;
                    return Ok(Expr::Column {
                        table: Some(name),
                        name: column,
                        span,
                    });
                }
                Ok(Expr::Column {
                    table: None,
                    name,
                    span,
                })
            }
            _ => Err(SyntaxError::unexpected_token(
                "expression",
                &self.current_token_name(),
                span,
            )),
        }
    }

    /// Parses a function call with arguments. The name is kept upper-cased.
    fn parse_function_call(
        &mut self,
        name: String,
        span: super::error::Span,
    ) -> Result<Expr, SyntaxError> {
        self.expect_token(TokenKind::LParen)?;

        let mut args = Vec::new();
        if !self.consume_token(TokenKind::RParen) {
            loop {
                let arg_span = self.current_span();
                if self.consume_token(TokenKind::Asterisk) {
                    if !name.eq_ignore_ascii_case(ASTERISK_FUNCTION) {
                        return Err(SyntaxError::asterisk_in_function(
                            &name.to_ascii_uppercase(),
                            arg_span,
                        ));
                    }
                    args.push(Expr::Asterisk { span: arg_span });
                } else {
                    args.push(self.parse_operand()?);
                }
                if !self.consume_token(TokenKind::Comma) {
                    break;
                }
            }
            self.expect_token(TokenKind::RParen)?;
        }

        Ok(Expr::Function {
            name: name.to_ascii_uppercase(),
            args,
            span,
        })
    }

    /// Parses `CONVERT(value USING charset)` or `CONVERT(value, TYPE)`.
    fn parse_convert(&mut self, span: super::error::Span) -> Result<Expr, SyntaxError> {
        self.expect_token(TokenKind::LParen)?;
        if self.check_token(TokenKind::Asterisk) {
            return Err(SyntaxError::asterisk_in_function(
                "CONVERT",
                self.current_span(),
            ));
        }
        let expr = self.parse_operand()?;

        let target = if self.consume_keyword(Keyword::Using) {
            let charset_span = self.current_span();
            let charset = self.expect_identifier()?;
            if encoding_rs::Encoding::for_label(charset.as_bytes()).is_none() {
                return Err(SyntaxError::invalid_parameter(&charset, charset_span));
            }
            ConvertTarget::Charset(charset)
        } else {
            self.expect_token(TokenKind::Comma)?;
            let type_span = self.current_span();
            let type_name = self.expect_identifier()?;
            match Type::from_name(&type_name) {
                Some(ty) => ConvertTarget::Type(ty),
                None => return Err(SyntaxError::invalid_parameter(&type_name, type_span)),
            }
        };

        self.expect_token(TokenKind::RParen)?;
        Ok(Expr::Convert {
            expr: Box::new(expr),
            target,
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::error::SyntaxErrorKind;
    use super::*;

    fn parse_expr(sql: &str) -> Result<Expr, SyntaxError> {
        let mut parser = Parser::new(sql);
        let expr = parser.parse_expr()?;
        assert!(parser.is_eof(), "trailing tokens in {sql}");
        Ok(expr)
    }

    #[test]
    fn test_precedence_next() {
        assert_eq!(Precedence::Lowest.next(), Precedence::Or);
        assert_eq!(Precedence::And.next(), Precedence::Not);
        assert_eq!(Precedence::Not.next(), Precedence::Not);
    }

    #[test]
    fn test_or_chain_flattens() {
        match parse_expr("a = 1 or b = 2 or c = 3").unwrap() {
            Expr::Or(children) => assert_eq!(children.len(), 3),
            other => panic!("expected OR, got {other:?}"),
        }
    }

    #[test]
    fn test_not_binds_tighter_than_and() {
        match parse_expr("not a = 1 and b = 2").unwrap() {
            Expr::And(children) => assert!(matches!(children[0], Expr::Not(_))),
            other => panic!("expected AND, got {other:?}"),
        }
    }

    #[test]
    fn test_between_uses_its_own_and() {
        match parse_expr("a between 1 and 2 and b = 3").unwrap() {
            Expr::And(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[0], Expr::Between { .. }));
            }
            other => panic!("expected AND, got {other:?}"),
        }
    }

    #[test]
    fn test_function_call() {
        match parse_expr("round(price, 2, true)").unwrap() {
            Expr::Function { name, args, .. } => {
                assert_eq!(name, "ROUND");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected function, got {other:?}"),
        }
        match parse_expr("pi()").unwrap() {
            Expr::Function { args, .. } => assert!(args.is_empty()),
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_count_asterisk() {
        match parse_expr("count(*)").unwrap() {
            Expr::Function { args, .. } => assert!(matches!(args[0], Expr::Asterisk { .. })),
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_asterisk_in_function() {
        let err = parse_expr("upper(*)").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::AsteriskInFunction);
        assert_eq!(err.position(), 7);
    }

    #[test]
    fn test_convert_forms() {
        match parse_expr("convert(a using utf8)").unwrap() {
            Expr::Convert { target, .. } => {
                assert_eq!(target, ConvertTarget::Charset("utf8".into()))
            }
            other => panic!("expected convert, got {other:?}"),
        }
        match parse_expr("convert(a, integer)").unwrap() {
            Expr::Convert { target, .. } => assert_eq!(target, ConvertTarget::Type(Type::Integer)),
            other => panic!("expected convert, got {other:?}"),
        }
    }

    #[test]
    fn test_convert_invalid_targets() {
        let err = parse_expr("convert(a using nocharset)").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::InvalidParameter);
        let err = parse_expr("convert(a, notatype)").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::InvalidParameter);
    }

    #[test]
    fn test_dangling_not() {
        assert!(parse_expr("a not = 1").is_err());
    }
}
