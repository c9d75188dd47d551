//! Abstract Syntax Tree (AST) for SQL statements.
//!
//! This module defines the data structures that represent parsed SQL statements.
//! The AST is produced by the parser and consumed by the query planner.
//!
//! Every node implements [`Display`](std::fmt::Display) and renders canonical
//! SQL; parsing the rendering yields the same tree shape.

use std::fmt;

use super::error::Span;
use super::token::Keyword;
use crate::datum::Type;

/// A SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT statement.
    Select(Box<SelectStmt>),
}

impl Statement {
    /// Returns the number of `?` placeholders in this statement.
    pub fn parameter_count(&self) -> usize {
        match self {
            Statement::Select(select) => select.parameter_count,
        }
    }
}

/// SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    /// Whether to select distinct rows only.
    pub distinct: bool,
    /// Selected columns/expressions.
    pub columns: Vec<SelectItem>,
    /// Tables in join order; the first entry is the driving table.
    pub from: Vec<TableRef>,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// ORDER BY clause.
    pub order_by: Vec<OrderByItem>,
    /// Number of `?` placeholders.
    pub parameter_count: usize,
}

/// An item in the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// SELECT * - all columns.
    Wildcard { span: Span },
    /// SELECT table.* - all columns from a table.
    QualifiedWildcard { table: String, span: Span },
    /// An expression with optional alias.
    Expr { expr: Expr, alias: Option<String> },
}

/// A table reference in FROM clause together with how it joins the tables
/// before it.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    /// Schema qualifier (`geog.tblAC`).
    pub schema: Option<String>,
    /// Table name without the `.db` suffix.
    pub name: String,
    /// Table alias.
    pub alias: Option<String>,
    /// Join type against the preceding tables; CROSS for the first table.
    pub join_type: JoinType,
    /// ON condition.
    pub condition: Option<Expr>,
    /// Position of the table name.
    pub span: Span,
}

impl TableRef {
    /// Returns the name the table is referred to by in the query.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Type of JOIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT [OUTER] JOIN.
    Left,
    /// RIGHT [OUTER] JOIN.
    Right,
    /// FULL [OUTER] JOIN.
    Full,
    /// CROSS JOIN or comma.
    Cross,
}

impl JoinType {
    /// Returns the SQL keyword(s) for this join.
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    /// Expression to order by; an integer literal is a 1-based ordinal.
    pub expr: Expr,
    /// Sort direction.
    pub direction: SortDirection,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// Target of `CONVERT`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertTarget {
    /// `CONVERT(value USING charset)`.
    Charset(String),
    /// `CONVERT(value, TYPE)`.
    Type(Type),
}

/// Expression in SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// NULL literal.
    Null,
    /// Boolean literal.
    Boolean(bool),
    /// Integer literal.
    Integer(i64),
    /// Decimal literal, kept as written.
    Decimal(String),
    /// String literal.
    String(String),
    /// Column reference (optionally qualified with table name).
    Column {
        table: Option<String>,
        name: String,
        span: Span,
    },
    /// `?` placeholder, numbered from zero in order of appearance.
    Parameter { index: usize, span: Span },
    /// `*` as a function argument (`COUNT(*)`).
    Asterisk { span: Span },
    /// Function call.
    Function {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    /// `CONVERT(value USING charset)` or `CONVERT(value, TYPE)`.
    Convert {
        expr: Box<Expr>,
        target: ConvertTarget,
        span: Span,
    },
    /// Comparison.
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    /// IS NULL / IS NOT NULL.
    IsNull { expr: Box<Expr>, negated: bool },
    /// BETWEEN: expr [NOT] BETWEEN low AND high.
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    /// LIKE / ILIKE: expr [NOT] LIKE pattern.
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
        case_insensitive: bool,
    },
    /// NOT condition.
    Not(Box<Expr>),
    /// N-ary AND.
    And(Vec<Expr>),
    /// N-ary OR.
    Or(Vec<Expr>),
}

impl Expr {
    /// Visits every column reference in this expression.
    pub fn for_each_column<'a>(&'a self, f: &mut impl FnMut(Option<&'a str>, &'a str, Span)) {
        match self {
            Expr::Column { table, name, span } => f(table.as_deref(), name, *span),
            Expr::Function { args, .. } => args.iter().for_each(|arg| arg.for_each_column(f)),
            Expr::Convert { expr, .. } | Expr::IsNull { expr, .. } | Expr::Not(expr) => {
                expr.for_each_column(f)
            }
            Expr::Compare { left, right, .. } => {
                left.for_each_column(f);
                right.for_each_column(f);
            }
            Expr::Between { expr, low, high, .. } => {
                expr.for_each_column(f);
                low.for_each_column(f);
                high.for_each_column(f);
            }
            Expr::Like { expr, pattern, .. } => {
                expr.for_each_column(f);
                pattern.for_each_column(f);
            }
            Expr::And(children) | Expr::Or(children) => {
                children.iter().for_each(|child| child.for_each_column(f))
            }
            Expr::Null
            | Expr::Boolean(_)
            | Expr::Integer(_)
            | Expr::Decimal(_)
            | Expr::String(_)
            | Expr::Parameter { .. }
            | Expr::Asterisk { .. } => {}
        }
    }

    /// Returns the source position of this expression when known.
    pub fn span(&self) -> Option<Span> {
        match self {
            Expr::Column { span, .. }
            | Expr::Parameter { span, .. }
            | Expr::Asterisk { span }
            | Expr::Function { span, .. }
            | Expr::Convert { span, .. } => Some(*span),
            Expr::Compare { left, .. } => left.span(),
            Expr::IsNull { expr, .. } | Expr::Between { expr, .. } | Expr::Like { expr, .. } => {
                expr.span()
            }
            Expr::Not(inner) => inner.span(),
            Expr::And(children) | Expr::Or(children) => children.first().and_then(Expr::span),
            _ => None,
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
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
}

impl CompareOp {
    /// Returns the display string for this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

/// Writes an identifier, quoting it when it would not lex back as one.
fn write_ident(f: &mut fmt::Formatter<'_>, ident: &str) -> fmt::Result {
    let plain = ident.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && ident.chars().all(|c| c.is_alphanumeric() || c == '_')
        && Keyword::parse(ident).is_none();
    if plain {
        f.write_str(ident)
    } else {
        write!(f, "\"{}\"", ident.replace('"', "\"\""))
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_connective(
    f: &mut fmt::Formatter<'_>,
    keyword: &str,
    children: &[Expr],
    needs_parens: impl Fn(&Expr) -> bool,
) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {keyword} ")?;
        }
        if needs_parens(child) {
            write!(f, "({child})")?;
        } else {
            write!(f, "{child}")?;
        }
    }
    Ok(())
}

/// Renders an operand of a predicate, parenthesizing nested conditions.
struct Operand<'a>(&'a Expr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Compare { .. }
            | Expr::IsNull { .. }
            | Expr::Between { .. }
            | Expr::Like { .. }
            | Expr::Not(_)
            | Expr::And(_)
            | Expr::Or(_) => write!(f, "({})", self.0),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Select(select) => write!(f, "{select}"),
        }
    }
}

impl fmt::Display for SelectStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write_list(f, &self.columns)?;
        for (i, table) in self.from.iter().enumerate() {
            if i == 0 {
                write!(f, " FROM {table}")?;
            } else {
                write!(f, " {} {table}", table.join_type.as_str())?;
                if let Some(condition) = &table.condition {
                    write!(f, " ON {condition}")?;
                }
            }
        }
        if let Some(condition) = &self.where_clause {
            write!(f, " WHERE {condition}")?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            write_list(f, &self.group_by)?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            write_list(f, &self.order_by)?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectItem::Wildcard { .. } => f.write_str("*"),
            SelectItem::QualifiedWildcard { table, .. } => {
                write_ident(f, table)?;
                f.write_str(".*")
            }
            SelectItem::Expr { expr, alias } => {
                write!(f, "{expr}")?;
                if let Some(alias) = alias {
                    f.write_str(" AS ")?;
                    write_ident(f, alias)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write_ident(f, schema)?;
            f.write_str(".")?;
        }
        write_ident(f, &self.name)?;
        if let Some(alias) = &self.alias {
            f.write_str(" AS ")?;
            write_ident(f, alias)?;
        }
        Ok(())
    }
}

impl fmt::Display for OrderByItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if self.direction == SortDirection::Desc {
            f.write_str(" DESC")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Null => f.write_str("NULL"),
            Expr::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Expr::Integer(n) => write!(f, "{n}"),
            Expr::Decimal(text) => f.write_str(text),
            Expr::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Expr::Column { table, name, .. } => {
                if let Some(table) = table {
                    write_ident(f, table)?;
                    f.write_str(".")?;
                }
                write_ident(f, name)
            }
            Expr::Parameter { .. } => f.write_str("?"),
            Expr::Asterisk { .. } => f.write_str("*"),
            Expr::Function { name, args, .. } => {
                write!(f, "{}(", name.to_ascii_uppercase())?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Convert { expr, target, .. } => match target {
                ConvertTarget::Charset(charset) => write!(f, "CONVERT({expr} USING {charset})"),
                ConvertTarget::Type(ty) => write!(f, "CONVERT({expr}, {ty})"),
            },
            Expr::Compare { left, op, right } => write!(
                f,
                "{} {} {}",
                Operand(left),
                op.as_str(),
                Operand(right)
            ),
            Expr::IsNull { expr, negated } => write!(
                f,
                "{} IS {}NULL",
                Operand(expr),
                if *negated { "NOT " } else { "" }
            ),
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => write!(
                f,
                "{} {}BETWEEN {} AND {}",
                Operand(expr),
                if *negated { "NOT " } else { "" },
                Operand(low),
                Operand(high)
            ),
            Expr::Like {
                expr,
                pattern,
                negated,
                case_insensitive,
            } => write!(
                f,
                "{} {}{} {}",
                Operand(expr),
                if *negated { "NOT " } else { "" },
                if *case_insensitive { "ILIKE" } else { "LIKE" },
                Operand(pattern)
            ),
            Expr::Not(inner) => match inner.as_ref() {
                Expr::And(_) | Expr::Or(_) => write!(f, "NOT ({inner})"),
                _ => write!(f, "NOT {inner}"),
            },
            Expr::And(children) => write_connective(f, "AND", children, |child| {
                matches!(child, Expr::And(_) | Expr::Or(_))
            }),
            Expr::Or(children) => {
                write_connective(f, "OR", children, |child| matches!(child, Expr::Or(_)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str) -> Expr {
        Expr::Column {
            table: None,
            name: name.to_string(),
            span: Span::at(0),
        }
    }

    #[test]
    fn test_compare_op_str() {
        assert_eq!(CompareOp::Eq.as_str(), "=");
        assert_eq!(CompareOp::Neq.as_str(), "<>");
        assert_eq!(CompareOp::GtEq.as_str(), ">=");
    }

    #[test]
    fn test_display_quotes_identifiers() {
        assert_eq!(column("name").to_string(), "name");
        assert_eq!(column("first name").to_string(), "\"first name\"");
        assert_eq!(column("order").to_string(), "\"order\"");
    }

    #[test]
    fn test_display_nested_connectives() {
        let expr = Expr::And(vec![
            column("a"),
            Expr::Or(vec![column("b"), column("c")]),
        ]);
        assert_eq!(expr.to_string(), "a AND (b OR c)");
        let expr = Expr::Not(Box::new(Expr::And(vec![column("a"), column("b")])));
        assert_eq!(expr.to_string(), "NOT (a AND b)");
    }

    #[test]
    fn test_display_string_escape() {
        assert_eq!(Expr::String("it's".to_string()).to_string(), "'it''s'");
    }

    #[test]
    fn test_for_each_column() {
        let expr = Expr::Compare {
            left: Box::new(column("a")),
            op: CompareOp::Eq,
            right: Box::new(Expr::Function {
                name: "upper".to_string(),
                args: vec![column("b")],
                span: Span::at(4),
            }),
        };
        let mut names = Vec::new();
        expr.for_each_column(&mut |_, name, _| names.push(name.to_string()));
        assert_eq!(names, vec!["a", "b"]);
    }
}
