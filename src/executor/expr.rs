//! Bound expression tree with plan-time column resolution.
//!
//! [`BoundExpr`] is the executor's representation of SQL expressions. Column
//! references are first resolved to a `(table, field)` pair while the FROM
//! list is being bound, then rewritten to positions in the joined raw row
//! once the set of loaded fields per table is known.

use std::fmt;

use encoding_rs::Encoding;

use crate::datum::{Type, Value};
use crate::function::Function;
use crate::sql::CompareOp;

/// A registered function, compared by name.
#[derive(Clone, Copy)]
pub struct FunctionRef(pub &'static dyn Function);

impl FunctionRef {
    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl PartialEq for FunctionRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.name() == other.0.name()
    }
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

/// Target of a bound `CONVERT`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConvertTo {
    /// Re-decode text stored in `source` as `target`.
    Charset {
        source: &'static Encoding,
        target: &'static Encoding,
    },
    Type(Type),
}

/// One aggregate call of a grouped query.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    pub function: FunctionRef,
    pub arg: BoundExpr,
}

impl AggregateCall {
    pub fn ty(&self) -> Type {
        self.function.0.result_type(&[self.arg.ty()])
    }
}

impl fmt::Display for AggregateCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.function.name(), self.arg)
    }
}

/// An expression tree with column references resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr {
    /// Constant value.
    Literal(Value),
    /// Field `field` of FROM-list table `table`; only present while planning.
    Field {
        table: usize,
        field: usize,
        name: String,
        ty: Type,
    },
    /// Position in the joined raw row.
    Column { index: usize, name: String, ty: Type },
    /// `?` placeholder, typed from its bound value.
    Parameter { index: usize, ty: Type },
    /// Scalar function call.
    Function {
        function: FunctionRef,
        args: Vec<BoundExpr>,
    },
    /// Result of the plan's aggregate at `index`.
    Aggregate { index: usize, ty: Type },
    Convert { expr: Box<BoundExpr>, to: ConvertTo },
    Compare {
        left: Box<BoundExpr>,
        op: CompareOp,
        right: Box<BoundExpr>,
    },
    IsNull { expr: Box<BoundExpr>, negated: bool },
    Between {
        expr: Box<BoundExpr>,
        low: Box<BoundExpr>,
        high: Box<BoundExpr>,
        negated: bool,
    },
    Like {
        expr: Box<BoundExpr>,
        pattern: Box<BoundExpr>,
        negated: bool,
        case_insensitive: bool,
    },
    Not(Box<BoundExpr>),
    And(Vec<BoundExpr>),
    Or(Vec<BoundExpr>),
}

impl BoundExpr {
    /// Output type of this expression.
    pub fn ty(&self) -> Type {
        match self {
            BoundExpr::Literal(value) => value.data_type(),
            BoundExpr::Field { ty, .. }
            | BoundExpr::Column { ty, .. }
            | BoundExpr::Parameter { ty, .. }
            | BoundExpr::Aggregate { ty, .. } => *ty,
            BoundExpr::Function { function, args } => {
                let types: Vec<Type> = args.iter().map(BoundExpr::ty).collect();
                function.0.result_type(&types)
            }
            BoundExpr::Convert { to, .. } => match to {
                ConvertTo::Charset { .. } => Type::Varchar,
                ConvertTo::Type(ty) => *ty,
            },
            BoundExpr::Compare { .. }
            | BoundExpr::IsNull { .. }
            | BoundExpr::Between { .. }
            | BoundExpr::Like { .. }
            | BoundExpr::Not(_)
            | BoundExpr::And(_)
            | BoundExpr::Or(_) => Type::Boolean,
        }
    }

    /// Direct children of this node.
    pub(super) fn children(&self) -> Vec<&BoundExpr> {
        match self {
            BoundExpr::Literal(_)
            | BoundExpr::Field { .. }
            | BoundExpr::Column { .. }
            | BoundExpr::Parameter { .. }
            | BoundExpr::Aggregate { .. } => Vec::new(),
            BoundExpr::Function { args, .. } => args.iter().collect(),
            BoundExpr::Convert { expr, .. }
            | BoundExpr::IsNull { expr, .. }
            | BoundExpr::Not(expr) => vec![expr],
            BoundExpr::Compare { left, right, .. } => vec![left, right],
            BoundExpr::Between { expr, low, high, .. } => vec![expr, low, high],
            BoundExpr::Like { expr, pattern, .. } => vec![expr, pattern],
            BoundExpr::And(children) | BoundExpr::Or(children) => children.iter().collect(),
        }
    }

    fn children_mut(&mut self) -> Vec<&mut BoundExpr> {
        match self {
            BoundExpr::Literal(_)
            | BoundExpr::Field { .. }
            | BoundExpr::Column { .. }
            | BoundExpr::Parameter { .. }
            | BoundExpr::Aggregate { .. } => Vec::new(),
            BoundExpr::Function { args, .. } => args.iter_mut().collect(),
            BoundExpr::Convert { expr, .. }
            | BoundExpr::IsNull { expr, .. }
            | BoundExpr::Not(expr) => vec![expr],
            BoundExpr::Compare { left, right, .. } => vec![left, right],
            BoundExpr::Between { expr, low, high, .. } => vec![expr, low, high],
            BoundExpr::Like { expr, pattern, .. } => vec![expr, pattern],
            BoundExpr::And(children) | BoundExpr::Or(children) => children.iter_mut().collect(),
        }
    }

    /// Visits this node and all descendants, parents first.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a BoundExpr)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    /// Returns true if any node satisfies `pred`.
    pub fn any(&self, pred: &impl Fn(&BoundExpr) -> bool) -> bool {
        pred(self) || self.children().into_iter().any(|child| child.any(pred))
    }

    pub fn contains_aggregate(&self) -> bool {
        self.any(&|e| matches!(e, BoundExpr::Aggregate { .. }))
    }

    /// Returns true if the expression reads no table field.
    pub fn is_constant(&self) -> bool {
        !self.any(&|e| matches!(e, BoundExpr::Field { .. } | BoundExpr::Column { .. }))
    }

    /// FROM-list tables this expression reads, ascending and deduplicated.
    pub fn tables(&self) -> Vec<usize> {
        let mut tables = Vec::new();
        self.visit(&mut |e| {
            if let BoundExpr::Field { table, .. } = e {
                tables.push(*table);
            }
        });
        tables.sort_unstable();
        tables.dedup();
        tables
    }

    /// Calls `f` with every `(table, field)` reference.
    pub fn for_each_field(&self, f: &mut impl FnMut(usize, usize)) {
        self.visit(&mut |e| {
            if let BoundExpr::Field { table, field, .. } = e {
                f(*table, *field);
            }
        });
    }

    /// Rewrites field references to raw-row positions.
    pub fn resolve_fields(&mut self, position: &impl Fn(usize, usize) -> usize) {
        if let BoundExpr::Field {
            table,
            field,
            name,
            ty,
        } = self
        {
            *self = BoundExpr::Column {
                index: position(*table, *field),
                name: std::mem::take(name),
                ty: *ty,
            };
            return;
        }
        for child in self.children_mut() {
            child.resolve_fields(position);
        }
    }

    /// Splits a condition into its top-level AND conjuncts.
    pub fn into_conjuncts(self) -> Vec<BoundExpr> {
        match self {
            BoundExpr::And(children) => children.into_iter().flat_map(Self::into_conjuncts).collect(),
            other => vec![other],
        }
    }

    /// Joins conjuncts back into a condition; `None` when there are none.
    pub fn conjunction(mut conjuncts: Vec<BoundExpr>) -> Option<BoundExpr> {
        match conjuncts.len() {
            0 => None,
            1 => conjuncts.pop(),
            _ => Some(BoundExpr::And(conjuncts)),
        }
    }

    /// Removes AND/OR nodes with a single child and flattens nested
    /// same-operator chains.
    pub fn reduce(self) -> BoundExpr {
        match self {
            BoundExpr::And(children) => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child.reduce() {
                        BoundExpr::And(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                if flat.len() == 1 {
                    flat.remove(0)
                } else {
                    BoundExpr::And(flat)
                }
            }
            BoundExpr::Or(children) => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child.reduce() {
                        BoundExpr::Or(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                if flat.len() == 1 {
                    flat.remove(0)
                } else {
                    BoundExpr::Or(flat)
                }
            }
            BoundExpr::Not(inner) => BoundExpr::Not(Box::new(inner.reduce())),
            other => other,
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, sep: &str, items: &[BoundExpr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for BoundExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundExpr::Literal(Value::Text(s)) => write!(f, "'{}'", s.replace('\'', "''")),
            BoundExpr::Literal(value) => write!(f, "{value}"),
            BoundExpr::Field { table, name, .. } => write!(f, "${table}.{name}"),
            BoundExpr::Column { index, name, .. } => write!(f, "$col{index} ({name})"),
            BoundExpr::Parameter { index, .. } => write!(f, "${}", index + 1),
            BoundExpr::Function { function, args } => {
                write!(f, "{}(", function.name())?;
                write_joined(f, ", ", args)?;
                f.write_str(")")
            }
            BoundExpr::Aggregate { index, .. } => write!(f, "$agg{index}"),
            BoundExpr::Convert { expr, to } => match to {
                ConvertTo::Charset { target, .. } => write!(f, "CONVERT({expr} USING {})", target.name()),
                ConvertTo::Type(ty) => write!(f, "CONVERT({expr}, {ty})"),
            },
            BoundExpr::Compare { left, op, right } => write!(f, "({left} {} {right})", op.as_str()),
            BoundExpr::IsNull { expr, negated } => {
                let not = if *negated { " NOT" } else { "" };
                write!(f, "({expr} IS{not} NULL)")
            }
            BoundExpr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let not = if *negated { " NOT" } else { "" };
                write!(f, "({expr}{not} BETWEEN {low} AND {high})")
            }
            BoundExpr::Like {
                expr,
                pattern,
                negated,
                case_insensitive,
            } => {
                let not = if *negated { " NOT" } else { "" };
                let op = if *case_insensitive { "ILIKE" } else { "LIKE" };
                write!(f, "({expr}{not} {op} {pattern})")
            }
            BoundExpr::Not(inner) => write!(f, "(NOT {inner})"),
            BoundExpr::And(children) => {
                f.write_str("(")?;
                write_joined(f, " AND ", children)?;
                f.write_str(")")
            }
            BoundExpr::Or(children) => {
                f.write_str("(")?;
                write_joined(f, " OR ", children)?;
                f.write_str(")")
            }
        }
    }
}
