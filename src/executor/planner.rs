//! Query planner for SELECT statements.
//!
//! Transforms a parsed [`SelectStmt`] into a [`Plan`]: table references are
//! resolved through the catalog, asterisks expanded, column names bound to
//! `(table, field)` pairs and validated against GROUP BY. After push-down the
//! set of fields each table must load is fixed and every reference is
//! rewritten to its position in the joined raw row.

use std::collections::BTreeSet;

use encoding_rs::Encoding;
use tracing::debug;

use crate::catalog::{CatalogError, ColumnInfo};
use crate::data::resolve_charset;
use crate::datum::{Decimal, Value};
use crate::function::{FunctionError, find_function};
use crate::sql::{ConvertTarget, Expr, SelectItem, SelectStmt, Span};

use super::column::ColumnDesc;
use super::context::ExecutionContext;
use super::error::{ExecutorError, ExecutorResult};
use super::expr::{AggregateCall, BoundExpr, ConvertTo, FunctionRef};
use super::optimize::push_down;
use super::plan::{Grouping, Plan, PlanColumn, PlanTable, SortKey};

fn position(span: Span) -> Option<usize> {
    Some(span.start + 1)
}

fn expr_position(expr: &Expr) -> Option<usize> {
    expr.span().and_then(position)
}

/// Clause an expression is bound in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Select,
    Join,
    Where,
    GroupBy,
    OrderBy,
}

impl Clause {
    fn allows_aggregates(self) -> bool {
        matches!(self, Clause::Select | Clause::OrderBy)
    }

    fn as_str(self) -> &'static str {
        match self {
            Clause::Select => "SELECT",
            Clause::Join => "ON",
            Clause::Where => "WHERE",
            Clause::GroupBy => "GROUP BY",
            Clause::OrderBy => "ORDER BY",
        }
    }
}

/// A FROM-list table as seen by name resolution.
struct ScopeTable {
    name: String,
    columns: Vec<ColumnInfo>,
    charset: Option<&'static Encoding>,
}

/// Binds AST expressions against the FROM list.
struct Binder<'a> {
    tables: &'a [ScopeTable],
    params: &'a [Value],
    /// Number of leading tables references may resolve against.
    visible: usize,
    aggregates: Vec<AggregateCall>,
    in_aggregate: bool,
}

impl Binder<'_> {
    /// Resolves a possibly qualified column name to a field reference.
    fn resolve(&self, table: Option<&str>, name: &str, span: Span) -> ExecutorResult<BoundExpr> {
        let tables = &self.tables[..self.visible];
        let invalid = || ExecutorError::InvalidColumn {
            name: match table {
                Some(t) => format!("{t}.{name}"),
                None => name.to_string(),
            },
            position: position(span),
        };
        let field_of = |t: &ScopeTable| t.columns.iter().position(|c| c.name.eq_ignore_ascii_case(name));

        let (table, field) = match table {
            Some(qualifier) => {
                let index = tables
                    .iter()
                    .position(|t| t.name.eq_ignore_ascii_case(qualifier))
                    .ok_or_else(invalid)?;
                (index, field_of(&tables[index]).ok_or_else(invalid)?)
            }
            None => {
                let mut found = None;
                for (index, candidate) in tables.iter().enumerate() {
                    if let Some(field) = field_of(candidate) {
                        if found.is_some() {
                            return Err(ExecutorError::ColumnAmbiguous {
                                name: name.to_string(),
                                position: position(span),
                            });
                        }
                        found = Some((index, field));
                    }
                }
                found.ok_or_else(invalid)?
            }
        };
        let column = &self.tables[table].columns[field];
        Ok(BoundExpr::Field {
            table,
            field,
            name: column.name.clone(),
            ty: column.ty,
        })
    }

    fn bind_all(&mut self, exprs: &[Expr], clause: Clause) -> ExecutorResult<Vec<BoundExpr>> {
        exprs.iter().map(|e| self.bind(e, clause)).collect()
    }

    fn bind_boxed(&mut self, expr: &Expr, clause: Clause) -> ExecutorResult<Box<BoundExpr>> {
        Ok(Box::new(self.bind(expr, clause)?))
    }

    fn bind(&mut self, expr: &Expr, clause: Clause) -> ExecutorResult<BoundExpr> {
        match expr {
            Expr::Null => Ok(BoundExpr::Literal(Value::Null)),
            Expr::Boolean(b) => Ok(BoundExpr::Literal(Value::Boolean(*b))),
            Expr::Integer(n) => Ok(BoundExpr::Literal(Value::Integer(*n))),
            Expr::Decimal(text) => Ok(BoundExpr::Literal(
                Decimal::parse(text)
                    .map(Value::Decimal)
                    .or_else(|| text.parse().ok().map(Value::Number))
                    .unwrap_or_else(|| Value::Text(text.clone())),
            )),
            Expr::String(s) => Ok(BoundExpr::Literal(Value::Text(s.clone()))),

            Expr::Column { table, name, span } => self.resolve(table.as_deref(), name, *span),

            Expr::Parameter { index, span } => match self.params.get(*index) {
                Some(value) => Ok(BoundExpr::Parameter {
                    index: *index,
                    ty: value.data_type(),
                }),
                None => Err(ExecutorError::ParameterNotSet {
                    index: index + 1,
                    position: position(*span),
                }),
            },

            Expr::Asterisk { span } => Err(ExecutorError::unsupported(
                "'*' is only allowed in COUNT(*)",
                position(*span),
            )),

            Expr::Function { name, args, span } => self.bind_function(name, args, *span, clause),

            Expr::Convert { expr, target, span } => {
                let inner = self.bind(expr, clause)?;
                let to = match target {
                    ConvertTarget::Charset(charset) => {
                        let target = resolve_charset(charset).ok_or_else(|| {
                            ExecutorError::function(
                                FunctionError::InvalidParameter {
                                    function: "CONVERT",
                                    value: charset.clone(),
                                },
                                position(*span),
                            )
                        })?;
                        let source = inner
                            .tables()
                            .first()
                            .and_then(|&t| self.tables[t].charset)
                            .unwrap_or(encoding_rs::UTF_8);
                        ConvertTo::Charset { source, target }
                    }
                    ConvertTarget::Type(ty) => ConvertTo::Type(*ty),
                };
                Ok(BoundExpr::Convert {
                    expr: Box::new(inner),
                    to,
                })
            }

            Expr::Compare { left, op, right } => Ok(BoundExpr::Compare {
                left: self.bind_boxed(left, clause)?,
                op: *op,
                right: self.bind_boxed(right, clause)?,
            }),

            Expr::IsNull { expr, negated } => Ok(BoundExpr::IsNull {
                expr: self.bind_boxed(expr, clause)?,
                negated: *negated,
            }),

            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => Ok(BoundExpr::Between {
                expr: self.bind_boxed(expr, clause)?,
                low: self.bind_boxed(low, clause)?,
                high: self.bind_boxed(high, clause)?,
                negated: *negated,
            }),

            Expr::Like {
                expr,
                pattern,
                negated,
                case_insensitive,
            } => Ok(BoundExpr::Like {
                expr: self.bind_boxed(expr, clause)?,
                pattern: self.bind_boxed(pattern, clause)?,
                negated: *negated,
                case_insensitive: *case_insensitive,
            }),

            Expr::Not(inner) => Ok(BoundExpr::Not(self.bind_boxed(inner, clause)?)),
            Expr::And(children) => Ok(BoundExpr::And(self.bind_all(children, clause)?)),
            Expr::Or(children) => Ok(BoundExpr::Or(self.bind_all(children, clause)?)),
        }
    }

    fn bind_function(
        &mut self,
        name: &str,
        args: &[Expr],
        span: Span,
        clause: Clause,
    ) -> ExecutorResult<BoundExpr> {
        let pos = position(span);
        let function = find_function(name).map_err(|e| ExecutorError::function(e, pos))?;
        function
            .arity()
            .check(function.name(), args.len())
            .map_err(|e| ExecutorError::function(e, pos))?;

        if !function.is_grouping() {
            let args = self.bind_all(args, clause)?;
            return Ok(BoundExpr::Function {
                function: FunctionRef(function),
                args,
            });
        }

        if !clause.allows_aggregates() {
            return Err(ExecutorError::unsupported(
                format!("aggregate function {} in {}", function.name(), clause.as_str()),
                pos,
            ));
        }
        if self.in_aggregate {
            return Err(ExecutorError::unsupported(
                format!("nested aggregate function {}", function.name()),
                pos,
            ));
        }
        let [arg] = args else {
            return Err(ExecutorError::unsupported(
                format!("{} takes exactly one argument", function.name()),
                pos,
            ));
        };
        self.in_aggregate = true;
        let arg = match arg {
            Expr::Asterisk { .. } => Ok(BoundExpr::Literal(Value::Integer(1))),
            other => self.bind(other, clause),
        };
        self.in_aggregate = false;

        let call = AggregateCall {
            function: FunctionRef(function),
            arg: arg?,
        };
        let ty = call.ty();
        let index = match self.aggregates.iter().position(|existing| *existing == call) {
            Some(index) => index,
            None => {
                self.aggregates.push(call);
                self.aggregates.len() - 1
            }
        };
        Ok(BoundExpr::Aggregate { index, ty })
    }
}

/// Name of a select-list column without alias.
fn column_name(expr: &Expr, bound: &BoundExpr) -> String {
    match (expr, bound) {
        (Expr::Column { .. }, BoundExpr::Field { name, .. }) => name.clone(),
        (Expr::String(s), _) => s.clone(),
        _ => expr.to_string(),
    }
}

/// Appends every column of `scope[table]`.
fn push_table_columns(columns: &mut Vec<PlanColumn>, scope: &[ScopeTable], table: usize, span: Span) {
    let source = &scope[table];
    for (field, info) in source.columns.iter().enumerate() {
        columns.push(PlanColumn {
            desc: ColumnDesc {
                name: info.name.clone(),
                table: Some(source.name.clone()),
                ty: info.ty,
                nullable: true,
            },
            expr: BoundExpr::Field {
                table,
                field,
                name: info.name.clone(),
                ty: info.ty,
            },
            hidden: false,
            position: position(span),
        });
    }
}

/// Returns true if `expr` can be computed once per group.
fn is_grouped(expr: &BoundExpr, keys: &[BoundExpr]) -> bool {
    if keys.contains(expr) {
        return true;
    }
    match expr {
        BoundExpr::Field { .. } | BoundExpr::Column { .. } => false,
        BoundExpr::Aggregate { .. } => true,
        other => other.children().into_iter().all(|child| is_grouped(child, keys)),
    }
}

/// Applies `f` to every expression of the plan.
fn for_each_expr(plan: &mut Plan, f: &mut impl FnMut(&mut BoundExpr)) {
    for column in &mut plan.columns {
        f(&mut column.expr);
    }
    for table in &mut plan.tables {
        if let Some(condition) = &mut table.condition {
            f(condition);
        }
    }
    if let Some(condition) = &mut plan.condition {
        f(condition);
    }
    if let Some(grouping) = &mut plan.grouping {
        for key in &mut grouping.keys {
            f(key);
        }
        for aggregate in &mut grouping.aggregates {
            f(&mut aggregate.arg);
        }
    }
}

/// Decides which fields each table loads and rewrites references to raw-row
/// positions.
fn layout(plan: &mut Plan) {
    let mut needed = vec![BTreeSet::new(); plan.tables.len()];
    for_each_expr(plan, &mut |expr| {
        expr.for_each_field(&mut |table, field| {
            needed[table].insert(field);
        })
    });

    let mut offset = 0;
    for (table, fields) in plan.tables.iter_mut().zip(needed) {
        let mut fields: Vec<usize> = fields.into_iter().collect();
        // Rows must still be counted when no field of the table is read.
        if fields.is_empty() && !table.source.columns().is_empty() {
            fields.push(0);
        }
        table.offset = offset;
        offset += fields.len();
        table.fields = fields;
    }

    let positions: Vec<(usize, Vec<usize>)> = plan
        .tables
        .iter()
        .map(|t| (t.offset, t.fields.clone()))
        .collect();
    for_each_expr(plan, &mut |expr| {
        expr.resolve_fields(&|table, field| {
            let (offset, fields) = &positions[table];
            offset + fields.binary_search(&field).unwrap_or(0)
        })
    });
}

/// Builds a [`Plan`] for `select` with the bound parameter values.
pub fn plan_select(
    select: &SelectStmt,
    params: &[Value],
    ctx: &ExecutionContext<'_>,
) -> ExecutorResult<Plan> {
    ctx.check_cancelled()?;

    let mut sources = Vec::with_capacity(select.from.len());
    let mut scope: Vec<ScopeTable> = Vec::with_capacity(select.from.len());
    for table_ref in &select.from {
        let pos = position(table_ref.span);
        let reference = table_ref.reference_name();
        if scope.iter().any(|t| t.name.eq_ignore_ascii_case(reference)) {
            return Err(ExecutorError::TableAmbiguous {
                name: reference.to_string(),
                position: pos,
            });
        }
        let schema = table_ref.schema.as_deref().unwrap_or(ctx.schema);
        let source = ctx
            .catalog
            .find_table(schema, &table_ref.name, &ctx.decode, ctx.warnings)
            .map_err(|e| match e {
                CatalogError::TableNotFound { name } => ExecutorError::TableNotFound { name, position: pos },
                other => other.into(),
            })?;
        scope.push(ScopeTable {
            name: reference.to_string(),
            columns: source.columns(),
            charset: source.charset(),
        });
        sources.push(source);
    }

    let mut binder = Binder {
        tables: &scope,
        params,
        visible: scope.len(),
        aggregates: Vec::new(),
        in_aggregate: false,
    };

    let mut columns = Vec::new();
    for item in &select.columns {
        match item {
            SelectItem::Wildcard { span } => {
                if scope.is_empty() {
                    return Err(ExecutorError::AsteriskWithoutTable {
                        position: position(*span),
                    });
                }
                for table in 0..scope.len() {
                    push_table_columns(&mut columns, &scope, table, *span);
                }
            }
            SelectItem::QualifiedWildcard { table, span } => {
                let index = scope
                    .iter()
                    .position(|t| t.name.eq_ignore_ascii_case(table))
                    .ok_or_else(|| ExecutorError::TableNotFound {
                        name: table.clone(),
                        position: position(*span),
                    })?;
                push_table_columns(&mut columns, &scope, index, *span);
            }
            SelectItem::Expr { expr, alias } => {
                let bound = binder.bind(expr, Clause::Select)?;
                let table = match &bound {
                    BoundExpr::Field { table, .. } => Some(scope[*table].name.clone()),
                    _ => None,
                };
                columns.push(PlanColumn {
                    desc: ColumnDesc {
                        name: alias.clone().unwrap_or_else(|| column_name(expr, &bound)),
                        table,
                        ty: bound.ty(),
                        nullable: true,
                    },
                    expr: bound,
                    hidden: false,
                    position: expr_position(expr),
                });
            }
        }
    }
    if columns.is_empty() {
        return Err(ExecutorError::EmptyColumnList);
    }

    let mut conditions = Vec::with_capacity(scope.len());
    for (index, table_ref) in select.from.iter().enumerate() {
        binder.visible = index + 1;
        let condition = match &table_ref.condition {
            Some(condition) => Some(binder.bind(condition, Clause::Join)?),
            None => None,
        };
        conditions.push(condition);
    }
    binder.visible = scope.len();

    let condition = match &select.where_clause {
        Some(condition) => Some(binder.bind(condition, Clause::Where)?),
        None => None,
    };

    let mut keys = Vec::with_capacity(select.group_by.len());
    for expr in &select.group_by {
        if let Expr::Parameter { span, .. } = expr {
            return Err(ExecutorError::unsupported("parameter in GROUP BY", position(*span)));
        }
        keys.push(binder.bind(expr, Clause::GroupBy)?);
    }

    let grouped = !keys.is_empty() || !binder.aggregates.is_empty();
    if grouped {
        for column in &columns {
            if !is_grouped(&column.expr, &keys) {
                return Err(ExecutorError::NotGroupBy {
                    name: column.desc.name.clone(),
                    position: column.position,
                });
            }
        }
    }

    let visible = columns.len();
    let mut order_by = Vec::with_capacity(select.order_by.len());
    for item in &select.order_by {
        let pos = expr_position(&item.expr);
        let column = match &item.expr {
            Expr::Integer(n) => usize::try_from(*n)
                .ok()
                .filter(|&ordinal| (1..=visible).contains(&ordinal))
                .map(|ordinal| ordinal - 1)
                .ok_or(ExecutorError::InvalidColumnIndex {
                    index: *n,
                    position: pos,
                })?,
            expr => {
                let bound = match binder.bind(expr, Clause::OrderBy) {
                    Ok(bound) => bound,
                    Err(err @ ExecutorError::InvalidColumn { .. }) => {
                        // Unqualified names may refer to a select-list alias.
                        let alias = match expr {
                            Expr::Column {
                                table: None, name, ..
                            } => columns[..visible]
                                .iter()
                                .position(|c| c.desc.name.eq_ignore_ascii_case(name)),
                            _ => None,
                        };
                        match alias {
                            Some(index) => {
                                order_by.push(SortKey {
                                    column: index,
                                    direction: item.direction,
                                });
                                continue;
                            }
                            None => return Err(err),
                        }
                    }
                    Err(err) => return Err(err),
                };
                match columns[..visible].iter().position(|c| c.expr == bound) {
                    Some(index) => index,
                    None if grouped || bound.contains_aggregate() => {
                        return Err(ExecutorError::OrderByNotInGroupBy {
                            name: expr.to_string(),
                            position: pos,
                        });
                    }
                    None => match columns[visible..].iter().position(|c| c.expr == bound) {
                        Some(index) => visible + index,
                        None => {
                            columns.push(PlanColumn {
                                desc: ColumnDesc {
                                    name: column_name(expr, &bound),
                                    table: None,
                                    ty: bound.ty(),
                                    nullable: true,
                                },
                                expr: bound,
                                hidden: true,
                                position: pos,
                            });
                            columns.len() - 1
                        }
                    },
                }
            }
        };
        order_by.push(SortKey {
            column,
            direction: item.direction,
        });
    }

    let grouping = grouped.then(|| Grouping {
        keys,
        aggregates: std::mem::take(&mut binder.aggregates),
    });

    let tables = sources
        .into_iter()
        .zip(&select.from)
        .zip(conditions)
        .map(|((source, table_ref), condition)| PlanTable {
            source,
            name: table_ref.reference_name().to_string(),
            join_type: table_ref.join_type,
            condition,
            fields: Vec::new(),
            offset: 0,
        })
        .collect();

    let mut plan = Plan {
        tables,
        columns,
        condition,
        grouping,
        order_by,
        distinct: select.distinct,
        params: params.to_vec(),
    };
    push_down(&mut plan);
    layout(&mut plan);

    debug!(
        tables = ?plan.tables.iter().map(|t| (&t.name, &t.fields)).collect::<Vec<_>>(),
        columns = plan.columns.len(),
        grouped = plan.grouping.is_some(),
        "planned select"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    use crate::catalog::{Catalog, Warning, WarningSink};
    use crate::error::ErrorCode;
    use crate::sql::{Statement, parse};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        catalog: Catalog,
        warnings: WarningSink,
        cancel: AtomicBool,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let catalog = Catalog::open(dir.path()).unwrap();
            let warnings = WarningSink::new();
            warnings.push(Warning {
                catalog: "test".into(),
                code: ErrorCode::CorruptHeader,
                reason: "bad header".into(),
                stack_trace: String::new(),
            });
            Self {
                _dir: dir,
                catalog,
                warnings,
                cancel: AtomicBool::new(false),
            }
        }

        fn plan(&self, sql: &str) -> ExecutorResult<Plan> {
            let ctx = ExecutionContext::new(
                &self.catalog,
                "information_schema",
                &self.warnings,
                &self.cancel,
            );
            let Statement::Select(select) = parse(sql).unwrap().remove(0);
            plan_select(&select, &[Value::Integer(1)], &ctx)
        }
    }

    #[test]
    fn test_wildcard_expansion() {
        let plan = Fixture::new().plan("SELECT * FROM pdx_warnings").unwrap();
        let names: Vec<_> = plan.result_columns().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["catalog", "reason", "sql_state", "vendor_code", "stack_trace"]);
        assert_eq!(plan.tables[0].fields, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_only_referenced_fields_are_loaded() {
        let plan = Fixture::new()
            .plan("SELECT reason FROM pdx_warnings WHERE vendor_code > 0")
            .unwrap();
        assert_eq!(plan.tables[0].fields, vec![1, 3]);
        assert_eq!(plan.raw_width(), 2);
    }

    #[test]
    fn test_unreferenced_table_loads_first_field() {
        let plan = Fixture::new().plan("SELECT COUNT(*) FROM pdx_warnings").unwrap();
        assert_eq!(plan.tables[0].fields, vec![0]);
        assert!(plan.grouping.is_some());
    }

    #[test]
    fn test_column_names_and_aliases() {
        let plan = Fixture::new()
            .plan("SELECT reason AS r, 'abc', 1, UPPER(reason) FROM pdx_warnings")
            .unwrap();
        let names: Vec<_> = plan.result_columns().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["r", "abc", "1", "UPPER(reason)"]);
    }

    #[test]
    fn test_ambiguous_and_invalid_columns() {
        let fixture = Fixture::new();
        let err = fixture
            .plan("SELECT reason FROM pdx_warnings a, pdx_warnings b")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ColumnAmbiguousDefined);
        assert_eq!(err.position(), Some(8));

        let err = fixture.plan("SELECT nope FROM pdx_warnings").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidColumn);

        let plan = fixture
            .plan("SELECT a.reason, b.reason FROM pdx_warnings a, pdx_warnings b")
            .unwrap();
        assert_eq!(plan.raw_width(), 2);
    }

    #[test]
    fn test_table_errors() {
        let fixture = Fixture::new();
        let err = fixture.plan("SELECT * FROM pdx_warnings, pdx_warnings").unwrap_err();
        assert_eq!(err.code(), ErrorCode::TableAmbiguousDefined);
        let err = fixture.plan("SELECT * FROM nope").unwrap_err();
        assert_eq!(err.code(), ErrorCode::TableNotFound);
        let err = fixture.plan("SELECT *").unwrap_err();
        assert_eq!(err.code(), ErrorCode::AsteriskWithoutTable);
    }

    #[test]
    fn test_not_group_by() {
        let fixture = Fixture::new();
        let err = fixture
            .plan("SELECT reason, COUNT(*) FROM pdx_warnings")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotGroupBy);

        fixture
            .plan("SELECT UPPER(reason), COUNT(*), 'x' FROM pdx_warnings GROUP BY reason")
            .unwrap();
        fixture
            .plan("SELECT reason FROM pdx_warnings GROUP BY reason")
            .unwrap();
    }

    #[test]
    fn test_order_by_resolution() {
        let fixture = Fixture::new();
        let plan = fixture
            .plan("SELECT reason AS r FROM pdx_warnings ORDER BY 1, r, vendor_code DESC")
            .unwrap();
        assert_eq!(plan.order_by.len(), 3);
        assert_eq!(plan.order_by[0].column, 0);
        assert_eq!(plan.order_by[1].column, 0);
        assert_eq!(plan.order_by[2].column, 1);
        assert!(plan.columns[1].hidden);
        assert_eq!(plan.visible_len(), 1);

        let err = fixture.plan("SELECT reason FROM pdx_warnings ORDER BY 2").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidColumnIndex);

        let err = fixture
            .plan("SELECT reason FROM pdx_warnings GROUP BY reason ORDER BY vendor_code")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OrderByNotInGroupBy);
    }

    #[test]
    fn test_aggregate_placement() {
        let fixture = Fixture::new();
        let err = fixture
            .plan("SELECT reason FROM pdx_warnings WHERE COUNT(*) > 1")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OperationNotSupported);
        let err = fixture
            .plan("SELECT MAX(COUNT(reason)) FROM pdx_warnings")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OperationNotSupported);
        let err = fixture
            .plan("SELECT COUNT(*) FROM pdx_warnings GROUP BY ?")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OperationNotSupported);
    }

    #[test]
    fn test_aggregates_are_shared() {
        let plan = Fixture::new()
            .plan("SELECT COUNT(reason), COUNT(reason) FROM pdx_warnings")
            .unwrap();
        assert_eq!(plan.grouping.unwrap().aggregates.len(), 1);
    }

    #[test]
    fn test_parameters() {
        let fixture = Fixture::new();
        let plan = fixture
            .plan("SELECT reason FROM pdx_warnings WHERE vendor_code = ?")
            .unwrap();
        assert!(plan.condition.is_none());
        assert!(plan.tables[0].condition.is_some());
        let err = fixture
            .plan("SELECT reason FROM pdx_warnings WHERE vendor_code BETWEEN ? AND ?")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
    }

    #[test]
    fn test_function_errors() {
        let fixture = Fixture::new();
        let err = fixture.plan("SELECT NOPE(reason) FROM pdx_warnings").unwrap_err();
        assert_eq!(err.code(), ErrorCode::FunctionNotFound);
        let err = fixture.plan("SELECT UPPER(reason, 1) FROM pdx_warnings").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameterCount);
    }
}
