//! Plan execution.
//!
//! A [`Plan`] runs as a fixed pipeline over materialized rows:
//!
//! ```text
//! load tables -> join -> WHERE -> group / project -> ORDER BY -> DISTINCT -> max rows
//! ```
//!
//! Table loading, filtering and projection fan out over rayon's pool when
//! parallel scanning is enabled and the input is large enough; every stage
//! keeps input order, so results do not depend on the setting.

use std::cmp::Ordering;
use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::datum::{Value, compare_values};
use crate::sql::SortDirection;

use super::aggregate::{GroupKey, group_rows};
use super::column::ColumnDesc;
use super::context::ExecutionContext;
use super::error::{ExecutorError, ExecutorResult};
use super::eval::EvalEnv;
use super::join::join_tables;
use super::plan::{Plan, PlanColumn, PlanTable, SortKey};

/// Rows and column metadata of an executed query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<ColumnDesc>,
    pub rows: Vec<Vec<Value>>,
}

fn load_table(table: &PlanTable, ctx: &ExecutionContext<'_>) -> ExecutorResult<Vec<Vec<Value>>> {
    let rows = table
        .source
        .load(&table.fields, ctx.cancel)
        .map_err(|e| if ctx.is_cancelled() { ExecutorError::Cancelled } else { e.into() })?;
    debug!(table = %table.name, fields = ?table.fields, rows = rows.len(), "loaded table");
    Ok(rows)
}

fn project(columns: &[PlanColumn], row: &[Value], env: &EvalEnv<'_>) -> ExecutorResult<Vec<Value>> {
    columns.iter().map(|c| c.expr.evaluate(row, env)).collect()
}

/// Orders two projected rows by the sort keys. NULL sorts before any value.
fn compare_rows(keys: &[SortKey], a: &[Value], b: &[Value]) -> Ordering {
    for key in keys {
        let (x, y) = (&a[key.column], &b[key.column]);
        let ord = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => compare_values(x, y).unwrap_or(Ordering::Equal),
        };
        let ord = match key.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Executes a plan to completion.
pub fn execute_plan(plan: Plan, ctx: &ExecutionContext<'_>) -> ExecutorResult<QueryResult> {
    ctx.check_cancelled()?;
    let env = EvalEnv {
        params: &plan.params,
        functions: &ctx.functions,
        escape: ctx.escape,
        aggregates: &[],
    };

    let loaded = if ctx.parallel.enabled && plan.tables.len() > 1 {
        plan.tables
            .par_iter()
            .map(|table| load_table(table, ctx))
            .collect::<ExecutorResult<Vec<_>>>()?
    } else {
        plan.tables
            .iter()
            .map(|table| load_table(table, ctx))
            .collect::<ExecutorResult<Vec<_>>>()?
    };

    let mut rows = join_tables(&plan.tables, loaded, &env, ctx)?;

    if let Some(condition) = &plan.condition {
        let keep = |row: Vec<Value>| -> ExecutorResult<Option<Vec<Value>>> {
            ctx.check_cancelled()?;
            Ok(condition.matches(&row, &env)?.then_some(row))
        };
        let filtered: Vec<Option<Vec<Value>>> = if ctx.parallel.applies_to(rows.len()) {
            rows.into_par_iter().map(keep).collect::<ExecutorResult<_>>()?
        } else {
            rows.into_iter().map(keep).collect::<ExecutorResult<_>>()?
        };
        rows = filtered.into_iter().flatten().collect();
    }

    let mut output = match &plan.grouping {
        Some(grouping) => {
            let groups = group_rows(rows, grouping, plan.raw_width(), &env, ctx)?;
            debug!(groups = groups.len(), "grouped rows");
            groups
                .iter()
                .map(|(row, aggregates)| project(&plan.columns, row, &env.with_aggregates(aggregates)))
                .collect::<ExecutorResult<Vec<_>>>()?
        }
        None => {
            let projected = |row: &Vec<Value>| -> ExecutorResult<Vec<Value>> {
                ctx.check_cancelled()?;
                project(&plan.columns, row, &env)
            };
            if ctx.parallel.applies_to(rows.len()) {
                rows.par_iter().map(projected).collect::<ExecutorResult<Vec<_>>>()?
            } else {
                rows.iter().map(projected).collect::<ExecutorResult<Vec<_>>>()?
            }
        }
    };

    if !plan.order_by.is_empty() {
        ctx.check_cancelled()?;
        output.sort_by(|a, b| compare_rows(&plan.order_by, a, b));
    }

    let visible = plan.visible_len();
    if plan.distinct {
        let mut seen = HashSet::new();
        output.retain(|row| seen.insert(GroupKey(row[..visible].to_vec())));
    }

    if ctx.max_rows > 0 {
        output.truncate(ctx.max_rows);
    }
    for row in &mut output {
        row.truncate(visible);
    }

    info!(rows = output.len(), columns = visible, "query executed");
    Ok(QueryResult {
        columns: plan.result_columns(),
        rows: output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    use crate::catalog::{Catalog, CatalogError, ColumnInfo, TableSource, WarningSink};
    use crate::datum::Type;
    use crate::executor::expr::BoundExpr;
    use crate::sql::JoinType;
    use tempfile::TempDir;

    /// When a table source sees the cancel flag raised.
    #[derive(Debug)]
    enum Trigger {
        Never,
        /// The source raises the flag itself halfway through loading.
        InLoad,
        /// Another thread raises the flag once loading has started.
        OtherThread(Arc<Barrier>),
    }

    #[derive(Debug)]
    struct NumberSource {
        rows: i64,
        trigger: Trigger,
    }

    impl TableSource for NumberSource {
        fn name(&self) -> &str {
            "numbers"
        }

        fn schema(&self) -> &str {
            "main"
        }

        fn columns(&self) -> Vec<ColumnInfo> {
            vec![ColumnInfo {
                name: "n".into(),
                ty: Type::Integer,
            }]
        }

        fn load(&self, _fields: &[usize], cancel: &AtomicBool) -> Result<Vec<Vec<Value>>, CatalogError> {
            let mut rows = Vec::new();
            for n in 0..self.rows {
                if n == self.rows / 2 {
                    match &self.trigger {
                        Trigger::Never => {}
                        Trigger::InLoad => cancel.store(true, AtomicOrdering::Relaxed),
                        Trigger::OtherThread(started) => {
                            started.wait();
                            while !cancel.load(AtomicOrdering::Relaxed) {
                                thread::yield_now();
                            }
                        }
                    }
                }
                rows.push(vec![Value::Integer(n)]);
            }
            Ok(rows)
        }
    }

    fn scan(trigger: Trigger, condition: Option<BoundExpr>) -> Plan {
        let n = BoundExpr::Column {
            index: 0,
            name: "n".into(),
            ty: Type::Integer,
        };
        Plan {
            tables: vec![PlanTable {
                source: Box::new(NumberSource { rows: 1000, trigger }),
                name: "numbers".into(),
                join_type: JoinType::Cross,
                condition: None,
                fields: vec![0],
                offset: 0,
            }],
            columns: vec![PlanColumn {
                desc: ColumnDesc {
                    name: "n".into(),
                    table: Some("numbers".into()),
                    ty: Type::Integer,
                    nullable: true,
                },
                expr: n,
                hidden: false,
                position: Some(1),
            }],
            condition,
            grouping: None,
            order_by: Vec::new(),
            distinct: false,
            params: Vec::new(),
        }
    }

    fn execute(plan: Plan, cancel: &AtomicBool) -> ExecutorResult<QueryResult> {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::open(dir.path()).unwrap();
        let warnings = WarningSink::new();
        let ctx = ExecutionContext::new(&catalog, "main", &warnings, cancel);
        execute_plan(plan, &ctx)
    }

    fn always() -> Option<BoundExpr> {
        Some(BoundExpr::Literal(Value::Boolean(true)))
    }

    #[test]
    fn test_scan_without_cancel_returns_every_row() {
        let cancel = AtomicBool::new(false);
        let result = execute(scan(Trigger::Never, always()), &cancel).unwrap();
        assert_eq!(result.rows.len(), 1000);
    }

    #[test]
    fn test_cancel_raised_during_load_stops_filter() {
        let cancel = AtomicBool::new(false);
        let err = execute(scan(Trigger::InLoad, always()), &cancel).unwrap_err();
        assert!(matches!(err, ExecutorError::Cancelled));
        assert_eq!(err.code(), crate::error::ErrorCode::OperationCancelled);
    }

    #[test]
    fn test_cancel_raised_during_load_stops_projection() {
        let cancel = AtomicBool::new(false);
        let err = execute(scan(Trigger::InLoad, None), &cancel).unwrap_err();
        assert!(matches!(err, ExecutorError::Cancelled));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let cancel = AtomicBool::new(false);
        let started = Arc::new(Barrier::new(2));
        let plan = scan(Trigger::OtherThread(Arc::clone(&started)), always());
        let result = thread::scope(|scope| {
            scope.spawn(|| {
                started.wait();
                cancel.store(true, AtomicOrdering::Relaxed);
            });
            execute(plan, &cancel)
        });
        assert!(matches!(result, Err(ExecutorError::Cancelled)));
    }

    fn key(column: usize, direction: SortDirection) -> SortKey {
        SortKey { column, direction }
    }

    #[test]
    fn test_nulls_sort_first_ascending() {
        let mut rows = vec![
            vec![Value::Integer(2)],
            vec![Value::Null],
            vec![Value::Integer(1)],
        ];
        rows.sort_by(|a, b| compare_rows(&[key(0, SortDirection::Asc)], a, b));
        assert_eq!(
            rows,
            vec![vec![Value::Null], vec![Value::Integer(1)], vec![Value::Integer(2)]]
        );
        rows.sort_by(|a, b| compare_rows(&[key(0, SortDirection::Desc)], a, b));
        assert_eq!(
            rows,
            vec![vec![Value::Integer(2)], vec![Value::Integer(1)], vec![Value::Null]]
        );
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let row = |k: i64, tag: &str| vec![Value::Integer(k), Value::Text(tag.into())];
        let mut rows = vec![row(1, "a"), row(0, "b"), row(1, "c"), row(0, "d")];
        rows.sort_by(|a, b| compare_rows(&[key(0, SortDirection::Asc)], a, b));
        assert_eq!(rows, vec![row(0, "b"), row(0, "d"), row(1, "a"), row(1, "c")]);
    }

    #[test]
    fn test_secondary_key() {
        let row = |a: i64, b: i64| vec![Value::Integer(a), Value::Integer(b)];
        let mut rows = vec![row(1, 1), row(0, 5), row(1, 3)];
        rows.sort_by(|a, b| {
            compare_rows(&[key(0, SortDirection::Asc), key(1, SortDirection::Desc)], a, b)
        });
        assert_eq!(rows, vec![row(0, 5), row(1, 3), row(1, 1)]);
    }
}
