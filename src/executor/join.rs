//! Nested-loop join over loaded tables.
//!
//! Tables are joined left to right. The running result holds rows as wide
//! as the tables joined so far; each step appends the next table's loaded
//! fields, keeping only combinations accepted by that table's condition and
//! null-filling the preserved side of outer joins.

use crate::datum::Value;
use crate::sql::JoinType;

use super::context::ExecutionContext;
use super::error::ExecutorResult;
use super::eval::EvalEnv;
use super::plan::PlanTable;

fn concat(left: &[Value], right: &[Value]) -> Vec<Value> {
    let mut row = Vec::with_capacity(left.len() + right.len());
    row.extend_from_slice(left);
    row.extend_from_slice(right);
    row
}

fn nulls(width: usize) -> Vec<Value> {
    vec![Value::Null; width]
}

/// Joins the loaded rows of every table into raw rows.
///
/// `loaded[i]` holds the rows of `tables[i]`, each with exactly the table's
/// loaded fields.
pub fn join_tables(
    tables: &[PlanTable],
    loaded: Vec<Vec<Vec<Value>>>,
    env: &EvalEnv<'_>,
    ctx: &ExecutionContext<'_>,
) -> ExecutorResult<Vec<Vec<Value>>> {
    let mut rows: Vec<Vec<Value>> = vec![Vec::new()];
    let mut width = 0;

    for (table, right_rows) in tables.iter().zip(loaded) {
        let accepts = |row: &[Value]| match &table.condition {
            Some(condition) => condition.matches(row, env),
            None => Ok(true),
        };
        let right_width = table.width();
        let mut joined = Vec::new();

        match table.join_type {
            JoinType::Inner | JoinType::Cross => {
                for left in &rows {
                    ctx.check_cancelled()?;
                    for right in &right_rows {
                        let row = concat(left, right);
                        if accepts(&row)? {
                            joined.push(row);
                        }
                    }
                }
            }
            JoinType::Left | JoinType::Full => {
                let mut right_matched = vec![false; right_rows.len()];
                for left in &rows {
                    ctx.check_cancelled()?;
                    let mut matched = false;
                    for (index, right) in right_rows.iter().enumerate() {
                        let row = concat(left, right);
                        if accepts(&row)? {
                            matched = true;
                            right_matched[index] = true;
                            joined.push(row);
                        }
                    }
                    if !matched {
                        joined.push(concat(left, &nulls(right_width)));
                    }
                }
                if table.join_type == JoinType::Full {
                    for (right, _) in right_rows
                        .iter()
                        .zip(right_matched)
                        .filter(|(_, matched)| !matched)
                    {
                        joined.push(concat(&nulls(width), right));
                    }
                }
            }
            JoinType::Right => {
                for right in &right_rows {
                    ctx.check_cancelled()?;
                    let mut matched = false;
                    for left in &rows {
                        let row = concat(left, right);
                        if accepts(&row)? {
                            matched = true;
                            joined.push(row);
                        }
                    }
                    if !matched {
                        joined.push(concat(&nulls(width), right));
                    }
                }
            }
        }

        rows = joined;
        width += right_width;
    }
    Ok(rows)
}
