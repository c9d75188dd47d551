//! Grouping of joined rows.
//!
//! [`GroupKey`] gives GROUP BY and DISTINCT their equality: NULL equals NULL,
//! numbers compare by value across integer, decimal and double, and values
//! of unrelated types never collide. [`group_rows`] partitions rows by key
//! and feeds every aggregate argument into one accumulator per group.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use chrono::NaiveTime;
use rayon::prelude::*;
use tracing::debug;

use crate::datum::{Value, compare_values};
use crate::function::Accumulator;

use super::context::ExecutionContext;
use super::error::{ExecutorError, ExecutorResult};
use super::eval::EvalEnv;
use super::plan::Grouping;

/// Comparison family of a value. Values of different families are distinct.
fn family(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Boolean(_) => 1,
        Value::Integer(_) | Value::Number(_) | Value::Decimal(_) => 2,
        Value::Text(_) => 3,
        Value::Bytes(_) => 4,
        Value::Date(_) | Value::Timestamp(_) => 5,
        Value::Time(_) => 6,
    }
}

/// HashMap key with SQL GROUP BY equality semantics.
#[derive(Debug, Clone)]
pub struct GroupKey(pub Vec<Value>);

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(a, b)| match (a, b) {
                (Value::Null, Value::Null) => true,
                _ => {
                    family(a) == family(b)
                        && compare_values(a, b) == Some(std::cmp::Ordering::Equal)
                }
            })
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for value in &self.0 {
            family(value).hash(state);
            match value {
                Value::Null => {}
                Value::Boolean(b) => b.hash(state),
                Value::Integer(_) | Value::Number(_) | Value::Decimal(_) => {
                    let n = value.as_f64().unwrap_or(f64::NAN);
                    let n = if n == 0.0 {
                        0.0
                    } else if n.is_nan() {
                        f64::NAN
                    } else {
                        n
                    };
                    n.to_bits().hash(state);
                }
                Value::Text(s) => s.hash(state),
                Value::Bytes(b) => b.hash(state),
                Value::Date(d) => d.and_time(NaiveTime::MIN).hash(state),
                Value::Timestamp(ts) => ts.hash(state),
                Value::Time(t) => t.hash(state),
            }
        }
    }
}

/// One group: its first raw row and the finished aggregate values.
pub type Group = (Vec<Value>, Vec<Value>);

struct GroupState {
    row: Vec<Value>,
    accumulators: Vec<Box<dyn Accumulator>>,
}

impl GroupState {
    fn new(row: Vec<Value>, grouping: &Grouping) -> ExecutorResult<Self> {
        let accumulators = grouping
            .aggregates
            .iter()
            .map(|call| {
                call.function.0.accumulator().ok_or_else(|| {
                    ExecutorError::unsupported(
                        format!("{} is not an aggregate function", call.function.name()),
                        None,
                    )
                })
            })
            .collect::<ExecutorResult<Vec<_>>>()?;
        Ok(Self { row, accumulators })
    }

    fn feed(&mut self, row: &[Value], grouping: &Grouping, env: &EvalEnv<'_>) -> ExecutorResult<()> {
        for (accumulator, call) in self.accumulators.iter_mut().zip(&grouping.aggregates) {
            let value = call.arg.evaluate(row, env)?;
            accumulator
                .feed(&value)
                .map_err(|e| ExecutorError::function(e, None))?;
        }
        Ok(())
    }

    fn combine(&mut self, other: GroupState) -> ExecutorResult<()> {
        for (accumulator, partial) in self.accumulators.iter_mut().zip(&other.accumulators) {
            accumulator
                .combine(&**partial)
                .map_err(|e| ExecutorError::function(e, None))?;
        }
        Ok(())
    }

    fn finish(self) -> Group {
        let values = self.accumulators.iter().map(|a| a.finish()).collect();
        (self.row, values)
    }
}

/// Groups one run of rows, in order of first appearance within the run.
fn partial_groups(
    rows: &[Vec<Value>],
    grouping: &Grouping,
    env: &EvalEnv<'_>,
    ctx: &ExecutionContext<'_>,
) -> ExecutorResult<Vec<(GroupKey, GroupState)>> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(GroupKey, GroupState)> = Vec::new();

    for row in rows {
        ctx.check_cancelled()?;
        let key = GroupKey(
            grouping
                .keys
                .iter()
                .map(|k| k.evaluate(row, env))
                .collect::<ExecutorResult<Vec<_>>>()?,
        );
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, GroupState::new(row.clone(), grouping)?));
                groups.len() - 1
            }
        };
        groups[slot].1.feed(row, grouping, env)?;
    }
    Ok(groups)
}

/// Partitions `rows` by the grouping keys, in order of first appearance.
///
/// Large inputs are grouped chunk by chunk on the rayon pool; the partial
/// states are then merged in chunk order, so the result matches a serial
/// pass. Without GROUP BY keys an empty input still forms one group over an
/// all-NULL row of `raw_width` fields, so `COUNT(*)` over nothing is 0.
pub fn group_rows(
    rows: Vec<Vec<Value>>,
    grouping: &Grouping,
    raw_width: usize,
    env: &EvalEnv<'_>,
    ctx: &ExecutionContext<'_>,
) -> ExecutorResult<Vec<Group>> {
    let partials = if ctx.parallel.applies_to(rows.len()) {
        let chunk = rows.len().div_ceil(rayon::current_num_threads()).max(1);
        debug!(rows = rows.len(), chunk, "grouping in parallel");
        rows.par_chunks(chunk)
            .map(|run| partial_groups(run, grouping, env, ctx))
            .collect::<ExecutorResult<Vec<_>>>()?
    } else {
        vec![partial_groups(&rows, grouping, env, ctx)?]
    };

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<GroupState> = Vec::new();
    for (key, state) in partials.into_iter().flatten() {
        match index.get(&key) {
            Some(&slot) => groups[slot].combine(state)?,
            None => {
                index.insert(key, groups.len());
                groups.push(state);
            }
        }
    }

    if groups.is_empty() && grouping.keys.is_empty() {
        groups.push(GroupState::new(vec![Value::Null; raw_width], grouping)?);
    }
    Ok(groups.into_iter().map(GroupState::finish).collect())
}
