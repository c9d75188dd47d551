//! Query executor for SELECT statements over catalog tables.
//!
//! # Architecture
//!
//! ```text
//! AST (SelectStmt)
//!       |
//! [planner] -- resolves tables via Catalog, binds names, checks GROUP BY
//!       |
//! [optimize] -- pushes WHERE conjuncts into join conditions
//!       |
//! Plan
//!       |
//! [runner] -- load -> join -> filter -> group/project -> sort -> distinct
//! ```
//!
//! # Components
//!
//! - [`plan_select`]: Transforms a SELECT AST into a [`Plan`]
//! - [`execute_plan`]: Runs a plan to a [`QueryResult`]
//! - [`BoundExpr`]: Bound expression tree with plan-time column resolution
//! - [`ExecutionContext`]: Connection settings and cancel flag of one execution

mod aggregate;
mod column;
mod context;
mod error;
mod eval;
mod expr;
mod join;
mod optimize;
mod plan;
mod planner;
mod runner;

pub use aggregate::GroupKey;
pub use column::ColumnDesc;
pub use context::{ExecutionContext, ParallelOptions};
pub use error::{ExecutorError, ExecutorResult};
pub use eval::EvalEnv;
pub use expr::{AggregateCall, BoundExpr, ConvertTo, FunctionRef};
pub use plan::{Grouping, Plan, PlanColumn, PlanTable, SortKey};
pub use planner::plan_select;
pub use runner::{QueryResult, execute_plan};

use crate::datum::Value;
use crate::sql::SelectStmt;

/// Plans and executes `select` with the bound parameter values.
pub fn execute_select(
    select: &SelectStmt,
    params: &[Value],
    ctx: &ExecutionContext<'_>,
) -> ExecutorResult<QueryResult> {
    let plan = plan_select(select, params, ctx)?;
    execute_plan(plan, ctx)
}
