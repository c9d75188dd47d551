//! Condition push-down.
//!
//! WHERE conjuncts are moved into the join condition of the last table they
//! read, so rows are dropped as early as possible during the nested-loop
//! join. A conjunct is only moved when doing so cannot change which rows an
//! outer join null-fills.

use tracing::debug;

use crate::sql::JoinType;

use super::expr::BoundExpr;
use super::plan::{Plan, PlanTable};

/// Returns true if a WHERE conjunct may be evaluated as part of the join of
/// `tables[target]`.
fn accepts_push_down(tables: &[PlanTable], target: usize) -> bool {
    matches!(tables[target].join_type, JoinType::Inner | JoinType::Cross)
        && tables[target + 1..]
            .iter()
            .all(|t| !matches!(t.join_type, JoinType::Right | JoinType::Full))
}

/// Pushes WHERE conjuncts down into table conditions.
pub fn push_down(plan: &mut Plan) {
    for table in &mut plan.tables {
        table.condition = table.condition.take().map(BoundExpr::reduce);
    }
    let Some(condition) = plan.condition.take() else {
        return;
    };

    let mut remaining = Vec::new();
    for conjunct in condition.reduce().into_conjuncts() {
        let target = match conjunct.tables().last() {
            Some(&target) => target,
            // Constant conjuncts filter the whole result.
            None => {
                remaining.push(conjunct);
                continue;
            }
        };
        if conjunct.contains_aggregate() || !accepts_push_down(&plan.tables, target) {
            remaining.push(conjunct);
            continue;
        }
        let table = &mut plan.tables[target];
        debug!(table = %table.name, condition = %conjunct, "pushed down condition");
        table.condition = Some(match table.condition.take() {
            Some(existing) => BoundExpr::And(vec![existing, conjunct]).reduce(),
            None => conjunct,
        });
    }
    plan.condition = BoundExpr::conjunction(remaining);
}
