//! Physical query plan.
//!
//! A [`Plan`] is built once per statement execution by
//! [`plan_select`](super::plan_select), rewritten by the push-down pass, and
//! consumed by [`execute_plan`](super::execute_plan).

use std::fmt;

use crate::catalog::TableSource;
use crate::datum::Value;
use crate::sql::{JoinType, SortDirection};

use super::column::ColumnDesc;
use super::expr::{AggregateCall, BoundExpr};

/// One FROM-list table with its join.
pub struct PlanTable {
    pub source: Box<dyn TableSource>,
    /// Name the query refers to the table by (alias or table name).
    pub name: String,
    /// Join against the tables before it; CROSS for the first table.
    pub join_type: JoinType,
    /// ON condition plus conditions pushed down from WHERE.
    pub condition: Option<BoundExpr>,
    /// Storage indices of the fields to load, ascending.
    pub fields: Vec<usize>,
    /// Position of this table's first loaded field in the raw row.
    pub offset: usize,
}

impl PlanTable {
    /// Number of loaded fields.
    pub fn width(&self) -> usize {
        self.fields.len()
    }
}

impl fmt::Debug for PlanTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanTable")
            .field("name", &self.name)
            .field("join_type", &self.join_type)
            .field("condition", &self.condition)
            .field("fields", &self.fields)
            .field("offset", &self.offset)
            .finish()
    }
}

/// A projected column.
#[derive(Debug, Clone)]
pub struct PlanColumn {
    pub desc: ColumnDesc,
    pub expr: BoundExpr,
    /// Present only to drive ORDER BY; stripped from the result.
    pub hidden: bool,
    /// 1-based source position of the select item.
    pub position: Option<usize>,
}

/// ORDER BY key over projected columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub direction: SortDirection,
}

/// GROUP BY keys and the aggregates computed per group.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub keys: Vec<BoundExpr>,
    pub aggregates: Vec<AggregateCall>,
}

/// Resolved SELECT statement ready for execution.
#[derive(Debug)]
pub struct Plan {
    pub tables: Vec<PlanTable>,
    /// Visible columns first, then hidden ones.
    pub columns: Vec<PlanColumn>,
    /// WHERE condition left after push-down.
    pub condition: Option<BoundExpr>,
    /// Present when the query aggregates.
    pub grouping: Option<Grouping>,
    pub order_by: Vec<SortKey>,
    pub distinct: bool,
    /// Bound `?` values.
    pub params: Vec<Value>,
}

impl Plan {
    /// Width of a joined raw row.
    pub fn raw_width(&self) -> usize {
        self.tables.iter().map(PlanTable::width).sum()
    }

    /// Number of columns returned to the caller.
    pub fn visible_len(&self) -> usize {
        self.columns.iter().filter(|c| !c.hidden).count()
    }

    /// Metadata of the returned columns.
    pub fn result_columns(&self) -> Vec<ColumnDesc> {
        self.columns
            .iter()
            .filter(|c| !c.hidden)
            .map(|c| c.desc.clone())
            .collect()
    }
}
