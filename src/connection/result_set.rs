//! Materialized query results.

use crate::datum::Value;
use crate::executor::{ColumnDesc, QueryResult};

/// Column metadata and rows returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Vec<ColumnDesc>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<ColumnDesc>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column named `name`, ignoring case.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Value at `row` and `column`, both 0-based.
    pub fn get(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.get(column)
    }

    /// Values of the column named `name`, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<Value>> {
        let index = self.find_column(name)?;
        Some(self.rows.iter().map(|row| row[index].clone()).collect())
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }
}

impl From<QueryResult> for ResultSet {
    fn from(result: QueryResult) -> Self {
        Self::new(result.columns, result.rows)
    }
}

impl IntoIterator for ResultSet {
    type Item = Vec<Value>;
    type IntoIter = std::vec::IntoIter<Vec<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
