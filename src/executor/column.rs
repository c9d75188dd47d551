//! Result column metadata.

use crate::datum::Type;

/// Metadata describing a result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDesc {
    /// Column name (or alias).
    pub name: String,
    /// Reference name of the source table for plain field columns.
    pub table: Option<String>,
    pub ty: Type,
    pub nullable: bool,
}

impl ColumnDesc {
    /// Returns `table.name` for field columns, otherwise the name.
    pub fn display_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{table}.{}", self.name),
            None => self.name.clone(),
        }
    }
}
