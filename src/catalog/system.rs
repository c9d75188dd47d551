//! The `information_schema` system schema.

use std::sync::atomic::{AtomicBool, Ordering};

use super::error::CatalogError;
use super::pattern::NamePattern;
use super::source::{ColumnInfo, TableSource};
use super::warning::WarningSink;
use crate::data::DataError;
use crate::datum::{Type, Value};

/// Name of the system schema.
pub const INFORMATION_SCHEMA: &str = "information_schema";

/// Name of the warnings table.
pub const WARNINGS_TABLE: &str = "pdx_warnings";

/// An in-memory table materialized from connection state.
#[derive(Debug, Clone)]
pub struct SystemTable {
    name: String,
    columns: Vec<ColumnInfo>,
    rows: Vec<Vec<Value>>,
}

impl SystemTable {
    /// Builds `pdx_warnings` from the recorded warnings.
    pub fn warnings(sink: &WarningSink) -> Self {
        let column = |name: &str, ty| ColumnInfo {
            name: name.to_string(),
            ty,
        };
        let rows = sink
            .snapshot()
            .into_iter()
            .map(|w| {
                vec![
                    Value::Text(w.catalog.clone()),
                    Value::Text(w.reason.clone()),
                    Value::Text(w.sql_state().to_string()),
                    Value::Integer(i64::from(w.vendor_code())),
                    if w.stack_trace.is_empty() {
                        Value::Null
                    } else {
                        Value::Text(w.stack_trace)
                    },
                ]
            })
            .collect();

        Self {
            name: WARNINGS_TABLE.to_string(),
            columns: vec![
                column("catalog", Type::Varchar),
                column("reason", Type::Varchar),
                column("sql_state", Type::Varchar),
                column("vendor_code", Type::Integer),
                column("stack_trace", Type::Varchar),
            ],
            rows,
        }
    }

    /// Looks up a system table by name, ignoring case.
    pub fn find(name: &str, sink: &WarningSink) -> Result<Self, CatalogError> {
        if name.eq_ignore_ascii_case(WARNINGS_TABLE) {
            Ok(Self::warnings(sink))
        } else {
            Err(CatalogError::TableNotFound {
                name: format!("{INFORMATION_SCHEMA}.{name}"),
            })
        }
    }

    /// Names of the system tables matching `pattern`.
    pub fn list(pattern: &NamePattern) -> Vec<&'static str> {
        [WARNINGS_TABLE]
            .into_iter()
            .filter(|name| pattern.matches(name))
            .collect()
    }
}

impl TableSource for SystemTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &str {
        INFORMATION_SCHEMA
    }

    fn columns(&self) -> Vec<ColumnInfo> {
        self.columns.clone()
    }

    fn load(&self, fields: &[usize], cancel: &AtomicBool) -> Result<Vec<Vec<Value>>, CatalogError> {
        self.rows
            .iter()
            .map(|row| {
                if cancel.load(Ordering::Relaxed) {
                    return Err(CatalogError::Data(DataError::Cancelled));
                }
                Ok(fields
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                    .collect())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Warning;
    use crate::error::ErrorCode;

    #[test]
    fn test_warnings_table() {
        let sink = WarningSink::new();
        let err = DataError::corrupt_header("bad.db", "truncated");
        sink.push(Warning::from_error("main", ErrorCode::CorruptHeader, &err));

        let table = SystemTable::find("PDX_WARNINGS", &sink).unwrap();
        assert_eq!(table.columns().len(), 5);
        let rows = table.load(&[0, 2, 4], &AtomicBool::new(false)).unwrap();
        assert_eq!(
            rows,
            vec![vec![
                Value::Text("main".to_string()),
                Value::Text("HY000".to_string()),
                Value::Null,
            ]]
        );
    }

    #[test]
    fn test_unknown_system_table() {
        let sink = WarningSink::new();
        assert!(matches!(
            SystemTable::find("tables", &sink),
            Err(CatalogError::TableNotFound { .. })
        ));
    }
}
