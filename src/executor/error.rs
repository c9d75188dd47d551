//! Executor-specific errors.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::data::DataError;
use crate::error::ErrorCode;
use crate::function::FunctionError;

/// Result type for planning and execution.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors that can occur while planning or executing a query.
///
/// Variants carrying a `position` report the 1-based offset of the offending
/// SQL text when the parser recorded one.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Referenced table does not exist in the FROM list.
    #[error("table \"{name}\" not found")]
    TableNotFound { name: String, position: Option<usize> },

    /// Two tables in the FROM list share a reference name.
    #[error("table \"{name}\" is defined more than once")]
    TableAmbiguous { name: String, position: Option<usize> },

    /// Referenced column does not exist.
    #[error("invalid column \"{name}\"")]
    InvalidColumn { name: String, position: Option<usize> },

    /// ORDER BY ordinal out of range.
    #[error("invalid column index {index}")]
    InvalidColumnIndex { index: i64, position: Option<usize> },

    /// Column reference matches more than one table.
    #[error("column \"{name}\" is ambiguous")]
    ColumnAmbiguous { name: String, position: Option<usize> },

    /// `*` used without any table in FROM.
    #[error("'*' requires a table")]
    AsteriskWithoutTable { position: Option<usize> },

    /// The SELECT list expands to no columns.
    #[error("empty column list")]
    EmptyColumnList,

    /// A selected column is neither grouped nor aggregated.
    #[error("column \"{name}\" must appear in GROUP BY or be used in an aggregate function")]
    NotGroupBy { name: String, position: Option<usize> },

    /// ORDER BY on a grouped query names something outside the select list.
    #[error("ORDER BY column \"{name}\" must appear in the select list of a grouped query")]
    OrderByNotInGroupBy { name: String, position: Option<usize> },

    /// Unsupported operation or feature.
    #[error("unsupported: {message}")]
    Unsupported { message: String, position: Option<usize> },

    /// A `?` placeholder has no bound value.
    #[error("parameter {index} is not set")]
    ParameterNotSet { index: usize, position: Option<usize> },

    /// Function validation or evaluation failed.
    #[error("{source}")]
    Function {
        source: FunctionError,
        position: Option<usize>,
    },

    /// Catalog error during table lookup.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Decoding error while loading rows.
    #[error(transparent)]
    Data(#[from] DataError),

    /// The cancel flag was raised.
    #[error("operation cancelled")]
    Cancelled,
}

impl ExecutorError {
    /// Machine-readable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ExecutorError::TableNotFound { .. } => ErrorCode::TableNotFound,
            ExecutorError::TableAmbiguous { .. } => ErrorCode::TableAmbiguousDefined,
            ExecutorError::InvalidColumn { .. } => ErrorCode::InvalidColumn,
            ExecutorError::InvalidColumnIndex { .. } => ErrorCode::InvalidColumnIndex,
            ExecutorError::ColumnAmbiguous { .. } => ErrorCode::ColumnAmbiguousDefined,
            ExecutorError::AsteriskWithoutTable { .. } => ErrorCode::AsteriskWithoutTable,
            ExecutorError::EmptyColumnList => ErrorCode::EmptyColumnList,
            ExecutorError::NotGroupBy { .. } => ErrorCode::NotGroupBy,
            ExecutorError::OrderByNotInGroupBy { .. } => ErrorCode::OrderByNotInGroupBy,
            ExecutorError::Unsupported { .. } => ErrorCode::OperationNotSupported,
            ExecutorError::ParameterNotSet { .. } => ErrorCode::InvalidParameter,
            ExecutorError::Function { source, .. } => source.code(),
            ExecutorError::Catalog(e) => e.code(),
            ExecutorError::Data(e) => e.code(),
            ExecutorError::Cancelled => ErrorCode::OperationCancelled,
        }
    }

    /// 1-based source position, when known.
    pub fn position(&self) -> Option<usize> {
        match self {
            ExecutorError::TableNotFound { position, .. }
            | ExecutorError::TableAmbiguous { position, .. }
            | ExecutorError::InvalidColumn { position, .. }
            | ExecutorError::InvalidColumnIndex { position, .. }
            | ExecutorError::ColumnAmbiguous { position, .. }
            | ExecutorError::AsteriskWithoutTable { position }
            | ExecutorError::NotGroupBy { position, .. }
            | ExecutorError::OrderByNotInGroupBy { position, .. }
            | ExecutorError::Unsupported { position, .. }
            | ExecutorError::ParameterNotSet { position, .. }
            | ExecutorError::Function { position, .. } => *position,
            ExecutorError::EmptyColumnList
            | ExecutorError::Catalog(_)
            | ExecutorError::Data(_)
            | ExecutorError::Cancelled => None,
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>, position: Option<usize>) -> Self {
        ExecutorError::Unsupported {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn function(source: FunctionError, position: Option<usize>) -> Self {
        ExecutorError::Function { source, position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_positions() {
        let err = ExecutorError::ColumnAmbiguous {
            name: "id".into(),
            position: Some(8),
        };
        assert_eq!(err.code(), ErrorCode::ColumnAmbiguousDefined);
        assert_eq!(err.position(), Some(8));
        assert_eq!(err.to_string(), "column \"id\" is ambiguous");
        assert_eq!(ExecutorError::Cancelled.code(), ErrorCode::OperationCancelled);
    }

    #[test]
    fn test_function_error_keeps_code() {
        let err = ExecutorError::function(FunctionError::NotFound { name: "NOPE".into() }, None);
        assert_eq!(err.code(), ErrorCode::FunctionNotFound);
        assert_eq!(err.to_string(), "function NOPE not found");
    }
}
