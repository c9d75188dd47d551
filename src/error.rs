//! Crate-level error type with stable machine-readable codes.

use std::fmt;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::data::DataError;
use crate::executor::ExecutorError;
use crate::sql::{SyntaxError, SyntaxErrorKind};

/// Result type for public operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Stable error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    EmptySql,
    UseBatchOperation,
    InconsistentParameterList,
    SyntaxError,
    InvalidColumn,
    InvalidColumnIndex,
    ColumnAmbiguousDefined,
    TableNotFound,
    TableAmbiguousDefined,
    AsteriskWithoutTable,
    AsteriskInFunction,
    EmptyColumnList,
    NotGroupBy,
    OrderByNotInGroupBy,
    InvalidParameterCount,
    InvalidParameter,
    FunctionNotFound,
    FieldTypeNotSupported,
    EncryptedTable,
    CorruptHeader,
    CorruptData,
    IoError,
    OperationNotSupported,
    OperationCancelled,
    NotConnected,
    DirectoryNotFound,
    SchemaNotFound,
    IncompatibleTypes,
}

impl ErrorCode {
    /// Upper snake case name of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::EmptySql => "EMPTY_SQL",
            ErrorCode::UseBatchOperation => "USE_BATCH_OPERATION",
            ErrorCode::InconsistentParameterList => "INCONSISTENT_PARAMETER_LIST",
            ErrorCode::SyntaxError => "SYNTAX_ERROR",
            ErrorCode::InvalidColumn => "INVALID_COLUMN",
            ErrorCode::InvalidColumnIndex => "INVALID_COLUMN_INDEX",
            ErrorCode::ColumnAmbiguousDefined => "COLUMN_AMBIGUOUS_DEFINED",
            ErrorCode::TableNotFound => "TABLE_NOT_FOUND",
            ErrorCode::TableAmbiguousDefined => "TABLE_AMBIGUOUS_DEFINED",
            ErrorCode::AsteriskWithoutTable => "ASTERISK_WITHOUT_TABLE",
            ErrorCode::AsteriskInFunction => "ASTERISK_IN_FUNCTION",
            ErrorCode::EmptyColumnList => "EMPTY_COLUMN_LIST",
            ErrorCode::NotGroupBy => "NOT_GROUP_BY",
            ErrorCode::OrderByNotInGroupBy => "ORDER_BY_NOT_IN_GROUP_BY",
            ErrorCode::InvalidParameterCount => "INVALID_PARAMETER_COUNT",
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::FunctionNotFound => "FUNCTION_NOT_FOUND",
            ErrorCode::FieldTypeNotSupported => "FIELD_TYPE_NOT_SUPPORTED",
            ErrorCode::EncryptedTable => "ENCRYPTED_TABLE",
            ErrorCode::CorruptHeader => "CORRUPT_HEADER",
            ErrorCode::CorruptData => "CORRUPT_DATA",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::OperationNotSupported => "OPERATION_NOT_SUPPORTED",
            ErrorCode::OperationCancelled => "OPERATION_CANCELLED",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::DirectoryNotFound => "DIRECTORY_NOT_FOUND",
            ErrorCode::SchemaNotFound => "SCHEMA_NOT_FOUND",
            ErrorCode::IncompatibleTypes => "INCOMPATIBLE_TYPES",
        }
    }

    /// Numeric vendor code; stable as long as variants are only appended.
    pub fn vendor_code(self) -> i32 {
        self as i32 + 1
    }

    /// SQLSTATE class reported alongside the code.
    pub fn sql_state(self) -> &'static str {
        match self {
            ErrorCode::SyntaxError
            | ErrorCode::AsteriskWithoutTable
            | ErrorCode::AsteriskInFunction
            | ErrorCode::EmptyColumnList
            | ErrorCode::NotGroupBy
            | ErrorCode::OrderByNotInGroupBy => "42000",
            ErrorCode::InvalidColumn
            | ErrorCode::InvalidColumnIndex
            | ErrorCode::ColumnAmbiguousDefined => "42S22",
            ErrorCode::TableNotFound | ErrorCode::TableAmbiguousDefined => "42S02",
            ErrorCode::SchemaNotFound | ErrorCode::DirectoryNotFound => "3F000",
            ErrorCode::FunctionNotFound => "42883",
            ErrorCode::InvalidParameterCount
            | ErrorCode::InvalidParameter
            | ErrorCode::InconsistentParameterList => "07001",
            ErrorCode::IncompatibleTypes => "42804",
            ErrorCode::OperationNotSupported
            | ErrorCode::UseBatchOperation
            | ErrorCode::FieldTypeNotSupported
            | ErrorCode::EncryptedTable => "0A000",
            ErrorCode::OperationCancelled => "57014",
            ErrorCode::NotConnected => "08003",
            ErrorCode::EmptySql => "42000",
            ErrorCode::CorruptHeader | ErrorCode::CorruptData | ErrorCode::IoError => "HY000",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the public API.
#[derive(Debug, Error)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// The statement text contains no statement.
    #[error("empty SQL statement")]
    EmptySql,

    /// More than one statement was given where one is expected.
    #[error("multiple statements require a batch operation")]
    UseBatchOperation,

    /// A batch entry declares a different number of parameters.
    #[error("inconsistent parameter list: expected {expected} parameters, found {found}")]
    InconsistentParameterList { expected: usize, found: usize },

    /// A parameter index is outside the statement's parameter list.
    #[error("invalid parameter index {index}")]
    InvalidParameterIndex { index: usize },

    /// The owning connection has been closed.
    #[error("connection is closed")]
    NotConnected,
}

impl Error {
    /// Machine-readable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Syntax(e) => match e.kind {
                SyntaxErrorKind::Unexpected => ErrorCode::SyntaxError,
                SyntaxErrorKind::AsteriskInFunction => ErrorCode::AsteriskInFunction,
                SyntaxErrorKind::InvalidParameter => ErrorCode::InvalidParameter,
            },
            Error::Data(e) => e.code(),
            Error::Catalog(e) => e.code(),
            Error::Executor(e) => e.code(),
            Error::EmptySql => ErrorCode::EmptySql,
            Error::UseBatchOperation => ErrorCode::UseBatchOperation,
            Error::InconsistentParameterList { .. } => ErrorCode::InconsistentParameterList,
            Error::InvalidParameterIndex { .. } => ErrorCode::InvalidParameter,
            Error::NotConnected => ErrorCode::NotConnected,
        }
    }

    /// 1-based position in the statement text, when known.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Syntax(e) => Some(e.position()),
            Error::Executor(e) => e.position(),
            _ => None,
        }
    }
}
