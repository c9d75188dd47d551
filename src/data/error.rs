//! Errors raised while reading table, memo and index files.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::ErrorCode;

/// Result type for decoder operations.
pub type DataResult<T> = Result<T, DataError>;

/// Errors that can occur while decoding Paradox files.
#[derive(Debug, Error)]
pub enum DataError {
    /// Underlying I/O failure.
    #[error("error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Header is truncated or inconsistent.
    #[error("corrupt header in {}: {reason}", path.display())]
    CorruptHeader { path: PathBuf, reason: String },

    /// Block chain or record layout is inconsistent.
    #[error("corrupt data block {block} in {}", path.display())]
    CorruptBlock { path: PathBuf, block: u16 },

    /// A record ends before one of its fields.
    #[error("record too short for field '{field}'")]
    RecordTooShort { field: String },

    /// No parser is registered for the field's type code.
    #[error("field type 0x{code:02x} of field '{field}' is not supported")]
    FieldTypeNotSupported { code: u8, field: String },

    /// The table carries an encryption marker.
    #[error("table '{name}' is encrypted")]
    Encrypted { name: String },

    /// Loading was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl DataError {
    /// Machine-readable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DataError::Io { .. } => ErrorCode::IoError,
            DataError::CorruptHeader { .. } => ErrorCode::CorruptHeader,
            DataError::CorruptBlock { .. } | DataError::RecordTooShort { .. } => {
                ErrorCode::CorruptData
            }
            DataError::FieldTypeNotSupported { .. } => ErrorCode::FieldTypeNotSupported,
            DataError::Encrypted { .. } => ErrorCode::EncryptedTable,
            DataError::Cancelled => ErrorCode::OperationCancelled,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt_header(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DataError::CorruptHeader {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
