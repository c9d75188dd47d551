//! Catalog-specific errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::data::DataError;
use crate::error::ErrorCode;

/// Errors that can occur while resolving schemas and tables.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog root is not a directory.
    #[error("directory {} not found", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// No schema directory with this name.
    #[error("schema \"{name}\" not found")]
    SchemaNotFound { name: String },

    /// No table with this name in the schema.
    #[error("table \"{name}\" not found")]
    TableNotFound { name: String },

    /// The name refers to a view, which can only be listed.
    #[error("querying view \"{name}\" is not supported")]
    ViewNotSupported { name: String },

    /// Directory listing failed.
    #[error("error listing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Table header or data could not be decoded.
    #[error(transparent)]
    Data(#[from] DataError),
}

impl CatalogError {
    /// Machine-readable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CatalogError::DirectoryNotFound { .. } => ErrorCode::DirectoryNotFound,
            CatalogError::SchemaNotFound { .. } => ErrorCode::SchemaNotFound,
            CatalogError::TableNotFound { .. } => ErrorCode::TableNotFound,
            CatalogError::ViewNotSupported { .. } => ErrorCode::OperationNotSupported,
            CatalogError::Io { .. } => ErrorCode::IoError,
            CatalogError::Data(e) => e.code(),
        }
    }
}
