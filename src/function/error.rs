//! Function validation and evaluation errors.

use thiserror::Error;

use crate::datum::Type;
use crate::error::ErrorCode;

/// Result type for function operations.
pub type FunctionResult<T> = Result<T, FunctionError>;

/// Errors raised while validating or evaluating a function call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    /// No function with this name.
    #[error("function {name} not found")]
    NotFound { name: String },

    /// Wrong number of arguments.
    #[error("invalid parameter count for {function}: expected {expected}, found {found}")]
    InvalidParameterCount {
        function: &'static str,
        expected: String,
        found: usize,
    },

    /// Argument value out of the accepted domain.
    #[error("invalid parameter value '{value}' for {function}")]
    InvalidParameter { function: &'static str, value: String },

    /// Argument of a type the function cannot handle.
    #[error("{function} does not accept values of type {found}")]
    IncompatibleTypes { function: &'static str, found: Type },

    /// Partial aggregate states of different functions were combined.
    #[error("cannot combine {function} with the state of another aggregate")]
    MismatchedState { function: &'static str },
}

impl FunctionError {
    /// Machine-readable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            FunctionError::NotFound { .. } => ErrorCode::FunctionNotFound,
            FunctionError::InvalidParameterCount { .. } => ErrorCode::InvalidParameterCount,
            FunctionError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            FunctionError::IncompatibleTypes { .. } | FunctionError::MismatchedState { .. } => {
                ErrorCode::IncompatibleTypes
            }
        }
    }

    pub(crate) fn invalid_parameter(function: &'static str, value: &crate::datum::Value) -> Self {
        FunctionError::InvalidParameter {
            function,
            value: value.to_string(),
        }
    }

    pub(crate) fn incompatible(function: &'static str, value: &crate::datum::Value) -> Self {
        FunctionError::IncompatibleTypes {
            function,
            found: value.data_type(),
        }
    }
}
