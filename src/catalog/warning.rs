//! Non-fatal problems collected while scanning schemas.

use std::error::Error as StdError;

use parking_lot::Mutex;

use crate::error::ErrorCode;

/// A recorded warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Schema or catalog the warning came from.
    pub catalog: String,
    pub code: ErrorCode,
    pub reason: String,
    /// Chain of underlying causes, one per line.
    pub stack_trace: String,
}

impl Warning {
    /// Builds a warning from an error and its source chain.
    pub fn from_error(catalog: &str, code: ErrorCode, error: &(dyn StdError + 'static)) -> Self {
        let mut trace = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            trace.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        Self {
            catalog: catalog.to_string(),
            code,
            reason: error.to_string(),
            stack_trace: trace.join("\n"),
        }
    }

    pub fn sql_state(&self) -> &'static str {
        self.code.sql_state()
    }

    pub fn vendor_code(&self) -> i32 {
        self.code.vendor_code()
    }
}

/// Thread-safe warning collector shared by a connection and its statements.
#[derive(Debug, Default)]
pub struct WarningSink {
    warnings: Mutex<Vec<Warning>>,
}

impl WarningSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, warning: Warning) {
        self.warnings.lock().push(warning);
    }

    /// Returns a copy of the recorded warnings.
    pub fn snapshot(&self) -> Vec<Warning> {
        self.warnings.lock().clone()
    }

    pub fn clear(&self) {
        self.warnings.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.warnings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
