//! Execution context shared by planning and execution.
//!
//! The [`ExecutionContext`] carries the connection settings a statement runs
//! under: where tables live, how they are decoded, how functions round, and
//! the cancel flag polled between rows.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::catalog::{Catalog, DEFAULT_ESCAPE, WarningSink};
use crate::data::DecodeOptions;
use crate::function::FunctionContext;

use super::error::{ExecutorError, ExecutorResult};

/// Data-parallel row processing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelOptions {
    /// Whether filtering and projection may run on the rayon pool.
    pub enabled: bool,
    /// Minimum row count before work is split across threads.
    pub threshold: usize,
}

impl Default for ParallelOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 4096,
        }
    }
}

impl ParallelOptions {
    /// Returns true if `rows` rows should be processed in parallel.
    pub fn applies_to(&self, rows: usize) -> bool {
        self.enabled && rows >= self.threshold
    }
}

/// Settings and handles one statement execution runs with.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub catalog: &'a Catalog,
    /// Schema unqualified table names resolve in.
    pub schema: &'a str,
    pub decode: DecodeOptions,
    pub functions: FunctionContext,
    /// Escape character of LIKE patterns.
    pub escape: char,
    pub warnings: &'a WarningSink,
    /// Maximum number of result rows; 0 is unlimited.
    pub max_rows: usize,
    pub parallel: ParallelOptions,
    pub cancel: &'a AtomicBool,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with default decoding and function settings.
    pub fn new(
        catalog: &'a Catalog,
        schema: &'a str,
        warnings: &'a WarningSink,
        cancel: &'a AtomicBool,
    ) -> Self {
        Self {
            catalog,
            schema,
            decode: DecodeOptions::default(),
            functions: FunctionContext::default(),
            escape: DEFAULT_ESCAPE,
            warnings,
            max_rows: 0,
            parallel: ParallelOptions::default(),
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Fails with [`ExecutorError::Cancelled`] once the cancel flag is set.
    pub fn check_cancelled(&self) -> ExecutorResult<()> {
        if self.is_cancelled() {
            Err(ExecutorError::Cancelled)
        } else {
            Ok(())
        }
    }
}
