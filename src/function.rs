//! Function registry.
//!
//! Scalar and grouping functions live in a process-wide immutable table and
//! are looked up by name, ignoring case. Each function declares its arity and
//! result type; grouping functions also hand out per-group accumulators.

mod date;
mod error;
mod general;
mod grouping;
mod numeric;
mod string;
mod system;

use std::fmt;

use encoding_rs::Encoding;

pub use error::{FunctionError, FunctionResult};
pub use general::{convert_charset, convert_type};
pub use grouping::Accumulator;

use crate::datum::{RoundingMode, Type, Value};

/// Accepted argument counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` for variadic functions.
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exact(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self { min, max: Some(max) }
    }

    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Checks an argument count against this arity.
    pub fn check(&self, function: &'static str, found: usize) -> FunctionResult<()> {
        let ok = found >= self.min && self.max.is_none_or(|max| found <= max);
        if ok {
            Ok(())
        } else {
            Err(FunctionError::InvalidParameterCount {
                function,
                expected: self.to_string(),
                found,
            })
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{} to {max}", self.min),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// Connection settings visible to functions.
#[derive(Debug, Clone, Copy)]
pub struct FunctionContext {
    pub rounding: RoundingMode,
    /// Charset text values are assumed to be stored in.
    pub charset: &'static Encoding,
}

impl Default for FunctionContext {
    fn default() -> Self {
        Self {
            rounding: RoundingMode::HalfUp,
            charset: encoding_rs::WINDOWS_1252,
        }
    }
}

/// A callable SQL function.
pub trait Function: Sync {
    /// Upper-case function name.
    fn name(&self) -> &'static str;

    fn arity(&self) -> Arity;

    /// Result type for the given argument types.
    fn result_type(&self, args: &[Type]) -> Type;

    /// Returns true for aggregate functions.
    fn is_grouping(&self) -> bool {
        false
    }

    /// Evaluates the function on one row of argument values.
    fn execute(&self, ctx: &FunctionContext, args: &[Value]) -> FunctionResult<Value>;

    /// Creates an accumulator for one group. Only grouping functions return one.
    fn accumulator(&self) -> Option<Box<dyn Accumulator>> {
        None
    }
}

impl fmt::Debug for dyn Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

static FUNCTIONS: &[&dyn Function] = &[
    &numeric::Round,
    &numeric::Pi,
    &numeric::Asin,
    &numeric::Abs,
    &string::Concat,
    &string::ConcatWs,
    &string::Repeat,
    &string::Replace,
    &string::Space,
    &string::Substring,
    &string::Upper,
    &string::Lower,
    &string::Length,
    &date::CurrentDate,
    &date::Date,
    &system::Version,
    &system::DriverMajorVersion,
    &system::DriverMinorVersion,
    &grouping::Count,
    &grouping::Sum,
    &grouping::Avg,
    &grouping::Min,
    &grouping::Max,
];

/// Looks up a function by name, ignoring case.
pub fn find_function(name: &str) -> FunctionResult<&'static dyn Function> {
    FUNCTIONS
        .iter()
        .copied()
        .find(|f| f.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| FunctionError::NotFound {
            name: name.to_ascii_uppercase(),
        })
}

/// Every registered function.
pub fn functions() -> &'static [&'static dyn Function] {
    FUNCTIONS
}
