//! String functions.

use super::{Arity, Function, FunctionContext, FunctionError, FunctionResult};
use crate::datum::{Type, Value};

/// Largest text in bytes that `REPEAT` and `SPACE` may build.
pub const MAX_REPEAT_BYTES: usize = 16 * 1024 * 1024;

/// Reads a non-negative count argument.
fn count_arg(function: &'static str, value: &Value) -> FunctionResult<usize> {
    value
        .as_i64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| FunctionError::invalid_parameter(function, value))
}

/// Repeats `text` `count` times, rejecting results over [`MAX_REPEAT_BYTES`].
fn repeat_text(function: &'static str, text: &str, count: &Value) -> FunctionResult<Value> {
    let times = count_arg(function, count)?;
    match text.len().checked_mul(times) {
        Some(len) if len <= MAX_REPEAT_BYTES => Ok(Value::Text(text.repeat(times))),
        _ => Err(FunctionError::invalid_parameter(function, count)),
    }
}

/// `CONCAT(value, ...)`; NULL arguments are skipped.
pub struct Concat;

impl Function for Concat {
    fn name(&self) -> &'static str {
        "CONCAT"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(0)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Varchar
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        Ok(Value::Text(args.iter().filter_map(Value::to_text).collect()))
    }
}

/// `CONCAT_WS(separator, value, ...)`; NULL values are skipped.
pub struct ConcatWs;

impl Function for ConcatWs {
    fn name(&self) -> &'static str {
        "CONCAT_WS"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Varchar
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        let separator = args[0]
            .to_text()
            .ok_or_else(|| FunctionError::invalid_parameter(self.name(), &args[0]))?;
        let parts: Vec<String> = args[1..].iter().filter_map(Value::to_text).collect();
        Ok(Value::Text(parts.join(&separator)))
    }
}

/// `REPEAT(text, count)`.
pub struct Repeat;

impl Function for Repeat {
    fn name(&self) -> &'static str {
        "REPEAT"
    }

    fn arity(&self) -> Arity {
        Arity::exact(2)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Varchar
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        let Some(text) = args[0].to_text() else {
            return Ok(Value::Null);
        };
        repeat_text(self.name(), &text, &args[1])
    }
}

/// `REPLACE(text, from, to)`.
pub struct Replace;

impl Function for Replace {
    fn name(&self) -> &'static str {
        "REPLACE"
    }

    fn arity(&self) -> Arity {
        Arity::exact(3)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Varchar
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        match (args[0].to_text(), args[1].to_text(), args[2].to_text()) {
            (Some(text), Some(from), Some(to)) => Ok(Value::Text(text.replace(&from, &to))),
            _ => Ok(Value::Null),
        }
    }
}

/// `SPACE(count)`.
pub struct Space;

impl Function for Space {
    fn name(&self) -> &'static str {
        "SPACE"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Varchar
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        if args[0].is_null() {
            return Ok(Value::Null);
        }
        repeat_text(self.name(), " ", &args[0])
    }
}

/// `SUBSTRING(text, start[, length])` with a 1-based start.
pub struct Substring;

impl Function for Substring {
    fn name(&self) -> &'static str {
        "SUBSTRING"
    }

    fn arity(&self) -> Arity {
        Arity::range(2, 3)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Varchar
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        let Some(text) = args[0].to_text() else {
            return Ok(Value::Null);
        };
        let start = count_arg(self.name(), &args[1])?;
        if start == 0 {
            return Err(FunctionError::invalid_parameter(self.name(), &args[1]));
        }
        let length = match args.get(2) {
            Some(value) => count_arg(self.name(), value)?,
            None => usize::MAX,
        };
        Ok(Value::Text(text.chars().skip(start - 1).take(length).collect()))
    }
}

/// `UPPER(text)`.
pub struct Upper;

impl Function for Upper {
    fn name(&self) -> &'static str {
        "UPPER"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Varchar
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        Ok(args[0].to_text().map_or(Value::Null, |s| Value::Text(s.to_uppercase())))
    }
}

/// `LOWER(text)`.
pub struct Lower;

impl Function for Lower {
    fn name(&self) -> &'static str {
        "LOWER"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Varchar
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        Ok(args[0].to_text().map_or(Value::Null, |s| Value::Text(s.to_lowercase())))
    }
}

/// `LENGTH(text)` in characters.
pub struct Length;

impl Function for Length {
    fn name(&self) -> &'static str {
        "LENGTH"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Integer
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        Ok(match &args[0] {
            Value::Null => Value::Null,
            Value::Bytes(bytes) => Value::Integer(bytes.len() as i64),
            other => Value::Integer(other.to_text().map_or(0, |s| s.chars().count()) as i64),
        })
    }
}
