//! Date functions.

use chrono::Local;

use super::{Arity, Function, FunctionContext, FunctionError, FunctionResult};
use crate::datum::{Type, Value, parse_temporal};

/// `CURRENT_DATE()`: today in local time.
pub struct CurrentDate;

impl Function for CurrentDate {
    fn name(&self) -> &'static str {
        "CURRENT_DATE"
    }

    fn arity(&self) -> Arity {
        Arity::exact(0)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Date
    }

    fn execute(&self, _: &FunctionContext, _: &[Value]) -> FunctionResult<Value> {
        Ok(Value::Date(Local::now().date_naive()))
    }
}

/// `DATE(value)`: the date part of a timestamp, or a date parsed from text.
pub struct Date;

impl Function for Date {
    fn name(&self) -> &'static str {
        "DATE"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Date
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        match &args[0] {
            Value::Null => Ok(Value::Null),
            Value::Date(d) => Ok(Value::Date(*d)),
            Value::Timestamp(ts) => Ok(Value::Date(ts.date())),
            Value::Text(s) => match parse_temporal(s, Type::Timestamp) {
                Some(Value::Timestamp(ts)) => Ok(Value::Date(ts.date())),
                _ => Err(FunctionError::invalid_parameter(self.name(), &args[0])),
            },
            other => Err(FunctionError::incompatible(self.name(), other)),
        }
    }
}
