//! Grouping (aggregate) functions and their accumulators.
//!
//! An accumulator folds one group's argument values and produces the
//! aggregate result. Starting a group is `accumulator()` followed by the
//! first `feed`; folding another row is another `feed`. Two partial states
//! of the same function merge with `combine`. NULL arguments are skipped by
//! every accumulator, so `COUNT(column)` counts non-NULL values.

use std::any::Any;
use std::cmp::Ordering;

use super::{Arity, Function, FunctionContext, FunctionError, FunctionResult};
use crate::datum::{Decimal, Type, Value, compare_values};

/// Stateful per-group aggregate computation.
pub trait Accumulator: Send + Any {
    /// Folds one argument value into the state.
    fn feed(&mut self, value: &Value) -> FunctionResult<()>;

    /// Merges the partial state `other`, built by the same function over
    /// other rows, into this one.
    fn combine(&mut self, other: &dyn Accumulator) -> FunctionResult<()>;

    /// Produces the aggregate result.
    fn finish(&self) -> Value;

    fn as_any(&self) -> &dyn Any;
}

/// Downcasts the other side of a `combine`.
fn partial<'a, T: Accumulator>(function: &'static str, other: &'a dyn Accumulator) -> FunctionResult<&'a T> {
    other
        .as_any()
        .downcast_ref::<T>()
        .ok_or(FunctionError::MismatchedState { function })
}

/// Runs an accumulator over a single value; used when a grouping function is
/// evaluated as a plain scalar.
fn fold_one(function: &dyn Function, value: &Value) -> FunctionResult<Value> {
    let Some(mut acc) = function.accumulator() else {
        return Ok(Value::Null);
    };
    acc.feed(value)?;
    Ok(acc.finish())
}

/// `COUNT(value)` / `COUNT(*)`.
pub struct Count;

impl Function for Count {
    fn name(&self) -> &'static str {
        "COUNT"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Integer
    }

    fn is_grouping(&self) -> bool {
        true
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        fold_one(self, &args[0])
    }

    fn accumulator(&self) -> Option<Box<dyn Accumulator>> {
        Some(Box::new(CountAccumulator { count: 0 }))
    }
}

struct CountAccumulator {
    count: i64,
}

impl Accumulator for CountAccumulator {
    fn feed(&mut self, value: &Value) -> FunctionResult<()> {
        if !value.is_null() {
            self.count += 1;
        }
        Ok(())
    }

    fn combine(&mut self, other: &dyn Accumulator) -> FunctionResult<()> {
        self.count += partial::<Self>("COUNT", other)?.count;
        Ok(())
    }

    fn finish(&self) -> Value {
        Value::Integer(self.count)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `SUM(value)`.
pub struct Sum;

impl Function for Sum {
    fn name(&self) -> &'static str {
        "SUM"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, args: &[Type]) -> Type {
        match args.first() {
            Some(Type::Smallint | Type::Integer | Type::Bigint) => Type::Integer,
            Some(Type::Double) => Type::Double,
            _ => Type::Numeric,
        }
    }

    fn is_grouping(&self) -> bool {
        true
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        fold_one(self, &args[0])
    }

    fn accumulator(&self) -> Option<Box<dyn Accumulator>> {
        Some(Box::new(SumAccumulator { sum: Value::Null }))
    }
}

/// Adds two decimals exactly, or `None` on overflow.
fn add_decimal(a: Decimal, b: Decimal) -> Option<Decimal> {
    let scale = a.scale().max(b.scale());
    let a = a.mantissa().checked_mul(10i128.pow(scale - a.scale()))?;
    let b = b.mantissa().checked_mul(10i128.pow(scale - b.scale()))?;
    Some(Decimal::new(a.checked_add(b)?, scale))
}

/// Normalizes a summand to Integer, Decimal or Number.
fn numeric_operand(function: &'static str, value: &Value) -> FunctionResult<Value> {
    match value {
        Value::Integer(_) | Value::Decimal(_) | Value::Number(_) => Ok(value.clone()),
        Value::Text(_) => value
            .as_decimal()
            .map(Value::Decimal)
            .ok_or_else(|| FunctionError::invalid_parameter(function, value)),
        other => Err(FunctionError::incompatible(function, other)),
    }
}

struct SumAccumulator {
    sum: Value,
}

impl Accumulator for SumAccumulator {
    fn feed(&mut self, value: &Value) -> FunctionResult<()> {
        if value.is_null() {
            return Ok(());
        }
        let value = numeric_operand("SUM", value)?;
        let sum = std::mem::replace(&mut self.sum, Value::Null);
        self.sum = match (sum, value) {
            (Value::Null, value) => value,
            (Value::Integer(a), Value::Integer(b)) => match a.checked_add(b) {
                Some(n) => Value::Integer(n),
                None => add_exact(Decimal::new(i128::from(a), 0), Decimal::new(i128::from(b), 0)),
            },
            (a @ Value::Number(_), b) | (a, b @ Value::Number(_)) => {
                Value::Number(a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0))
            }
            (a, b) => match (a.as_decimal(), b.as_decimal()) {
                (Some(a), Some(b)) => add_exact(a, b),
                _ => return Err(FunctionError::incompatible("SUM", &b)),
            },
        };
        Ok(())
    }

    fn combine(&mut self, other: &dyn Accumulator) -> FunctionResult<()> {
        let other = partial::<Self>("SUM", other)?.sum.clone();
        self.feed(&other)
    }

    fn finish(&self) -> Value {
        self.sum.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Exact decimal sum, falling back to a double once the mantissa overflows.
fn add_exact(a: Decimal, b: Decimal) -> Value {
    match add_decimal(a, b) {
        Some(sum) => Value::Decimal(sum),
        None => Value::Number(a.to_f64() + b.to_f64()),
    }
}

/// `AVG(value)`; always a double.
pub struct Avg;

impl Function for Avg {
    fn name(&self) -> &'static str {
        "AVG"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Double
    }

    fn is_grouping(&self) -> bool {
        true
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        fold_one(self, &args[0])
    }

    fn accumulator(&self) -> Option<Box<dyn Accumulator>> {
        Some(Box::new(AvgAccumulator { sum: 0.0, count: 0 }))
    }
}

struct AvgAccumulator {
    sum: f64,
    count: i64,
}

impl Accumulator for AvgAccumulator {
    fn feed(&mut self, value: &Value) -> FunctionResult<()> {
        if value.is_null() {
            return Ok(());
        }
        let n = numeric_operand("AVG", value)?;
        self.sum += n.as_f64().unwrap_or(0.0);
        self.count += 1;
        Ok(())
    }

    fn combine(&mut self, other: &dyn Accumulator) -> FunctionResult<()> {
        let other = partial::<Self>("AVG", other)?;
        self.sum += other.sum;
        self.count += other.count;
        Ok(())
    }

    fn finish(&self) -> Value {
        if self.count == 0 {
            Value::Null
        } else {
            Value::Number(self.sum / self.count as f64)
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `MIN(value)`.
pub struct Min;

impl Function for Min {
    fn name(&self) -> &'static str {
        "MIN"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, args: &[Type]) -> Type {
        args.first().copied().unwrap_or(Type::Null)
    }

    fn is_grouping(&self) -> bool {
        true
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        fold_one(self, &args[0])
    }

    fn accumulator(&self) -> Option<Box<dyn Accumulator>> {
        Some(Box::new(ExtremumAccumulator {
            function: "MIN",
            keep: Ordering::Less,
            current: Value::Null,
        }))
    }
}

/// `MAX(value)`.
pub struct Max;

impl Function for Max {
    fn name(&self) -> &'static str {
        "MAX"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, args: &[Type]) -> Type {
        args.first().copied().unwrap_or(Type::Null)
    }

    fn is_grouping(&self) -> bool {
        true
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        fold_one(self, &args[0])
    }

    fn accumulator(&self) -> Option<Box<dyn Accumulator>> {
        Some(Box::new(ExtremumAccumulator {
            function: "MAX",
            keep: Ordering::Greater,
            current: Value::Null,
        }))
    }
}

/// Keeps the value that compares `keep` against everything seen so far.
struct ExtremumAccumulator {
    function: &'static str,
    keep: Ordering,
    current: Value,
}

impl Accumulator for ExtremumAccumulator {
    fn feed(&mut self, value: &Value) -> FunctionResult<()> {
        if value.is_null() {
            return Ok(());
        }
        if self.current.is_null() {
            self.current = value.clone();
            return Ok(());
        }
        match compare_values(value, &self.current) {
            Some(ord) if ord == self.keep => self.current = value.clone(),
            Some(_) => {}
            None => return Err(FunctionError::incompatible(self.function, value)),
        }
        Ok(())
    }

    fn combine(&mut self, other: &dyn Accumulator) -> FunctionResult<()> {
        let other = partial::<Self>(self.function, other)?;
        if other.keep != self.keep {
            return Err(FunctionError::MismatchedState { function: self.function });
        }
        let other = other.current.clone();
        self.feed(&other)
    }

    fn finish(&self) -> Value {
        self.current.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(function: &dyn Function, values: &[Value]) -> FunctionResult<Value> {
        let mut acc = function.accumulator().unwrap();
        for value in values {
            acc.feed(value)?;
        }
        Ok(acc.finish())
    }

    #[test]
    fn test_count_skips_null() {
        let values = [Value::Integer(1), Value::Null, Value::Text("a".into())];
        assert_eq!(fold(&Count, &values).unwrap(), Value::Integer(2));
        assert_eq!(fold(&Count, &[]).unwrap(), Value::Integer(0));
    }

    #[test]
    fn test_sum_integers() {
        let values = [Value::Integer(1), Value::Null, Value::Integer(2)];
        assert_eq!(fold(&Sum, &values).unwrap(), Value::Integer(3));
        assert_eq!(fold(&Sum, &[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_sum_promotes_on_overflow() {
        let values = [Value::Integer(i64::MAX), Value::Integer(1)];
        let expected = Decimal::new(i128::from(i64::MAX) + 1, 0);
        assert_eq!(fold(&Sum, &values).unwrap(), Value::Decimal(expected));
    }

    #[test]
    fn test_sum_mixed() {
        let values = [Value::Integer(1), Value::Decimal(Decimal::new(25, 1))];
        assert_eq!(fold(&Sum, &values).unwrap(), Value::Decimal(Decimal::new(35, 1)));
        let values = [Value::Integer(1), Value::Number(0.5)];
        assert_eq!(fold(&Sum, &values).unwrap(), Value::Number(1.5));
    }

    #[test]
    fn test_sum_rejects_non_numeric() {
        let err = fold(&Sum, &[Value::Boolean(true)]).unwrap_err();
        assert!(matches!(err, FunctionError::IncompatibleTypes { function: "SUM", .. }));
    }

    #[test]
    fn test_avg() {
        let values = [Value::Integer(1), Value::Integer(2), Value::Null];
        assert_eq!(fold(&Avg, &values).unwrap(), Value::Number(1.5));
        assert_eq!(fold(&Avg, &[Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn test_min_max() {
        let values = [Value::Integer(3), Value::Null, Value::Integer(-1), Value::Number(2.5)];
        assert_eq!(fold(&Min, &values).unwrap(), Value::Integer(-1));
        assert_eq!(fold(&Max, &values).unwrap(), Value::Integer(3));
        let text = [Value::Text("b".into()), Value::Text("a".into())];
        assert_eq!(fold(&Min, &text).unwrap(), Value::Text("a".into()));
    }

    /// Folds `left` and `right` separately, then merges the two states.
    fn fold_split(function: &dyn Function, left: &[Value], right: &[Value]) -> FunctionResult<Value> {
        let mut acc = function.accumulator().unwrap();
        for value in left {
            acc.feed(value)?;
        }
        let mut other = function.accumulator().unwrap();
        for value in right {
            other.feed(value)?;
        }
        acc.combine(&*other)?;
        Ok(acc.finish())
    }

    #[test]
    fn test_combine_matches_single_fold() {
        let values = [
            Value::Integer(4),
            Value::Null,
            Value::Integer(-2),
            Value::Number(7.5),
            Value::Integer(1),
        ];
        let functions: [&dyn Function; 5] = [&Count, &Sum, &Avg, &Min, &Max];
        for function in functions {
            let whole = fold(function, &values).unwrap();
            for split in 0..=values.len() {
                let (left, right) = values.split_at(split);
                assert_eq!(
                    fold_split(function, left, right).unwrap(),
                    whole,
                    "{} split at {split}",
                    function.name()
                );
            }
        }
    }

    #[test]
    fn test_combine_partial_states() {
        let ints = [Value::Integer(1), Value::Integer(2)];
        let more = [Value::Integer(3), Value::Null];
        assert_eq!(fold_split(&Count, &ints, &more).unwrap(), Value::Integer(3));
        assert_eq!(fold_split(&Sum, &ints, &more).unwrap(), Value::Integer(6));
        assert_eq!(fold_split(&Sum, &[], &[]).unwrap(), Value::Null);
        assert_eq!(fold_split(&Avg, &ints, &more).unwrap(), Value::Number(2.0));
        assert_eq!(fold_split(&Avg, &[Value::Null], &[]).unwrap(), Value::Null);
        assert_eq!(fold_split(&Min, &more, &ints).unwrap(), Value::Integer(1));
        assert_eq!(fold_split(&Max, &[], &more).unwrap(), Value::Integer(3));
    }

    #[test]
    fn test_combine_rejects_other_function() {
        let mut count = Count.accumulator().unwrap();
        let sum = Sum.accumulator().unwrap();
        let err = count.combine(&*sum).unwrap_err();
        assert!(matches!(err, FunctionError::MismatchedState { function: "COUNT" }));

        let mut min = Min.accumulator().unwrap();
        let max = Max.accumulator().unwrap();
        assert!(min.combine(&*max).is_err());
    }

    #[test]
    fn test_scalar_execute_folds_one_value() {
        let ctx = FunctionContext::default();
        assert_eq!(Count.execute(&ctx, &[Value::Null]).unwrap(), Value::Integer(0));
        assert_eq!(Max.execute(&ctx, &[Value::Integer(7)]).unwrap(), Value::Integer(7));
    }
}
