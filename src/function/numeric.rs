//! Numeric functions.

use super::{Arity, Function, FunctionContext, FunctionError, FunctionResult};
use crate::datum::{Decimal, RoundingMode, Type, Value};

fn number_arg(function: &'static str, value: &Value) -> FunctionResult<Option<f64>> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| FunctionError::incompatible(function, value))
}

/// `ROUND(number, decimals[, truncate])`.
///
/// Rounds half up, or toward negative infinity when `truncate` is true.
pub struct Round;

impl Function for Round {
    fn name(&self) -> &'static str {
        "ROUND"
    }

    fn arity(&self) -> Arity {
        Arity::range(2, 3)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Numeric
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        let (value, decimals) = (&args[0], &args[1]);
        if value.is_null() || decimals.is_null() {
            return Ok(Value::Null);
        }
        let number = value
            .as_decimal()
            .ok_or_else(|| FunctionError::incompatible(self.name(), value))?;
        let decimals = decimals
            .as_i64()
            .ok_or_else(|| FunctionError::invalid_parameter(self.name(), decimals))?;
        let mode = match args.get(2).and_then(Value::as_bool) {
            Some(true) => RoundingMode::Floor,
            _ => RoundingMode::HalfUp,
        };
        Ok(Value::Decimal(round_decimal(number, decimals, mode)))
    }
}

/// Rounds to `decimals` places; negative counts round left of the point.
fn round_decimal(number: Decimal, decimals: i64, mode: RoundingMode) -> Decimal {
    if decimals >= 0 {
        return number.with_scale(decimals.min(32) as u32, mode);
    }
    let shift = decimals.unsigned_abs().min(30) as u32;
    let scaled = Decimal::new(number.mantissa(), number.scale() + shift).with_scale(0, mode);
    Decimal::new(scaled.mantissa().saturating_mul(10i128.pow(shift)), 0)
}

/// `PI()`.
pub struct Pi;

impl Function for Pi {
    fn name(&self) -> &'static str {
        "PI"
    }

    fn arity(&self) -> Arity {
        Arity::exact(0)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Double
    }

    fn execute(&self, _: &FunctionContext, _: &[Value]) -> FunctionResult<Value> {
        Ok(Value::Number(std::f64::consts::PI))
    }
}

/// `ASIN(number)`, the arc sine in radians.
pub struct Asin;

impl Function for Asin {
    fn name(&self) -> &'static str {
        "ASIN"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Double
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        Ok(number_arg(self.name(), &args[0])?.map_or(Value::Null, |n| Value::Number(n.asin())))
    }
}

/// `ABS(number)`.
pub struct Abs;

impl Function for Abs {
    fn name(&self) -> &'static str {
        "ABS"
    }

    fn arity(&self) -> Arity {
        Arity::exact(1)
    }

    fn result_type(&self, args: &[Type]) -> Type {
        match args.first() {
            Some(ty) if ty.is_numeric() => *ty,
            _ => Type::Double,
        }
    }

    fn execute(&self, _: &FunctionContext, args: &[Value]) -> FunctionResult<Value> {
        Ok(match &args[0] {
            Value::Null => Value::Null,
            Value::Integer(n) => n
                .checked_abs()
                .map_or(Value::Number((*n as f64).abs()), Value::Integer),
            Value::Decimal(d) => Value::Decimal(Decimal::new(d.mantissa().abs(), d.scale())),
            other => Value::Number(
                number_arg(self.name(), other)?
                    .map(f64::abs)
                    .unwrap_or_default(),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(args: &[Value]) -> Value {
        Round.execute(&FunctionContext::default(), args).unwrap()
    }

    #[test]
    fn test_round_half_up_by_default() {
        let value = round(&[Value::Decimal(Decimal::parse("1.2355").unwrap()), Value::Integer(2)]);
        assert_eq!(value.to_string(), "1.24");
        let value = round(&[Value::Decimal(Decimal::parse("1.2345").unwrap()), Value::Integer(2)]);
        assert_eq!(value.to_string(), "1.23");
    }

    #[test]
    fn test_round_truncate_flag_floors() {
        let args = [
            Value::Decimal(Decimal::parse("1.2355").unwrap()),
            Value::Integer(2),
            Value::Boolean(true),
        ];
        assert_eq!(round(&args).to_string(), "1.23");
        let args = [
            Value::Decimal(Decimal::parse("-1.231").unwrap()),
            Value::Integer(2),
            Value::Boolean(true),
        ];
        assert_eq!(round(&args).to_string(), "-1.24");
    }

    #[test]
    fn test_round_null_and_negative_places() {
        assert_eq!(round(&[Value::Null, Value::Integer(2)]), Value::Null);
        assert_eq!(round(&[Value::Integer(1), Value::Null]), Value::Null);
        assert_eq!(round(&[Value::Integer(1250), Value::Integer(-2)]).to_string(), "1300");
        assert_eq!(round(&[Value::Number(2.5), Value::Integer(0)]).to_string(), "3");
    }

    #[test]
    fn test_round_rejects_text() {
        let err = Round
            .execute(&FunctionContext::default(), &[Value::Text("abc".into()), Value::Integer(1)])
            .unwrap_err();
        assert!(matches!(err, FunctionError::IncompatibleTypes { .. }));
    }

    #[test]
    fn test_asin_and_abs() {
        let ctx = FunctionContext::default();
        assert_eq!(Asin.execute(&ctx, &[Value::Integer(0)]).unwrap(), Value::Number(0.0));
        assert_eq!(Asin.execute(&ctx, &[Value::Null]).unwrap(), Value::Null);
        assert_eq!(Abs.execute(&ctx, &[Value::Integer(-4)]).unwrap(), Value::Integer(4));
        assert_eq!(Abs.execute(&ctx, &[Value::Number(-1.5)]).unwrap(), Value::Number(1.5));
        assert_eq!(
            Pi.execute(&ctx, &[]).unwrap(),
            Value::Number(std::f64::consts::PI)
        );
    }
}
