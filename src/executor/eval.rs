//! Expression evaluator.
//!
//! Evaluates [`BoundExpr`] nodes against one joined raw row. Predicates use
//! three-valued logic: any comparison involving NULL yields NULL, which a
//! filter treats as not matching.

use std::cmp::Ordering;

use crate::catalog::like_match;
use crate::datum::{RoundingMode, Value, compare_values};
use crate::function::{FunctionContext, convert_charset, convert_type};
use crate::sql::CompareOp;

use super::error::{ExecutorError, ExecutorResult};
use super::expr::{BoundExpr, ConvertTo};

/// Everything an expression can read besides the row itself.
#[derive(Debug, Clone, Copy)]
pub struct EvalEnv<'a> {
    /// Bound `?` values.
    pub params: &'a [Value],
    pub functions: &'a FunctionContext,
    /// Escape character for LIKE patterns.
    pub escape: char,
    /// Finished aggregate values of the current group.
    pub aggregates: &'a [Value],
}

impl<'a> EvalEnv<'a> {
    /// Returns a copy reading aggregate results from `aggregates`.
    pub fn with_aggregates(self, aggregates: &'a [Value]) -> Self {
        Self { aggregates, ..self }
    }

    fn rounding(&self) -> RoundingMode {
        self.functions.rounding
    }
}

impl BoundExpr {
    /// Evaluates the expression against a raw row.
    pub fn evaluate(&self, row: &[Value], env: &EvalEnv<'_>) -> ExecutorResult<Value> {
        match self {
            BoundExpr::Literal(value) => Ok(value.clone()),

            BoundExpr::Column { index, .. } => Ok(row.get(*index).cloned().unwrap_or(Value::Null)),

            BoundExpr::Field { name, .. } => Err(ExecutorError::InvalidColumn {
                name: name.clone(),
                position: None,
            }),

            BoundExpr::Parameter { index, .. } => {
                env.params
                    .get(*index)
                    .cloned()
                    .ok_or(ExecutorError::ParameterNotSet {
                        index: index + 1,
                        position: None,
                    })
            }

            BoundExpr::Aggregate { index, .. } => {
                Ok(env.aggregates.get(*index).cloned().unwrap_or(Value::Null))
            }

            BoundExpr::Function { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(row, env))
                    .collect::<ExecutorResult<Vec<_>>>()?;
                function
                    .0
                    .execute(env.functions, &values)
                    .map_err(|e| ExecutorError::function(e, None))
            }

            BoundExpr::Convert { expr, to } => {
                let value = expr.evaluate(row, env)?;
                let converted = match to {
                    ConvertTo::Charset { source, target } => convert_charset(&value, *source, *target),
                    ConvertTo::Type(ty) => convert_type(&value, *ty, env.rounding()),
                };
                converted.map_err(|e| ExecutorError::function(e, None))
            }

            BoundExpr::Compare { left, op, right } => {
                let l = left.evaluate(row, env)?;
                let r = right.evaluate(row, env)?;
                Ok(eval_compare(&l, *op, &r))
            }

            BoundExpr::IsNull { expr, negated } => {
                let is_null = expr.evaluate(row, env)?.is_null();
                Ok(Value::Boolean(is_null != *negated))
            }

            BoundExpr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let v = expr.evaluate(row, env)?;
                let lo = low.evaluate(row, env)?;
                let hi = high.evaluate(row, env)?;
                let in_range = match (compare_values(&v, &lo), compare_values(&v, &hi)) {
                    (Some(a), Some(b)) => a != Ordering::Less && b != Ordering::Greater,
                    _ => return Ok(Value::Null),
                };
                Ok(Value::Boolean(in_range != *negated))
            }

            BoundExpr::Like {
                expr,
                pattern,
                negated,
                case_insensitive,
            } => {
                let v = expr.evaluate(row, env)?;
                let p = pattern.evaluate(row, env)?;
                let (Some(s), Some(p)) = (v.to_text(), p.to_text()) else {
                    return Ok(Value::Null);
                };
                let matched = like_match(&s, &p, Some(env.escape), *case_insensitive);
                Ok(Value::Boolean(matched != *negated))
            }

            BoundExpr::Not(inner) => Ok(match truth(&inner.evaluate(row, env)?) {
                Some(b) => Value::Boolean(!b),
                None => Value::Null,
            }),

            BoundExpr::And(children) => {
                let mut unknown = false;
                for child in children {
                    match truth(&child.evaluate(row, env)?) {
                        Some(false) => return Ok(Value::Boolean(false)),
                        Some(true) => {}
                        None => unknown = true,
                    }
                }
                Ok(if unknown { Value::Null } else { Value::Boolean(true) })
            }

            BoundExpr::Or(children) => {
                let mut unknown = false;
                for child in children {
                    match truth(&child.evaluate(row, env)?) {
                        Some(true) => return Ok(Value::Boolean(true)),
                        Some(false) => {}
                        None => unknown = true,
                    }
                }
                Ok(if unknown { Value::Null } else { Value::Boolean(false) })
            }
        }
    }

    /// Evaluates a condition; NULL and non-boolean results do not match.
    pub fn matches(&self, row: &[Value], env: &EvalEnv<'_>) -> ExecutorResult<bool> {
        Ok(truth(&self.evaluate(row, env)?) == Some(true))
    }
}

/// Boolean reading of a predicate result; `None` is unknown.
fn truth(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        other => other.as_bool(),
    }
}

fn eval_compare(left: &Value, op: CompareOp, right: &Value) -> Value {
    let Some(ord) = compare_values(left, right) else {
        return Value::Null;
    };
    let result = match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Neq => ord != Ordering::Equal,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::LtEq => ord != Ordering::Greater,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::GtEq => ord != Ordering::Less,
    };
    Value::Boolean(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Type;
    use crate::executor::expr::FunctionRef;
    use crate::function::find_function;

    fn col(index: usize) -> BoundExpr {
        BoundExpr::Column {
            index,
            name: format!("c{index}"),
            ty: Type::Integer,
        }
    }

    fn lit(value: Value) -> Box<BoundExpr> {
        Box::new(BoundExpr::Literal(value))
    }

    fn eval(expr: &BoundExpr, row: &[Value]) -> ExecutorResult<Value> {
        let functions = FunctionContext::default();
        let env = EvalEnv {
            params: &[Value::Integer(7)],
            functions: &functions,
            escape: '\\',
            aggregates: &[],
        };
        expr.evaluate(row, &env)
    }

    #[test]
    fn test_compare_with_null_is_unknown() {
        let expr = BoundExpr::Compare {
            left: Box::new(col(0)),
            op: CompareOp::Eq,
            right: lit(Value::Integer(1)),
        };
        assert_eq!(eval(&expr, &[Value::Null]).unwrap(), Value::Null);
        assert_eq!(eval(&expr, &[Value::Integer(1)]).unwrap(), Value::Boolean(true));
        assert_eq!(eval(&expr, &[Value::Text("1".into())]).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_and_or_three_valued() {
        let null = BoundExpr::Literal(Value::Null);
        let t = BoundExpr::Literal(Value::Boolean(true));
        let f = BoundExpr::Literal(Value::Boolean(false));
        let and = BoundExpr::And(vec![null.clone(), f.clone()]);
        assert_eq!(eval(&and, &[]).unwrap(), Value::Boolean(false));
        let and = BoundExpr::And(vec![null.clone(), t.clone()]);
        assert_eq!(eval(&and, &[]).unwrap(), Value::Null);
        let or = BoundExpr::Or(vec![null.clone(), t]);
        assert_eq!(eval(&or, &[]).unwrap(), Value::Boolean(true));
        let or = BoundExpr::Or(vec![null.clone(), f]);
        assert_eq!(eval(&or, &[]).unwrap(), Value::Null);
        let not = BoundExpr::Not(Box::new(null));
        assert_eq!(eval(&not, &[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_between_inclusive() {
        let expr = BoundExpr::Between {
            expr: Box::new(col(0)),
            low: lit(Value::Integer(1)),
            high: lit(Value::Integer(3)),
            negated: false,
        };
        assert_eq!(eval(&expr, &[Value::Integer(1)]).unwrap(), Value::Boolean(true));
        assert_eq!(eval(&expr, &[Value::Integer(3)]).unwrap(), Value::Boolean(true));
        assert_eq!(eval(&expr, &[Value::Integer(4)]).unwrap(), Value::Boolean(false));
        assert_eq!(eval(&expr, &[Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn test_like_and_ilike() {
        let like = |case_insensitive| BoundExpr::Like {
            expr: Box::new(col(0)),
            pattern: lit(Value::Text("ab%".into())),
            negated: false,
            case_insensitive,
        };
        let row = [Value::Text("ABC".into())];
        assert_eq!(eval(&like(false), &row).unwrap(), Value::Boolean(false));
        assert_eq!(eval(&like(true), &row).unwrap(), Value::Boolean(true));
        assert_eq!(eval(&like(true), &[Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn test_is_null() {
        let expr = BoundExpr::IsNull {
            expr: Box::new(col(0)),
            negated: true,
        };
        assert_eq!(eval(&expr, &[Value::Null]).unwrap(), Value::Boolean(false));
        assert_eq!(eval(&expr, &[Value::Integer(0)]).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_parameters_and_functions() {
        let expr = BoundExpr::Function {
            function: FunctionRef(find_function("concat").unwrap()),
            args: vec![
                BoundExpr::Parameter {
                    index: 0,
                    ty: Type::Integer,
                },
                col(0),
            ],
        };
        assert_eq!(
            eval(&expr, &[Value::Text("x".into())]).unwrap(),
            Value::Text("7x".into())
        );
        let missing = BoundExpr::Parameter {
            index: 3,
            ty: Type::Integer,
        };
        assert!(matches!(
            eval(&missing, &[]),
            Err(ExecutorError::ParameterNotSet { index: 4, .. })
        ));
    }

    #[test]
    fn test_matches_treats_null_as_false() {
        let functions = FunctionContext::default();
        let env = EvalEnv {
            params: &[],
            functions: &functions,
            escape: '\\',
            aggregates: &[],
        };
        assert!(!BoundExpr::Literal(Value::Null).matches(&[], &env).unwrap());
        assert!(BoundExpr::Literal(Value::Boolean(true)).matches(&[], &env).unwrap());
    }
}
