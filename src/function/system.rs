//! Driver information functions.

use super::{Arity, Function, FunctionContext, FunctionResult};
use crate::datum::{Type, Value};

pub const DRIVER_NAME: &str = "Paradox";
pub const DRIVER_MAJOR_VERSION: i64 = 1;
pub const DRIVER_MINOR_VERSION: i64 = 3;

/// `VERSION()`.
pub struct Version;

impl Function for Version {
    fn name(&self) -> &'static str {
        "VERSION"
    }

    fn arity(&self) -> Arity {
        Arity::exact(0)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Varchar
    }

    fn execute(&self, _: &FunctionContext, _: &[Value]) -> FunctionResult<Value> {
        Ok(Value::Text(format!(
            "{DRIVER_NAME} {DRIVER_MAJOR_VERSION}.{DRIVER_MINOR_VERSION}"
        )))
    }
}

/// `DRIVER_MAJOR_VERSION()`.
pub struct DriverMajorVersion;

impl Function for DriverMajorVersion {
    fn name(&self) -> &'static str {
        "DRIVER_MAJOR_VERSION"
    }

    fn arity(&self) -> Arity {
        Arity::exact(0)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Integer
    }

    fn execute(&self, _: &FunctionContext, _: &[Value]) -> FunctionResult<Value> {
        Ok(Value::Integer(DRIVER_MAJOR_VERSION))
    }
}

/// `DRIVER_MINOR_VERSION()`.
pub struct DriverMinorVersion;

impl Function for DriverMinorVersion {
    fn name(&self) -> &'static str {
        "DRIVER_MINOR_VERSION"
    }

    fn arity(&self) -> Arity {
        Arity::exact(0)
    }

    fn result_type(&self, _: &[Type]) -> Type {
        Type::Integer
    }

    fn execute(&self, _: &FunctionContext, _: &[Value]) -> FunctionResult<Value> {
        Ok(Value::Integer(DRIVER_MINOR_VERSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ctx = FunctionContext::default();
        assert_eq!(Version.execute(&ctx, &[]).unwrap(), Value::Text("Paradox 1.3".into()));
        assert_eq!(DriverMajorVersion.execute(&ctx, &[]).unwrap(), Value::Integer(1));
        assert_eq!(DriverMinorVersion.execute(&ctx, &[]).unwrap(), Value::Integer(3));
    }
}
