//! Type and charset conversion behind `CONVERT`.

use encoding_rs::Encoding;

use super::{FunctionError, FunctionResult};
use crate::datum::{Decimal, RoundingMode, Type, Value, parse_temporal};

const CONVERT: &str = "CONVERT";

/// `CONVERT(value, TYPE)`: converts a value to `ty`.
pub fn convert_type(value: &Value, ty: Type, rounding: RoundingMode) -> FunctionResult<Value> {
    if value.is_null() || ty == Type::Null {
        return Ok(Value::Null);
    }
    let invalid = || FunctionError::invalid_parameter(CONVERT, value);
    let converted = match ty {
        Type::Null => Value::Null,
        Type::Boolean => Value::Boolean(value.as_bool().ok_or_else(invalid)?),
        Type::Smallint | Type::Integer | Type::Bigint => {
            let decimal = match value {
                Value::Boolean(b) => Decimal::new(i128::from(*b), 0),
                other => other.as_decimal().ok_or_else(invalid)?,
            };
            let n = decimal.to_i64(rounding).ok_or_else(invalid)?;
            let fits = match ty {
                Type::Smallint => i16::try_from(n).is_ok(),
                Type::Integer => i32::try_from(n).is_ok(),
                _ => true,
            };
            if !fits {
                return Err(invalid());
            }
            Value::Integer(n)
        }
        Type::Double => Value::Number(value.as_f64().ok_or_else(invalid)?),
        Type::Numeric => Value::Decimal(value.as_decimal().ok_or_else(invalid)?),
        Type::Varchar | Type::Clob => match value {
            Value::Bytes(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
            other => Value::Text(other.to_text().ok_or_else(invalid)?),
        },
        Type::Blob | Type::Binary => match value {
            Value::Bytes(bytes) => Value::Bytes(bytes.clone()),
            other => Value::Bytes(other.to_text().ok_or_else(invalid)?.into_bytes()),
        },
        Type::Date => match value {
            Value::Date(d) => Value::Date(*d),
            Value::Timestamp(ts) => Value::Date(ts.date()),
            Value::Text(s) => parse_temporal(s, Type::Date)
                .or_else(|| parse_temporal(s, Type::Timestamp).and_then(|ts| date_part(&ts)))
                .ok_or_else(invalid)?,
            _ => return Err(FunctionError::incompatible(CONVERT, value)),
        },
        Type::Time => match value {
            Value::Time(t) => Value::Time(*t),
            Value::Timestamp(ts) => Value::Time(ts.time()),
            Value::Text(s) => parse_temporal(s, Type::Time).ok_or_else(invalid)?,
            _ => return Err(FunctionError::incompatible(CONVERT, value)),
        },
        Type::Timestamp => match value {
            Value::Timestamp(ts) => Value::Timestamp(*ts),
            Value::Date(d) => Value::Timestamp(d.and_time(chrono::NaiveTime::MIN)),
            Value::Text(s) => parse_temporal(s, Type::Timestamp).ok_or_else(invalid)?,
            _ => return Err(FunctionError::incompatible(CONVERT, value)),
        },
    };
    Ok(converted)
}

fn date_part(value: &Value) -> Option<Value> {
    match value {
        Value::Timestamp(ts) => Some(Value::Date(ts.date())),
        _ => None,
    }
}

/// `CONVERT(value USING charset)`.
///
/// Text is re-encoded with `source` (the charset it was decoded with) and
/// decoded again with `target`. Binary values are decoded with `target`
/// directly, dropping NUL bytes.
pub fn convert_charset(
    value: &Value,
    source: &'static Encoding,
    target: &'static Encoding,
) -> FunctionResult<Value> {
    let bytes: Vec<u8> = match value {
        Value::Null => return Ok(Value::Null),
        Value::Bytes(bytes) => bytes.iter().copied().filter(|&b| b != 0).collect(),
        other => {
            let text = other
                .to_text()
                .ok_or_else(|| FunctionError::invalid_parameter(CONVERT, other))?;
            let (encoded, _, _) = source.encode(&text);
            encoded.into_owned()
        }
    };
    let (decoded, _, _) = target.decode(&bytes);
    Ok(Value::Text(decoded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    #[test]
    fn test_convert_to_integer() {
        let v = convert_type(&Value::Text("12.6".into()), Type::Integer, RoundingMode::HalfUp);
        assert_eq!(v.unwrap(), Value::Integer(13));
        let v = convert_type(&Value::Number(12.6), Type::Integer, RoundingMode::Floor);
        assert_eq!(v.unwrap(), Value::Integer(12));
        let err = convert_type(&Value::Integer(70_000), Type::Smallint, RoundingMode::HalfUp);
        assert!(matches!(err, Err(FunctionError::InvalidParameter { .. })));
    }

    #[test]
    fn test_convert_to_varchar_and_null() {
        let v = convert_type(&Value::Integer(5), Type::Varchar, RoundingMode::HalfUp);
        assert_eq!(v.unwrap(), Value::Text("5".into()));
        let v = convert_type(&Value::Null, Type::Integer, RoundingMode::HalfUp);
        assert_eq!(v.unwrap(), Value::Null);
    }

    #[test]
    fn test_convert_temporal() {
        let ts = NaiveDateTime::parse_from_str("2013-11-24 11:29:31", "%Y-%m-%d %H:%M:%S").unwrap();
        let v = convert_type(&Value::Timestamp(ts), Type::Date, RoundingMode::HalfUp).unwrap();
        assert_eq!(v, Value::Date(NaiveDate::from_ymd_opt(2013, 11, 24).unwrap()));
        let v = convert_type(&Value::Text("2013-11-24".into()), Type::Date, RoundingMode::HalfUp);
        assert_eq!(v.unwrap(), Value::Date(NaiveDate::from_ymd_opt(2013, 11, 24).unwrap()));
        let err = convert_type(&Value::Integer(1), Type::Date, RoundingMode::HalfUp);
        assert!(matches!(err, Err(FunctionError::IncompatibleTypes { .. })));
    }

    #[test]
    fn test_convert_charset_reinterprets_bytes() {
        // "é" decoded as windows-1252 from UTF-8 bytes shows up as "Ã©".
        let stored = Value::Text("Ã©".into());
        let v = convert_charset(&stored, encoding_rs::WINDOWS_1252, encoding_rs::UTF_8).unwrap();
        assert_eq!(v, Value::Text("é".into()));
    }

    #[test]
    fn test_convert_charset_bytes_drop_nul() {
        let v = convert_charset(
            &Value::Bytes(b"ab\0c".to_vec()),
            encoding_rs::UTF_8,
            encoding_rs::UTF_8,
        )
        .unwrap();
        assert_eq!(v, Value::Text("abc".into()));
        let v = convert_charset(&Value::Null, encoding_rs::UTF_8, encoding_rs::UTF_8).unwrap();
        assert_eq!(v, Value::Null);
    }
}
