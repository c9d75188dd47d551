//! SQL data types and values.
//!
//! This module defines the type system shared by the decoder, the function
//! registry and the executor. [`Type`] is the declared type of a column and
//! [`Value`] is a single typed value. [`Decimal`] carries exact fixed-point
//! numbers decoded from BCD fields.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Declared SQL type of a column or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// Type of the NULL literal.
    Null,
    /// Boolean.
    Boolean,
    /// 2-byte integer field.
    Smallint,
    /// 4-byte integer field (LONG and auto-increment).
    Integer,
    /// 8-byte integer produced by counting functions.
    Bigint,
    /// Double precision (NUMBER and CURRENCY).
    Double,
    /// Exact fixed-point decimal (BCD).
    Numeric,
    /// Character data.
    Varchar,
    /// Character large object (memo).
    Clob,
    /// Binary large object (BLOB, OLE, GRAPHIC).
    Blob,
    /// Fixed-width raw bytes.
    Binary,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time of day.
    Timestamp,
}

impl Type {
    /// Returns the SQL display name for this type.
    pub const fn display_name(self) -> &'static str {
        match self {
            Type::Null => "NULL",
            Type::Boolean => "BOOLEAN",
            Type::Smallint => "SMALLINT",
            Type::Integer => "INTEGER",
            Type::Bigint => "BIGINT",
            Type::Double => "DOUBLE",
            Type::Numeric => "NUMERIC",
            Type::Varchar => "VARCHAR",
            Type::Clob => "CLOB",
            Type::Blob => "BLOB",
            Type::Binary => "BINARY",
            Type::Date => "DATE",
            Type::Time => "TIME",
            Type::Timestamp => "TIMESTAMP",
        }
    }

    /// Resolves a type name as written in `CONVERT(value, TYPE)`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "BOOLEAN" | "BOOL" => Some(Type::Boolean),
            "SMALLINT" => Some(Type::Smallint),
            "INTEGER" | "INT" => Some(Type::Integer),
            "BIGINT" | "LONG" => Some(Type::Bigint),
            "DOUBLE" | "NUMBER" | "REAL" | "FLOAT" | "CURRENCY" => Some(Type::Double),
            "NUMERIC" | "DECIMAL" | "BCD" => Some(Type::Numeric),
            "VARCHAR" | "CHAR" | "TEXT" => Some(Type::Varchar),
            "CLOB" | "MEMO" => Some(Type::Clob),
            "BLOB" => Some(Type::Blob),
            "BINARY" | "BYTES" => Some(Type::Binary),
            "DATE" => Some(Type::Date),
            "TIME" => Some(Type::Time),
            "TIMESTAMP" | "DATETIME" => Some(Type::Timestamp),
            _ => None,
        }
    }

    /// Returns true for types compared numerically.
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Type::Smallint | Type::Integer | Type::Bigint | Type::Double | Type::Numeric
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Rounding applied when a decimal loses scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round half away from zero.
    #[default]
    HalfUp,
    /// Round toward negative infinity.
    Floor,
}

/// Exact decimal number: `mantissa * 10^-scale`.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

const MAX_DECIMAL_SCALE: u32 = 32;

impl Decimal {
    /// Creates a decimal from its unscaled value and scale.
    pub fn new(mantissa: i128, scale: u32) -> Self {
        Self {
            mantissa,
            scale: scale.min(MAX_DECIMAL_SCALE),
        }
    }

    /// Returns the unscaled value.
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Returns the number of digits after the decimal point.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Converts a double by way of its shortest decimal representation.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Self::parse(&format!("{value}"))
    }

    /// Parses a plain decimal literal such as `-12.340`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }
        let mut mantissa: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            mantissa = mantissa
                .checked_mul(10)?
                .checked_add(i128::from(c.to_digit(10)?))?;
        }
        let scale = u32::try_from(frac_part.len()).ok()?;
        if scale > MAX_DECIMAL_SCALE {
            return None;
        }
        Some(Self::new(if negative { -mantissa } else { mantissa }, scale))
    }

    /// Returns this value rescaled to `scale` digits using `mode`.
    pub fn with_scale(&self, scale: u32, mode: RoundingMode) -> Self {
        let scale = scale.min(MAX_DECIMAL_SCALE);
        if scale >= self.scale {
            let factor = 10i128.pow(scale - self.scale);
            return match self.mantissa.checked_mul(factor) {
                Some(m) => Self::new(m, scale),
                None => *self,
            };
        }
        let divisor = 10i128.pow(self.scale - scale);
        let quotient = self.mantissa / divisor;
        let remainder = self.mantissa % divisor;
        let adjusted = match mode {
            RoundingMode::HalfUp => {
                if remainder.abs() * 2 >= divisor {
                    quotient + self.mantissa.signum()
                } else {
                    quotient
                }
            }
            RoundingMode::Floor => {
                if remainder < 0 {
                    quotient - 1
                } else {
                    quotient
                }
            }
        };
        Self::new(adjusted, scale)
    }

    /// Converts to the nearest double.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    /// Returns the integral part, rounded with `mode`.
    pub fn to_i64(&self, mode: RoundingMode) -> Option<i64> {
        i64::try_from(self.with_scale(0, mode).mantissa).ok()
    }

    fn aligned(&self, other: &Decimal) -> Option<(i128, i128)> {
        let scale = self.scale.max(other.scale);
        let a = self.mantissa.checked_mul(10i128.pow(scale - self.scale))?;
        let b = other.mantissa.checked_mul(10i128.pow(scale - other.scale))?;
        Some((a, b))
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.aligned(other) {
            Some((a, b)) => a.cmp(&b),
            None => compare_f64(self.to_f64(), other.to_f64()),
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

/// A typed SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean.
    Boolean(bool),
    /// Any integer width.
    Integer(i64),
    /// Double precision.
    Number(f64),
    /// Exact decimal.
    Decimal(Decimal),
    /// Character data (VARCHAR and memo).
    Text(String),
    /// Binary data (BLOB, OLE, GRAPHIC, BYTES).
    Bytes(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time.
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Returns the natural type of this value.
    pub fn data_type(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Boolean(_) => Type::Boolean,
            Value::Integer(_) => Type::Integer,
            Value::Number(_) => Type::Double,
            Value::Decimal(_) => Type::Numeric,
            Value::Text(_) => Type::Varchar,
            Value::Bytes(_) => Type::Blob,
            Value::Date(_) => Type::Date,
            Value::Time(_) => Type::Time,
            Value::Timestamp(_) => Type::Timestamp,
        }
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the value as a double when it is numeric or numeric text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Number(n) => Some(*n),
            Value::Decimal(d) => Some(d.to_f64()),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the value as an exact decimal when it is numeric or numeric text.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(n) => Some(Decimal::new(i128::from(*n), 0)),
            Value::Number(n) => Decimal::from_f64(*n),
            Value::Decimal(d) => Some(*d),
            Value::Text(s) => Decimal::parse(s),
            _ => None,
        }
    }

    /// Returns the value as an integer, truncating fractions.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            Value::Decimal(d) => d.to_i64(RoundingMode::Floor),
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| Decimal::parse(s).and_then(|d| d.to_i64(RoundingMode::Floor)))
            }
            _ => None,
        }
    }

    /// Returns the value interpreted as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(n) => Some(*n != 0),
            Value::Number(n) => Some(*n != 0.0),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "yes" => Some(true),
                "false" | "f" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Converts this value to its text representation; NULL becomes `None`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Boolean(b) => Some(b.to_string()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Number(n) => Some(format_double(*n)),
            Value::Decimal(d) => Some(d.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Bytes(b) => Some(b.iter().map(|byte| format!("{byte:02x}")).collect()),
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => Some(t.format("%H:%M:%S").to_string()),
            Value::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("NULL"),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v.into())
            }
        })*
    };
}

value_from! {
    bool => Boolean,
    i16 => Integer,
    i32 => Integer,
    i64 => Integer,
    f64 => Number,
    Decimal => Decimal,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Formats a double without a trailing `.0` for integral values.
fn format_double(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n.is_sign_positive() { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{n}")
    }
}

/// Compares two f64 values with NaN-aware total ordering.
///
/// NaN is treated as greater than all non-NaN values, and NaN == NaN.
pub fn compare_f64(a: f64, b: f64) -> Ordering {
    match a.partial_cmp(&b) {
        Some(ord) => ord,
        None => match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => Ordering::Equal,
        },
    }
}

/// Canonical comparator for two non-NULL values.
///
/// Mixed operands are promoted to the most general comparable type:
/// integers and decimals compare exactly, any double makes the comparison
/// floating point, text against a number compares numerically when the text
/// parses, and text against a temporal value parses the text as that
/// temporal type. Returns `None` when the values are not comparable.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    use Value::*;
    match (left, right) {
        (Null, _) | (_, Null) => None,
        (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
        (Integer(a), Integer(b)) => Some(a.cmp(b)),
        (Text(a), Text(b)) => Some(a.cmp(b)),
        (Bytes(a), Bytes(b)) => Some(a.cmp(b)),
        (Date(a), Date(b)) => Some(a.cmp(b)),
        (Time(a), Time(b)) => Some(a.cmp(b)),
        (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
        (Date(a), Timestamp(b)) => Some(a.and_time(NaiveTime::MIN).cmp(b)),
        (Timestamp(a), Date(b)) => Some(a.cmp(&b.and_time(NaiveTime::MIN))),
        (Number(_), _) | (_, Number(_)) => {
            Some(compare_f64(left.as_f64()?, right.as_f64()?))
        }
        (Integer(_) | Decimal(_), Integer(_) | Decimal(_)) => {
            Some(left.as_decimal()?.cmp(&right.as_decimal()?))
        }
        (Text(_), Integer(_) | Decimal(_)) | (Integer(_) | Decimal(_), Text(_)) => {
            Some(left.as_decimal()?.cmp(&right.as_decimal()?))
        }
        (Text(s), Date(_) | Timestamp(_) | Time(_)) => {
            compare_values(&parse_temporal(s, right.data_type())?, right)
        }
        (Date(_) | Timestamp(_) | Time(_), Text(s)) => {
            compare_values(left, &parse_temporal(s, left.data_type())?)
        }
        (Boolean(a), other) | (other, Boolean(a)) => {
            let b = other.as_bool()?;
            let ord = a.cmp(&b);
            Some(if matches!(left, Boolean(_)) { ord } else { ord.reverse() })
        }
        _ => None,
    }
}

/// Parses text as a date, time or timestamp literal of type `ty`.
pub fn parse_temporal(text: &str, ty: Type) -> Option<Value> {
    let text = text.trim();
    match ty {
        Type::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(Value::Date),
        Type::Time => NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
            .ok()
            .map(Value::Time),
        Type::Timestamp => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
            .map(Value::Timestamp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_parse_and_display() {
        let d = Decimal::parse("-12.340").unwrap();
        assert_eq!(d.mantissa(), -12340);
        assert_eq!(d.scale(), 3);
        assert_eq!(d.to_string(), "-12.340");
        assert_eq!(Decimal::new(5, 3).to_string(), "0.005");
        assert!(Decimal::parse("1.2.3").is_none());
        assert!(Decimal::parse("").is_none());
    }

    #[test]
    fn test_decimal_half_up() {
        let d = Decimal::parse("1.2355").unwrap();
        assert_eq!(d.with_scale(2, RoundingMode::HalfUp).to_string(), "1.24");
        let d = Decimal::parse("1.2345").unwrap();
        assert_eq!(d.with_scale(2, RoundingMode::HalfUp).to_string(), "1.23");
        let d = Decimal::parse("-2.5").unwrap();
        assert_eq!(d.with_scale(0, RoundingMode::HalfUp).to_string(), "-3");
    }

    #[test]
    fn test_decimal_floor() {
        let d = Decimal::parse("1.2399").unwrap();
        assert_eq!(d.with_scale(2, RoundingMode::Floor).to_string(), "1.23");
        let d = Decimal::parse("-1.231").unwrap();
        assert_eq!(d.with_scale(2, RoundingMode::Floor).to_string(), "-1.24");
    }

    #[test]
    fn test_decimal_ordering_across_scales() {
        let a = Decimal::parse("1.50").unwrap();
        let b = Decimal::parse("1.5").unwrap();
        assert_eq!(a, b);
        assert!(Decimal::parse("2").unwrap() > a);
    }

    #[test]
    fn test_compare_mixed_numeric() {
        let ord = compare_values(&Value::Integer(2), &Value::Number(2.5));
        assert_eq!(ord, Some(Ordering::Less));
        let ord = compare_values(&Value::Text("10".into()), &Value::Integer(9));
        assert_eq!(ord, Some(Ordering::Greater));
        let ord = compare_values(&Value::Decimal(Decimal::new(150, 2)), &Value::Integer(1));
        assert_eq!(ord, Some(Ordering::Greater));
    }

    #[test]
    fn test_compare_null_is_unknown() {
        assert_eq!(compare_values(&Value::Null, &Value::Integer(1)), None);
        assert_eq!(compare_values(&Value::Null, &Value::Null), None);
    }

    #[test]
    fn test_compare_text_with_date() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        let ord = compare_values(&Value::Text("2020-01-01".into()), &date);
        assert_eq!(ord, Some(Ordering::Less));
    }

    #[test]
    fn test_compare_f64_nan_ordering() {
        assert_eq!(compare_f64(f64::NAN, f64::NAN), Ordering::Equal);
        assert_eq!(compare_f64(f64::NAN, 1.0), Ordering::Greater);
        assert_eq!(compare_f64(1.0, f64::NAN), Ordering::Less);
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::Number(3.0).to_text().as_deref(), Some("3"));
        assert_eq!(Value::Bytes(vec![0xab, 0x01]).to_text().as_deref(), Some("ab01"));
        let t = NaiveTime::from_hms_opt(0, 0, 30).unwrap();
        assert_eq!(Value::Time(t).to_text().as_deref(), Some("00:00:30"));
    }

    #[test]
    fn test_type_from_name() {
        assert_eq!(Type::from_name("integer"), Some(Type::Integer));
        assert_eq!(Type::from_name("Timestamp"), Some(Type::Timestamp));
        assert_eq!(Type::from_name("nope"), None);
    }

    #[test]
    fn test_value_from() {
        assert_eq!(Value::from(5i32), Value::Integer(5));
        assert_eq!(Value::from("ab"), Value::Text("ab".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(1.5)), Value::Number(1.5));
    }
}
