//! Field parsers.
//!
//! Each parser handles one family of type codes. Parsers are looked up in a
//! process-wide immutable registry and always receive exactly the bytes the
//! field occupies in its record.

use bytes::Buf;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use encoding_rs::Encoding;

use super::charset::decode_text;
use super::error::{DataError, DataResult};
use super::field_type::FieldType;
use super::header::FieldDescriptor;
use super::memo::{MemoFile, MemoPointer};
use crate::datum::{Decimal, RoundingMode, Value};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// State shared by the parsers while decoding one table.
pub struct FieldContext<'a> {
    pub encoding: &'static Encoding,
    pub rounding: RoundingMode,
    pub memo: &'a mut MemoFile,
}

/// Decodes the storage of one field into a value.
pub trait FieldParser: Sync {
    /// Returns true if this parser handles the given field type.
    fn matches(&self, field_type: FieldType) -> bool;

    /// Parses `data`, which holds exactly the field's storage bytes.
    fn parse(
        &self,
        ctx: &mut FieldContext<'_>,
        data: &[u8],
        field: &FieldDescriptor,
    ) -> DataResult<Value>;
}

static PARSERS: &[&dyn FieldParser] = &[
    &VarcharParser,
    &IntegerParser,
    &LongParser,
    &NumberParser,
    &BooleanParser,
    &DateParser,
    &TimeParser,
    &TimestampParser,
    &BcdParser,
    &BytesParser,
    &MemoParser,
    &BlobParser,
];

/// Finds the parser for a raw type code.
pub fn find_parser(code: u8) -> Option<&'static dyn FieldParser> {
    let field_type = FieldType::from_code(code)?;
    PARSERS.iter().copied().find(|p| p.matches(field_type))
}

/// Parses the next field from `buf` and advances past its storage.
pub fn parse_field(
    ctx: &mut FieldContext<'_>,
    buf: &mut &[u8],
    field: &FieldDescriptor,
) -> DataResult<Value> {
    let parser = find_parser(field.type_code).ok_or_else(|| DataError::FieldTypeNotSupported {
        code: field.type_code,
        field: field.name.clone(),
    })?;
    let data = take_field(buf, field)?;
    parser.parse(ctx, data, field)
}

/// Skips a field that is not requested.
pub fn skip_field(buf: &mut &[u8], field: &FieldDescriptor) -> DataResult<()> {
    take_field(buf, field).map(|_| ())
}

fn take_field<'b>(buf: &mut &'b [u8], field: &FieldDescriptor) -> DataResult<&'b [u8]> {
    let size = field.storage_size();
    if buf.len() < size {
        return Err(DataError::RecordTooShort {
            field: field.name.clone(),
        });
    }
    let (data, rest) = buf.split_at(size);
    *buf = rest;
    Ok(data)
}

fn is_zero(data: &[u8]) -> bool {
    data.iter().all(|&b| b == 0)
}

/// Reads a big-endian unsigned integer of up to 8 bytes.
fn read_be(data: &[u8]) -> u64 {
    let mut buf = data;
    buf.get_uint(data.len().min(8))
}

/// Undoes the sign-bit flip used for stored doubles.
fn decode_double(raw: u64) -> f64 {
    const SIGN: u64 = 1 << 63;
    if raw & SIGN != 0 {
        f64::from_bits(raw & !SIGN)
    } else {
        f64::from_bits(!raw)
    }
}

struct VarcharParser;

impl FieldParser for VarcharParser {
    fn matches(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Varchar
    }

    fn parse(&self, ctx: &mut FieldContext<'_>, data: &[u8], _: &FieldDescriptor) -> DataResult<Value> {
        let text = decode_text(ctx.encoding, data);
        if text.is_empty() {
            Ok(Value::Null)
        } else {
            Ok(Value::Text(text))
        }
    }
}

struct IntegerParser;

impl FieldParser for IntegerParser {
    fn matches(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Integer
    }

    fn parse(&self, _: &mut FieldContext<'_>, data: &[u8], _: &FieldDescriptor) -> DataResult<Value> {
        if is_zero(data) {
            return Ok(Value::Null);
        }
        let raw = read_be(data) as u16;
        Ok(Value::Integer(i64::from((raw ^ 0x8000) as i16)))
    }
}

struct LongParser;

impl FieldParser for LongParser {
    fn matches(&self, field_type: FieldType) -> bool {
        matches!(field_type, FieldType::Long | FieldType::AutoIncrement)
    }

    fn parse(&self, _: &mut FieldContext<'_>, data: &[u8], _: &FieldDescriptor) -> DataResult<Value> {
        if is_zero(data) {
            return Ok(Value::Null);
        }
        let raw = read_be(data) as u32;
        Ok(Value::Integer(i64::from((raw ^ 0x8000_0000) as i32)))
    }
}

struct NumberParser;

impl FieldParser for NumberParser {
    fn matches(&self, field_type: FieldType) -> bool {
        matches!(field_type, FieldType::Number | FieldType::Currency)
    }

    fn parse(&self, _: &mut FieldContext<'_>, data: &[u8], _: &FieldDescriptor) -> DataResult<Value> {
        if is_zero(data) {
            return Ok(Value::Null);
        }
        Ok(Value::Number(decode_double(read_be(data))))
    }
}

struct BooleanParser;

impl FieldParser for BooleanParser {
    fn matches(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Boolean
    }

    fn parse(&self, _: &mut FieldContext<'_>, data: &[u8], _: &FieldDescriptor) -> DataResult<Value> {
        Ok(match data.first() {
            Some(0x80) => Value::Boolean(false),
            Some(0x81) => Value::Boolean(true),
            _ => Value::Null,
        })
    }
}

struct DateParser;

impl FieldParser for DateParser {
    fn matches(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Date
    }

    fn parse(&self, _: &mut FieldContext<'_>, data: &[u8], _: &FieldDescriptor) -> DataResult<Value> {
        if is_zero(data) {
            return Ok(Value::Null);
        }
        let days = (read_be(data) & 0x7FFF_FFFF) as i32;
        Ok(NaiveDate::from_num_days_from_ce_opt(days).map_or(Value::Null, Value::Date))
    }
}

struct TimeParser;

impl FieldParser for TimeParser {
    fn matches(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Time
    }

    fn parse(&self, _: &mut FieldContext<'_>, data: &[u8], _: &FieldDescriptor) -> DataResult<Value> {
        if is_zero(data) {
            return Ok(Value::Null);
        }
        let millis = (read_be(data) & 0x7FFF_FFFF) as u32;
        Ok(
            NaiveTime::from_num_seconds_from_midnight_opt(millis / 1000, (millis % 1000) * 1_000_000)
                .map_or(Value::Null, Value::Time),
        )
    }
}

struct TimestampParser;

impl FieldParser for TimestampParser {
    fn matches(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Timestamp
    }

    fn parse(&self, _: &mut FieldContext<'_>, data: &[u8], _: &FieldDescriptor) -> DataResult<Value> {
        if is_zero(data) {
            return Ok(Value::Null);
        }
        let millis = decode_double(read_be(data));
        Ok(timestamp_from_millis(millis).map_or(Value::Null, Value::Timestamp))
    }
}

/// Converts milliseconds since 0001-01-01 00:00 (day 1) into a timestamp.
fn timestamp_from_millis(millis: f64) -> Option<NaiveDateTime> {
    if !millis.is_finite() {
        return None;
    }
    let days = (millis / MILLIS_PER_DAY).floor();
    let rest = (millis - days * MILLIS_PER_DAY).trunc() as i64;
    let date = NaiveDate::from_num_days_from_ce_opt(i32::try_from(days as i64).ok()?)?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::milliseconds(rest))
}

struct BcdParser;

impl FieldParser for BcdParser {
    fn matches(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Bcd
    }

    fn parse(&self, ctx: &mut FieldContext<'_>, data: &[u8], field: &FieldDescriptor) -> DataResult<Value> {
        if is_zero(data) {
            return Ok(Value::Null);
        }
        Ok(Value::Decimal(decode_bcd(data, field.size as u32, ctx.rounding)))
    }
}

/// Decodes 17 bytes of packed BCD.
///
/// Bit 7 of the first byte is set for positive values; negative values have
/// every byte complemented. The low six bits of the first byte hold the number
/// of stored decimals, and the 32 digit nibbles follow. The value is read at
/// the stored decimals, then rescaled to the field's `scale`.
fn decode_bcd(data: &[u8], scale: u32, rounding: RoundingMode) -> Decimal {
    let positive = data[0] & 0x80 != 0;
    let byte = |i: usize| if positive { data[i] } else { !data[i] };

    let stored = u32::from(byte(0) & 0x3F);
    let mut mantissa: i128 = 0;
    for i in 1..data.len() {
        let b = byte(i);
        mantissa = mantissa * 10 + i128::from((b >> 4).min(9));
        mantissa = mantissa * 10 + i128::from((b & 0x0F).min(9));
    }
    if !positive {
        mantissa = -mantissa;
    }

    Decimal::new(mantissa, stored).with_scale(scale, rounding)
}

struct BytesParser;

impl FieldParser for BytesParser {
    fn matches(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Bytes
    }

    fn parse(&self, _: &mut FieldContext<'_>, data: &[u8], _: &FieldDescriptor) -> DataResult<Value> {
        Ok(Value::Bytes(data.to_vec()))
    }
}

/// Resolves a memo/blob pointer to its payload bytes, or `None` for NULL.
fn load_lob(ctx: &mut FieldContext<'_>, data: &[u8]) -> DataResult<Option<Vec<u8>>> {
    let Some((prefix, pointer)) = MemoPointer::split(data) else {
        return Ok(None);
    };
    if pointer.is_inline() {
        let end = prefix.iter().position(|&b| b == 0).unwrap_or(prefix.len());
        return Ok((end > 0).then(|| prefix[..end].to_vec()));
    }
    Ok(Some(ctx.memo.read(&pointer)?.to_vec()))
}

struct MemoParser;

impl FieldParser for MemoParser {
    fn matches(&self, field_type: FieldType) -> bool {
        matches!(field_type, FieldType::Memo | FieldType::FormattedMemo)
    }

    fn parse(&self, ctx: &mut FieldContext<'_>, data: &[u8], _: &FieldDescriptor) -> DataResult<Value> {
        Ok(match load_lob(ctx, data)? {
            Some(bytes) => Value::Text(decode_text(ctx.encoding, &bytes)),
            None => Value::Null,
        })
    }
}

struct BlobParser;

impl FieldParser for BlobParser {
    fn matches(&self, field_type: FieldType) -> bool {
        matches!(
            field_type,
            FieldType::Blob | FieldType::Ole | FieldType::Graphic
        )
    }

    fn parse(&self, ctx: &mut FieldContext<'_>, data: &[u8], _: &FieldDescriptor) -> DataResult<Value> {
        Ok(load_lob(ctx, data)?.map_or(Value::Null, Value::Bytes))
    }
}
