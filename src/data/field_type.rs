//! Paradox field type codes.

use crate::datum::Type;

/// Storage size of a BCD field; the declared size is its scale.
pub const BCD_STORAGE_SIZE: usize = 17;

/// Field types declared in a table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Varchar,
    Date,
    Integer,
    Long,
    Currency,
    Number,
    Boolean,
    Memo,
    Blob,
    FormattedMemo,
    Ole,
    Graphic,
    Time,
    Timestamp,
    AutoIncrement,
    Bcd,
    Bytes,
}

impl FieldType {
    /// Looks up the type for an on-disk type code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x01 => FieldType::Varchar,
            0x02 => FieldType::Date,
            0x03 => FieldType::Integer,
            0x04 => FieldType::Long,
            0x05 => FieldType::Currency,
            0x06 => FieldType::Number,
            0x09 => FieldType::Boolean,
            0x0C => FieldType::Memo,
            0x0D => FieldType::Blob,
            0x0E => FieldType::FormattedMemo,
            0x0F => FieldType::Ole,
            0x10 => FieldType::Graphic,
            0x14 => FieldType::Time,
            0x15 => FieldType::Timestamp,
            0x16 => FieldType::AutoIncrement,
            0x17 => FieldType::Bcd,
            0x18 => FieldType::Bytes,
            _ => return None,
        })
    }

    /// Returns the on-disk type code.
    pub fn code(self) -> u8 {
        match self {
            FieldType::Varchar => 0x01,
            FieldType::Date => 0x02,
            FieldType::Integer => 0x03,
            FieldType::Long => 0x04,
            FieldType::Currency => 0x05,
            FieldType::Number => 0x06,
            FieldType::Boolean => 0x09,
            FieldType::Memo => 0x0C,
            FieldType::Blob => 0x0D,
            FieldType::FormattedMemo => 0x0E,
            FieldType::Ole => 0x0F,
            FieldType::Graphic => 0x10,
            FieldType::Time => 0x14,
            FieldType::Timestamp => 0x15,
            FieldType::AutoIncrement => 0x16,
            FieldType::Bcd => 0x17,
            FieldType::Bytes => 0x18,
        }
    }

    /// Returns the SQL type values of this field decode to.
    pub fn sql_type(self) -> Type {
        match self {
            FieldType::Varchar => Type::Varchar,
            FieldType::Date => Type::Date,
            FieldType::Integer => Type::Smallint,
            FieldType::Long | FieldType::AutoIncrement => Type::Integer,
            FieldType::Currency | FieldType::Number => Type::Double,
            FieldType::Boolean => Type::Boolean,
            FieldType::Memo | FieldType::FormattedMemo => Type::Clob,
            FieldType::Blob | FieldType::Ole | FieldType::Graphic => Type::Blob,
            FieldType::Time => Type::Time,
            FieldType::Timestamp => Type::Timestamp,
            FieldType::Bcd => Type::Numeric,
            FieldType::Bytes => Type::Binary,
        }
    }

    /// Returns the Paradox name of this type.
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Varchar => "ALPHA",
            FieldType::Date => "DATE",
            FieldType::Integer => "SHORT",
            FieldType::Long => "LONG",
            FieldType::Currency => "CURRENCY",
            FieldType::Number => "NUMBER",
            FieldType::Boolean => "LOGICAL",
            FieldType::Memo => "MEMO",
            FieldType::Blob => "BLOB",
            FieldType::FormattedMemo => "FORMATTED MEMO",
            FieldType::Ole => "OLE",
            FieldType::Graphic => "GRAPHIC",
            FieldType::Time => "TIME",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::AutoIncrement => "AUTOINCREMENT",
            FieldType::Bcd => "BCD",
            FieldType::Bytes => "BYTES",
        }
    }
}
