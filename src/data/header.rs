//! Table file header layout.
//!
//! All header integers are little-endian. Field descriptors start at `0x78`
//! for format 4.x and up (version id above 4) and at `0x58` before that; field
//! names follow the table name, whose reserved width depends on the version.

use std::path::Path;

use bytes::Buf;
use encoding_rs::Encoding;

use super::charset::{decode_text, encoding_for_code_page};
use super::error::{DataError, DataResult};
use super::field_type::FieldType;

/// Version ids above this are format 4.x and up.
pub const PARADOX_VERSION_4: u8 = 4;

/// Version id whose table name area is 261 bytes wide.
const VERSION_LONG_NAMES: u8 = 0x0C;

/// Marker meaning the real encryption word lives at `0x5C`.
const ENCRYPTION_REDIRECT: u32 = 0xFF00_FF00;

/// Smallest header that holds the fixed fields.
pub(crate) const MIN_HEADER_SIZE: usize = 0x58;

/// Bounds-checked little-endian reads over a header buffer.
pub(crate) struct HeaderBytes<'a> {
    data: &'a [u8],
    path: &'a Path,
}

impl<'a> HeaderBytes<'a> {
    pub(crate) fn new(data: &'a [u8], path: &'a Path) -> Self {
        Self { data, path }
    }

    pub(crate) fn slice(&self, offset: usize, len: usize) -> DataResult<&'a [u8]> {
        self.data
            .get(offset..offset.saturating_add(len))
            .ok_or_else(|| {
                DataError::corrupt_header(
                    self.path,
                    format!("truncated at offset 0x{offset:x} (header has {} bytes)", self.data.len()),
                )
            })
    }

    pub(crate) fn u8_at(&self, offset: usize) -> DataResult<u8> {
        Ok(self.slice(offset, 1)?.get_u8())
    }

    pub(crate) fn u16_at(&self, offset: usize) -> DataResult<u16> {
        Ok(self.slice(offset, 2)?.get_u16_le())
    }

    pub(crate) fn u32_at(&self, offset: usize) -> DataResult<u32> {
        Ok(self.slice(offset, 4)?.get_u32_le())
    }

    pub(crate) fn i32_at(&self, offset: usize) -> DataResult<i32> {
        Ok(self.slice(offset, 4)?.get_i32_le())
    }
}

/// Fixed metadata from the start of a table file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub record_size: u16,
    pub header_size: u16,
    pub file_type: u8,
    /// Block size in KiB.
    pub block_size: u8,
    pub row_count: u32,
    pub used_blocks: u16,
    pub total_blocks: u16,
    pub first_block: u16,
    pub last_block: u16,
    pub field_count: u16,
    pub primary_field_count: u16,
    /// Nonzero when the data blocks are encrypted.
    pub encryption: u32,
    pub write_protected: bool,
    pub version_id: u8,
    pub auto_increment: i32,
    pub first_free_block: u16,
    pub referential_integrity: u8,
    /// Code page, present from format 4.x on.
    pub code_page: Option<u16>,
}

impl TableHeader {
    /// Parses the fixed part of a table header.
    pub(crate) fn parse(bytes: &HeaderBytes<'_>) -> DataResult<Self> {
        let version_id = bytes.u8_at(0x39)?;
        let mut encryption = bytes.u32_at(0x25)?;
        if encryption == ENCRYPTION_REDIRECT && version_id > PARADOX_VERSION_4 {
            encryption = bytes.u32_at(0x5C)?;
        }
        let code_page = if version_id > PARADOX_VERSION_4 {
            Some(bytes.u16_at(0x6A)?)
        } else {
            None
        };

        let header = Self {
            record_size: bytes.u16_at(0x00)?,
            header_size: bytes.u16_at(0x02)?,
            file_type: bytes.u8_at(0x04)?,
            block_size: bytes.u8_at(0x05)?,
            row_count: bytes.u32_at(0x06)?,
            used_blocks: bytes.u16_at(0x0A)?,
            total_blocks: bytes.u16_at(0x0C)?,
            first_block: bytes.u16_at(0x0E)?,
            last_block: bytes.u16_at(0x10)?,
            field_count: bytes.u16_at(0x21)?,
            primary_field_count: bytes.u16_at(0x23)?,
            encryption,
            write_protected: bytes.u8_at(0x38)? != 0,
            version_id,
            auto_increment: bytes.i32_at(0x49)?,
            first_free_block: bytes.u16_at(0x4D)?,
            referential_integrity: bytes.u8_at(0x55)?,
            code_page,
        };

        if header.record_size == 0 || header.block_size == 0 {
            return Err(DataError::corrupt_header(
                bytes.path,
                "record size and block size must be nonzero",
            ));
        }
        Ok(header)
    }

    /// Block size in bytes.
    pub fn block_size_bytes(&self) -> usize {
        usize::from(self.block_size) * 1024
    }

    /// Returns true if the data blocks are encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encryption != 0
    }

    /// Human-readable format version.
    pub fn version_name(&self) -> &'static str {
        match self.version_id {
            0x03 => "3.0",
            0x04 => "3.5",
            0x05..=0x09 => "4.x",
            0x0A | 0x0B => "5.x",
            0x0C => "7.x",
            _ => "unknown",
        }
    }

    /// Offset of the first field descriptor.
    pub(crate) fn descriptors_offset(&self) -> usize {
        if self.version_id > PARADOX_VERSION_4 {
            0x78
        } else {
            0x58
        }
    }

    /// Offset of the first field name.
    pub(crate) fn names_offset(&self) -> usize {
        let n = usize::from(self.field_count);
        if self.version_id > PARADOX_VERSION_4 {
            if self.version_id == VERSION_LONG_NAMES {
                0x78 + 261 + 4 + 6 * n
            } else {
                0x78 + 83 + 6 * n
            }
        } else {
            0x58 + 83 + 6 * n
        }
    }

    /// Encoding for text in this table, or `fallback` when the code page is unknown.
    pub fn encoding(&self, fallback: &'static Encoding) -> &'static Encoding {
        self.code_page
            .and_then(encoding_for_code_page)
            .unwrap_or(fallback)
    }
}

/// A field declared in a table header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Raw type code.
    pub type_code: u8,
    /// Declared size; the scale for BCD fields.
    pub size: usize,
    /// Zero-based position within the record.
    pub index: usize,
}

impl FieldDescriptor {
    /// Returns the decoded field type, if the code is known.
    pub fn field_type(&self) -> Option<FieldType> {
        FieldType::from_code(self.type_code)
    }

    /// Bytes this field occupies in a record.
    pub fn storage_size(&self) -> usize {
        match self.field_type() {
            Some(FieldType::Bcd) => super::field_type::BCD_STORAGE_SIZE,
            _ => self.size,
        }
    }
}

/// Parses field descriptors and names, in storage order.
///
/// The display-order table that follows the names is not read; columns are
/// always reported in storage order.
pub(crate) fn parse_fields(
    bytes: &HeaderBytes<'_>,
    header: &TableHeader,
    encoding: &'static Encoding,
) -> DataResult<Vec<FieldDescriptor>> {
    let count = usize::from(header.field_count);
    let descriptors = bytes.slice(header.descriptors_offset(), count * 2)?;

    let mut pos = header.names_offset();
    let mut fields = Vec::with_capacity(count);
    for (index, pair) in descriptors.chunks_exact(2).enumerate() {
        let tail = bytes.slice(pos, 0).map(|_| &bytes.data[pos..])?;
        let len = tail.iter().position(|&b| b == 0).ok_or_else(|| {
            DataError::corrupt_header(bytes.path, format!("unterminated name of field {}", index + 1))
        })?;
        fields.push(FieldDescriptor {
            name: decode_text(encoding, &tail[..len]),
            type_code: pair[0],
            size: usize::from(pair[1]),
            index,
        });
        pos += len + 1;
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(version: u8, field_count: u16) -> Vec<u8> {
        let mut data = vec![0u8; 0x800];
        data[0x00..0x02].copy_from_slice(&10u16.to_le_bytes());
        data[0x02..0x04].copy_from_slice(&0x800u16.to_le_bytes());
        data[0x05] = 2;
        data[0x06..0x0A].copy_from_slice(&3u32.to_le_bytes());
        data[0x21..0x23].copy_from_slice(&field_count.to_le_bytes());
        data[0x39] = version;
        data[0x6A..0x6C].copy_from_slice(&1252u16.to_le_bytes());
        data
    }

    #[test]
    fn test_parse_fixed_fields() {
        let data = header_bytes(0x0C, 2);
        let path = Path::new("t.db");
        let header = TableHeader::parse(&HeaderBytes::new(&data, path)).unwrap();
        assert_eq!(header.record_size, 10);
        assert_eq!(header.row_count, 3);
        assert_eq!(header.block_size_bytes(), 2048);
        assert_eq!(header.code_page, Some(1252));
        assert_eq!(header.version_name(), "7.x");
        assert!(!header.is_encrypted());
    }

    #[test]
    fn test_encryption_redirect() {
        let mut data = header_bytes(0x0C, 1);
        data[0x25..0x29].copy_from_slice(&0xFF00_FF00u32.to_le_bytes());
        data[0x5C..0x60].copy_from_slice(&7u32.to_le_bytes());
        let header = TableHeader::parse(&HeaderBytes::new(&data, Path::new("t.db"))).unwrap();
        assert_eq!(header.encryption, 7);
        assert!(header.is_encrypted());
    }

    #[test]
    fn test_names_offset_by_version() {
        let data = header_bytes(0x0C, 2);
        let header = TableHeader::parse(&HeaderBytes::new(&data, Path::new("t.db"))).unwrap();
        assert_eq!(header.names_offset(), 0x78 + 261 + 4 + 12);

        let data = header_bytes(0x09, 2);
        let header = TableHeader::parse(&HeaderBytes::new(&data, Path::new("t.db"))).unwrap();
        assert_eq!(header.names_offset(), 0x78 + 83 + 12);

        let data = header_bytes(0x03, 2);
        let header = TableHeader::parse(&HeaderBytes::new(&data, Path::new("t.db"))).unwrap();
        assert_eq!(header.names_offset(), 0x58 + 83 + 12);
        assert_eq!(header.code_page, None);
    }

    #[test]
    fn test_parse_fields() {
        let mut data = header_bytes(0x0C, 2);
        data[0x78..0x7C].copy_from_slice(&[0x01, 0x08, 0x03, 0x02]);
        let names = 0x78 + 261 + 4 + 12;
        data[names..names + 9].copy_from_slice(b"NAME\0AGE\0");
        data[names + 9..names + 11].copy_from_slice(&[2, 1]);
        let path = Path::new("t.db");
        let bytes = HeaderBytes::new(&data, path);
        let header = TableHeader::parse(&bytes).unwrap();
        let fields = parse_fields(&bytes, &header, encoding_rs::WINDOWS_1252).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "NAME");
        assert_eq!(fields[0].size, 8);
        assert_eq!(fields[1].field_type(), Some(FieldType::Integer));
        // A reversed display order leaves storage order alone.
        let names: Vec<_> = fields.iter().map(|f| (f.index, f.name.as_str())).collect();
        assert_eq!(names, vec![(0, "NAME"), (1, "AGE")]);
    }

    #[test]
    fn test_truncated_header() {
        let data = vec![0u8; 0x20];
        let err = TableHeader::parse(&HeaderBytes::new(&data, Path::new("t.db"))).unwrap_err();
        assert!(matches!(err, DataError::CorruptHeader { .. }));
    }
}
