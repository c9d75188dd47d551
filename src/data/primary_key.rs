//! Primary key (`.PX`) file headers, read for metadata only.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::error::{DataError, DataResult};
use super::header::HeaderBytes;

const PX_HEADER_SIZE: usize = 0x3A;

/// Metadata from a primary key index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyDescriptor {
    /// File name including the extension.
    pub name: String,
    pub path: PathBuf,
    pub record_size: u16,
    pub header_size: u16,
    pub file_type: u8,
    pub block_size: u8,
    pub row_count: u32,
    pub used_blocks: u16,
    pub total_blocks: u16,
    pub first_block: u16,
    pub last_block: u16,
    /// Number of the indexed field.
    pub index_field_number: u8,
    pub field_count: u8,
    pub write_protected: bool,
    pub version_id: u8,
}

impl PrimaryKeyDescriptor {
    /// Reads the header of a `.PX` file.
    pub fn open(path: &Path) -> DataResult<Self> {
        let mut data = Vec::with_capacity(PX_HEADER_SIZE);
        File::open(path)
            .and_then(|file| file.take(PX_HEADER_SIZE as u64).read_to_end(&mut data))
            .map_err(|e| DataError::io(path, e))?;
        let bytes = HeaderBytes::new(&data, path);

        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            record_size: bytes.u16_at(0x00)?,
            header_size: bytes.u16_at(0x02)?,
            file_type: bytes.u8_at(0x04)?,
            block_size: bytes.u8_at(0x05)?,
            row_count: bytes.u32_at(0x06)?,
            used_blocks: bytes.u16_at(0x0A)?,
            total_blocks: bytes.u16_at(0x0C)?,
            first_block: bytes.u16_at(0x0E)?,
            last_block: bytes.u16_at(0x10)?,
            index_field_number: bytes.u8_at(0x15)?,
            field_count: bytes.u8_at(0x21)?,
            write_protected: bytes.u8_at(0x38)? != 0,
            version_id: bytes.u8_at(0x39)?,
        })
    }
}
