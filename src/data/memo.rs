//! Out-of-line memo and blob values stored in `<table>.MB`.

use std::path::PathBuf;

use bytes::{Buf, Bytes};
use tracing::trace;

use super::error::{DataError, DataResult};

/// Size of the pointer trailing every inline memo/blob field.
pub const MEMO_POINTER_SIZE: usize = 10;

/// Slot value marking a single-value block.
const SINGLE_BLOCK_SLOT: u8 = 0xFF;

/// Header size of a single-value block.
const SINGLE_BLOCK_HEADER: usize = 9;

/// Offset of the pointer table in a multi-value block.
const POINTER_TABLE_OFFSET: usize = 12;

/// Size of one pointer table entry.
const POINTER_ENTRY_SIZE: usize = 5;

/// Pointer stored in the trailing bytes of a memo/blob field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoPointer {
    pub offset: u32,
    pub length: u32,
    pub modifier: u16,
}

impl MemoPointer {
    /// Splits raw field storage into its inline prefix and trailing pointer.
    pub fn split(data: &[u8]) -> Option<(&[u8], MemoPointer)> {
        let split = data.len().checked_sub(MEMO_POINTER_SIZE)?;
        let (prefix, mut tail) = data.split_at(split);
        let pointer = MemoPointer {
            offset: tail.get_u32_le(),
            length: tail.get_u32_le(),
            modifier: tail.get_u16_le(),
        };
        Some((prefix, pointer))
    }

    /// Returns true if the whole value lives in the inline prefix.
    pub fn is_inline(&self) -> bool {
        self.offset == 0 || self.length == 0
    }
}

/// Lazily loaded memo file.
#[derive(Debug)]
pub struct MemoFile {
    path: PathBuf,
    data: Option<Bytes>,
}

impl MemoFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: None,
        }
    }

    fn contents(&mut self) -> DataResult<Bytes> {
        let data = match self.data.take() {
            Some(data) => data,
            None => {
                let bytes = std::fs::read(&self.path).map_err(|e| DataError::io(&self.path, e))?;
                trace!(path = %self.path.display(), size = bytes.len(), "loaded memo file");
                Bytes::from(bytes)
            }
        };
        self.data = Some(data.clone());
        Ok(data)
    }

    /// Reads the payload a pointer refers to.
    pub fn read(&mut self, pointer: &MemoPointer) -> DataResult<Bytes> {
        let data = self.contents()?;
        let block = (pointer.offset & 0xFFFF_FF00) as usize;
        let slot = (pointer.offset & 0xFF) as u8;
        let length = pointer.length as usize;
        let corrupt = || DataError::CorruptBlock {
            path: self.path.clone(),
            block: (block >> 12) as u16,
        };

        let start = if slot == SINGLE_BLOCK_SLOT {
            block + SINGLE_BLOCK_HEADER
        } else {
            let entry = block + POINTER_TABLE_OFFSET + usize::from(slot) * POINTER_ENTRY_SIZE;
            let paragraph = *data.get(entry).ok_or_else(corrupt)?;
            block + usize::from(paragraph) * 16
        };

        if start + length > data.len() {
            return Err(corrupt());
        }
        Ok(data.slice(start..start + length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn pointer_bytes(offset: u32, length: u32) -> Vec<u8> {
        let mut data = b"abc".to_vec();
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&length.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data
    }

    #[test]
    fn test_split_pointer() {
        let data = pointer_bytes(0x1000, 5);
        let (prefix, pointer) = MemoPointer::split(&data).unwrap();
        assert_eq!(prefix, b"abc");
        assert_eq!(pointer.offset, 0x1000);
        assert_eq!(pointer.length, 5);
        assert!(!pointer.is_inline());
        assert!(MemoPointer::split(&[0u8; 4]).is_none());
    }

    #[test]
    fn test_read_single_block() {
        let mut data = vec![0u8; 0x2000];
        data[0x1000 + 9..0x1000 + 14].copy_from_slice(b"hello");
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();

        let mut memo = MemoFile::new(file.path());
        let pointer = MemoPointer { offset: 0x10FF, length: 5, modifier: 0 };
        assert_eq!(&memo.read(&pointer).unwrap()[..], b"hello");
    }

    #[test]
    fn test_read_pointer_table_slot() {
        let mut data = vec![0u8; 0x2000];
        // slot 2 points at paragraph 4 of the block
        data[0x1000 + 12 + 2 * 5] = 4;
        data[0x1000 + 64..0x1000 + 68].copy_from_slice(b"memo");
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();

        let mut memo = MemoFile::new(file.path());
        let pointer = MemoPointer { offset: 0x1002, length: 4, modifier: 0 };
        assert_eq!(&memo.read(&pointer).unwrap()[..], b"memo");
    }

    #[test]
    fn test_read_out_of_bounds() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();
        let mut memo = MemoFile::new(file.path());
        let pointer = MemoPointer { offset: 0x10FF, length: 5, modifier: 0 };
        assert!(matches!(memo.read(&pointer), Err(DataError::CorruptBlock { .. })));
    }
}
