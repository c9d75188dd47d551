//! Block chain walking and record decoding.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Buf;
use tracing::{debug, trace};

use super::error::{DataError, DataResult};
use super::field::{FieldContext, parse_field, skip_field};
use super::memo::MemoFile;
use super::table::TableDescriptor;
use crate::datum::Value;

/// Size of the header at the start of each data block.
const BLOCK_HEADER_SIZE: usize = 6;

/// Header of a data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockHeader {
    next: u16,
    number: u16,
    add_data_size: i16,
}

impl BlockHeader {
    fn parse(mut buf: &[u8]) -> Self {
        Self {
            next: buf.get_u16_le(),
            number: buf.get_u16_le(),
            add_data_size: buf.get_i16_le(),
        }
    }

    /// Number of records packed in the block.
    fn record_count(&self, record_size: u16) -> usize {
        let count = i32::from(self.add_data_size).div_euclid(i32::from(record_size)) + 1;
        count.max(0) as usize
    }
}

/// Reads rows out of a table's data blocks.
pub struct TableData;

impl TableData {
    /// Loads every row of `table`, keeping only the fields at `field_ids`.
    ///
    /// Each returned row holds one value per requested field, in request order.
    pub fn load(
        table: &TableDescriptor,
        field_ids: &[usize],
        cancel: &AtomicBool,
    ) -> DataResult<Vec<Vec<Value>>> {
        if table.is_encrypted() {
            return Err(DataError::Encrypted {
                name: table.name.clone(),
            });
        }

        let header = &table.header;
        if header.used_blocks == 0 || header.first_block == 0 {
            return Ok(Vec::new());
        }

        // target[i] is where field i goes in the output row
        let mut target = vec![None; table.fields.len()];
        for (pos, &id) in field_ids.iter().enumerate() {
            if let Some(slot) = target.get_mut(id) {
                *slot = Some(pos);
            }
        }
        let last_needed = target.iter().rposition(Option::is_some);

        let path = &table.path;
        let mut file = File::open(path).map_err(|e| DataError::io(path, e))?;
        let mut memo = MemoFile::new(
            table
                .memo_path()
                .unwrap_or_else(|| path.with_extension("MB")),
        );
        let mut ctx = FieldContext {
            encoding: table.encoding(),
            rounding: table.rounding(),
            memo: &mut memo,
        };

        let block_size = header.block_size_bytes();
        let record_size = usize::from(header.record_size);
        let mut rows = Vec::with_capacity(table.row_count());
        let mut visited = HashSet::new();
        let mut buffer = Vec::with_capacity(block_size);
        let mut next = header.first_block;

        while next != 0 {
            if !visited.insert(next) {
                return Err(DataError::CorruptBlock {
                    path: path.clone(),
                    block: next,
                });
            }

            let position = usize::from(header.header_size) + usize::from(next - 1) * block_size;
            buffer.clear();
            file.seek(SeekFrom::Start(position as u64))
                .map_err(|e| DataError::io(path, e))?;
            (&mut file)
                .take(block_size as u64)
                .read_to_end(&mut buffer)
                .map_err(|e| DataError::io(path, e))?;
            if buffer.len() < BLOCK_HEADER_SIZE {
                return Err(DataError::CorruptBlock {
                    path: path.clone(),
                    block: next,
                });
            }

            let block = BlockHeader::parse(&buffer);
            let count = block.record_count(header.record_size);
            trace!(
                table = %table.name,
                block = next,
                number = block.number,
                records = count,
                "decoding block"
            );

            for i in 0..count {
                if cancel.load(Ordering::Relaxed) {
                    return Err(DataError::Cancelled);
                }
                let start = BLOCK_HEADER_SIZE + i * record_size;
                let record = buffer
                    .get(start..start + record_size)
                    .ok_or_else(|| DataError::CorruptBlock {
                        path: path.clone(),
                        block: next,
                    })?;
                rows.push(read_row(&mut ctx, table, record, &target, last_needed, field_ids.len())?);
            }

            next = block.next;
        }

        debug!(table = %table.name, rows = rows.len(), fields = field_ids.len(), "loaded table data");
        Ok(rows)
    }
}

fn read_row(
    ctx: &mut FieldContext<'_>,
    table: &TableDescriptor,
    mut record: &[u8],
    target: &[Option<usize>],
    last_needed: Option<usize>,
    width: usize,
) -> DataResult<Vec<Value>> {
    let mut row = vec![Value::Null; width];
    let Some(last) = last_needed else {
        return Ok(row);
    };
    for (field, slot) in table.fields.iter().zip(target).take(last + 1) {
        match slot {
            Some(pos) => row[*pos] = parse_field(ctx, &mut record, field)?,
            None => skip_field(&mut record, field)?,
        }
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_count() {
        let header = |add| BlockHeader {
            next: 0,
            number: 0,
            add_data_size: add,
        };
        assert_eq!(header(0).record_count(10), 1);
        assert_eq!(header(20).record_count(10), 3);
        assert_eq!(header(-10).record_count(10), 0);
        assert_eq!(header(-1).record_count(10), 0);
    }

    #[test]
    fn test_parse_block_header() {
        let block = BlockHeader::parse(&[0x02, 0x00, 0x01, 0x00, 0x14, 0x00]);
        assert_eq!(block.next, 2);
        assert_eq!(block.number, 1);
        assert_eq!(block.add_data_size, 20);
    }
}
