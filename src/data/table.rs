//! Table descriptors built from `.DB` file headers.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use tracing::debug;

use super::error::{DataError, DataResult};
use super::header::{FieldDescriptor, HeaderBytes, MIN_HEADER_SIZE, TableHeader, parse_fields};
use crate::datum::RoundingMode;

/// Bytes read up front; enough for the fixed header of every version.
const INITIAL_READ: usize = 2048;

/// Decoding settings taken from the connection.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Encoding used when the table's code page has no codec.
    pub charset: &'static Encoding,
    /// Rounding applied when BCD values carry more decimals than their scale.
    pub rounding: RoundingMode,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            charset: encoding_rs::WINDOWS_1252,
            rounding: RoundingMode::HalfUp,
        }
    }
}

/// An opened table: header metadata plus its field list.
///
/// Built once per statement and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    /// Table name (file stem).
    pub name: String,
    /// Owning schema name.
    pub schema: String,
    /// Path of the `.DB` file.
    pub path: PathBuf,
    pub header: TableHeader,
    pub fields: Vec<FieldDescriptor>,
    encoding: &'static Encoding,
    rounding: RoundingMode,
}

impl TableDescriptor {
    /// Reads the header of the table file at `path`.
    pub fn open(path: &Path, schema: &str, options: &DecodeOptions) -> DataResult<Self> {
        let data = read_header(path)?;
        let bytes = HeaderBytes::new(&data, path);
        let header = TableHeader::parse(&bytes)?;
        let encoding = header.encoding(options.charset);
        let fields = parse_fields(&bytes, &header, encoding)?;

        let storage: usize = fields.iter().map(FieldDescriptor::storage_size).sum();
        if storage > usize::from(header.record_size) {
            return Err(DataError::corrupt_header(
                path,
                format!(
                    "fields need {storage} bytes but records are {} bytes",
                    header.record_size
                ),
            ));
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(
            table = %name,
            version = header.version_name(),
            fields = fields.len(),
            rows = header.row_count,
            encoding = encoding.name(),
            "opened table"
        );

        Ok(Self {
            name,
            schema: schema.to_string(),
            path: path.to_path_buf(),
            header,
            fields,
            encoding,
            rounding: options.rounding,
        })
    }

    /// Encoding for text fields.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    /// Finds a field by name, ignoring case.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    pub fn row_count(&self) -> usize {
        self.header.row_count as usize
    }

    pub fn is_encrypted(&self) -> bool {
        self.header.is_encrypted()
    }

    /// Path of the memo file holding out-of-line values, if one exists.
    pub fn memo_path(&self) -> Option<PathBuf> {
        sibling_file(&self.path, "MB")
    }

    /// Path of the primary key file, if one exists.
    pub fn primary_key_path(&self) -> Option<PathBuf> {
        sibling_file(&self.path, "PX")
    }
}

/// Reads the whole header area of a table file.
fn read_header(path: &Path) -> DataResult<Vec<u8>> {
    let file = File::open(path).map_err(|e| DataError::io(path, e))?;
    let mut data = Vec::with_capacity(INITIAL_READ);
    let mut reader = file;
    (&mut reader)
        .take(INITIAL_READ as u64)
        .read_to_end(&mut data)
        .map_err(|e| DataError::io(path, e))?;
    if data.len() < MIN_HEADER_SIZE {
        return Err(DataError::corrupt_header(
            path,
            format!("file has only {} bytes", data.len()),
        ));
    }

    let header_size = usize::from(u16::from_le_bytes([data[2], data[3]]));
    if header_size > data.len() {
        reader
            .take((header_size - data.len()) as u64)
            .read_to_end(&mut data)
            .map_err(|e| DataError::io(path, e))?;
    }
    Ok(data)
}

/// Finds a file next to `path` with the same stem and the given extension in
/// either case.
pub(crate) fn sibling_file(path: &Path, extension: &str) -> Option<PathBuf> {
    [extension.to_ascii_uppercase(), extension.to_ascii_lowercase()]
        .into_iter()
        .map(|ext| path.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_minimal_table(dir: &Path, record_size: u16) -> PathBuf {
        let mut data = vec![0u8; 0x800];
        data[0x00..0x02].copy_from_slice(&record_size.to_le_bytes());
        data[0x02..0x04].copy_from_slice(&0x800u16.to_le_bytes());
        data[0x05] = 1;
        data[0x21..0x23].copy_from_slice(&1u16.to_le_bytes());
        data[0x39] = 0x0C;
        data[0x6A..0x6C].copy_from_slice(&1252u16.to_le_bytes());
        data[0x78] = 0x03;
        data[0x79] = 2;
        let names = 0x78 + 261 + 4 + 6;
        data[names..names + 3].copy_from_slice(b"ID\0");
        data[names + 3] = 1;

        let path = dir.join("people.DB");
        let mut file = File::create(&path).unwrap();
        file.write_all(&data).unwrap();
        path
    }

    #[test]
    fn test_open_table() {
        let dir = TempDir::new().unwrap();
        let path = write_minimal_table(dir.path(), 2);
        let table = TableDescriptor::open(&path, "main", &DecodeOptions::default()).unwrap();
        assert_eq!(table.name, "people");
        assert_eq!(table.schema, "main");
        assert_eq!(table.fields.len(), 1);
        assert_eq!(table.field("id").map(|f| f.index), Some(0));
        assert_eq!(table.encoding(), encoding_rs::WINDOWS_1252);
        assert!(table.memo_path().is_none());
    }

    #[test]
    fn test_fields_wider_than_record() {
        let dir = TempDir::new().unwrap();
        let path = write_minimal_table(dir.path(), 1);
        let err = TableDescriptor::open(&path, "main", &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::CorruptHeader { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = TableDescriptor::open(&dir.path().join("nope.db"), "main", &DecodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
