//! Writes Paradox 7 table files for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use tempfile::TempDir;

use pdxsql::{Connection, ConnectionInfo, ConnectionRegistry, ResultSet, Value};

const HEADER_SIZE: usize = 0x800;
const BLOCK_SIZE: usize = 0x400;
const BLOCK_HEADER_SIZE: usize = 6;

/// Cell value written into a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Short(i16),
    Long(i32),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<i16> for Cell {
    fn from(n: i16) -> Self {
        Cell::Short(n)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Long(n)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

/// Field declaration: name, type code, size.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    code: u8,
    size: u8,
}

pub fn alpha(name: &str, size: u8) -> Field {
    Field {
        name: name.to_string(),
        code: 0x01,
        size,
    }
}

pub fn short(name: &str) -> Field {
    Field {
        name: name.to_string(),
        code: 0x03,
        size: 2,
    }
}

pub fn long(name: &str) -> Field {
    Field {
        name: name.to_string(),
        code: 0x04,
        size: 4,
    }
}

pub fn number(name: &str) -> Field {
    Field {
        name: name.to_string(),
        code: 0x06,
        size: 8,
    }
}

pub fn logical(name: &str) -> Field {
    Field {
        name: name.to_string(),
        code: 0x09,
        size: 1,
    }
}

pub fn date(name: &str) -> Field {
    Field {
        name: name.to_string(),
        code: 0x02,
        size: 4,
    }
}

fn encode(cell: &Cell, field: &Field) -> Vec<u8> {
    let size = usize::from(field.size);
    match cell {
        Cell::Null => vec![0; size],
        Cell::Text(s) => {
            let mut bytes = s.as_bytes().to_vec();
            bytes.resize(size, 0);
            bytes
        }
        Cell::Short(n) => ((*n as u16) ^ 0x8000).to_be_bytes().to_vec(),
        Cell::Long(n) => ((*n as u32) ^ 0x8000_0000).to_be_bytes().to_vec(),
        Cell::Number(n) => {
            let bits = n.to_bits();
            let raw = if *n >= 0.0 { bits | (1 << 63) } else { !bits };
            raw.to_be_bytes().to_vec()
        }
        Cell::Bool(b) => vec![if *b { 0x81 } else { 0x80 }],
        Cell::Date(d) => ((d.num_days_from_ce() as u32) | 0x8000_0000).to_be_bytes().to_vec(),
    }
}

/// Builder for one `.DB` file.
#[derive(Debug, Clone)]
pub struct TableFile {
    name: String,
    fields: Vec<Field>,
    rows: Vec<Vec<Cell>>,
    encrypted: bool,
}

impl TableFile {
    pub fn new(name: &str, fields: Vec<Field>) -> Self {
        Self {
            name: name.to_string(),
            fields,
            rows: Vec::new(),
            encrypted: false,
        }
    }

    pub fn row(mut self, cells: Vec<Cell>) -> Self {
        assert_eq!(cells.len(), self.fields.len());
        self.rows.push(cells);
        self
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = Vec<Cell>>) -> Self {
        for row in rows {
            self = self.row(row);
        }
        self
    }

    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    fn record_size(&self) -> usize {
        self.fields.iter().map(|f| usize::from(f.size)).sum()
    }

    /// Writes the table into `dir` and returns its path.
    pub fn write(&self, dir: &Path) -> PathBuf {
        let record_size = self.record_size();
        let per_block = (BLOCK_SIZE - BLOCK_HEADER_SIZE) / record_size;
        let blocks: Vec<&[Vec<Cell>]> = self.rows.chunks(per_block).collect();
        let n = self.fields.len();

        let mut data = vec![0u8; HEADER_SIZE];
        data[0x00..0x02].copy_from_slice(&(record_size as u16).to_le_bytes());
        data[0x02..0x04].copy_from_slice(&(HEADER_SIZE as u16).to_le_bytes());
        data[0x05] = (BLOCK_SIZE / 1024) as u8;
        data[0x06..0x0A].copy_from_slice(&(self.rows.len() as u32).to_le_bytes());
        data[0x0A..0x0C].copy_from_slice(&(blocks.len() as u16).to_le_bytes());
        data[0x0C..0x0E].copy_from_slice(&(blocks.len() as u16).to_le_bytes());
        let first = if blocks.is_empty() { 0u16 } else { 1 };
        data[0x0E..0x10].copy_from_slice(&first.to_le_bytes());
        data[0x10..0x12].copy_from_slice(&(blocks.len() as u16).to_le_bytes());
        data[0x21..0x23].copy_from_slice(&(n as u16).to_le_bytes());
        if self.encrypted {
            data[0x25..0x29].copy_from_slice(&0x1234_5678u32.to_le_bytes());
        }
        data[0x39] = 0x0C;
        data[0x6A..0x6C].copy_from_slice(&1252u16.to_le_bytes());

        for (i, field) in self.fields.iter().enumerate() {
            data[0x78 + 2 * i] = field.code;
            data[0x79 + 2 * i] = field.size;
        }
        let mut pos = 0x78 + 261 + 4 + 6 * n;
        for field in &self.fields {
            data[pos..pos + field.name.len()].copy_from_slice(field.name.as_bytes());
            pos += field.name.len() + 1;
        }
        for i in 0..n {
            data[pos + i] = (i + 1) as u8;
        }

        for (index, rows) in blocks.iter().enumerate() {
            let mut block = vec![0u8; BLOCK_SIZE];
            let next = if index + 1 < blocks.len() { index as u16 + 2 } else { 0 };
            block[0..2].copy_from_slice(&next.to_le_bytes());
            block[2..4].copy_from_slice(&(index as u16).to_le_bytes());
            let add = ((rows.len() - 1) * record_size) as i16;
            block[4..6].copy_from_slice(&add.to_le_bytes());
            let mut offset = BLOCK_HEADER_SIZE;
            for row in rows.iter() {
                for (cell, field) in row.iter().zip(&self.fields) {
                    let bytes = encode(cell, field);
                    block[offset..offset + bytes.len()].copy_from_slice(&bytes);
                    offset += bytes.len();
                }
            }
            data.extend_from_slice(&block);
        }

        let path = dir.join(format!("{}.DB", self.name));
        fs::write(&path, data).unwrap();
        path
    }
}

/// Area codes and states, the classic sample data set.
pub fn areacodes() -> TableFile {
    TableFile::new(
        "areacodes",
        vec![short("ac"), alpha("state", 2), alpha("cities", 20)],
    )
    .rows([
        vec![Cell::Short(201), "NJ".into(), "Hackensack".into()],
        vec![Cell::Short(202), "DC".into(), "Washington".into()],
        vec![Cell::Short(203), "CT".into(), "New Haven".into()],
        vec![Cell::Short(204), "MB".into(), Cell::Null],
        vec![Cell::Short(205), "AL".into(), "Birmingham".into()],
        vec![Cell::Short(206), "WA".into(), "Seattle".into()],
        vec![Cell::Short(207), "ME".into(), "Portland".into()],
        vec![Cell::Short(973), "NJ".into(), "Newark".into()],
    ])
}

pub fn states() -> TableFile {
    TableFile::new("states", vec![alpha("code", 2), alpha("name", 20), logical("coastal")]).rows([
        vec!["NJ".into(), "New Jersey".into(), true.into()],
        vec!["CT".into(), "Connecticut".into(), true.into()],
        vec!["TX".into(), "Texas".into(), true.into()],
        vec!["CO".into(), "Colorado".into(), false.into()],
    ])
}

pub fn orders() -> TableFile {
    let day = |d| Cell::Date(NaiveDate::from_ymd_opt(2020, 1, d).unwrap());
    TableFile::new(
        "orders",
        vec![long("id"), alpha("state", 2), number("amount"), date("placed")],
    )
    .rows([
        vec![Cell::Long(1), "NJ".into(), 10.5.into(), day(3)],
        vec![Cell::Long(2), "CT".into(), 4.25.into(), day(1)],
        vec![Cell::Long(3), "NJ".into(), (-2.0).into(), day(2)],
        vec![Cell::Long(4), "TX".into(), Cell::Null, day(2)],
        vec![Cell::Long(5), "NJ".into(), 7.0.into(), Cell::Null],
    ])
}

/// A catalog with schemas `geog` (areacodes, states) and `sales` (orders).
pub struct Fixture {
    pub dir: TempDir,
    pub registry: std::sync::Arc<ConnectionRegistry>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let geog = dir.path().join("geog");
        let sales = dir.path().join("sales");
        fs::create_dir(&geog).unwrap();
        fs::create_dir(&sales).unwrap();
        areacodes().write(&geog);
        states().write(&geog);
        orders().write(&sales);
        Self {
            dir,
            registry: ConnectionRegistry::new(),
        }
    }

    pub fn schema_dir(&self, schema: &str) -> PathBuf {
        self.dir.path().join(schema)
    }

    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo::new(self.dir.path()).with_schema("geog")
    }

    pub fn connect(&self) -> Connection {
        self.registry.open(self.info()).unwrap()
    }

    pub fn query(&self, sql: &str) -> ResultSet {
        self.connect()
            .create_statement()
            .unwrap()
            .execute_query(sql)
            .unwrap_or_else(|e| panic!("{sql}: {e}"))
    }
}

/// Writes a file that cannot be opened as a table.
pub fn write_corrupt(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{name}.DB"));
    fs::write(&path, [0u8; 16]).unwrap();
    path
}

/// Writes a saved query file.
pub fn write_view(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{name}.QBE"));
    fs::write(&path, b"Query\r\nANSWER: :PRIV:ANSWER.DB\r\n").unwrap();
    path
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub fn int(n: i64) -> Value {
    Value::Integer(n)
}

/// Column `index` of every row.
pub fn column(result: &ResultSet, index: usize) -> Vec<Value> {
    result.rows().iter().map(|row| row[index].clone()).collect()
}
