//! Row sources the executor can read from.

use std::fmt;
use std::sync::atomic::AtomicBool;

use encoding_rs::Encoding;

use super::error::CatalogError;
use crate::data::{TableData, TableDescriptor};
use crate::datum::{Type, Value};

/// Metadata of one column of a row source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub ty: Type,
}

/// A named table that can load its rows.
pub trait TableSource: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn schema(&self) -> &str;

    /// Columns in storage order.
    fn columns(&self) -> Vec<ColumnInfo>;

    /// Charset text columns were decoded with, if the source has one.
    fn charset(&self) -> Option<&'static Encoding> {
        None
    }

    /// Loads every row, keeping only the columns at `fields` in that order.
    fn load(&self, fields: &[usize], cancel: &AtomicBool) -> Result<Vec<Vec<Value>>, CatalogError>;
}

impl TableSource for TableDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &str {
        &self.schema
    }

    fn columns(&self) -> Vec<ColumnInfo> {
        self.fields
            .iter()
            .map(|field| ColumnInfo {
                name: field.name.clone(),
                ty: field.field_type().map_or(Type::Null, |t| t.sql_type()),
            })
            .collect()
    }

    fn charset(&self) -> Option<&'static Encoding> {
        Some(self.encoding())
    }

    fn load(&self, fields: &[usize], cancel: &AtomicBool) -> Result<Vec<Vec<Value>>, CatalogError> {
        Ok(TableData::load(self, fields, cancel)?)
    }
}
