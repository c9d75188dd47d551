//! Schema directories and the tables and views they hold.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::CatalogError;
use super::pattern::NamePattern;
use super::warning::{Warning, WarningSink};
use crate::data::{DecodeOptions, PrimaryKeyDescriptor, TableDescriptor};

const TABLE_EXTENSION: &str = "db";
const VIEW_EXTENSION: &str = "qbe";

/// A saved query file, listed but never executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub name: String,
    pub schema: String,
    pub path: PathBuf,
}

/// A directory of table files.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    path: PathBuf,
}

impl Schema {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Files in this schema with the given extension, sorted by name.
    fn files(&self, extension: &str) -> Result<Vec<(String, PathBuf)>, CatalogError> {
        let entries = fs::read_dir(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut files: Vec<(String, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            })
            .filter_map(|path| {
                let stem = path.file_stem()?.to_string_lossy().into_owned();
                Some((stem, path))
            })
            .collect();
        files.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));
        Ok(files)
    }

    /// Opens every table whose name matches `pattern`.
    ///
    /// Files that fail to open are skipped and recorded in `warnings`.
    pub fn list_tables(
        &self,
        pattern: &NamePattern,
        options: &DecodeOptions,
        warnings: &WarningSink,
    ) -> Result<Vec<TableDescriptor>, CatalogError> {
        let mut tables = Vec::new();
        for (name, path) in self.files(TABLE_EXTENSION)? {
            if !pattern.matches(&name) {
                continue;
            }
            match TableDescriptor::open(&path, &self.name, options) {
                Ok(table) => tables.push(table),
                Err(err) => {
                    warn!(schema = %self.name, table = %name, error = %err, "skipping table");
                    warnings.push(Warning::from_error(&self.name, err.code(), &err));
                }
            }
        }
        debug!(schema = %self.name, count = tables.len(), "listed tables");
        Ok(tables)
    }

    /// Lists the views whose name matches `pattern`.
    pub fn list_views(&self, pattern: &NamePattern) -> Result<Vec<ViewDescriptor>, CatalogError> {
        Ok(self
            .files(VIEW_EXTENSION)?
            .into_iter()
            .filter(|(name, _)| pattern.matches(name))
            .map(|(name, path)| ViewDescriptor {
                name,
                schema: self.name.clone(),
                path,
            })
            .collect())
    }

    /// Opens a single table by name, ignoring case. A trailing `.db` is ignored.
    pub fn find_table(&self, name: &str, options: &DecodeOptions) -> Result<TableDescriptor, CatalogError> {
        let name = strip_extension(name, TABLE_EXTENSION);
        let path = self
            .files(TABLE_EXTENSION)?
            .into_iter()
            .find(|(stem, _)| stem.eq_ignore_ascii_case(name))
            .map(|(_, path)| path);

        match path {
            Some(path) => Ok(TableDescriptor::open(&path, &self.name, options)?),
            None if self.find_view(name)?.is_some() => Err(CatalogError::ViewNotSupported {
                name: name.to_string(),
            }),
            None => Err(CatalogError::TableNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Finds a view by name, ignoring case.
    pub fn find_view(&self, name: &str) -> Result<Option<ViewDescriptor>, CatalogError> {
        Ok(self
            .list_views(&NamePattern::any())?
            .into_iter()
            .find(|view| view.name.eq_ignore_ascii_case(name)))
    }

    /// Reads the primary key header of a table, if it has one.
    pub fn load_primary_key(
        &self,
        table: &TableDescriptor,
    ) -> Result<Option<PrimaryKeyDescriptor>, CatalogError> {
        match table.primary_key_path() {
            Some(path) => Ok(Some(PrimaryKeyDescriptor::open(&path)?)),
            None => Ok(None),
        }
    }
}

fn strip_extension<'a>(name: &'a str, extension: &str) -> &'a str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case(extension) => stem,
        _ => name,
    }
}
