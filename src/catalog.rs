//! Table catalog.
//!
//! A catalog is a root directory; each subdirectory is a schema holding
//! `.DB` table files and `.QBE` views. The `information_schema` system schema
//! exposes connection state such as recorded warnings.

mod error;
mod pattern;
mod schema;
mod source;
mod system;
mod warning;

pub use error::CatalogError;
pub use pattern::{DEFAULT_ESCAPE, NamePattern, like_match};
pub use schema::{Schema, ViewDescriptor};
pub use source::{ColumnInfo, TableSource};
pub use system::{INFORMATION_SCHEMA, SystemTable, WARNINGS_TABLE};
pub use warning::{Warning, WarningSink};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::DecodeOptions;

/// Entry point for schema and table lookup.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    /// Opens a catalog rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(CatalogError::DirectoryNotFound { path: root });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the catalog (the root directory name).
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Schema names, sorted, followed by the system schema.
    pub fn list_schemas(&self) -> Result<Vec<String>, CatalogError> {
        let entries = fs::read_dir(&self.root).map_err(|source| CatalogError::Io {
            path: self.root.clone(),
            source,
        })?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort_by_key(|name| name.to_lowercase());
        names.push(INFORMATION_SCHEMA.to_string());
        info!(root = %self.root.display(), schemas = names.len(), "scanned catalog");
        Ok(names)
    }

    /// Looks up a schema directory by name, ignoring case.
    pub fn schema(&self, name: &str) -> Result<Schema, CatalogError> {
        let exact = self.root.join(name);
        if exact.is_dir() {
            return Ok(Schema::new(name, exact));
        }
        self.list_schemas()?
            .into_iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(name) && candidate != INFORMATION_SCHEMA)
            .map(|found| Schema::new(found.clone(), self.root.join(found)))
            .ok_or_else(|| CatalogError::SchemaNotFound {
                name: name.to_string(),
            })
    }

    /// Resolves a table reference to a row source.
    pub fn find_table(
        &self,
        schema: &str,
        name: &str,
        options: &DecodeOptions,
        warnings: &WarningSink,
    ) -> Result<Box<dyn TableSource>, CatalogError> {
        if schema.eq_ignore_ascii_case(INFORMATION_SCHEMA) {
            return Ok(Box::new(SystemTable::find(name, warnings)?));
        }
        let schema = self.schema(schema)?;
        Ok(Box::new(schema.find_table(name, options)?))
    }
}
