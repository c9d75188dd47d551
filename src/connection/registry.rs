//! Open connections and the handles that refer to them.
//!
//! Statements never own their connection: they keep a [`ConnectionId`] and
//! look the connection up in the registry on every call, so closing a
//! connection makes all of its statements fail with `NOT_CONNECTED`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::info;

use crate::catalog::{Catalog, INFORMATION_SCHEMA, NamePattern, SystemTable, ViewDescriptor, Warning};
use crate::data::TableDescriptor;
use crate::error::{Error, Result};

use super::info::ConnectionInfo;
use super::statement::{PreparedStatement, Statement};

/// Identifier of an open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State shared by a connection and its statements.
#[derive(Debug)]
pub(crate) struct ConnectionState {
    pub(crate) catalog: Catalog,
    pub(crate) info: RwLock<ConnectionInfo>,
}

/// Process-wide table of open connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    connections: RwLock<HashMap<ConnectionId, Arc<ConnectionState>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Opens a connection on the catalog at `info.catalog_root`.
    ///
    /// When no schema is configured the first schema of the catalog becomes
    /// current.
    pub fn open(self: &Arc<Self>, mut info: ConnectionInfo) -> Result<Connection> {
        let catalog = Catalog::open(&info.catalog_root)?;
        if info.schema.is_empty() {
            info.schema = catalog
                .list_schemas()?
                .into_iter()
                .next()
                .unwrap_or_else(|| INFORMATION_SCHEMA.to_string());
        } else if !info.schema.eq_ignore_ascii_case(INFORMATION_SCHEMA) {
            info.schema = catalog.schema(&info.schema)?.name().to_string();
        }

        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        info!(connection = %id, root = %info.catalog_root.display(), schema = %info.schema, "connection opened");
        let state = Arc::new(ConnectionState {
            catalog,
            info: RwLock::new(info),
        });
        self.connections.write().insert(id, state);
        Ok(Connection {
            id,
            registry: Arc::clone(self),
        })
    }

    /// Closes a connection. Returns false if it was not open.
    pub fn close(&self, id: ConnectionId) -> bool {
        let closed = self.connections.write().remove(&id).is_some();
        if closed {
            info!(connection = %id, "connection closed");
        }
        closed
    }

    pub fn is_open(&self, id: ConnectionId) -> bool {
        self.connections.read().contains_key(&id)
    }

    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    pub(crate) fn get(&self, id: ConnectionId) -> Result<Arc<ConnectionState>> {
        self.connections
            .read()
            .get(&id)
            .cloned()
            .ok_or(Error::NotConnected)
    }
}

/// Handle to an open connection.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    registry: Arc<ConnectionRegistry>,
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        !self.registry.is_open(self.id)
    }

    pub fn close(&self) {
        self.registry.close(self.id);
    }

    fn state(&self) -> Result<Arc<ConnectionState>> {
        self.registry.get(self.id)
    }

    /// Snapshot of the current settings.
    pub fn info(&self) -> Result<ConnectionInfo> {
        Ok(self.state()?.info.read().clone())
    }

    /// Name of the current schema.
    pub fn schema(&self) -> Result<String> {
        Ok(self.state()?.info.read().schema.clone())
    }

    /// Makes `name` the current schema.
    pub fn set_schema(&self, name: &str) -> Result<()> {
        let state = self.state()?;
        let name = if name.eq_ignore_ascii_case(INFORMATION_SCHEMA) {
            INFORMATION_SCHEMA.to_string()
        } else {
            state.catalog.schema(name)?.name().to_string()
        };
        state.info.write().schema = name;
        Ok(())
    }

    /// Catalog (root directory) name.
    pub fn catalog_name(&self) -> Result<String> {
        Ok(self.state()?.catalog.name())
    }

    pub fn list_schemas(&self) -> Result<Vec<String>> {
        Ok(self.state()?.catalog.list_schemas()?)
    }

    /// Tables of the current schema whose name matches a LIKE `pattern`.
    ///
    /// Table files that cannot be opened are skipped and recorded as
    /// warnings.
    pub fn list_tables(&self, pattern: Option<&str>) -> Result<Vec<TableDescriptor>> {
        let state = self.state()?;
        let info = state.info.read().clone();
        if info.schema.eq_ignore_ascii_case(INFORMATION_SCHEMA) {
            return Ok(Vec::new());
        }
        let pattern = NamePattern::new(pattern, Some(info.escape));
        let schema = state.catalog.schema(&info.schema)?;
        Ok(schema.list_tables(&pattern, &info.decode_options(), &info.warnings)?)
    }

    /// System tables matching a LIKE `pattern`.
    pub fn list_system_tables(&self, pattern: Option<&str>) -> Result<Vec<&'static str>> {
        let escape = self.state()?.info.read().escape;
        Ok(SystemTable::list(&NamePattern::new(pattern, Some(escape))))
    }

    /// Views of the current schema whose name matches a LIKE `pattern`.
    pub fn list_views(&self, pattern: Option<&str>) -> Result<Vec<ViewDescriptor>> {
        let state = self.state()?;
        let info = state.info.read().clone();
        if info.schema.eq_ignore_ascii_case(INFORMATION_SCHEMA) {
            return Ok(Vec::new());
        }
        let schema = state.catalog.schema(&info.schema)?;
        Ok(schema.list_views(&NamePattern::new(pattern, Some(info.escape)))?)
    }

    /// Warnings recorded since the last [`clear_warnings`](Self::clear_warnings).
    pub fn warnings(&self) -> Result<Vec<Warning>> {
        Ok(self.state()?.info.read().warnings.snapshot())
    }

    pub fn clear_warnings(&self) -> Result<()> {
        self.state()?.info.read().warnings.clear();
        Ok(())
    }

    /// Creates a statement for ad-hoc SQL text.
    pub fn create_statement(&self) -> Result<Statement> {
        let max_rows = self.state()?.info.read().max_rows;
        Ok(Statement::new(self.id, Arc::clone(&self.registry), max_rows))
    }

    /// Parses `sql` into a prepared statement.
    pub fn prepare(&self, sql: &str) -> Result<PreparedStatement> {
        let max_rows = self.state()?.info.read().max_rows;
        PreparedStatement::new(self.id, Arc::clone(&self.registry), sql, max_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::fs;
    use tempfile::TempDir;

    fn catalog_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("geog")).unwrap();
        fs::create_dir(dir.path().join("fields")).unwrap();
        dir
    }

    #[test]
    fn test_open_and_close() {
        let dir = catalog_dir();
        let registry = ConnectionRegistry::new();
        let conn = registry.open(ConnectionInfo::new(dir.path())).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(conn.schema().unwrap(), "fields");

        conn.close();
        assert!(conn.is_closed());
        assert!(registry.is_empty());
        assert_eq!(conn.schema().unwrap_err().code(), ErrorCode::NotConnected);
        assert!(!registry.close(conn.id()));
    }

    #[test]
    fn test_ids_are_distinct() {
        let dir = catalog_dir();
        let registry = ConnectionRegistry::new();
        let a = registry.open(ConnectionInfo::new(dir.path())).unwrap();
        let b = registry.open(ConnectionInfo::new(dir.path())).unwrap();
        assert_ne!(a.id(), b.id());
        a.close();
        assert!(!b.is_closed());
    }

    #[test]
    fn test_set_schema() {
        let dir = catalog_dir();
        let registry = ConnectionRegistry::new();
        let conn = registry
            .open(ConnectionInfo::new(dir.path()).with_schema("GEOG"))
            .unwrap();
        assert_eq!(conn.schema().unwrap(), "geog");

        conn.set_schema("information_schema").unwrap();
        assert_eq!(conn.schema().unwrap(), INFORMATION_SCHEMA);
        assert!(conn.list_tables(None).unwrap().is_empty());

        let err = conn.set_schema("nope").unwrap_err();
        assert_eq!(err.code(), ErrorCode::SchemaNotFound);
    }

    #[test]
    fn test_open_missing_root() {
        let dir = TempDir::new().unwrap();
        let registry = ConnectionRegistry::new();
        let err = registry
            .open(ConnectionInfo::new(dir.path().join("missing")))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DirectoryNotFound);
    }

    #[test]
    fn test_system_tables() {
        let dir = catalog_dir();
        let registry = ConnectionRegistry::new();
        let conn = registry.open(ConnectionInfo::new(dir.path())).unwrap();
        assert_eq!(conn.list_system_tables(Some("pdx%")).unwrap(), vec!["pdx_warnings"]);
        assert!(conn.list_system_tables(Some("x%")).unwrap().is_empty());
    }
}
