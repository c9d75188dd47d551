//! Connection layer.
//!
//! A [`ConnectionRegistry`] owns every open connection. [`Connection`],
//! [`Statement`] and [`PreparedStatement`] are lightweight handles holding a
//! [`ConnectionId`]; each call resolves the connection through the registry
//! and runs the executor with the connection's [`ConnectionInfo`].

mod info;
mod registry;
mod result_set;
mod statement;

pub use info::ConnectionInfo;
pub use registry::{Connection, ConnectionId, ConnectionRegistry};
pub use result_set::ResultSet;
pub use statement::{PreparedStatement, Statement};
