pub mod catalog;
pub mod config;
pub mod connection;
pub mod data;
pub mod datum;
pub mod error;
pub mod executor;
pub mod function;
pub mod sql;

pub use config::Config;
pub use connection::{Connection, ConnectionInfo, ConnectionRegistry, PreparedStatement, ResultSet, Statement};
pub use datum::{Type, Value};
pub use error::{Error, ErrorCode, Result};
