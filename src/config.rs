//! Configuration file support.
//!
//! Loads connection and tool settings from TOML. Every field has a default,
//! so an empty file is a valid configuration.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::DEFAULT_ESCAPE;
use crate::connection::ConnectionInfo;
use crate::data::resolve_charset;
use crate::datum::RoundingMode;
use crate::executor::ParallelOptions;

/// Name of the configuration file looked up by [`Config::load_default`].
pub const CONFIG_FILE: &str = "pdxsql.toml";

/// Errors loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unknown charset '{0}'")]
    UnknownCharset(String),

    #[error("no schema root configured")]
    MissingSchemaRoot,
}

/// Settings of a connection and of the command-line tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog directory whose subdirectories are schemas.
    pub schema_root: Option<PathBuf>,
    /// Current schema; the first schema of the catalog when unset.
    pub schema: Option<String>,
    /// Fallback text encoding label.
    pub charset: String,
    pub locale: String,
    /// `true` rounds BCD values half up, `false` truncates.
    pub bcd_rounding: bool,
    pub escape_char: char,
    /// 0 is unlimited.
    pub max_rows: usize,
    pub parallel_scan: bool,
    pub parallel_threshold: usize,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let parallel = ParallelOptions::default();
        Self {
            schema_root: None,
            schema: None,
            charset: "windows-1252".to_string(),
            locale: "en".to_string(),
            bcd_rounding: true,
            escape_char: DEFAULT_ESCAPE,
            max_rows: 0,
            parallel_scan: parallel.enabled,
            parallel_threshold: parallel.threshold,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads `./pdxsql.toml`, then `~/.pdxsql.toml`, falling back to the
    /// defaults when neither exists.
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(home) = env::var_os("HOME") {
            candidates.push(PathBuf::from(home).join(format!(".{CONFIG_FILE}")));
        }
        match candidates.into_iter().find(|path| path.is_file()) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn rounding(&self) -> RoundingMode {
        if self.bcd_rounding {
            RoundingMode::HalfUp
        } else {
            RoundingMode::Floor
        }
    }

    /// Builds the settings of a new connection.
    pub fn connection_info(&self) -> Result<ConnectionInfo, ConfigError> {
        let root = self.schema_root.clone().ok_or(ConfigError::MissingSchemaRoot)?;
        let charset =
            resolve_charset(&self.charset).ok_or_else(|| ConfigError::UnknownCharset(self.charset.clone()))?;

        let mut info = ConnectionInfo::new(root).with_schema(self.schema.clone().unwrap_or_default());
        info.charset = charset;
        info.locale = self.locale.clone();
        info.rounding = self.rounding();
        info.escape = self.escape_char;
        info.max_rows = self.max_rows;
        info.parallel = ParallelOptions {
            enabled: self.parallel_scan,
            threshold: self.parallel_threshold,
        };
        Ok(info)
    }
}
