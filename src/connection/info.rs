//! Per-connection settings.

use std::path::PathBuf;
use std::sync::Arc;

use encoding_rs::Encoding;

use crate::catalog::{DEFAULT_ESCAPE, WarningSink};
use crate::data::DecodeOptions;
use crate::datum::RoundingMode;
use crate::executor::ParallelOptions;
use crate::function::FunctionContext;

/// Settings every decode, plan and execute call of a connection runs with.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Catalog root directory; each subdirectory is a schema.
    pub catalog_root: PathBuf,
    /// Schema unqualified table names resolve in.
    pub schema: String,
    pub locale: String,
    /// Fallback text encoding for tables whose code page has no codec.
    pub charset: &'static Encoding,
    pub rounding: RoundingMode,
    /// Escape character of LIKE patterns.
    pub escape: char,
    /// Default row limit of new statements; 0 is unlimited.
    pub max_rows: usize,
    pub parallel: ParallelOptions,
    pub warnings: Arc<WarningSink>,
}

impl ConnectionInfo {
    /// Creates settings with defaults for everything but the catalog root.
    pub fn new(catalog_root: impl Into<PathBuf>) -> Self {
        Self {
            catalog_root: catalog_root.into(),
            schema: String::new(),
            locale: "en".to_string(),
            charset: encoding_rs::WINDOWS_1252,
            rounding: RoundingMode::HalfUp,
            escape: DEFAULT_ESCAPE,
            max_rows: 0,
            parallel: ParallelOptions::default(),
            warnings: Arc::new(WarningSink::new()),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            charset: self.charset,
            rounding: self.rounding,
        }
    }

    pub fn function_context(&self) -> FunctionContext {
        FunctionContext {
            rounding: self.rounding,
            charset: self.charset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let info = ConnectionInfo::new("/data").with_schema("geog");
        assert_eq!(info.schema, "geog");
        assert_eq!(info.escape, '\\');
        assert_eq!(info.decode_options().charset, encoding_rs::WINDOWS_1252);
        assert_eq!(info.function_context().rounding, RoundingMode::HalfUp);
        assert!(info.warnings.is_empty());
    }
}
