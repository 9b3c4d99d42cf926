//! Error types for meter-filter
//!
//! Filter evaluation itself never fails; these errors only come out of loading
//! and validating declarative chain configuration.

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read filter config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse filter config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid filter config in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },
}

/// Convenience type alias for Results
pub type FilterResult<T> = Result<T, FilterError>;
