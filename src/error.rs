//! Error types for metricpipe parsing

use thiserror::Error;
use crate::validator::ConfigError;

/// Errors that can occur while reading templates, configurations or settings
#[derive(Debug, Error)]
pub enum ParseError {
    /// IO error reading file
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// YAML deserialization error
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON deserialization error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The text parsed but describes an invalid metric configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}
