//! Configuration error types.

use std::path::PathBuf;

use mdw_engine::OrderingError;
use thiserror::Error;

/// Errors that can occur while loading configuration or manifests.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read a configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension maps to no supported format.
    #[error("unsupported configuration format: {extension}")]
    UnsupportedFormat {
        /// The offending extension (or the whole path if it has none).
        extension: String,
    },

    /// Environment variable override could not be parsed.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParse {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field with the invalid value.
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },

    /// A middleware manifest entry was rejected by the engine.
    #[error("invalid middleware manifest: {source}")]
    Manifest {
        /// The registration error raised by the engine.
        #[from]
        source: OrderingError,
    },
}

impl ConfigError {
    /// Creates a new file-not-found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new unsupported-format error.
    pub fn unsupported_format(extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    /// Creates a new environment variable parse error.
    pub fn env_parse(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParse {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new invalid-value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_display() {
        let err = ConfigError::file_not_found("/etc/mdw/config.toml");
        assert!(err.to_string().contains("/etc/mdw/config.toml"));
    }

    #[test]
    fn test_env_parse_display() {
        let err = ConfigError::env_parse("MIDDLEWARE__SERVER__REQUEST_TIMEOUT_MS", "expected integer");
        assert!(err.to_string().contains("MIDDLEWARE__SERVER__REQUEST_TIMEOUT_MS"));
        assert!(err.to_string().contains("expected integer"));
    }

    #[test]
    fn test_manifest_error_wraps_engine_error() {
        let err = ConfigError::from(OrderingError::duplicate_name("cookie"));
        assert!(err.to_string().contains("cookie"));
    }
}
