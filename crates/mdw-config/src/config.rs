//! The manager configuration model.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the middleware manager.
///
/// All sections have sensible defaults; a configuration file only needs to
/// state what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// HTTP control-plane settings.
    pub server: ServerSettings,

    /// Logging settings.
    pub logging: LoggingSettings,

    /// Ordering engine settings.
    pub engine: EngineSettings,
}

impl ManagerConfig {
    /// Development preset: verbose, human-readable logging.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingSettings {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
            ..Self::default()
        }
    }

    /// Production preset: JSON logging at info level.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

/// HTTP control-plane settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    /// Address the manager listens on (and clients dial by default).
    pub http_addr: String,

    /// How long to wait for in-flight connections on shutdown.
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_addr: "localhost:7777".to_string(),
            shutdown_timeout_secs: 30,
            request_timeout_ms: 30_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Log level filter (e.g. "info", "debug", "mdw_server=debug,warn").
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Structured JSON, one object per line.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Ordering engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Treat hints aimed at unregistered middlewares as errors.
    pub strict_hints: bool,
}
