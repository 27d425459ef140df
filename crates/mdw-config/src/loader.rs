//! Layered configuration loading.
//!
//! Configuration is applied in layers, later layers overriding earlier
//! ones: built-in defaults, then an optional file (TOML or JSON), then
//! environment variables.

use std::env;
use std::fs;
use std::path::Path;

use crate::config::{LogFormat, ManagerConfig};
use crate::error::ConfigError;

/// The environment variable the original deployment used for the manager
/// address. Honored regardless of the configured prefix.
pub const HOST_ENV_VAR: &str = "MIDDLEWARE_HOST";

/// Default environment variable prefix for overrides.
pub const DEFAULT_ENV_PREFIX: &str = "MIDDLEWARE";

/// Layered configuration loader.
///
/// # Example
///
/// ```no_run
/// use mdw_config::ConfigLoader;
///
/// # fn main() -> Result<(), mdw_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("manager.toml")?
///     .with_env_prefix("MIDDLEWARE")
///     .load()?;
///
/// println!("listening on {}", config.server.http_addr);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: ManagerConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader holding the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = ManagerConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = ManagerConfig::production();
        self
    }

    /// Loads configuration from a file, replacing the current layer.
    ///
    /// The format is chosen by extension: `.toml` or `.json`. Fields the
    /// file does not mention keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, has an
    /// unsupported extension, or fails to parse.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            Some(other) => return Err(ConfigError::unsupported_format(other)),
            None => return Err(ConfigError::unsupported_format(path.display().to_string())),
        };

        Ok(self)
    }

    /// Loads configuration from a file if it exists, silently continuing
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in the given format ("toml" or
    /// "json").
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unknown or parsing fails.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::unsupported_format(other)),
        };
        Ok(self)
    }

    /// Sets the prefix for environment variable overrides.
    ///
    /// Overrides use the format `PREFIX__SECTION__KEY`, for example
    /// `MIDDLEWARE__SERVER__HTTP_ADDR=0.0.0.0:9000`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Finalizes the configuration, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvParse` if an override value does not parse
    /// as the field's type.
    pub fn load(mut self) -> Result<ManagerConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            apply_env_overrides(&mut self.config, &prefix)?;
        }

        // The original deployment configured the manager address with a
        // single flat variable; keep honoring it.
        if let Ok(host) = env::var(HOST_ENV_VAR) {
            if !host.is_empty() {
                self.config.server.http_addr = host;
            }
        }

        Ok(self.config)
    }
}

fn apply_env_overrides(config: &mut ManagerConfig, prefix: &str) -> Result<(), ConfigError> {
    if let Some(value) = read_env(prefix, "SERVER", "HTTP_ADDR") {
        config.server.http_addr = value;
    }
    if let Some(value) = read_env(prefix, "SERVER", "SHUTDOWN_TIMEOUT_SECS") {
        config.server.shutdown_timeout_secs = parse_env(prefix, "SERVER__SHUTDOWN_TIMEOUT_SECS", &value)?;
    }
    if let Some(value) = read_env(prefix, "SERVER", "REQUEST_TIMEOUT_MS") {
        config.server.request_timeout_ms = parse_env(prefix, "SERVER__REQUEST_TIMEOUT_MS", &value)?;
    }
    if let Some(value) = read_env(prefix, "LOGGING", "LEVEL") {
        config.logging.level = value;
    }
    if let Some(value) = read_env(prefix, "LOGGING", "FORMAT") {
        config.logging.format = value
            .parse::<LogFormat>()
            .map_err(|reason| ConfigError::env_parse(format!("{prefix}__LOGGING__FORMAT"), reason))?;
    }
    if let Some(value) = read_env(prefix, "ENGINE", "STRICT_HINTS") {
        config.engine.strict_hints = parse_env(prefix, "ENGINE__STRICT_HINTS", &value)?;
    }
    Ok(())
}

fn read_env(prefix: &str, section: &str, key: &str) -> Option<String> {
    env::var(format!("{prefix}__{section}__{key}")).ok()
}

fn parse_env<T: std::str::FromStr>(prefix: &str, suffix: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::env_parse(format!("{prefix}__{suffix}"), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, ManagerConfig::default());
    }

    #[test]
    fn test_with_string_toml() {
        let config = ConfigLoader::new()
            .with_string(
                r#"
                [server]
                http_addr = "127.0.0.1:3000"

                [engine]
                strict_hints = true
                "#,
                "toml",
            )
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert!(config.engine.strict_hints);
    }

    #[test]
    fn test_with_string_json() {
        let config = ConfigLoader::new()
            .with_string(r#"{"logging": {"level": "trace"}}"#, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_with_string_unknown_format() {
        let result = ConfigLoader::new().with_string("server: {}", "yaml");
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_with_file_missing() {
        let result = ConfigLoader::new().with_file("/nonexistent/manager.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_with_optional_file_missing_is_ok() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/manager.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, ManagerConfig::default());
    }

    #[test]
    fn test_with_file_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manager.toml");
        std::fs::write(&path, "[server]\nhttp_addr = \"0.0.0.0:8888\"\n").unwrap();

        let config = ConfigLoader::new()
            .with_file(&path)
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8888");
    }

    #[test]
    fn test_with_file_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manager.yaml");
        std::fs::write(&path, "server: {}\n").unwrap();

        let result = ConfigLoader::new().with_file(&path);
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_env_override_string_field() {
        env::set_var("MDWTEST_A__SERVER__HTTP_ADDR", "10.0.0.1:7000");

        let config = ConfigLoader::new()
            .with_env_prefix("MDWTEST_A")
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "10.0.0.1:7000");

        env::remove_var("MDWTEST_A__SERVER__HTTP_ADDR");
    }

    #[test]
    fn test_env_override_parsed_fields() {
        env::set_var("MDWTEST_B__SERVER__SHUTDOWN_TIMEOUT_SECS", "5");
        env::set_var("MDWTEST_B__ENGINE__STRICT_HINTS", "true");
        env::set_var("MDWTEST_B__LOGGING__FORMAT", "pretty");

        let config = ConfigLoader::new()
            .with_env_prefix("MDWTEST_B")
            .load()
            .unwrap();
        assert_eq!(config.server.shutdown_timeout_secs, 5);
        assert!(config.engine.strict_hints);
        assert_eq!(config.logging.format, LogFormat::Pretty);

        env::remove_var("MDWTEST_B__SERVER__SHUTDOWN_TIMEOUT_SECS");
        env::remove_var("MDWTEST_B__ENGINE__STRICT_HINTS");
        env::remove_var("MDWTEST_B__LOGGING__FORMAT");
    }

    #[test]
    fn test_env_override_rejects_bad_integer() {
        env::set_var("MDWTEST_C__SERVER__REQUEST_TIMEOUT_MS", "soon");

        let result = ConfigLoader::new().with_env_prefix("MDWTEST_C").load();
        assert!(matches!(result, Err(ConfigError::EnvParse { .. })));

        env::remove_var("MDWTEST_C__SERVER__REQUEST_TIMEOUT_MS");
    }
}
