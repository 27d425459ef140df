//! Middleware manifests.
//!
//! A manifest is the on-disk description of a middleware stack: a list of
//! declarations with their positioning constraints, and no handler code.
//! Manifests exist so an order can be computed and validated ahead of
//! deployment, and so external tooling can feed declarations to a running
//! manager.
//!
//! # Format
//!
//! ```toml
//! [[middleware]]
//! name = "cookie"
//!
//! [[middleware]]
//! name = "flash"
//! insert_after = ["cookie"]
//! requires = ["cookie"]
//! ```

use std::fs;
use std::path::Path;

use mdw_engine::{MiddlewareDeclaration, MiddlewareStack};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A file-backed set of middleware declarations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MiddlewareManifest {
    /// The declared middlewares, in file order.
    #[serde(default)]
    pub middleware: Vec<MiddlewareDeclaration>,
}

impl MiddlewareManifest {
    /// Loads a manifest from a file, choosing the format by extension
    /// (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, has an
    /// unsupported extension, or fails to parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format(path.display().to_string())),
        }
    }

    /// Parses a manifest from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Toml` on parse failure.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parses a manifest from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` on parse failure.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Returns the number of declared middlewares.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Returns `true` if the manifest declares no middleware.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Registers every declaration into a fresh stack, in file order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Manifest` if a declaration is rejected by the
    /// engine (duplicate or empty name).
    pub fn into_stack(self, strict_hints: bool) -> Result<MiddlewareStack, ConfigError> {
        let mut stack = if strict_hints {
            MiddlewareStack::strict()
        } else {
            MiddlewareStack::new()
        };

        for declaration in self.middleware {
            stack.register(declaration)?;
        }

        Ok(stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdw_engine::OrderingError;

    const SAMPLE_TOML: &str = r#"
        [[middleware]]
        name = "cookie"

        [[middleware]]
        name = "flash"
        insert_after = ["cookie"]
        requires = ["cookie"]

        [[middleware]]
        name = "auth"
        insert_after = ["flash"]
    "#;

    #[test]
    fn test_parse_toml_manifest() {
        let manifest = MiddlewareManifest::from_toml_str(SAMPLE_TOML).unwrap();
        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.middleware[1].name(), "flash");
        assert_eq!(manifest.middleware[1].insert_after(), ["cookie"]);
        assert_eq!(manifest.middleware[1].requires(), ["cookie"]);
    }

    #[test]
    fn test_parse_json_manifest() {
        let manifest = MiddlewareManifest::from_json_str(
            r#"{"middleware": [{"name": "cookie"}, {"name": "flash", "insert_after": ["cookie"]}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = MiddlewareManifest::from_toml_str("").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_unknown_manifest_keys_are_rejected() {
        let result = MiddlewareManifest::from_toml_str(
            r#"
            [[middlware]]
            name = "cookie"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_into_stack_preserves_file_order() {
        let manifest = MiddlewareManifest::from_toml_str(SAMPLE_TOML).unwrap();
        let stack = manifest.into_stack(false).unwrap();
        assert_eq!(stack.names(), ["cookie", "flash", "auth"]);

        let order: Vec<_> = stack
            .sort()
            .unwrap()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(order, ["cookie", "flash", "auth"]);
    }

    #[test]
    fn test_into_stack_rejects_duplicates() {
        let manifest = MiddlewareManifest::from_toml_str(
            r#"
            [[middleware]]
            name = "cookie"

            [[middleware]]
            name = "cookie"
            "#,
        )
        .unwrap();

        let err = manifest.into_stack(false).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Manifest {
                source: OrderingError::DuplicateName { .. }
            }
        ));
    }

    #[test]
    fn test_into_stack_strict_mode_flags_ghost_hints() {
        let manifest = MiddlewareManifest::from_toml_str(
            r#"
            [[middleware]]
            name = "solo"
            insert_after = ["ghost"]
            "#,
        )
        .unwrap();

        let stack = manifest.into_stack(true).unwrap();
        assert!(matches!(
            stack.sort(),
            Err(OrderingError::UnknownHintTarget { .. })
        ));
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("middleware.toml");
        std::fs::write(&path, SAMPLE_TOML).unwrap();

        let manifest = MiddlewareManifest::from_file(&path).unwrap();
        assert_eq!(manifest.len(), 3);
    }

    #[test]
    fn test_from_file_missing() {
        let result = MiddlewareManifest::from_file("/nonexistent/middleware.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }
}
