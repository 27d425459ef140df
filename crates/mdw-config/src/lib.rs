//! Typed configuration for the Bhojpur middleware manager.
//!
//! Two concerns live here:
//!
//! - [`ManagerConfig`]: the manager's own settings (listen address,
//!   logging, engine flags), loaded in layers by [`ConfigLoader`]:
//!   defaults, then a TOML/JSON file, then environment variables.
//! - [`MiddlewareManifest`]: the on-disk description of a middleware
//!   stack, feeding declarations into `mdw-engine`.
//!
//! # Example
//!
//! ```
//! use mdw_config::{ConfigLoader, MiddlewareManifest};
//!
//! # fn main() -> Result<(), mdw_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_string("[engine]\nstrict_hints = true", "toml")?
//!     .load()?;
//!
//! let manifest = MiddlewareManifest::from_toml_str(
//!     "[[middleware]]\nname = \"cookie\"",
//! )?;
//! let stack = manifest.into_stack(config.engine.strict_hints)?;
//! assert!(stack.contains("cookie"));
//! # Ok(())
//! # }
//! ```
//!
//! # Environment variable overrides
//!
//! Settings can be overridden with `PREFIX__SECTION__KEY` variables, e.g.
//! `MIDDLEWARE__SERVER__HTTP_ADDR=0.0.0.0:9000`. The flat
//! `MIDDLEWARE_HOST` variable from the original deployment is also
//! honored for the server address.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod manifest;

pub use config::{EngineSettings, LogFormat, LoggingSettings, ManagerConfig, ServerSettings};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX, HOST_ENV_VAR};
pub use manifest::MiddlewareManifest;
