//! # mdw-server
//!
//! HTTP control plane for the Bhojpur middleware manager.
//!
//! The server exposes a running [`MiddlewareService`] over a small
//! JSON API so external tooling can register middleware declarations and
//! read back the computed execution order:
//!
//! - `GET /health`, `GET /ready` for probes
//! - `GET /v1/middlewares` for the registered declarations
//! - `POST /v1/middlewares` to register a declaration
//! - `GET /v1/middlewares/sorted` for the execution order
//!
//! Built on Hyper with graceful shutdown: a SIGTERM flips the readiness
//! probe and drains in-flight connections before exit.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod health;
mod server;
mod service;
mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::ServerError;
pub use health::{HealthCheck, HealthStatus, ReadinessCheck, ReadinessStatus};
pub use server::{HttpResponse, ResponseBody, Server};
pub use service::{
    error_code, status_for, ErrorDetail, ErrorEnvelope, ListResponse, MiddlewareService,
    RegisterResponse, SortResponse,
};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
