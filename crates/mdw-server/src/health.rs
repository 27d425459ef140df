//! Health and readiness probes.
//!
//! `/health` reports liveness: the process is up. `/ready` reports
//! whether the manager should receive traffic; it flips to not-ready at
//! the start of graceful shutdown so load balancers drain first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Health status returned by the `/health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    /// Always "healthy" while the process is running.
    status: String,

    /// Service name.
    service: String,

    /// Service version.
    version: String,

    /// Uptime in seconds.
    uptime_seconds: u64,
}

impl HealthStatus {
    /// Returns the status string.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the uptime in seconds.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.uptime_seconds
    }
}

/// Liveness probe handler.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    service: String,
    version: String,
    start_time: Instant,
}

impl HealthCheck {
    /// Creates a new health check reporting the given service identity.
    #[must_use]
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            start_time: Instant::now(),
        }
    }

    /// Returns the current health status.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            service: self.service.clone(),
            version: self.version.clone(),
            uptime_seconds: self.uptime().as_secs(),
        }
    }

    /// Returns the process uptime.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Readiness status returned by the `/ready` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessStatus {
    /// Whether the manager should receive traffic.
    ready: bool,
}

impl ReadinessStatus {
    /// Returns whether the manager is ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Readiness probe handler.
///
/// Cloned handles share state: marking one not-ready marks them all.
#[derive(Debug, Clone)]
pub struct ReadinessCheck {
    ready: Arc<AtomicBool>,
}

impl ReadinessCheck {
    /// Creates a readiness check that starts ready.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns whether the manager is ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Marks the manager ready or not ready.
    ///
    /// Called with `false` at the start of graceful shutdown.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Returns the current readiness status.
    #[must_use]
    pub fn status(&self) -> ReadinessStatus {
        ReadinessStatus {
            ready: self.is_ready(),
        }
    }
}

impl Default for ReadinessCheck {
    fn default() -> Self {
        Self::new()
    }
}
