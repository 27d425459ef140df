//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the manager's HTTP listener.
///
/// # Example
///
/// ```
/// use mdw_server::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .http_addr("127.0.0.1:7777")
///     .build();
///
/// assert_eq!(config.http_addr(), "127.0.0.1:7777");
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on, as host:port.
    http_addr: String,

    /// How long to wait for in-flight connections on shutdown.
    shutdown_timeout: Duration,

    /// Per-request timeout.
    request_timeout: Duration,
}

impl ServerConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the configured listen address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Returns the shutdown drain timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Resolves the listen address to a socket address.
    ///
    /// Host names such as `localhost:7777` are resolved; the first result
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the address cannot be resolved.
    pub fn socket_addr(&self) -> std::io::Result<SocketAddr> {
        use std::net::ToSocketAddrs;

        self.http_addr.to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' resolved to no addresses", self.http_addr),
            )
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    http_addr: String,
    shutdown_timeout: Duration,
    request_timeout: Duration,
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self {
            http_addr: "localhost:7777".to_string(),
            shutdown_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfigBuilder {
    /// Sets the listen address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets the shutdown drain timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            http_addr: self.http_addr,
            shutdown_timeout: self.shutdown_timeout,
            request_timeout: self.request_timeout,
        }
    }
}
