//! HTTP client for a running middleware manager.

use std::time::Duration;

use mdw_engine::MiddlewareDeclaration;
use mdw_server::{ErrorEnvelope, HealthStatus, ListResponse, RegisterResponse, SortResponse};
use thiserror::Error;

/// Errors returned by [`ManagerClient`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request could not be sent or the response not read.
    #[error("cannot reach middleware manager: {0}")]
    Transport(#[from] reqwest::Error),

    /// The manager answered with an error envelope.
    #[error("manager rejected the request ({code}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code.
        code: String,
        /// Human-readable message.
        message: String,
    },
}

/// A JSON client for the manager's control-plane API.
#[derive(Debug, Clone)]
pub struct ManagerClient {
    client: reqwest::Client,
    base_url: String,
}

impl ManagerClient {
    /// Creates a client for the manager at `host` (host:port or full URL).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the underlying client cannot be
    /// constructed.
    pub fn new(host: &str) -> Result<Self, ClientError> {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{host}")
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Returns the base URL this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the manager's health status.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.get("/health").await
    }

    /// Fetches the registered declarations.
    pub async fn list(&self) -> Result<ListResponse, ClientError> {
        self.get("/v1/middlewares").await
    }

    /// Fetches the computed execution order.
    pub async fn sorted(&self) -> Result<SortResponse, ClientError> {
        self.get("/v1/middlewares/sorted").await
    }

    /// Registers a declaration with the manager.
    pub async fn register(
        &self,
        declaration: &MiddlewareDeclaration,
    ) -> Result<RegisterResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/v1/middlewares", self.base_url))
            .json(declaration)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => Err(ClientError::Api {
                status: status.as_u16(),
                code: envelope.error.code,
                message: envelope.error.message,
            }),
            Err(_) => Err(ClientError::Api {
                status: status.as_u16(),
                code: "UNEXPECTED_RESPONSE".to_string(),
                message: format!("manager answered with status {status}"),
            }),
        }
    }
}
