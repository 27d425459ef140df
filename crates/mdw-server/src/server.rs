//! The manager's HTTP server.
//!
//! A small Hyper-based control plane over a [`MiddlewareService`]:
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /health` | Liveness probe |
//! | `GET /ready` | Readiness probe (fails during shutdown drain) |
//! | `GET /v1/middlewares` | Registered declarations in registration order |
//! | `POST /v1/middlewares` | Register one declaration |
//! | `GET /v1/middlewares/sorted` | Computed execution order |
//!
//! Connections are tracked so a shutdown signal drains in-flight requests
//! before the process exits.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use mdw_engine::MiddlewareDeclaration;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::health::{HealthCheck, ReadinessCheck};
use crate::service::{
    status_for, ErrorDetail, ErrorEnvelope, ListResponse, MiddlewareService, RegisterResponse,
    SortResponse,
};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Type alias for the HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// The middleware manager server.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use mdw_server::{MiddlewareService, Server, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), mdw_server::ServerError> {
///     let config = ServerConfig::builder().http_addr("0.0.0.0:7777").build();
///     let service = Arc::new(MiddlewareService::new());
///
///     Server::new(config, service).run().await
/// }
/// ```
pub struct Server {
    config: ServerConfig,
    service: Arc<MiddlewareService>,
    health: HealthCheck,
    readiness: ReadinessCheck,
}

impl Server {
    /// Creates a server over the given service.
    #[must_use]
    pub fn new(config: ServerConfig, service: Arc<MiddlewareService>) -> Self {
        Self {
            config,
            service,
            health: HealthCheck::new("mdw", env!("CARGO_PKG_VERSION")),
            readiness: ReadinessCheck::new(),
        }
    }

    /// Returns the service this server exposes.
    #[must_use]
    pub fn service(&self) -> &Arc<MiddlewareService> {
        &self.service
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the server until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the listen address cannot be resolved or bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Runs the server until the given signal triggers.
    ///
    /// # Errors
    ///
    /// Returns an error if the listen address cannot be resolved or bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::Bind(format!("invalid address '{}': {e}", self.config.http_addr()))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind {addr}: {e}")))?;

        tracing::info!(%addr, "middleware manager listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let guard = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                    tracing::error!(%remote_addr, error = %e, "connection error");
                                }
                                drop(guard);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                _ = shutdown.recv() => {
                    tracing::info!("shutdown signal received, stopping server");
                    break;
                }
            }
        }

        server.readiness.set_ready(false);

        let drain_timeout = server.config.shutdown_timeout();
        tracing::info!(
            connections = tracker.active_connections(),
            timeout_secs = drain_timeout.as_secs(),
            "draining connections"
        );

        tokio::select! {
            _ = tracker.wait_for_idle() => {
                tracing::info!("all connections closed");
            }
            _ = tokio::time::sleep(drain_timeout) => {
                tracing::warn!(
                    connections = tracker.active_connections(),
                    "drain timeout reached"
                );
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: tokio::net::TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { server.handle_request(req).await }
        });

        let connection = http1::Builder::new().serve_connection(io, service);

        tokio::select! {
            result = connection => result,
            _ = shutdown.recv() => {
                tracing::debug!(%remote_addr, "connection closed by shutdown");
                Ok(())
            }
        }
    }

    async fn handle_request(
        self: &Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<HttpResponse, Infallible> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        tracing::debug!(%method, %path, "request");

        let collected =
            tokio::time::timeout(self.config.request_timeout(), req.into_body().collect()).await;

        let body = match collected {
            Ok(Ok(body)) => body.to_bytes(),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "failed to read request body");
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    "BODY_READ_ERROR",
                    "failed to read request body",
                ));
            }
            Err(_) => {
                tracing::warn!(%path, "request body read timed out");
                return Ok(error_response(
                    StatusCode::REQUEST_TIMEOUT,
                    "REQUEST_TIMEOUT",
                    "request body read timed out",
                ));
            }
        };

        Ok(dispatch(
            &method,
            &path,
            &body,
            &self.service,
            &self.health,
            &self.readiness,
        ))
    }
}

/// Routes one request to the matching operation.
pub(crate) fn dispatch(
    method: &Method,
    path: &str,
    body: &[u8],
    service: &MiddlewareService,
    health: &HealthCheck,
    readiness: &ReadinessCheck,
) -> HttpResponse {
    match (method.as_str(), path) {
        ("GET", "/health") => json_response(StatusCode::OK, &health.status()),

        ("GET", "/ready") => {
            let status = readiness.status();
            let code = if status.is_ready() {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            json_response(code, &status)
        }

        ("GET", "/v1/middlewares") => json_response(
            StatusCode::OK,
            &ListResponse {
                middlewares: service.list(),
            },
        ),

        ("POST", "/v1/middlewares") => {
            let declaration: MiddlewareDeclaration = match serde_json::from_slice(body) {
                Ok(declaration) => declaration,
                Err(e) => {
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        "INVALID_BODY",
                        &format!("invalid declaration: {e}"),
                    );
                }
            };

            let name = declaration.name().to_string();
            match service.register(declaration) {
                Ok(()) => {
                    tracing::info!(middleware = %name, "registered middleware");
                    json_response(StatusCode::CREATED, &RegisterResponse { registered: name })
                }
                Err(e) => {
                    json_response(status_for(&e), &ErrorEnvelope::from_ordering_error(&e))
                }
            }
        }

        ("GET", "/v1/middlewares/sorted") => match service.sorted_names() {
            Ok(order) => json_response(StatusCode::OK, &SortResponse { order }),
            Err(e) => json_response(status_for(&e), &ErrorEnvelope::from_ordering_error(&e)),
        },

        _ => error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "no such route"),
    }
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> HttpResponse {
    let body = serde_json::to_vec(value).expect("response serialization");

    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .expect("response construction")
}

fn error_response(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    json_response(
        status,
        &ErrorEnvelope {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
                names: Vec::new(),
            },
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (MiddlewareService, HealthCheck, ReadinessCheck) {
        (
            MiddlewareService::new(),
            HealthCheck::new("mdw", "test"),
            ReadinessCheck::new(),
        )
    }

    fn register(service: &MiddlewareService, json: &str) -> HttpResponse {
        let (health, readiness) = (HealthCheck::new("mdw", "test"), ReadinessCheck::new());
        dispatch(
            &Method::POST,
            "/v1/middlewares",
            json.as_bytes(),
            service,
            &health,
            &readiness,
        )
    }

    #[test]
    fn test_health_route() {
        let (service, health, readiness) = fixtures();
        let response = dispatch(&Method::GET, "/health", b"", &service, &health, &readiness);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_ready_route_degrades_during_shutdown() {
        let (service, health, readiness) = fixtures();

        let response = dispatch(&Method::GET, "/ready", b"", &service, &health, &readiness);
        assert_eq!(response.status(), StatusCode::OK);

        readiness.set_ready(false);
        let response = dispatch(&Method::GET, "/ready", b"", &service, &health, &readiness);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_register_and_sort_routes() {
        let (service, health, readiness) = fixtures();

        let response = register(&service, r#"{"name": "flash", "insert_after": ["cookie"]}"#);
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = register(&service, r#"{"name": "cookie"}"#);
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = dispatch(
            &Method::GET,
            "/v1/middlewares/sorted",
            b"",
            &service,
            &health,
            &readiness,
        );
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_register_duplicate_returns_conflict() {
        let (service, _, _) = fixtures();

        assert_eq!(
            register(&service, r#"{"name": "cookie"}"#).status(),
            StatusCode::CREATED
        );
        assert_eq!(
            register(&service, r#"{"name": "cookie"}"#).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_register_invalid_body_is_bad_request() {
        let (service, _, _) = fixtures();
        let response = register(&service, "not json");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_sort_route_surfaces_cycles() {
        let (service, health, readiness) = fixtures();

        register(&service, r#"{"name": "X", "insert_before": ["Y"]}"#);
        register(&service, r#"{"name": "Y", "insert_before": ["X"]}"#);

        let response = dispatch(
            &Method::GET,
            "/v1/middlewares/sorted",
            b"",
            &service,
            &health,
            &readiness,
        );
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_unknown_route_is_not_found() {
        let (service, health, readiness) = fixtures();
        let response = dispatch(
            &Method::GET,
            "/v2/unknown",
            b"",
            &service,
            &health,
            &readiness,
        );
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_list_route_reports_registration_order() {
        let (service, health, readiness) = fixtures();

        register(&service, r#"{"name": "b"}"#);
        register(&service, r#"{"name": "a"}"#);

        let response = dispatch(
            &Method::GET,
            "/v1/middlewares",
            b"",
            &service,
            &health,
            &readiness,
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(service.list().len(), 2);
    }
}
