//! The control-plane service over a middleware stack.
//!
//! [`MiddlewareService`] wraps a [`MiddlewareStack`] behind a lock so the
//! HTTP layer can register declarations and query orders concurrently.
//! The engine itself makes no concurrency guarantees; all serialization
//! happens here.

use http::StatusCode;
use mdw_engine::{MiddlewareDeclaration, MiddlewareStack, OrderingError, OrderingResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Thread-safe facade over a [`MiddlewareStack`].
#[derive(Debug, Default)]
pub struct MiddlewareService {
    stack: RwLock<MiddlewareStack>,
}

impl MiddlewareService {
    /// Creates a service over an empty, lenient stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service over an existing stack (e.g. seeded from a
    /// manifest).
    #[must_use]
    pub fn with_stack(stack: MiddlewareStack) -> Self {
        Self {
            stack: RwLock::new(stack),
        }
    }

    /// Registers a middleware declaration.
    ///
    /// # Errors
    ///
    /// Propagates the engine's registration errors; the stack is unchanged
    /// on error.
    pub fn register(&self, declaration: MiddlewareDeclaration) -> OrderingResult<()> {
        self.stack.write().register(declaration)
    }

    /// Returns every registered declaration in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<MiddlewareDeclaration> {
        self.stack.read().declarations().to_vec()
    }

    /// Returns `true` if a middleware with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.stack.read().contains(name)
    }

    /// Returns the number of registered middlewares.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.read().len()
    }

    /// Returns `true` if no middleware is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.read().is_empty()
    }

    /// Computes the execution order of the registered middlewares.
    ///
    /// # Errors
    ///
    /// Propagates the engine's sort errors.
    pub fn sorted_names(&self) -> OrderingResult<Vec<String>> {
        Ok(self
            .stack
            .read()
            .sort()?
            .iter()
            .map(|d| d.name().to_string())
            .collect())
    }
}

/// Response body for `GET /v1/middlewares`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    /// Registered declarations in registration order.
    pub middlewares: Vec<MiddlewareDeclaration>,
}

/// Response body for `GET /v1/middlewares/sorted`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SortResponse {
    /// Middleware names in execution order.
    pub order: Vec<String>,
}

/// Response body for a successful registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// The name that was registered.
    pub registered: String,
}

/// JSON error envelope returned for failed operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
}

/// Error details within an [`ErrorEnvelope`].
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Names involved in the error (missing requirements, stuck
    /// middlewares, unknown hint targets).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

impl ErrorEnvelope {
    /// Builds the envelope for an engine error.
    #[must_use]
    pub fn from_ordering_error(error: &OrderingError) -> Self {
        let names = match error {
            OrderingError::DuplicateName { name } => vec![name.clone()],
            OrderingError::EmptyName => Vec::new(),
            OrderingError::MissingRequirement { missing, .. } => missing.clone(),
            OrderingError::UnresolvableOrder { remaining } => remaining.clone(),
            OrderingError::UnknownHintTarget { unknown, .. } => unknown.clone(),
        };

        Self {
            error: ErrorDetail {
                code: error_code(error).to_string(),
                message: error.to_string(),
                names,
            },
        }
    }
}

/// Machine-readable code for an engine error.
#[must_use]
pub fn error_code(error: &OrderingError) -> &'static str {
    match error {
        OrderingError::DuplicateName { .. } => "DUPLICATE_NAME",
        OrderingError::EmptyName => "EMPTY_NAME",
        OrderingError::MissingRequirement { .. } => "MISSING_REQUIREMENT",
        OrderingError::UnresolvableOrder { .. } => "UNRESOLVABLE_ORDER",
        OrderingError::UnknownHintTarget { .. } => "UNKNOWN_HINT_TARGET",
    }
}

/// HTTP status for an engine error.
///
/// Duplicate registrations conflict with existing state; every other kind
/// is a semantic problem with the submitted declarations.
#[must_use]
pub fn status_for(error: &OrderingError) -> StatusCode {
    match error {
        OrderingError::DuplicateName { .. } => StatusCode::CONFLICT,
        OrderingError::EmptyName => StatusCode::BAD_REQUEST,
        OrderingError::MissingRequirement { .. }
        | OrderingError::UnresolvableOrder { .. }
        | OrderingError::UnknownHintTarget { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}
