//! Server error types.

use thiserror::Error;

/// Errors that can occur while running the manager server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The server could not bind to the configured address.
    #[error("failed to bind server: {0}")]
    Bind(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
