//! Error types for the listener client.
//!
//! Every error here is scoped to one listener connection; none of them
//! affect the daemon or other listeners.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Listener client errors.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The endpoint refused or reset the connection.
    ///
    /// Usually means the daemon is not running on `addr`.
    #[error("Failed to connect to {addr}: {error}")]
    Connect { addr: SocketAddr, error: String },

    /// The connect did not complete within the configured timeout.
    #[error("Timed out connecting to {addr}")]
    ConnectTimeout { addr: SocketAddr },

    /// The listener was stopped before a connection was established.
    #[error("Listener cancelled")]
    Cancelled,

    /// Socket read failure on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The receive task panicked or was aborted.
    #[error("Receive task failed: {0}")]
    Task(String),
}

impl ClientError {
    /// Returns true for failures that may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::ConnectTimeout { .. })
    }
}

/// Result type alias for listener operations.
pub type Result<T> = std::result::Result<T, ClientError>;
