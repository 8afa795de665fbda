//! Error types shared by transports and bot handles.
//!
//! Routing-level errors (like `BuildError`) are defined in chatmux-framework.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// The transport reported a protocol-level error.
    #[error("transport error: {0}")]
    Protocol(String),

    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for bot API calls made from handlers.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The bot has not completed authentication.
    #[error("bot is not connected")]
    NotConnected,
    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Other error.
    #[error("{0}")]
    Other(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
