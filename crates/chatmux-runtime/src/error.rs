//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use chatmux_framework::BuildError;

/// Errors that stop a bot from starting.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The service rejected the bot's credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The quit signal fired before authentication completed.
    #[error("quit event received during authentication")]
    QuitDuringAuthentication,

    /// The connection ended before authentication completed.
    #[error("connection closed during authentication")]
    ConnectionClosed,

    /// The router carries a build error and would never match.
    #[error("invalid routing rules: {0}")]
    Build(#[from] BuildError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
