//! Error types for rule construction.

use thiserror::Error;

/// A malformed rule, captured while building a [`Router`](crate::Router).
///
/// Build errors are never raised during dispatch. They are stored on the
/// owning route and router, which then refuse to match, and are surfaced
/// through `err()` for startup-time validation.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// The pattern passed to `hear` is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Why the regex engine rejected it.
        #[source]
        source: regex::Error,
    },
}

/// Result type for builder operations.
pub type BuildResult<T> = Result<T, BuildError>;
