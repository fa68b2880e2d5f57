//! Error types for polynest.

use thiserror::Error;

/// Result type alias for polynest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or running a nest.
#[derive(Debug, Error)]
pub enum Error {
    /// A part polygon is unusable.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The container polygon is missing or degenerate.
    #[error("Invalid container: {0}")]
    InvalidBoundary(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// NFP computation failed.
    #[error("NFP computation failed: {0}")]
    NfpError(String),

    /// No placeable parts survived preparation.
    #[error("No parts to nest")]
    NoParts,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
