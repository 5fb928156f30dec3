//! Error types for U-Loading.

use thiserror::Error;

/// Result type alias for U-Loading operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or searching load plans.
///
/// Infeasibility is not an error: searches report it as an empty result
/// list or `None`. Cancellation is not an error either.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid item or composite geometry provided.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Invalid container (bin type) provided.
    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An internal invariant was violated, e.g. a footprint step asked to
    /// orient items along a plane it cannot measure.
    #[error("Logic error: {0}")]
    Logic(String),
}
