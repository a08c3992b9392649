//! Error types for the core library.
//!
//! Almost every malformed input is handled by clamping (weights below the
//! minimum, a zero base weight), so the error surface is deliberately small.

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Weight was NaN or infinite. Finite weights are clamped, never rejected.
    #[error("invalid weight {0}: must be a finite number")]
    InvalidWeight(f64),
}
