//! Error types for the streaming histogram engine
//!
//! Provides a unified error type for all flowhist crates.

use thiserror::Error;

/// Core error type for streaming histogram operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A mean/variance update produced a non-finite value
    ///
    /// Raised immediately; the triggering update is rejected and the
    /// accumulator is left as of the last consistent update.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} populated bins, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Derived statistics invoked on a snapshot without engine metadata
    #[error("Missing metadata: {0}")]
    MissingMetadata(String),

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for a non-finite accumulator intermediate
    pub fn non_finite(context: &str) -> Self {
        Self::MalformedInput(format!("{context} produced a NaN or infinite value"))
    }

    /// Create an error for a snapshot that carries no engine metadata
    pub fn foreign_snapshot(operation: &str) -> Self {
        Self::MissingMetadata(format!(
            "{operation} requires a snapshot produced by the streaming engine"
        ))
    }

    /// Create an error for too few populated bins
    pub fn too_few_bins(expected: usize, actual: usize) -> Self {
        Self::InsufficientData { expected, actual }
    }
}
