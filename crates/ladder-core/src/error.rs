//! Error types for ladder-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid asset id: {0}")]
    InvalidAsset(String),

    #[error("Invalid bucket: {0}")]
    InvalidBucket(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
