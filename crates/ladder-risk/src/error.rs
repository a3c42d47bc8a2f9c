//! Risk error types.

use ladder_core::AssetId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Journal error: {0}")]
    Journal(#[from] ladder_journal::JournalError),
}

pub type RiskResult<T> = Result<T, RiskError>;

/// Failure reported by an external provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("No data for asset: {0}")]
    NotFound(AssetId),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed provider response: {0}")]
    Decode(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;
