//! Error types for the AI core.

use thiserror::Error;

/// Errors produced inside the AI core.
///
/// Only [`ProdyError::InvalidInput`] ever reaches feature callers through the
/// [`crate::coordinator::CacheCoordinator`]; every other variant is logged and
/// degraded into a fallback result.
#[derive(Error, Debug)]
pub enum ProdyError {
    /// Configuration could not be loaded or failed validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A provider call failed (network, quota, HTTP status, body parse).
    #[error("Provider error: {0}")]
    Provider(String),

    /// The provider has no credential configured.
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Caller supplied input the feature cannot work with.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A cached payload could not be encoded or decoded.
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ProdyError>;
