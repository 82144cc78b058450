//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for every cache variant.
///
/// Engine errors are wrapped but otherwise passed through untouched;
/// the cache layer never retries them.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Duration expression could not be parsed
    #[error("Cannot parse \"{0}\" as a duration")]
    InvalidDuration(String),

    /// Invalid construction-time configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Operation not available with the current configuration
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Redis engine failure
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// SQLite engine failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal failure (background work panicked or was cancelled)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for CacheError {
    fn from(err: bincode::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        CacheError::Internal(format!("blocking task failed: {}", err))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
