//! Cache error types.

use thiserror::Error;

/// Errors that can occur when using the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to serialize or deserialize a value.
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Key not found.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Value existed but its time-to-live has elapsed.
    #[error("Key expired: {0}")]
    Expired(String),
}
