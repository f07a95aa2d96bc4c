//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Boxed Error ==
/// Opaque error produced by an item's fill or read operation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A live entry already uses this key
    #[error("Key already exists: {0}")]
    AlreadyExists(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The item's fill operation failed; the entry has been evicted
    #[error("Fill failed for key {key}: {source}")]
    FillFailed {
        key: String,
        #[source]
        source: BoxError,
    },

    /// Key rejected before admission
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl CacheError {
    /// Returns true for the `NotFound` variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
