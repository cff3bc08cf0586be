//! Error types for the Wayfarer environment abstraction.

use thiserror::Error;

/// Errors that can occur while talking to a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend failed (I/O, corruption, closed database)
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Creates a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Creates a serialization error.
    pub fn serialization(msg: impl std::fmt::Display) -> Self {
        Self::Serialization(msg.to_string())
    }
}
