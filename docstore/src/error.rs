//! Error types for document store operations.

use common::StorageError;

/// Error type for document store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed hierarchical key. Never retried.
    InvalidKey(String),

    /// Invalid scan parameters.
    InvalidInput(String),

    /// A document leaf or key cannot be represented in stored form.
    /// Raised while flattening, before any row is written.
    Serialization(String),

    /// The storage backend cannot be reached, or a deferred operation was
    /// cancelled before it completed.
    Unavailable(String),

    /// The storage backend failed to execute an operation.
    Storage(String),

    /// Stored rows could not be decoded.
    Encoding(String),

    /// Internal errors indicating bugs or invariant violations.
    Internal(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            Error::Storage(msg) => write!(f, "Storage error: {}", msg),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Storage(msg) => Error::Storage(msg),
            StorageError::Unavailable(msg) => Error::Unavailable(msg),
            StorageError::Internal(msg) => Error::Internal(msg),
        }
    }
}

impl From<common::serde::DeserializeError> for Error {
    fn from(err: common::serde::DeserializeError) -> Self {
        Error::Encoding(err.message)
    }
}

/// Result type alias for document store operations.
pub type Result<T> = std::result::Result<T, Error>;
