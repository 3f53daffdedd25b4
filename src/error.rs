//! Unified error type for Revstore.
//!
//! Wraps the engine's errors in a stable public shape. Keys are carried as
//! their `<type>/<id>` text.

use thiserror::Error;

/// All Revstore errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Conditional write refused (`If-Match` mismatch or `If-None-Match: *`
    /// on an active resource)
    #[error("precondition failed on {key}: expected {expected:?}, current {actual:?}")]
    PreconditionFailed {
        /// Resource key
        key: String,
        /// Version the caller asserted
        expected: Option<u64>,
        /// Head version at evaluation time
        actual: Option<u64>,
    },

    /// Create-only write on an active resource
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// No history for the key
    #[error("not found: {0}")]
    NotFound(String),

    /// Requested version does not exist
    #[error("version {version_id} of {key} not found")]
    VersionNotFound {
        /// Resource key
        key: String,
        /// Missing version
        version_id: u64,
    },

    /// Resource (or the version read) is a tombstone
    #[error("gone: {key} deleted at version {version_id}")]
    Gone {
        /// Resource key
        key: String,
        /// Tombstone version
        version_id: u64,
    },

    /// Write raced an erase of the same resource
    #[error("conflict with concurrent erase: {0}")]
    ConflictDuringErase(String),

    /// Operation disabled by configuration
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Malformed key
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Version too large to store
    #[error("payload too large: {key} encodes to {size} bytes, limit {limit}")]
    PayloadTooLarge {
        /// Resource key
        key: String,
        /// Encoded size
        size: usize,
        /// Largest accepted size
        limit: usize,
    },

    /// Malformed ETag
    #[error("invalid ETag: {0}")]
    InvalidETag(String),

    /// Lock wait exceeded the configured timeout
    #[error("timed out: {0}")]
    Timeout(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or configuration error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Journal failure or on-disk corruption
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for Revstore operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// Only erase races and lock timeouts may succeed on a plain retry;
    /// precondition failures need fresh data first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ConflictDuringErase(_) | Error::Timeout(_))
    }

    /// Check if this is a conflict (HTTP 409/412 family).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Error::PreconditionFailed { .. } | Error::AlreadyExists(_) | Error::ConflictDuringErase(_)
        )
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::VersionNotFound { .. })
    }

    /// Check if the resource was deleted.
    pub fn is_gone(&self) -> bool {
        matches!(self, Error::Gone { .. })
    }

    /// Check if this is a serious/unrecoverable error.
    pub fn is_serious(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_))
    }
}

impl From<revstore_core::Error> for Error {
    fn from(e: revstore_core::Error) -> Self {
        use revstore_core::Error as CoreError;
        match e {
            CoreError::PreconditionFailed {
                key,
                expected,
                actual,
            } => Error::PreconditionFailed {
                key: key.to_string(),
                expected,
                actual,
            },
            CoreError::AlreadyExists(key) => Error::AlreadyExists(key.to_string()),
            CoreError::NotFound(key) => Error::NotFound(key.to_string()),
            CoreError::VersionNotFound { key, version_id } => Error::VersionNotFound {
                key: key.to_string(),
                version_id,
            },
            CoreError::Gone {
                key, version_id, ..
            } => Error::Gone {
                key: key.to_string(),
                version_id,
            },
            CoreError::ConflictDuringErase(key) => Error::ConflictDuringErase(key.to_string()),
            CoreError::NotSupported(msg) => Error::NotSupported(msg),
            CoreError::InvalidKey { key, reason } => {
                Error::InvalidKey(format!("'{}': {}", key, reason))
            }
            CoreError::PayloadTooLarge { key, size, limit } => Error::PayloadTooLarge {
                key: key.to_string(),
                size,
                limit,
            },
            CoreError::Timeout(key) => Error::Timeout(key.to_string()),
            CoreError::StorageFailure(msg) => Error::Storage(msg),
            CoreError::Corruption(msg) => Error::Storage(format!("corruption: {}", msg)),
            CoreError::Io(io_err) => Error::Io(io_err),
            CoreError::Serialization(msg) => Error::Serialization(msg),
        }
    }
}

impl From<revstore_wire::HeaderError> for Error {
    fn from(e: revstore_wire::HeaderError) -> Self {
        match e {
            revstore_wire::HeaderError::InvalidETag(value) => Error::InvalidETag(value),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
