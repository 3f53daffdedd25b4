//! Error types for the resource store
//!
//! Every failure surfaced by the store is one of these variants. The
//! transport layer maps each variant to a status code (see `revstore-wire`).

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::ResourceKey;

/// Store errors
#[derive(Debug, Error)]
pub enum Error {
    /// Conditional write failed against the current head
    #[error("precondition failed on {key}: expected version {expected:?}, current {actual:?}")]
    PreconditionFailed {
        /// Resource targeted by the request
        key: ResourceKey,
        /// Version the caller asserted (None for `If-None-Match: *`)
        expected: Option<u64>,
        /// Head version at evaluation time (None when absent)
        actual: Option<u64>,
    },

    /// Create-only write targeted an active resource
    #[error("resource already exists: {0}")]
    AlreadyExists(ResourceKey),

    /// No history exists for the key
    #[error("resource not found: {0}")]
    NotFound(ResourceKey),

    /// The requested version does not exist in the history
    #[error("version {version_id} not found for {key}")]
    VersionNotFound {
        /// Resource that was read
        key: ResourceKey,
        /// Missing version
        version_id: u64,
    },

    /// The head version is a tombstone
    #[error("resource deleted: {key} (version {version_id})")]
    Gone {
        /// Deleted resource
        key: ResourceKey,
        /// Version of the tombstone
        version_id: u64,
        /// When the tombstone was written
        deleted_at: DateTime<Utc>,
    },

    /// A write raced with an erase of the same key
    #[error("conflict with concurrent erase of {0}")]
    ConflictDuringErase(ResourceKey),

    /// Operation disabled by configuration
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// Key is malformed
    #[error("invalid key '{key}': {reason}")]
    InvalidKey {
        /// Offending key text
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// Encoded version exceeds the journal's frame limit; nothing was written
    #[error("payload too large for {key}: {size} bytes encoded, limit {limit}")]
    PayloadTooLarge {
        /// Resource targeted by the write
        key: ResourceKey,
        /// Encoded size of the journal entry
        size: usize,
        /// Largest accepted entry
        limit: usize,
    },

    /// Entry lock could not be acquired within the configured timeout
    #[error("timed out waiting for lock on {0}")]
    Timeout(ResourceKey),

    /// Durable write failed; the in-memory state was left unchanged
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// Persisted data is inconsistent
    #[error("corruption: {0}")]
    Corruption(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Key the error refers to, if any
    pub fn key(&self) -> Option<&ResourceKey> {
        match self {
            Error::PreconditionFailed { key, .. }
            | Error::VersionNotFound { key, .. }
            | Error::Gone { key, .. }
            | Error::PayloadTooLarge { key, .. } => Some(key),
            Error::AlreadyExists(key)
            | Error::NotFound(key)
            | Error::ConflictDuringErase(key)
            | Error::Timeout(key) => Some(key),
            _ => None,
        }
    }

    /// True for the conflict family (precondition, existence, erase race)
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Error::PreconditionFailed { .. }
                | Error::AlreadyExists(_)
                | Error::ConflictDuringErase(_)
        )
    }
}
