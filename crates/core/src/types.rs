//! Core types for the resource store
//!
//! This module defines the fundamental types used throughout the system:
//! - [`ResourceKey`]: Logical identifier of a resource (`<type>/<id>`)
//! - [`Payload`]: Opaque resource content
//! - [`VersionRecord`]: One immutable entry in a resource's version history
//! - [`LifecycleState`]: Derived state of a logical resource
//! - [`Precondition`] / [`ReadCondition`]: Conditional request variants
//! - Result types handed back to the transport layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Logical identifier of a resource instance
///
/// A key is the pair `(resource_type, logical_id)`. The logical id is stable
/// across versions and is either supplied by the caller or assigned by the
/// server (UUID v4).
///
/// Keys are ordered lexicographically: resource_type → logical_id
///
/// # Examples
///
/// ```
/// use revstore_core::types::ResourceKey;
///
/// let key = ResourceKey::new("Patient", "p-1");
/// assert_eq!(key.to_string(), "Patient/p-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Resource type (e.g. `Patient`)
    pub resource_type: String,
    /// Logical id within the resource type
    pub logical_id: String,
}

impl ResourceKey {
    /// Create a new key
    pub fn new(resource_type: impl Into<String>, logical_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            logical_id: logical_id.into(),
        }
    }

    /// Create a key with a server-assigned logical id
    ///
    /// # Examples
    ///
    /// ```
    /// use revstore_core::types::ResourceKey;
    ///
    /// let k1 = ResourceKey::generate("Patient");
    /// let k2 = ResourceKey::generate("Patient");
    /// assert_ne!(k1, k2);
    /// ```
    pub fn generate(resource_type: impl Into<String>) -> Self {
        Self::new(resource_type, Uuid::new_v4().to_string())
    }

    /// Parse a key from its `<type>/<id>` form
    pub fn parse(s: &str) -> Result<Self> {
        let (resource_type, logical_id) = s.split_once('/').ok_or_else(|| Error::InvalidKey {
            key: s.to_string(),
            reason: "expected <type>/<id>".to_string(),
        })?;
        let key = Self::new(resource_type, logical_id);
        key.validate()?;
        Ok(key)
    }

    /// Check that both parts are non-empty and fit in a `<type>/<id>` path
    pub fn validate(&self) -> Result<()> {
        for (part, value) in [
            ("resource type", &self.resource_type),
            ("logical id", &self.logical_id),
        ] {
            if value.is_empty() {
                return Err(Error::InvalidKey {
                    key: self.to_string(),
                    reason: format!("{} must not be empty", part),
                });
            }
            if value.contains('/') {
                return Err(Error::InvalidKey {
                    key: self.to_string(),
                    reason: format!("{} must not contain '/'", part),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for ResourceKey {
    /// Display key in the format: resource_type/logical_id
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.logical_id)
    }
}

/// Opaque resource content
///
/// The store never interprets payload bytes. Tombstones carry an empty payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Wrap raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Payload(bytes.into())
    }

    /// The empty payload used by tombstones
    pub fn empty() -> Self {
        Payload(Vec::new())
    }

    /// Encode a JSON document as the payload
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        serde_json::to_vec(value)
            .map(Payload)
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decode the payload as a JSON document
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::from_slice(&self.0).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the empty payload
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload(bytes)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload(s.as_bytes().to_vec())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload(s.into_bytes())
    }
}

/// One immutable entry in a resource's version history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Version number, contiguous from 1 within a resource
    pub version_id: u64,
    /// Resource content (empty for tombstones)
    pub payload: Payload,
    /// Commit timestamp
    pub created_at: DateTime<Utc>,
    /// True when this version records a logical delete
    pub is_deletion_marker: bool,
}

impl VersionRecord {
    /// Create a record stamped with the current time
    pub fn new(version_id: u64, payload: Payload, is_deletion_marker: bool) -> Self {
        Self {
            version_id,
            payload,
            created_at: Utc::now(),
            is_deletion_marker,
        }
    }

    /// Create a tombstone record
    pub fn tombstone(version_id: u64) -> Self {
        Self::new(version_id, Payload::empty(), true)
    }
}

/// Lifecycle state of a logical resource
///
/// Derived from the head version: no records means `Absent`, a tombstone head
/// means `Deleted`, anything else is `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// No version history
    Absent,
    /// Head version carries content
    Active,
    /// Head version is a tombstone
    Deleted,
}

impl LifecycleState {
    /// Derive the state from the current head
    pub fn of(head: Option<&VersionRecord>) -> Self {
        match head {
            None => LifecycleState::Absent,
            Some(record) if record.is_deletion_marker => LifecycleState::Deleted,
            Some(_) => LifecycleState::Active,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Absent => "ABSENT",
            LifecycleState::Active => "ACTIVE",
            LifecycleState::Deleted => "DELETED",
        };
        f.write_str(name)
    }
}

/// Write precondition carried by a conditional request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Precondition {
    /// Unconditional write
    #[default]
    None,
    /// Admit only if the head version equals the given version
    IfMatch(u64),
    /// Admit only if the resource has no active version (`If-None-Match: *`)
    IfNoneMatch,
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precondition::None => f.write_str("none"),
            Precondition::IfMatch(v) => write!(f, "If-Match: {}", v),
            Precondition::IfNoneMatch => f.write_str("If-None-Match: *"),
        }
    }
}

/// Read-side condition (`If-None-Match: W/"<n>"` on a read)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadCondition {
    /// Unconditional read
    #[default]
    None,
    /// Report `NotModified` when the head version equals the given version
    IfNoneMatchVersion(u64),
}

/// Outcome of a successful write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeStatus {
    /// A new epoch started (first version, or first after a delete)
    Created,
    /// A new version was appended to an active resource
    Updated,
    /// A tombstone was appended
    Deleted,
    /// Nothing was appended (idempotent delete of a deleted resource)
    Unchanged,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutcomeStatus::Created => "Created",
            OutcomeStatus::Updated => "Updated",
            OutcomeStatus::Deleted => "Deleted",
            OutcomeStatus::Unchanged => "Unchanged",
        };
        f.write_str(name)
    }
}

/// Result of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    /// Resource that was written
    pub key: ResourceKey,
    /// Head version after the write
    pub version_id: u64,
    /// Timestamp of the head version
    pub last_modified: DateTime<Utc>,
    /// What the write did
    pub outcome: OutcomeStatus,
}

/// Result of a successful read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
    /// Resource that was read
    pub key: ResourceKey,
    /// Content of the version read
    pub payload: Payload,
    /// Version read
    pub version_id: u64,
    /// Timestamp of the version read
    pub last_modified: DateTime<Utc>,
}

impl ReadResult {
    /// Build a read result from a stored record
    pub fn from_record(key: ResourceKey, record: VersionRecord) -> Self {
        Self {
            key,
            payload: record.payload,
            version_id: record.version_id,
            last_modified: record.created_at,
        }
    }
}

/// Result of a conditional read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalRead {
    /// The head differs from the caller's version
    Modified(ReadResult),
    /// The head is the caller's version
    NotModified {
        /// Current head version
        version_id: u64,
        /// Timestamp of the head version
        last_modified: DateTime<Utc>,
    },
}

/// History paging parameters
///
/// Results are always newest-first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Maximum number of versions to return (None = all)
    pub limit: Option<usize>,
    /// Only return versions strictly below this version
    pub before: Option<u64>,
}

impl HistoryQuery {
    /// All versions, newest first
    pub fn all() -> Self {
        Self::default()
    }

    /// Limit the page size
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Start the page below the given version
    pub fn before(mut self, version_id: u64) -> Self {
        self.before = Some(version_id);
        self
    }
}

/// Audit record returned by erase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraseRecord {
    /// Resource that was erased
    pub key: ResourceKey,
    /// Number of version records removed
    pub versions_erased: usize,
    /// Caller-supplied reason
    pub reason: Option<String>,
    /// When the purge took effect
    pub erased_at: DateTime<Utc>,
}
