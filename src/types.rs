//! Public types for the Revstore API.
//!
//! Re-exports the engine's types under one path, plus the JSON view of a
//! resource version.

use chrono::{DateTime, Utc};

pub use revstore_core::{
    ConditionalRead, EraseRecord, HistoryQuery, LifecycleState, OutcomeStatus, Payload,
    Precondition, ReadCondition, ReadResult, ResourceKey, VersionRecord, WriteResult,
};

pub use revstore_durability::DurabilityMode;
pub use revstore_engine::{DeletePolicy, EraseRequest, EraseSemantics, StoreConfig, StoreInfo};

/// A resource version with its payload decoded as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Resource key
    pub key: ResourceKey,
    /// Decoded payload
    pub body: serde_json::Value,
    /// Version read
    pub version_id: u64,
    /// Timestamp of the version
    pub last_modified: DateTime<Utc>,
}

impl Resource {
    /// Weak ETag of this version.
    pub fn etag(&self) -> String {
        revstore_wire::etag(self.version_id)
    }

    /// History path of this version.
    pub fn location(&self) -> String {
        revstore_wire::location(&self.key, self.version_id)
    }

    pub(crate) fn from_read(read: ReadResult) -> crate::Result<Self> {
        let body = read.payload.to_json()?;
        Ok(Self {
            key: read.key,
            body,
            version_id: read.version_id,
            last_modified: read.last_modified,
        })
    }
}
