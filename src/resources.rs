//! Resource operations.
//!
//! JSON-document view of the store, plus header-level entry points that
//! accept raw `If-Match` / `If-None-Match` values.

use crate::error::Result;
use crate::types::{
    ConditionalRead, EraseRecord, EraseRequest, HistoryQuery, LifecycleState, Payload,
    Precondition, Resource, ResourceKey, VersionRecord, WriteResult,
};
use revstore_engine::ResourceStore;
use std::sync::Arc;

/// Resource operations.
///
/// Access via `db.resources`.
pub struct Resources {
    store: Arc<ResourceStore>,
}

impl Resources {
    pub(crate) fn new(store: Arc<ResourceStore>) -> Self {
        Self { store }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a resource with a server-assigned id.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let created = db.resources.create("Patient", &json!({"name": "Alice"}))?;
    /// assert_eq!(created.version_id, 1);
    /// ```
    pub fn create(&self, resource_type: &str, body: &serde_json::Value) -> Result<WriteResult> {
        Ok(self.store.create(resource_type, Payload::from_json(body)?)?)
    }

    /// Create a resource with a caller-supplied id.
    ///
    /// Fails with `AlreadyExists` if the resource is active.
    pub fn create_with_id(&self, key: &ResourceKey, body: &serde_json::Value) -> Result<WriteResult> {
        Ok(self.store.create_with_id(key, Payload::from_json(body)?)?)
    }

    /// Write a new version.
    ///
    /// # Example
    ///
    /// ```ignore
    /// db.resources.update(&key, &json!({"name": "Bob"}), Precondition::IfMatch(1))?;
    /// ```
    pub fn update(
        &self,
        key: &ResourceKey,
        body: &serde_json::Value,
        precondition: Precondition,
    ) -> Result<WriteResult> {
        Ok(self
            .store
            .update(key, Payload::from_json(body)?, precondition)?)
    }

    /// Write a new version, with preconditions taken from raw header values.
    ///
    /// `If-Match` wins when both headers are given.
    pub fn update_with_headers(
        &self,
        key: &ResourceKey,
        body: &serde_json::Value,
        if_match: Option<&str>,
        if_none_match: Option<&str>,
    ) -> Result<WriteResult> {
        let precondition = write_precondition(if_match, if_none_match)?;
        self.update(key, body, precondition)
    }

    /// Logically delete a resource (append a tombstone).
    pub fn delete(&self, key: &ResourceKey, precondition: Precondition) -> Result<WriteResult> {
        Ok(self.store.delete(key, precondition)?)
    }

    /// Delete with an optional raw `If-Match` header.
    pub fn delete_with_header(&self, key: &ResourceKey, if_match: Option<&str>) -> Result<WriteResult> {
        let precondition = write_precondition(if_match, None)?;
        self.delete(key, precondition)
    }

    /// Permanently remove every version of a resource.
    pub fn erase(&self, key: &ResourceKey, reason: Option<&str>) -> Result<EraseRecord> {
        let request = match reason {
            Some(reason) => EraseRequest::with_reason(reason),
            None => EraseRequest::new(),
        };
        Ok(self.store.erase(key, request)?)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read the current version.
    pub fn read(&self, key: &ResourceKey) -> Result<Resource> {
        Resource::from_read(self.store.read(key)?)
    }

    /// Read unless the client already holds the current version.
    ///
    /// Returns `None` for "not modified". Unparseable header values are
    /// ignored.
    pub fn read_if_none_match(&self, key: &ResourceKey, if_none_match: &str) -> Result<Option<Resource>> {
        let condition = revstore_wire::parse_if_none_match(if_none_match).read_condition();
        match self.store.read_conditional(key, condition)? {
            ConditionalRead::Modified(read) => Ok(Some(Resource::from_read(read)?)),
            ConditionalRead::NotModified { .. } => Ok(None),
        }
    }

    /// Read a specific version.
    pub fn vread(&self, key: &ResourceKey, version_id: u64) -> Result<Resource> {
        Resource::from_read(self.store.vread(key, version_id)?)
    }

    /// Version history, newest first, tombstones included.
    pub fn history(&self, key: &ResourceKey, query: HistoryQuery) -> Result<Vec<VersionRecord>> {
        Ok(self.store.history(key, query)?)
    }

    /// Lifecycle state of a resource.
    pub fn state(&self, key: &ResourceKey) -> LifecycleState {
        self.store.state(key)
    }

    /// True when the resource is active.
    pub fn exists(&self, key: &ResourceKey) -> bool {
        self.state(key) == LifecycleState::Active
    }

    /// Keys of one resource type, including deleted ones.
    pub fn list(&self, resource_type: &str) -> Vec<ResourceKey> {
        self.store.keys_of_type(resource_type)
    }
}

fn write_precondition(if_match: Option<&str>, if_none_match: Option<&str>) -> Result<Precondition> {
    if let Some(header) = if_match {
        return Ok(Precondition::IfMatch(revstore_wire::parse_if_match(header)?));
    }
    match if_none_match {
        Some(header) => Ok(revstore_wire::parse_if_none_match(header).precondition(header)?),
        None => Ok(Precondition::None),
    }
}
