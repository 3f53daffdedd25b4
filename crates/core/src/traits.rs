//! Storage trait
//!
//! [`VersionLedger`] is the seam between the engine and the in-memory
//! version store. Implementations must be `Send + Sync`; every method takes
//! `&self` and serializes writers per key internally.

use crate::error::Result;
use crate::types::{HistoryQuery, LifecycleState, Payload, ResourceKey, VersionRecord};

/// Append-only per-resource version history
pub trait VersionLedger: Send + Sync {
    /// Append a new version at `head + 1` and return it
    ///
    /// The version id is assigned under the entry's writer lock, so concurrent
    /// appends to one key produce a gap-free sequence.
    fn append(&self, key: &ResourceKey, payload: Payload, is_deletion_marker: bool)
        -> Result<VersionRecord>;

    /// Current head version, if any
    fn head(&self, key: &ResourceKey) -> Option<VersionRecord>;

    /// A specific version
    ///
    /// Fails with `VersionNotFound` when the key has no such version.
    fn at(&self, key: &ResourceKey, version_id: u64) -> Result<VersionRecord>;

    /// Remove every version of the key, returning how many were removed
    fn purge_all(&self, key: &ResourceKey) -> Result<usize>;

    /// Versions newest-first, paged by `query`
    fn history(&self, key: &ResourceKey, query: HistoryQuery) -> Vec<VersionRecord>;

    /// Number of versions stored for the key (0 when absent)
    fn version_count(&self, key: &ResourceKey) -> usize;

    /// Number of keys with at least one version
    fn len(&self) -> usize;

    /// True when no key holds any version
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of one resource type, sorted
    fn keys_of_type(&self, resource_type: &str) -> Vec<ResourceKey>;

    /// Lifecycle state derived from the head
    fn state(&self, key: &ResourceKey) -> LifecycleState {
        LifecycleState::of(self.head(key).as_ref())
    }
}
