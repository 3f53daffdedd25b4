//! Sharded version ledger
//!
//! DashMap keyed by [`ResourceKey`], one [`LedgerEntry`] per resource.
//! Reads never take a writer lock; writers to different keys never contend.
//!
//! # Design
//!
//! - DashMap with FxHash: sharded map, O(1) lookups
//! - Per-entry writer `Mutex`: serializes the read-check-append sequence
//! - Per-entry records `RwLock`: readers see either the old or the new head
//!
//! An entry is *retired* when it leaves the map while a writer still holds an
//! `Arc` to it. Retirement happens on purge (erase) and when a write left the
//! entry empty (for example an update rejected with `NotFound`). A writer that
//! wakes on a retired entry either reacquires a fresh entry or fails,
//! according to [`OnRetired`].

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use revstore_core::{
    Error, HistoryQuery, LifecycleState, Payload, ResourceKey, Result, VersionLedger,
    VersionRecord,
};
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// Why an entry left the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    /// History was erased
    Purged,
    /// A write finished without committing anything
    Vacated,
}

/// What a writer does when it acquires a purged entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnRetired {
    /// Start over on a fresh entry (numbering restarts at 1)
    Reacquire,
    /// Fail with `ConflictDuringErase`
    Fail,
}

#[derive(Debug, Default)]
struct WriterState {
    retired: Option<RetireReason>,
}

/// Per-resource history
///
/// `records[i].version_id == i + 1` always holds.
#[derive(Debug, Default)]
pub struct LedgerEntry {
    writer: Mutex<WriterState>,
    records: RwLock<Vec<VersionRecord>>,
}

impl LedgerEntry {
    fn head(&self) -> Option<VersionRecord> {
        self.records.read().last().cloned()
    }

    fn len(&self) -> usize {
        self.records.read().len()
    }
}

/// Exclusive access to one entry for the duration of a write
///
/// Obtained through [`ShardedLedger::write`]. Everything done through the
/// guard happens with the entry's writer lock held.
pub struct LedgerGuard<'a> {
    key: &'a ResourceKey,
    entry: &'a Arc<LedgerEntry>,
    ledger: &'a ShardedLedger,
    writer: &'a mut WriterState,
}

impl<'a> LedgerGuard<'a> {
    /// Key being written
    pub fn key(&self) -> &ResourceKey {
        self.key
    }

    /// Current head
    pub fn head(&self) -> Option<VersionRecord> {
        self.entry.head()
    }

    /// Lifecycle state derived from the head
    pub fn state(&self) -> LifecycleState {
        LifecycleState::of(self.head().as_ref())
    }

    /// Number of stored versions
    pub fn version_count(&self) -> usize {
        self.entry.len()
    }

    /// Build the record that would become the next head
    ///
    /// Nothing is stored until [`commit`](Self::commit).
    pub fn next_record(&self, payload: Payload, is_deletion_marker: bool) -> VersionRecord {
        let next = self.entry.len() as u64 + 1;
        VersionRecord::new(next, payload, is_deletion_marker)
    }

    /// Make a record the new head
    ///
    /// The record must be exactly `head + 1`.
    pub fn commit(&mut self, record: VersionRecord) -> Result<()> {
        let mut records = self.entry.records.write();
        let expected = records.len() as u64 + 1;
        if record.version_id != expected {
            return Err(Error::Corruption(format!(
                "{}: version {} does not follow head {}",
                self.key,
                record.version_id,
                expected - 1
            )));
        }
        trace!(key = %self.key, version = record.version_id, "commit");
        records.push(record);
        Ok(())
    }

    /// Build and commit the next record in one step
    pub fn append(&mut self, payload: Payload, is_deletion_marker: bool) -> Result<VersionRecord> {
        let record = self.next_record(payload, is_deletion_marker);
        self.commit(record.clone())?;
        Ok(record)
    }

    /// Remove every version and retire the entry
    ///
    /// Returns the number of versions removed. Writers queued on this entry
    /// observe [`RetireReason::Purged`].
    pub fn purge_all(&mut self) -> usize {
        let removed = {
            let mut records = self.entry.records.write();
            let n = records.len();
            records.clear();
            n
        };
        self.writer.retired = Some(RetireReason::Purged);
        let entry = self.entry;
        self.ledger
            .shards
            .remove_if(self.key, |_, current| Arc::ptr_eq(current, entry));
        debug!(key = %self.key, removed, "purged entry");
        removed
    }
}

/// Sharded in-memory version ledger
///
/// # Thread Safety
///
/// - Reads clone the entry `Arc` out of the map, then take the records read lock
/// - Writes take the entry writer lock, then the records write lock
/// - No path holds a map shard lock while waiting on an entry writer lock
pub struct ShardedLedger {
    shards: DashMap<ResourceKey, Arc<LedgerEntry>, FxBuildHasher>,
}

impl ShardedLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            shards: DashMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Create with expected number of resources
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            shards: DashMap::with_capacity_and_hasher(capacity, FxBuildHasher::default()),
        }
    }

    fn entry(&self, key: &ResourceKey) -> Option<Arc<LedgerEntry>> {
        self.shards.get(key).map(|e| Arc::clone(e.value()))
    }

    fn entry_or_insert(&self, key: &ResourceKey) -> Arc<LedgerEntry> {
        if let Some(entry) = self.entry(key) {
            return entry;
        }
        Arc::clone(
            self.shards
                .entry(key.clone())
                .or_insert_with(|| Arc::new(LedgerEntry::default()))
                .value(),
        )
    }

    /// Run `f` inside the key's critical section
    ///
    /// Waits at most `timeout` for the writer lock (forever when `None`).
    /// An entry left empty after `f` returns is removed from the map.
    ///
    /// # Errors
    ///
    /// - `Timeout` if the lock is not acquired in time
    /// - `ConflictDuringErase` if the entry was purged and `on_retired` is `Fail`
    /// - whatever `f` returns
    pub fn write<T, F>(
        &self,
        key: &ResourceKey,
        timeout: Option<Duration>,
        on_retired: OnRetired,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut LedgerGuard<'_>) -> Result<T>,
    {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let entry = self.entry_or_insert(key);
            let mut writer = match deadline {
                Some(deadline) => entry
                    .writer
                    .try_lock_until(deadline)
                    .ok_or_else(|| Error::Timeout(key.clone()))?,
                None => entry.writer.lock(),
            };

            match writer.retired {
                Some(RetireReason::Purged) if on_retired == OnRetired::Fail => {
                    debug!(key = %key, "writer raced with erase");
                    return Err(Error::ConflictDuringErase(key.clone()));
                }
                Some(reason) => {
                    trace!(key = %key, ?reason, "entry retired, reacquiring");
                    continue;
                }
                None => {}
            }

            let result = {
                let mut guard = LedgerGuard {
                    key,
                    entry: &entry,
                    ledger: self,
                    writer: &mut *writer,
                };
                f(&mut guard)
            };

            if writer.retired.is_none() && entry.len() == 0 {
                writer.retired = Some(RetireReason::Vacated);
                self.shards
                    .remove_if(key, |_, current| Arc::ptr_eq(current, &entry));
            }
            return result;
        }
    }

    /// Replay a record with its original id and timestamp
    pub fn restore(&self, key: &ResourceKey, record: VersionRecord) -> Result<()> {
        self.write(key, None, OnRetired::Reacquire, |guard| guard.commit(record))
    }

    /// All keys holding at least one version, sorted
    pub fn keys(&self) -> Vec<ResourceKey> {
        let mut keys: Vec<_> = self
            .shards
            .iter()
            .filter(|e| e.value().len() > 0)
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Total number of versions across all keys
    pub fn total_versions(&self) -> usize {
        self.shards.iter().map(|e| e.value().len()).sum()
    }
}

impl Default for ShardedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedLedger")
            .field("resources", &self.len())
            .field("versions", &self.total_versions())
            .finish()
    }
}

impl VersionLedger for ShardedLedger {
    fn append(
        &self,
        key: &ResourceKey,
        payload: Payload,
        is_deletion_marker: bool,
    ) -> Result<VersionRecord> {
        self.write(key, None, OnRetired::Reacquire, |guard| {
            guard.append(payload, is_deletion_marker)
        })
    }

    fn head(&self, key: &ResourceKey) -> Option<VersionRecord> {
        self.entry(key).and_then(|entry| entry.head())
    }

    fn at(&self, key: &ResourceKey, version_id: u64) -> Result<VersionRecord> {
        let found = match (version_id, self.entry(key)) {
            (0, _) | (_, None) => None,
            (v, Some(entry)) => usize::try_from(v - 1)
                .ok()
                .and_then(|index| entry.records.read().get(index).cloned()),
        };
        found.ok_or_else(|| Error::VersionNotFound {
            key: key.clone(),
            version_id,
        })
    }

    fn purge_all(&self, key: &ResourceKey) -> Result<usize> {
        self.write(key, None, OnRetired::Reacquire, |guard| Ok(guard.purge_all()))
    }

    fn history(&self, key: &ResourceKey, query: HistoryQuery) -> Vec<VersionRecord> {
        let Some(entry) = self.entry(key) else {
            return Vec::new();
        };
        let records = entry.records.read();
        let before = query.before.unwrap_or(u64::MAX);
        let limit = query.limit.unwrap_or(usize::MAX);
        records
            .iter()
            .rev()
            .filter(|r| r.version_id < before)
            .take(limit)
            .cloned()
            .collect()
    }

    fn version_count(&self, key: &ResourceKey) -> usize {
        self.entry(key).map(|entry| entry.len()).unwrap_or(0)
    }

    fn len(&self) -> usize {
        self.shards.iter().filter(|e| e.value().len() > 0).count()
    }

    fn keys_of_type(&self, resource_type: &str) -> Vec<ResourceKey> {
        let mut keys: Vec<_> = self
            .shards
            .iter()
            .filter(|e| e.key().resource_type == resource_type && e.value().len() > 0)
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        keys
    }
}
