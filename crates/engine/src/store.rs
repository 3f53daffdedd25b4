//! Resource store
//!
//! Orchestrates every operation on a resource:
//!
//! ```text
//! write(key, op):
//!   lock entry (timeout, retired handling)
//!     head  = ledger head
//!     t     = lifecycle::transition(head, op)      ← preconditions checked here
//!     journal.append(t)                            ← durability point
//!     ledger.commit(t)                             ← visibility point
//!   unlock
//! ```
//!
//! Reads never take the entry lock.

use crate::config::StoreConfig;
use crate::lifecycle::{self, Operation, Transition};
use crate::purger::{self, EraseRequest};
use crate::recovery::{self, RecoveryStats};
use revstore_concurrency::{check_read, ReadValidation};
use revstore_core::{
    ConditionalRead, EraseRecord, Error, HistoryQuery, LifecycleState, Payload, Precondition,
    ReadCondition, ReadResult, ResourceKey, Result, VersionLedger, VersionRecord, WriteResult,
};
use revstore_durability::{DurabilityMode, Journal, JournalEntry, JOURNAL_FILE};
use revstore_storage::{LedgerGuard, ShardedLedger};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Result of [`ResourceStore::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// A create, update or delete
    Written(WriteResult),
    /// An erase
    Erased(EraseRecord),
}

impl Applied {
    fn into_write(self) -> Result<WriteResult> {
        match self {
            Applied::Written(result) => Ok(result),
            Applied::Erased(record) => Err(Error::NotSupported(format!(
                "write to {} resolved to an erase",
                record.key
            ))),
        }
    }

    fn into_erase(self) -> Result<EraseRecord> {
        match self {
            Applied::Erased(record) => Ok(record),
            Applied::Written(result) => Err(Error::NotSupported(format!(
                "erase of {} resolved to a write",
                result.key
            ))),
        }
    }
}

/// Store summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInfo {
    /// Resources with at least one version
    pub resources: usize,
    /// Versions across all resources
    pub versions: usize,
    /// Journal fsync policy in effect
    pub durability: DurabilityMode,
    /// Journal size in bytes (0 when in memory)
    pub journal_bytes: u64,
    /// Data directory, if persistent
    pub data_dir: Option<PathBuf>,
}

/// Versioned resource store
///
/// # Thread Safety
///
/// `ResourceStore` is `Send + Sync`. Writers to one resource are serialized
/// by that resource's entry lock; writers to different resources run in
/// parallel. Lock order is entry, then journal.
pub struct ResourceStore {
    ledger: ShardedLedger,
    journal: Option<Journal>,
    config: StoreConfig,
    recovery: RecoveryStats,
}

impl ResourceStore {
    /// Open a store with the given configuration
    ///
    /// With a data directory and a journaling durability mode, the journal is
    /// replayed before the store is returned.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let ledger = ShardedLedger::new();
        let mut recovery = RecoveryStats::default();

        let journal = match (&config.data_dir, config.is_persistent()) {
            (Some(dir), true) => {
                fs::create_dir_all(dir)?;
                let path = dir.join(JOURNAL_FILE);
                recovery = recovery::recover(&ledger, &path)?;
                Some(Journal::open(&path, config.durability)?)
            }
            _ => None,
        };

        info!(
            data_dir = ?config.data_dir,
            durability = %config.durability,
            resources = recovery.resources,
            "opened store"
        );

        Ok(Self {
            ledger,
            journal,
            config,
            recovery,
        })
    }

    /// In-memory store with default settings
    pub fn ephemeral() -> Self {
        Self {
            ledger: ShardedLedger::new(),
            journal: None,
            config: StoreConfig::ephemeral(),
            recovery: RecoveryStats::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// What the journal replay found on open
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.recovery
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create a resource with a server-assigned id
    pub fn create(&self, resource_type: &str, payload: Payload) -> Result<WriteResult> {
        self.create_with_id(&ResourceKey::generate(resource_type), payload)
    }

    /// Create a resource with a caller-supplied id
    ///
    /// Fails with `AlreadyExists` when the resource is active.
    pub fn create_with_id(&self, key: &ResourceKey, payload: Payload) -> Result<WriteResult> {
        self.apply(key, Operation::Create, payload)?.into_write()
    }

    /// Write a new version, subject to `precondition`
    pub fn update(
        &self,
        key: &ResourceKey,
        payload: Payload,
        precondition: Precondition,
    ) -> Result<WriteResult> {
        self.apply(key, Operation::Update(precondition), payload)?
            .into_write()
    }

    /// Append a tombstone
    pub fn delete(&self, key: &ResourceKey, precondition: Precondition) -> Result<WriteResult> {
        self.apply(key, Operation::Delete(precondition), Payload::empty())?
            .into_write()
    }

    /// Remove every version of a resource
    ///
    /// With `compact_on_erase` the journal is rewritten afterwards. The erase
    /// is already durable at that point, so a failed compaction is logged and
    /// the record is still returned.
    pub fn erase(&self, key: &ResourceKey, request: EraseRequest) -> Result<EraseRecord> {
        let record = self.execute(key, Operation::Erase, Payload::empty(), &request)?.into_erase()?;
        if self.config.compact_on_erase {
            if let Err(e) = self.compact() {
                error!(key = %key, error = %e, "compaction after erase failed");
            }
        }
        Ok(record)
    }

    /// Run any operation against one resource
    pub fn apply(&self, key: &ResourceKey, op: Operation, payload: Payload) -> Result<Applied> {
        self.execute(key, op, payload, &EraseRequest::default())
    }

    fn execute(
        &self,
        key: &ResourceKey,
        op: Operation,
        payload: Payload,
        request: &EraseRequest,
    ) -> Result<Applied> {
        key.validate()?;
        let result = self.ledger.write(
            key,
            self.config.lock_timeout(),
            self.config.erase_semantics.on_retired(),
            |guard| {
                let head = guard.head();
                let transition = lifecycle::transition(key, head.as_ref(), op, &self.config)?;
                match transition {
                    Transition::Append { tombstone, outcome } => {
                        let payload = if tombstone { Payload::empty() } else { payload };
                        let record = guard.next_record(payload, tombstone);
                        self.commit(guard, record.clone())?;
                        debug!(
                            resource_type = %key.resource_type,
                            logical_id = %key.logical_id,
                            version_id = record.version_id,
                            %outcome,
                            "committed"
                        );
                        Ok(Applied::Written(WriteResult {
                            key: key.clone(),
                            version_id: record.version_id,
                            last_modified: record.created_at,
                            outcome,
                        }))
                    }
                    Transition::NoOp { outcome } => {
                        let head = head.ok_or_else(|| Error::NotFound(key.clone()))?;
                        Ok(Applied::Written(WriteResult {
                            key: key.clone(),
                            version_id: head.version_id,
                            last_modified: head.created_at,
                            outcome,
                        }))
                    }
                    Transition::Purge => {
                        purger::purge(guard, self.journal.as_ref(), request).map(Applied::Erased)
                    }
                }
            },
        );

        if let Err(e) = &result {
            match e {
                Error::ConflictDuringErase(_) => {
                    warn!(key = %key, %op, "write rejected by concurrent erase")
                }
                Error::Timeout(_) => warn!(key = %key, %op, "lock timeout"),
                _ => debug!(key = %key, %op, error = %e, "operation refused"),
            }
        }
        result
    }

    fn commit(&self, guard: &mut LedgerGuard<'_>, record: VersionRecord) -> Result<()> {
        match &self.journal {
            Some(journal) => {
                let entry = JournalEntry::Append {
                    key: guard.key().clone(),
                    record: record.clone(),
                };
                journal.append_then(&entry, || guard.commit(record))
            }
            None => guard.commit(record),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read the current version
    ///
    /// # Errors
    ///
    /// `NotFound` when absent, `Gone` when the head is a tombstone.
    pub fn read(&self, key: &ResourceKey) -> Result<ReadResult> {
        let head = self.live_head(key)?;
        Ok(ReadResult::from_record(key.clone(), head))
    }

    /// Read the current version unless the caller already holds it
    pub fn read_conditional(
        &self,
        key: &ResourceKey,
        condition: ReadCondition,
    ) -> Result<ConditionalRead> {
        let head = self.live_head(key)?;
        match check_read(&head, condition) {
            ReadValidation::NotModified => Ok(ConditionalRead::NotModified {
                version_id: head.version_id,
                last_modified: head.created_at,
            }),
            ReadValidation::Modified => Ok(ConditionalRead::Modified(ReadResult::from_record(
                key.clone(),
                head,
            ))),
        }
    }

    /// Read a specific version
    ///
    /// # Errors
    ///
    /// `NotFound` when absent, `VersionNotFound` when the version does not
    /// exist, `Gone` when the version is a tombstone.
    pub fn vread(&self, key: &ResourceKey, version_id: u64) -> Result<ReadResult> {
        key.validate()?;
        if self.ledger.version_count(key) == 0 {
            return Err(Error::NotFound(key.clone()));
        }
        let record = self.ledger.at(key, version_id)?;
        if record.is_deletion_marker {
            return Err(Error::Gone {
                key: key.clone(),
                version_id: record.version_id,
                deleted_at: record.created_at,
            });
        }
        Ok(ReadResult::from_record(key.clone(), record))
    }

    /// Version history, newest first, tombstones included
    pub fn history(&self, key: &ResourceKey, query: HistoryQuery) -> Result<Vec<VersionRecord>> {
        key.validate()?;
        if self.ledger.version_count(key) == 0 {
            return Err(Error::NotFound(key.clone()));
        }
        Ok(self.ledger.history(key, query))
    }

    /// Current lifecycle state
    pub fn state(&self, key: &ResourceKey) -> LifecycleState {
        self.ledger.state(key)
    }

    /// Keys of one resource type (including deleted), sorted
    pub fn keys_of_type(&self, resource_type: &str) -> Vec<ResourceKey> {
        self.ledger.keys_of_type(resource_type)
    }

    /// Number of resources with history
    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    /// True when no resource has history
    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    fn live_head(&self, key: &ResourceKey) -> Result<VersionRecord> {
        key.validate()?;
        let head = self
            .ledger
            .head(key)
            .ok_or_else(|| Error::NotFound(key.clone()))?;
        if head.is_deletion_marker {
            return Err(Error::Gone {
                key: key.clone(),
                version_id: head.version_id,
                deleted_at: head.created_at,
            });
        }
        Ok(head)
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// fsync the journal
    pub fn flush(&self) -> Result<()> {
        match &self.journal {
            Some(journal) => journal.flush(),
            None => Ok(()),
        }
    }

    /// Rewrite the journal from the live ledger
    ///
    /// Drops the frames of erased resources from disk. Returns the new
    /// journal size (0 when in memory).
    pub fn compact(&self) -> Result<u64> {
        match &self.journal {
            Some(journal) => journal.rewrite(|| recovery::snapshot_entries(&self.ledger)),
            None => Ok(0),
        }
    }

    /// Store summary
    pub fn info(&self) -> StoreInfo {
        StoreInfo {
            resources: self.ledger.len(),
            versions: self.ledger.total_versions(),
            durability: self
                .journal
                .as_ref()
                .map(|j| j.mode())
                .unwrap_or(DurabilityMode::None),
            journal_bytes: self.journal.as_ref().map(|j| j.size()).unwrap_or(0),
            data_dir: self.config.data_dir.clone(),
        }
    }
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("ledger", &self.ledger)
            .field("journal", &self.journal)
            .finish()
    }
}
