//! Journal recovery and compaction snapshots
//!
//! Recovery replays the journal into an empty ledger. Replaying reproduces
//! the same heads, histories and erasures the store had when it stopped,
//! minus any torn final frame.

use revstore_core::{HistoryQuery, Result, VersionLedger};
use revstore_durability::{replay, JournalEntry};
use revstore_storage::ShardedLedger;
use std::path::Path;
use tracing::info;

/// Recovery statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Append entries applied
    pub appends: usize,
    /// Purge entries applied
    pub purges: usize,
    /// Resources present after replay
    pub resources: usize,
    /// Versions present after replay
    pub versions: usize,
    /// Whether a torn final frame was dropped
    pub truncated_tail: bool,
}

/// Replay the journal at `path` into `ledger`
///
/// # Errors
///
/// `Corruption` if a frame before the tail is damaged or an append does not
/// follow its resource's head.
pub fn recover(ledger: &ShardedLedger, path: &Path) -> Result<RecoveryStats> {
    let replayed = replay(path)?;
    let mut stats = RecoveryStats {
        truncated_tail: replayed.truncated_tail,
        ..RecoveryStats::default()
    };

    for entry in replayed.entries {
        match entry {
            JournalEntry::Append { key, record } => {
                ledger.restore(&key, record)?;
                stats.appends += 1;
            }
            JournalEntry::Purge { key, .. } => {
                ledger.purge_all(&key)?;
                stats.purges += 1;
            }
        }
    }

    stats.resources = ledger.len();
    stats.versions = ledger.total_versions();
    info!(
        appends = stats.appends,
        purges = stats.purges,
        resources = stats.resources,
        versions = stats.versions,
        truncated_tail = stats.truncated_tail,
        "recovered store"
    );
    Ok(stats)
}

/// Journal entries that rebuild the ledger's current contents
///
/// Erased resources leave no trace; each surviving version becomes one
/// append, oldest first.
pub fn snapshot_entries(ledger: &ShardedLedger) -> Vec<JournalEntry> {
    let mut entries = Vec::with_capacity(ledger.total_versions());
    for key in ledger.keys() {
        let mut history = ledger.history(&key, HistoryQuery::all());
        history.reverse();
        entries.extend(history.into_iter().map(|record| JournalEntry::Append {
            key: key.clone(),
            record,
        }));
    }
    entries
}
