//! Erase purger
//!
//! Erase is the second deletion tier: unlike delete it appends nothing. It
//! removes every version of a resource and returns the key to `Absent`.
//! It cannot be undone.

use chrono::Utc;
use revstore_core::{EraseRecord, Result};
use revstore_durability::{Journal, JournalEntry};
use revstore_storage::LedgerGuard;
use tracing::info;

/// Parameters of an erase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EraseRequest {
    /// Free-text reason kept in the journal and the returned record
    pub reason: Option<String>,
}

impl EraseRequest {
    /// Erase without a reason
    pub fn new() -> Self {
        Self::default()
    }

    /// Erase with a reason
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

/// Purge the resource held by `guard`
///
/// The purge is journaled first; the in-memory history is only cleared once
/// the journal accepted the entry.
pub(crate) fn purge(
    guard: &mut LedgerGuard<'_>,
    journal: Option<&Journal>,
    request: &EraseRequest,
) -> Result<EraseRecord> {
    let key = guard.key().clone();
    let versions_erased = match journal {
        Some(journal) => {
            let entry = JournalEntry::Purge {
                key: key.clone(),
                reason: request.reason.clone(),
            };
            journal.append_then(&entry, || Ok(guard.purge_all()))?
        }
        None => guard.purge_all(),
    };

    info!(
        resource_type = %key.resource_type,
        logical_id = %key.logical_id,
        versions_erased,
        reason = request.reason.as_deref().unwrap_or(""),
        "erased resource"
    );

    Ok(EraseRecord {
        key,
        versions_erased,
        reason: request.reason.clone(),
        erased_at: Utc::now(),
    })
}
