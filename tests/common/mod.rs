//! Shared helpers for the integration suites.

#![allow(dead_code)]

use revstore::{DurabilityMode, Revstore, RevstoreBuilder, ResourceKey, VersionRecord};
use std::path::Path;
use tempfile::TempDir;

/// In-memory store with default settings
pub fn ephemeral() -> Revstore {
    Revstore::ephemeral()
}

/// Builder rooted at `dir` with strict fsync
pub fn strict_builder(dir: &Path) -> RevstoreBuilder {
    Revstore::builder().path(dir).strict()
}

/// Persistent store in a fresh temp dir; keep the `TempDir` alive
pub fn persistent() -> (TempDir, Revstore) {
    let dir = TempDir::new().expect("temp dir");
    let db = strict_builder(dir.path()).open().expect("open store");
    assert_eq!(db.durability_mode(), DurabilityMode::Strict);
    (dir, db)
}

/// Key under the `Patient` type
pub fn patient(id: &str) -> ResourceKey {
    ResourceKey::new("Patient", id)
}

/// Assert versions run 1..=n with no gaps, given newest-first history
pub fn assert_contiguous(history: &[VersionRecord]) {
    for (i, record) in history.iter().rev().enumerate() {
        assert_eq!(
            record.version_id,
            i as u64 + 1,
            "gap or duplicate in history: {:?}",
            history.iter().map(|r| r.version_id).collect::<Vec<_>>()
        );
    }
}
