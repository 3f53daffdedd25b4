//! Append-only journal
//!
//! Every committed version and every erase is written here before it becomes
//! visible in memory. Replaying the journal from the start rebuilds the ledger.
//!
//! Entries:
//! - Append: one new version of one resource
//! - Purge: every version of one resource was erased

use crate::encoding::{encode_entry, EncodeError, MAX_FRAME_LEN};
use crate::mode::DurabilityMode;
use parking_lot::Mutex;
use revstore_core::{Error, ResourceKey, Result, VersionRecord};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// File name of the journal inside a data directory
pub const JOURNAL_FILE: &str = "journal.wal";

/// Journal entry types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntry {
    /// A version was committed
    Append {
        /// Resource written
        key: ResourceKey,
        /// Committed record, including its id and timestamp
        record: VersionRecord,
    },

    /// All versions of a resource were erased
    Purge {
        /// Resource erased
        key: ResourceKey,
        /// Caller-supplied reason
        reason: Option<String>,
    },
}

impl JournalEntry {
    /// Key the entry applies to
    pub fn key(&self) -> &ResourceKey {
        match self {
            JournalEntry::Append { key, .. } | JournalEntry::Purge { key, .. } => key,
        }
    }

    /// Version id for appends
    pub fn version(&self) -> Option<u64> {
        match self {
            JournalEntry::Append { record, .. } => Some(record.version_id),
            JournalEntry::Purge { .. } => None,
        }
    }
}

struct JournalFile {
    file: File,
    /// Length of the file up to the last complete frame
    offset: u64,
    unsynced: usize,
    last_sync: Instant,
}

impl JournalFile {
    fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let offset = file.metadata()?.len();
        Ok(Self {
            file,
            offset,
            unsynced: 0,
            last_sync: Instant::now(),
        })
    }

    fn sync(&mut self) -> std::io::Result<()> {
        self.sync_with(File::sync_data)
    }

    fn sync_with(&mut self, sync: SyncFn) -> std::io::Result<()> {
        sync(&self.file)?;
        self.unsynced = 0;
        self.last_sync = Instant::now();
        Ok(())
    }

    fn write_frame(&mut self, frame: &[u8], mode: DurabilityMode) -> std::io::Result<()> {
        self.write_frame_with(frame, mode, File::sync_data)
    }

    /// Write `frame` and sync per `mode`
    ///
    /// On any failure the file is cut back to the last complete frame, so a
    /// frame is either reported written or absent from the file.
    fn write_frame_with(
        &mut self,
        frame: &[u8],
        mode: DurabilityMode,
        sync: SyncFn,
    ) -> std::io::Result<()> {
        let previous = self.offset;
        if let Err(e) = self.file.write_all(frame) {
            self.rollback(previous);
            return Err(e);
        }
        self.offset += frame.len() as u64;
        self.unsynced += 1;

        let needs_sync = match mode {
            DurabilityMode::Strict => true,
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                self.unsynced >= batch_size
                    || self.last_sync.elapsed() >= Duration::from_millis(interval_ms)
            }
            DurabilityMode::None => false,
        };
        if needs_sync {
            if let Err(e) = self.sync_with(sync) {
                self.rollback(previous);
                return Err(e);
            }
        }
        Ok(())
    }

    fn rollback(&mut self, offset: u64) {
        if let Err(e) = self.file.set_len(offset) {
            warn!(error = %e, offset, "failed to truncate unacknowledged journal frame");
        }
        if self.offset > offset {
            self.offset = offset;
            self.unsynced = self.unsynced.saturating_sub(1);
        }
    }
}

type SyncFn = fn(&File) -> std::io::Result<()>;

fn encode(entry: &JournalEntry) -> Result<Vec<u8>> {
    encode_entry(entry).map_err(|e| match e {
        EncodeError::TooLarge(size) => Error::PayloadTooLarge {
            key: entry.key().clone(),
            size,
            limit: MAX_FRAME_LEN,
        },
        EncodeError::Serialize(e) => Error::Serialization(e.to_string()),
    })
}

/// Append-only journal file
///
/// # Thread Safety
///
/// All writes go through an internal mutex. Callers that hold a per-resource
/// lock take the journal lock second, never the other way around.
pub struct Journal {
    path: PathBuf,
    mode: DurabilityMode,
    inner: Mutex<JournalFile>,
}

impl Journal {
    /// Open (or create) the journal at `path`
    pub fn open(path: impl AsRef<Path>, mode: DurabilityMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let inner = JournalFile::open(&path)?;
        debug!(path = %path.display(), size = inner.offset, %mode, "opened journal");
        Ok(Self {
            path,
            mode,
            inner: Mutex::new(inner),
        })
    }

    /// Write one entry
    pub fn append(&self, entry: &JournalEntry) -> Result<()> {
        self.append_then(entry, || Ok(()))
    }

    /// Write one entry, then run `apply` while the journal lock is still held
    ///
    /// `apply` is not called when the write fails. Holding the lock across
    /// `apply` keeps the in-memory state in step with the file for
    /// [`rewrite`](Self::rewrite).
    pub fn append_then<T, F>(&self, entry: &JournalEntry, apply: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let frame = encode(entry)?;
        let mut inner = self.inner.lock();
        inner.write_frame(&frame, self.mode).map_err(|e| {
            error!(key = %entry.key(), error = %e, "journal write failed");
            Error::StorageFailure(format!("journal write failed: {}", e))
        })?;
        apply()
    }

    /// Force an fsync of everything written so far
    pub fn flush(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner
            .sync()
            .map_err(|e| Error::StorageFailure(format!("journal fsync failed: {}", e)))
    }

    /// Replace the journal with the entries produced by `snapshot`
    ///
    /// `snapshot` runs with the journal lock held, so no append can land
    /// between taking the snapshot and swapping the file. Returns the new
    /// file size.
    pub fn rewrite<F>(&self, snapshot: F) -> Result<u64>
    where
        F: FnOnce() -> Vec<JournalEntry>,
    {
        let mut inner = self.inner.lock();
        let entries = snapshot();
        let tmp = self.path.with_extension("wal.tmp");

        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            for entry in &entries {
                writer.write_all(&encode(entry)?)?;
            }
            let file = writer
                .into_inner()
                .map_err(|e| Error::StorageFailure(e.to_string()))?;
            file.sync_all()?;
        }

        // Open before the rename so a failure leaves the old file in place
        let fresh = JournalFile::open(&tmp)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            // Persist the rename where the platform allows opening directories
            if let Ok(dir) = File::open(dir) {
                let _ = dir.sync_all();
            }
        }

        *inner = fresh;
        info!(
            path = %self.path.display(),
            entries = entries.len(),
            size = inner.offset,
            "rewrote journal"
        );
        Ok(inner.offset)
    }

    /// Bytes of complete frames in the file
    pub fn size(&self) -> u64 {
        self.inner.lock().offset
    }

    /// Path of the journal file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured durability mode
    pub fn mode(&self) -> DurabilityMode {
        self.mode
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if inner.unsynced > 0 {
            if let Err(e) = inner.sync() {
                warn!(path = %self.path.display(), error = %e, "fsync on close failed");
            }
        }
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .finish()
    }
}
