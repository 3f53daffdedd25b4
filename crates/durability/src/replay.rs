//! Journal replay
//!
//! Reads every complete frame from the start of the journal. A damaged
//! *final* frame is a torn write from a crash: it is dropped and the file is
//! truncated to the last good frame. Damage anywhere else is corruption.
//!
//! ## Replay Sequence
//!
//! ```text
//! 1. Read the whole file
//! 2. Decode frames until the end or the first bad frame
//! 3. Bad frame at the tail → truncate, report truncated_tail
//! 4. Bad frame before the tail → Corruption
//! ```

use crate::encoding::{decode_entry, DecodeError, FRAME_HEADER_LEN};
use crate::journal::JournalEntry;
use byteorder::{ByteOrder, LittleEndian};
use revstore_core::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

/// Replay result
#[derive(Debug, Default, Clone)]
pub struct ReplayResult {
    /// Decoded entries in file order
    pub entries: Vec<JournalEntry>,
    /// Whether a torn final frame was removed
    pub truncated_tail: bool,
    /// Frames discarded (only ever the torn tail)
    pub corrupt_entries: usize,
    /// Bytes of valid frames
    pub valid_bytes: u64,
}

impl ReplayResult {
    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} entries, {} bytes{}",
            self.entries.len(),
            self.valid_bytes,
            if self.truncated_tail {
                ", torn tail truncated"
            } else {
                ""
            }
        )
    }
}

/// Replay the journal at `path`
///
/// A missing file replays as empty.
pub fn replay(path: &Path) -> Result<ReplayResult> {
    let buf = match fs::read(path) {
        Ok(buf) => buf,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ReplayResult::default()),
        Err(e) => return Err(e.into()),
    };

    let mut result = ReplayResult::default();
    let mut offset = 0usize;

    while offset < buf.len() {
        match decode_entry(&buf[offset..]) {
            Ok((entry, used)) => {
                result.entries.push(entry);
                offset += used;
            }
            Err(err) => {
                if !is_tail_frame(&buf[offset..], &err) {
                    return Err(Error::Corruption(format!(
                        "journal {} at offset {}: {}",
                        path.display(),
                        offset,
                        err
                    )));
                }
                warn!(
                    path = %path.display(),
                    offset,
                    error = %err,
                    "dropping torn journal tail"
                );
                truncate(path, offset as u64)?;
                result.truncated_tail = true;
                result.corrupt_entries = 1;
                break;
            }
        }
    }

    result.valid_bytes = offset as u64;
    info!(path = %path.display(), "journal replay: {}", result.summary());
    Ok(result)
}

/// Whether a decode failure is confined to the last frame in the file
fn is_tail_frame(rest: &[u8], err: &DecodeError) -> bool {
    match err {
        DecodeError::Incomplete { .. } => true,
        DecodeError::ChecksumMismatch { .. } => {
            let len = LittleEndian::read_u32(&rest[0..4]) as usize;
            FRAME_HEADER_LEN + len == rest.len()
        }
        DecodeError::TooLarge(_) | DecodeError::Malformed(_) => false,
    }
}

fn truncate(path: &Path, len: u64) -> Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(len)?;
    file.sync_all()?;
    Ok(())
}
