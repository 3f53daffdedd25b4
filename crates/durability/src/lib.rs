//! Durability layer for Revstore
//!
//! This crate implements the append-only journal:
//! - JournalEntry types: Append, Purge
//! - Frame encoding/decoding with CRC32 checksums
//! - Durability modes: None, Strict, Batched (default)
//! - Replay with torn-tail truncation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod journal;
pub mod mode;
pub mod replay;

pub use encoding::{decode_entry, encode_entry, DecodeError, EncodeError, MAX_FRAME_LEN};
pub use journal::{Journal, JournalEntry, JOURNAL_FILE};
pub use mode::DurabilityMode;
pub use replay::{replay, ReplayResult};
