//! Frame encoding for journal entries
//!
//! Layout of one frame:
//!
//! ```text
//! +-----------+-----------+------------------------+
//! | len (u32) | crc (u32) | bincode(JournalEntry)  |
//! +-----------+-----------+------------------------+
//! ```
//!
//! Both header fields are little-endian. `len` is the body length and `crc`
//! is the CRC32 of the body.

use crate::journal::JournalEntry;
use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

/// Size of the frame header in bytes
pub const FRAME_HEADER_LEN: usize = 8;

/// Upper bound on a single frame body
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Frame decoding failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer ends before the frame does
    #[error("incomplete frame: need {needed} bytes, have {have}")]
    Incomplete {
        /// Bytes available
        have: usize,
        /// Bytes required for the full frame
        needed: usize,
    },

    /// Body does not match its checksum
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// CRC stored in the header
        expected: u32,
        /// CRC computed over the body
        actual: u32,
    },

    /// Header declares an impossible length
    #[error("frame length {0} exceeds limit")]
    TooLarge(usize),

    /// Checksum matched but the body did not deserialize
    #[error("malformed entry: {0}")]
    Malformed(String),
}

/// Frame encoding failures
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Body is larger than [`MAX_FRAME_LEN`]
    #[error("frame length {0} exceeds limit")]
    TooLarge(usize),

    /// Entry did not serialize
    #[error("failed to serialize entry: {0}")]
    Serialize(#[from] bincode::Error),
}

/// Encode one entry as a frame
///
/// Bodies over [`MAX_FRAME_LEN`] are refused so every frame written can be
/// decoded again.
pub fn encode_entry(entry: &JournalEntry) -> Result<Vec<u8>, EncodeError> {
    let body = bincode::serialize(entry)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(EncodeError::TooLarge(body.len()));
    }
    let len = u32::try_from(body.len()).map_err(|_| EncodeError::TooLarge(body.len()))?;
    let mut frame = vec![0u8; FRAME_HEADER_LEN + body.len()];
    LittleEndian::write_u32(&mut frame[0..4], len);
    LittleEndian::write_u32(&mut frame[4..8], crc32fast::hash(&body));
    frame[FRAME_HEADER_LEN..].copy_from_slice(&body);
    Ok(frame)
}

/// Decode the frame at the start of `buf`
///
/// Returns the entry and the number of bytes consumed.
pub fn decode_entry(buf: &[u8]) -> Result<(JournalEntry, usize), DecodeError> {
    if buf.len() < FRAME_HEADER_LEN {
        return Err(DecodeError::Incomplete {
            have: buf.len(),
            needed: FRAME_HEADER_LEN,
        });
    }

    let len = LittleEndian::read_u32(&buf[0..4]) as usize;
    if len > MAX_FRAME_LEN {
        return Err(DecodeError::TooLarge(len));
    }
    let total = FRAME_HEADER_LEN + len;
    if buf.len() < total {
        return Err(DecodeError::Incomplete {
            have: buf.len(),
            needed: total,
        });
    }

    let expected = LittleEndian::read_u32(&buf[4..8]);
    let body = &buf[FRAME_HEADER_LEN..total];
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(DecodeError::ChecksumMismatch { expected, actual });
    }

    let entry =
        bincode::deserialize(body).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    Ok((entry, total))
}
