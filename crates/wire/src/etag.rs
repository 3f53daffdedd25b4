//! ETag and `Location` encoding
//!
//! Versions travel as weak validators: `W/"<version>"`. `If-Match` is
//! strict about that form; the read-side `If-None-Match` is lenient and
//! also takes `1`, `"1"` and `W/1`.

use crate::error::HeaderError;
use revstore_core::{Precondition, ReadCondition, ResourceKey};

/// Weak ETag for a version
pub fn etag(version_id: u64) -> String {
    format!("W/\"{}\"", version_id)
}

/// History path of a version: `<type>/<id>/_history/<version>`
pub fn location(key: &ResourceKey, version_id: u64) -> String {
    format!(
        "{}/{}/_history/{}",
        key.resource_type, key.logical_id, version_id
    )
}

/// Parse an `If-Match` header value
///
/// Only `W/"<n>"` is accepted.
pub fn parse_if_match(header: &str) -> Result<u64, HeaderError> {
    let invalid = || HeaderError::InvalidETag(header.to_string());

    let quoted = header.strip_prefix("W/").ok_or_else(invalid)?;
    let inner = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(invalid)?;
    parse_version(inner).ok_or_else(invalid)
}

/// Parsed `If-None-Match` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfNoneMatch {
    /// `*`: the write must create
    Any,
    /// A version the client already holds
    Version(u64),
    /// Empty or unparseable; treated as absent
    Ignored,
}

impl IfNoneMatch {
    /// Write precondition, if the header carries one
    ///
    /// A version on a write is an error; only `*` is meaningful there.
    pub fn precondition(self, header: &str) -> Result<Precondition, HeaderError> {
        match self {
            IfNoneMatch::Any => Ok(Precondition::IfNoneMatch),
            IfNoneMatch::Ignored => Ok(Precondition::None),
            IfNoneMatch::Version(_) => Err(HeaderError::InvalidETag(header.to_string())),
        }
    }

    /// Read-side condition
    pub fn read_condition(self) -> ReadCondition {
        match self {
            IfNoneMatch::Version(v) => ReadCondition::IfNoneMatchVersion(v),
            IfNoneMatch::Any | IfNoneMatch::Ignored => ReadCondition::None,
        }
    }
}

/// Parse an `If-None-Match` header value
pub fn parse_if_none_match(header: &str) -> IfNoneMatch {
    let trimmed = header.trim();
    if trimmed == "*" {
        return IfNoneMatch::Any;
    }
    let bare: String = trimmed.replace("W/", "").replace('"', "");
    match parse_version(bare.trim()) {
        Some(v) => IfNoneMatch::Version(v),
        None => IfNoneMatch::Ignored,
    }
}

fn parse_version(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
