//! Response envelopes
//!
//! What a transport sends back for each operation, serializable to JSON.

use crate::error::{HeaderError, WireError};
use crate::etag::{etag, location};
use crate::status::{status_for_error, status_for_outcome, NOT_MODIFIED};
use chrono::{DateTime, Utc};
use revstore_core::{ConditionalRead, Error, ReadResult, WriteResult};
use serde::Serialize;

/// Successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteResponse {
    /// 201 or 200
    pub status: u16,
    /// Outcome name (`Created`, `Updated`, `Deleted`, `Unchanged`)
    pub outcome: String,
    /// `W/"<version>"`
    pub etag: String,
    /// `<type>/<id>/_history/<version>`
    pub location: String,
    /// Timestamp of the head version
    pub last_modified: DateTime<Utc>,
}

impl From<&WriteResult> for WriteResponse {
    fn from(result: &WriteResult) -> Self {
        Self {
            status: status_for_outcome(result.outcome),
            outcome: result.outcome.to_string(),
            etag: etag(result.version_id),
            location: location(&result.key, result.version_id),
            last_modified: result.last_modified,
        }
    }
}

/// Successful read, or a conditional read that matched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadResponse {
    /// 200 or 304
    pub status: u16,
    /// `W/"<version>"`
    pub etag: String,
    /// Timestamp of the version read
    pub last_modified: DateTime<Utc>,
    /// Payload as JSON, or as a string when it is not JSON; absent on 304
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl From<&ReadResult> for ReadResponse {
    fn from(read: &ReadResult) -> Self {
        let body = read.payload.to_json().unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(read.payload.as_bytes()).into_owned())
        });
        Self {
            status: 200,
            etag: etag(read.version_id),
            last_modified: read.last_modified,
            body: Some(body),
        }
    }
}

impl From<&ConditionalRead> for ReadResponse {
    fn from(read: &ConditionalRead) -> Self {
        match read {
            ConditionalRead::Modified(read) => Self::from(read),
            ConditionalRead::NotModified {
                version_id,
                last_modified,
            } => Self {
                status: NOT_MODIFIED,
                etag: etag(*version_id),
                last_modified: *last_modified,
                body: None,
            },
        }
    }
}

/// Failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// 4xx or 5xx
    pub status: u16,
    /// Code and message
    pub error: WireError,
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        Self {
            status: status_for_error(error),
            error: WireError::from_error(error),
        }
    }
}

impl From<&HeaderError> for ErrorResponse {
    fn from(error: &HeaderError) -> Self {
        let error = WireError::from_header(error);
        Self {
            status: error.status(),
            error,
        }
    }
}
