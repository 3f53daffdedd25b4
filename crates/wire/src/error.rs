//! Wire errors
//!
//! Every store error has a frozen string code and a status:
//! ```json
//! {"code": "PreconditionFailed", "message": "precondition failed on Patient/1: ..."}
//! ```

use crate::status::status_for_code;
use revstore_core::Error;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed request header
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// ETag not in an accepted form
    #[error("invalid ETag value: {0}")]
    InvalidETag(String),
}

/// Error as sent over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    /// Stable machine-readable code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl WireError {
    /// Wire form of a store error
    pub fn from_error(error: &Error) -> Self {
        Self {
            code: error_code(error).to_string(),
            message: error.to_string(),
        }
    }

    /// Wire form of a header error
    pub fn from_header(error: &HeaderError) -> Self {
        let code = match error {
            HeaderError::InvalidETag(_) => "InvalidETag",
        };
        Self {
            code: code.to_string(),
            message: error.to_string(),
        }
    }

    /// Status code matching this error's code
    pub fn status(&self) -> u16 {
        status_for_code(&self.code)
    }

    /// Encode as JSON
    pub fn to_json(&self) -> String {
        // Two string fields always serialize
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<&Error> for WireError {
    fn from(error: &Error) -> Self {
        Self::from_error(error)
    }
}

impl From<&HeaderError> for WireError {
    fn from(error: &HeaderError) -> Self {
        Self::from_header(error)
    }
}

/// Frozen code of a store error
pub fn error_code(error: &Error) -> &'static str {
    match error {
        Error::PreconditionFailed { .. } => "PreconditionFailed",
        Error::AlreadyExists(_) => "AlreadyExists",
        Error::NotFound(_) => "NotFound",
        Error::VersionNotFound { .. } => "VersionNotFound",
        Error::Gone { .. } => "Gone",
        Error::ConflictDuringErase(_) => "ConflictDuringErase",
        Error::NotSupported(_) => "NotSupported",
        Error::InvalidKey { .. } => "InvalidKey",
        Error::PayloadTooLarge { .. } => "PayloadTooLarge",
        Error::Timeout(_) => "Timeout",
        Error::StorageFailure(_) | Error::Io(_) => "StorageFailure",
        Error::Corruption(_) => "Corruption",
        Error::Serialization(_) => "Serialization",
    }
}
