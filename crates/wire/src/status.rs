//! Status codes

use crate::error::error_code;
use revstore_core::{Error, OutcomeStatus};

/// Status of a conditional read that matched the client's version
pub const NOT_MODIFIED: u16 = 304;

/// Status of a successful write
pub fn status_for_outcome(outcome: OutcomeStatus) -> u16 {
    match outcome {
        OutcomeStatus::Created => 201,
        OutcomeStatus::Updated | OutcomeStatus::Deleted | OutcomeStatus::Unchanged => 200,
    }
}

/// Status of a failed operation
pub fn status_for_error(error: &Error) -> u16 {
    status_for_code(error_code(error))
}

/// Status of a wire error code
pub fn status_for_code(code: &str) -> u16 {
    match code {
        "PreconditionFailed" | "AlreadyExists" => 412,
        "NotFound" | "VersionNotFound" => 404,
        "Gone" => 410,
        "InvalidKey" | "InvalidETag" => 400,
        "ConflictDuringErase" => 409,
        "NotSupported" => 405,
        "PayloadTooLarge" => 413,
        "Timeout" => 503,
        _ => 500,
    }
}
