//! Precondition evaluation
//!
//! Decides, against the head observed inside the entry's critical section,
//! whether a write is admitted. The checks here are pure: the caller holds
//! the writer lock, so the head cannot move between check and append.
//!
//! | state   | None    | IfMatch(v)                        | IfNoneMatch        |
//! |---------|---------|-----------------------------------|--------------------|
//! | Absent  | Create* | NotFound                          | Create             |
//! | Active  | Update  | Update if head == v, else failed  | PreconditionFailed |
//! | Deleted | Create* | Gone                              | Create             |
//!
//! \* only when `create_on_update` is enabled, otherwise `NotFound` / `Gone`.

use chrono::{DateTime, Utc};
use revstore_core::{Error, OutcomeStatus};
use revstore_core::{LifecycleState, Precondition, ReadCondition, ResourceKey, VersionRecord};
use tracing::trace;

/// Why a write was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// The head does not satisfy the caller's precondition
    PreconditionFailed {
        /// Version asserted by the caller (None for `If-None-Match: *`)
        expected: Option<u64>,
        /// Head version (None when absent)
        actual: Option<u64>,
    },
    /// The resource has no history
    NotFound,
    /// The head is a tombstone
    Gone {
        /// Tombstone version
        version_id: u64,
        /// Tombstone timestamp
        deleted_at: DateTime<Utc>,
    },
    /// Create-only write against an active resource
    AlreadyExists,
}

impl ConflictType {
    /// `Gone` for the given tombstone
    pub fn gone(tombstone: &VersionRecord) -> Self {
        ConflictType::Gone {
            version_id: tombstone.version_id,
            deleted_at: tombstone.created_at,
        }
    }

    /// Convert into the store error for `key`
    pub fn into_error(self, key: &ResourceKey) -> Error {
        match self {
            ConflictType::PreconditionFailed { expected, actual } => Error::PreconditionFailed {
                key: key.clone(),
                expected,
                actual,
            },
            ConflictType::NotFound => Error::NotFound(key.clone()),
            ConflictType::Gone {
                version_id,
                deleted_at,
            } => Error::Gone {
                key: key.clone(),
                version_id,
                deleted_at,
            },
            ConflictType::AlreadyExists => Error::AlreadyExists(key.clone()),
        }
    }
}

/// Kind of version a write will produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Starts a new epoch (first version, or first after a tombstone)
    Create,
    /// Continues an active epoch
    Update,
}

impl Admission {
    /// Outcome reported to the caller
    pub fn outcome(self) -> OutcomeStatus {
        match self {
            Admission::Create => OutcomeStatus::Created,
            Admission::Update => OutcomeStatus::Updated,
        }
    }
}

/// Result of a read condition check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadValidation {
    /// Return the content
    Modified,
    /// The caller already holds the head version
    NotModified,
}

/// Write admission policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePolicy {
    /// Unconditional writes to an absent or deleted id create it
    pub create_on_update: bool,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            create_on_update: true,
        }
    }
}

/// Evaluate a write precondition against the current head
///
/// The lifecycle state is derived from `head`.
pub fn check_precondition(
    head: Option<&VersionRecord>,
    precondition: Precondition,
    policy: WritePolicy,
) -> Result<Admission, ConflictType> {
    let state = LifecycleState::of(head);
    let head_version = head.map(|r| r.version_id);
    trace!(%precondition, ?state, ?head_version, "checking precondition");

    match (precondition, state, head) {
        (Precondition::None, LifecycleState::Active, _) => Ok(Admission::Update),
        (Precondition::None, _, _) if policy.create_on_update => Ok(Admission::Create),
        (Precondition::None, LifecycleState::Deleted, Some(tombstone)) => {
            Err(ConflictType::gone(tombstone))
        }
        (Precondition::None, _, _) => Err(ConflictType::NotFound),

        (Precondition::IfMatch(expected), LifecycleState::Active, _) => {
            if head_version == Some(expected) {
                Ok(Admission::Update)
            } else {
                Err(ConflictType::PreconditionFailed {
                    expected: Some(expected),
                    actual: head_version,
                })
            }
        }
        (Precondition::IfMatch(_), LifecycleState::Deleted, Some(tombstone)) => {
            Err(ConflictType::gone(tombstone))
        }
        (Precondition::IfMatch(_), _, _) => Err(ConflictType::NotFound),

        (Precondition::IfNoneMatch, LifecycleState::Active, _) => {
            Err(ConflictType::PreconditionFailed {
                expected: None,
                actual: head_version,
            })
        }
        (Precondition::IfNoneMatch, _, _) => Ok(Admission::Create),
    }
}

/// Evaluate a precondition on a delete
///
/// Only `If-Match` is meaningful; it must name the current head. As for
/// writes, a deleted resource reports `Gone` before any version comparison.
pub fn check_delete_precondition(
    head: Option<&VersionRecord>,
    precondition: Precondition,
) -> Result<(), ConflictType> {
    match (precondition, head) {
        (Precondition::IfMatch(_), None) => Err(ConflictType::NotFound),
        (Precondition::IfMatch(_), Some(head)) if head.is_deletion_marker => {
            Err(ConflictType::gone(head))
        }
        (Precondition::IfMatch(expected), Some(head)) if head.version_id == expected => Ok(()),
        (Precondition::IfMatch(expected), Some(head)) => Err(ConflictType::PreconditionFailed {
            expected: Some(expected),
            actual: Some(head.version_id),
        }),
        (Precondition::None | Precondition::IfNoneMatch, _) => Ok(()),
    }
}

/// Evaluate a read condition against the current head
pub fn check_read(head: &VersionRecord, condition: ReadCondition) -> ReadValidation {
    match condition {
        ReadCondition::IfNoneMatchVersion(v) if v == head.version_id => ReadValidation::NotModified,
        _ => ReadValidation::Modified,
    }
}
