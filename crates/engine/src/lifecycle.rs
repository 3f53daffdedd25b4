//! Lifecycle state machine
//!
//! Decides what an operation does to a resource given its current head.
//!
//! ```text
//!            create / update            delete
//!   ABSENT ──────────────────▶ ACTIVE ─────────▶ DELETED
//!     ▲                          ▲                  │
//!     │                          └──────────────────┘
//!     │                        update (create-on-update,
//!     │                         If-None-Match: *)
//!     └──────────── erase (from any state) ────────────
//! ```
//!
//! [`transition`] is pure; the store runs it inside the resource's critical
//! section and carries out the returned [`Transition`].

use crate::config::{DeletePolicy, StoreConfig};
use revstore_concurrency::{check_delete_precondition, check_precondition, ConflictType};
use revstore_core::{
    Error, LifecycleState, OutcomeStatus, Precondition, ResourceKey, Result, VersionRecord,
};

/// Operation requested against one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create-only write (fails on an active resource)
    Create,
    /// Write with an optional precondition
    Update(Precondition),
    /// Logical delete with an optional `If-Match`
    Delete(Precondition),
    /// Physical purge of every version
    Erase,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Update(Precondition::None) => f.write_str("update"),
            Operation::Update(p) => write!(f, "update ({})", p),
            Operation::Delete(Precondition::None) => f.write_str("delete"),
            Operation::Delete(p) => write!(f, "delete ({})", p),
            Operation::Erase => f.write_str("erase"),
        }
    }
}

/// What the store must do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Append one record at `head + 1`
    Append {
        /// Whether the record is a tombstone
        tombstone: bool,
        /// Outcome to report
        outcome: OutcomeStatus,
    },
    /// Append nothing; report the current head
    NoOp {
        /// Outcome to report
        outcome: OutcomeStatus,
    },
    /// Remove every version
    Purge,
}

impl Transition {
    /// State after the transition is carried out
    pub fn next_state(&self, current: LifecycleState) -> LifecycleState {
        match self {
            Transition::Append {
                tombstone: true, ..
            } => LifecycleState::Deleted,
            Transition::Append { .. } => LifecycleState::Active,
            Transition::NoOp { .. } => current,
            Transition::Purge => LifecycleState::Absent,
        }
    }
}

/// Resolve `op` against the current head
///
/// # Errors
///
/// - `AlreadyExists`: create on an active resource
/// - `PreconditionFailed`, `NotFound`, `Gone`: precondition refused
/// - `NotSupported`: delete with deletion disabled
pub fn transition(
    key: &ResourceKey,
    head: Option<&VersionRecord>,
    op: Operation,
    config: &StoreConfig,
) -> Result<Transition> {
    let state = LifecycleState::of(head);

    match op {
        Operation::Create => match state {
            LifecycleState::Active => Err(Error::AlreadyExists(key.clone())),
            LifecycleState::Absent | LifecycleState::Deleted => Ok(Transition::Append {
                tombstone: false,
                outcome: OutcomeStatus::Created,
            }),
        },

        Operation::Update(precondition) => {
            let admission = check_precondition(head, precondition, config.write_policy())
                .map_err(|conflict| conflict.into_error(key))?;
            Ok(Transition::Append {
                tombstone: false,
                outcome: admission.outcome(),
            })
        }

        Operation::Delete(precondition) => {
            if !config.allow_delete {
                return Err(Error::NotSupported(format!("delete is disabled ({})", key)));
            }
            if state == LifecycleState::Absent {
                return Err(Error::NotFound(key.clone()));
            }
            check_delete_precondition(head, precondition)
                .map_err(|conflict: ConflictType| conflict.into_error(key))?;

            match (state, config.delete_policy) {
                (LifecycleState::Deleted, DeletePolicy::Idempotent) => Ok(Transition::NoOp {
                    outcome: OutcomeStatus::Unchanged,
                }),
                _ => Ok(Transition::Append {
                    tombstone: true,
                    outcome: OutcomeStatus::Deleted,
                }),
            }
        }

        Operation::Erase => match state {
            LifecycleState::Absent => Err(Error::NotFound(key.clone())),
            LifecycleState::Active | LifecycleState::Deleted => Ok(Transition::Purge),
        },
    }
}
