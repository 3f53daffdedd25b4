//! Concurrency layer for Revstore
//!
//! This crate implements optimistic concurrency control for single-resource
//! writes:
//! - Precondition checks (`If-Match`, `If-None-Match: *`) against the head
//! - Conditional read checks (`If-None-Match: W/"<n>"`)
//! - Mapping of refusals to store errors
//!
//! Checks run inside the ledger's per-entry critical section, so validation
//! and append happen against the same head.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;

pub use controller::{
    check_delete_precondition, check_precondition, check_read, Admission, ConflictType,
    ReadValidation, WritePolicy,
};
