//! Core types and traits for Revstore
//!
//! This crate defines the vocabulary shared by every other crate:
//! - [`ResourceKey`]: logical `<type>/<id>` identifier
//! - [`VersionRecord`]: one immutable version of a resource
//! - [`LifecycleState`]: Absent / Active / Deleted
//! - [`Error`]: the store's error taxonomy
//! - [`VersionLedger`]: storage abstraction

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::VersionLedger;
pub use types::{
    ConditionalRead, EraseRecord, HistoryQuery, LifecycleState, OutcomeStatus, Payload,
    Precondition, ReadCondition, ReadResult, ResourceKey, VersionRecord, WriteResult,
};
