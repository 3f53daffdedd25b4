//! Storage layer for Revstore
//!
//! This crate implements the in-memory version ledger:
//! - ShardedLedger: DashMap of per-resource histories
//! - LedgerGuard: per-key critical section for read-check-append
//! - Retirement of purged entries so queued writers never append to erased history

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sharded;

pub use sharded::{LedgerEntry, LedgerGuard, OnRetired, RetireReason, ShardedLedger};
