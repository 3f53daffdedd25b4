//! Store engine for Revstore
//!
//! Ties the ledger, the concurrency controller and the journal together:
//! - `ResourceStore`: every resource operation
//! - `lifecycle`: the ABSENT / ACTIVE / DELETED state machine
//! - `purger`: physical erase
//! - `recovery`: journal replay and compaction snapshots
//! - `config`: store settings and `revstore.toml` loading

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod lifecycle;
pub mod purger;
pub mod recovery;
pub mod store;

pub use config::{DeletePolicy, EraseSemantics, StoreConfig, CONFIG_FILE};
pub use lifecycle::{transition, Operation, Transition};
pub use purger::EraseRequest;
pub use recovery::{recover, snapshot_entries, RecoveryStats};
pub use store::{Applied, ResourceStore, StoreInfo};
