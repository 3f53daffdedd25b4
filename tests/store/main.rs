//! Resource Store Integration Tests
//!
//! End-to-end behaviour of the public `Revstore` API: lifecycle,
//! preconditions, erase, concurrency, durability, history, and a
//! model-based check of random operation sequences.
//!
//! ```bash
//! cargo test --test store
//! cargo test --test store concurrency::
//! ```

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod durability;
mod erase;
mod history;
mod lifecycle;
mod model;
