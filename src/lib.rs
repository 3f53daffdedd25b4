//! # Revstore
//!
//! Embedded versioned resource store with optimistic concurrency control
//! and two-tier deletion.
//!
//! Every resource (`<type>/<id>`) keeps an append-only history of versions
//! numbered from 1. Writes can be made conditional on the current version
//! (`If-Match`) or on absence (`If-None-Match: *`). Deleting appends a
//! tombstone, so history survives; erasing removes every version for good.
//!
//! ## Quick Start
//!
//! ```ignore
//! use revstore::prelude::*;
//!
//! let db = Revstore::open("./my-store")?;
//! let key = ResourceKey::new("Patient", "p1");
//!
//! db.resources.create_with_id(&key, &json!({"name": "Alice"}))?;        // v1
//! db.resources.update(&key, &json!({"name": "Bob"}), Precondition::IfMatch(1))?; // v2
//! db.resources.delete(&key, Precondition::None)?;                         // v3 tombstone
//! assert!(db.resources.read(&key).unwrap_err().is_gone());
//!
//! db.resources.erase(&key, Some("requested by subject"))?;
//! assert!(db.resources.read(&key).unwrap_err().is_not_found());
//! ```
//!
//! ## Lifecycle
//!
//! | State | Meaning |
//! |-------|---------|
//! | `Absent` | no history |
//! | `Active` | head is a live version |
//! | `Deleted` | head is a tombstone |

#![warn(missing_docs)]

mod database;
mod error;
mod resources;
mod types;

pub mod prelude;

// Re-export main entry points
pub use database::{Revstore, RevstoreBuilder};
pub use error::{Error, Result};
pub use resources::Resources;

// Re-export types
pub use types::*;
