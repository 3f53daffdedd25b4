//! Convenient imports for Revstore.
//!
//! ```ignore
//! use revstore::prelude::*;
//!
//! let db = Revstore::ephemeral();
//! db.resources.create("Patient", &json!({"name": "Alice"}))?;
//! ```

// Main entry point
pub use crate::database::{Revstore, RevstoreBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Core types
pub use crate::types::{
    HistoryQuery, LifecycleState, OutcomeStatus, Precondition, Resource, ResourceKey,
    WriteResult,
};

// Configuration
pub use crate::types::{DeletePolicy, DurabilityMode, EraseSemantics};

// Re-export serde_json for convenience
pub use serde_json::json;
