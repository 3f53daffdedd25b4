//! Durability mode for journal writes.
//!
//! Defines when appended frames are fsynced to disk.

use serde::{Deserialize, Serialize};

/// Durability mode for journal writes.
///
/// | Mode | fsync | Loss window on power failure |
/// |------|-------|------------------------------|
/// | None | never, no file | everything |
/// | Batched | every `batch_size` appends or `interval_ms` | one batch |
/// | Strict | every append | nothing acknowledged |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DurabilityMode {
    /// No journal at all. State lives only in memory.
    None,

    /// fsync after every append.
    Strict,

    /// fsync every N appends OR once `interval_ms` has elapsed since the
    /// last fsync, checked on the next append.
    Batched {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum appends between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Whether a journal file is kept.
    pub fn requires_journal(&self) -> bool {
        !matches!(self, DurabilityMode::None)
    }

    /// Whether every append is fsynced before it is acknowledged.
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Strict)
    }

    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::None => "in-memory only",
            DurabilityMode::Strict => "fsync per write",
            DurabilityMode::Batched { .. } => "batched fsync",
        }
    }

    /// `Batched { interval_ms: 100, batch_size: 1000 }`
    pub fn buffered_default() -> Self {
        DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::buffered_default()
    }
}

impl std::fmt::Display for DurabilityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurabilityMode::None => f.write_str("none"),
            DurabilityMode::Strict => f.write_str("strict"),
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => write!(f, "batched({}ms, {})", interval_ms, batch_size),
        }
    }
}
