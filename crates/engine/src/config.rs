//! Store configuration
//!
//! Loaded from `revstore.toml` in the data directory when present, then
//! overridden by whatever the builder sets.
//!
//! ```toml
//! create_on_update = true
//! allow_delete = true
//! delete_policy = "idempotent"
//! erase_semantics = "reset_history"
//! lock_timeout_ms = 500
//!
//! [durability]
//! mode = "batched"
//! interval_ms = 100
//! batch_size = 1000
//! ```

use revstore_concurrency::WritePolicy;
use revstore_core::{Error, Result};
use revstore_durability::DurabilityMode;
use revstore_storage::OnRetired;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the optional config file inside a data directory
pub const CONFIG_FILE: &str = "revstore.toml";

/// What deleting an already-deleted resource does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Report `Unchanged` at the existing tombstone
    #[default]
    Idempotent,
    /// Append another tombstone
    RepeatTombstone,
}

/// What happens to writes queued on a resource while it is erased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EraseSemantics {
    /// Re-evaluate against the empty history; numbering restarts at 1
    #[default]
    ResetHistory,
    /// Fail with `ConflictDuringErase`
    RejectInFlight,
}

impl EraseSemantics {
    /// Ledger behaviour for writers that wake on a purged entry
    pub fn on_retired(self) -> OnRetired {
        match self {
            EraseSemantics::ResetHistory => OnRetired::Reacquire,
            EraseSemantics::RejectInFlight => OnRetired::Fail,
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Unconditional writes to an absent or deleted id create it
    pub create_on_update: bool,
    /// Whether logical delete is available
    pub allow_delete: bool,
    /// Behaviour of delete on a deleted resource
    pub delete_policy: DeletePolicy,
    /// Behaviour of writes racing an erase
    pub erase_semantics: EraseSemantics,
    /// Maximum wait for a resource's writer lock (None waits forever)
    pub lock_timeout_ms: Option<u64>,
    /// Rewrite the journal after each erase so erased payloads leave the disk
    pub compact_on_erase: bool,
    /// Journal fsync policy
    pub durability: DurabilityMode,
    /// Directory holding the journal (None keeps everything in memory)
    #[serde(skip)]
    pub data_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            create_on_update: true,
            allow_delete: true,
            delete_policy: DeletePolicy::default(),
            erase_semantics: EraseSemantics::default(),
            lock_timeout_ms: None,
            compact_on_erase: false,
            durability: DurabilityMode::default(),
            data_dir: None,
        }
    }
}

impl StoreConfig {
    /// In-memory configuration with no journal
    pub fn ephemeral() -> Self {
        Self {
            durability: DurabilityMode::None,
            ..Self::default()
        }
    }

    /// Parse from TOML text
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| config_error(format!("failed to parse config: {e}")))
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| config_error(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&contents)
            .map_err(|e| config_error(format!("failed to parse {}: {e}", path.display())))
    }

    /// Load `revstore.toml` from `dir`, or defaults when the file is missing
    ///
    /// `data_dir` is set to `dir` either way.
    pub fn load_or_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let path = dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.data_dir = Some(dir.to_path_buf());
        Ok(config)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| config_error(format!("failed to encode config: {e}")))
    }

    /// Lock timeout as a duration
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    /// Admission policy handed to the concurrency controller
    pub fn write_policy(&self) -> WritePolicy {
        WritePolicy {
            create_on_update: self.create_on_update,
        }
    }

    /// Whether a journal file is kept
    pub fn is_persistent(&self) -> bool {
        self.data_dir.is_some() && self.durability.requires_journal()
    }
}

fn config_error(message: String) -> Error {
    Error::Serialization(message)
}
