//! Main entry point for Revstore.
//!
//! This module provides the `Revstore` struct and its builder.

use crate::error::Result;
use crate::resources::Resources;
use crate::types::{DeletePolicy, DurabilityMode, EraseSemantics, StoreConfig, StoreInfo};
use revstore_engine::ResourceStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// The Revstore resource store.
///
/// Create one with [`Revstore::open`], [`Revstore::ephemeral`] or
/// [`Revstore::builder`].
///
/// # Example
///
/// ```ignore
/// use revstore::prelude::*;
///
/// let db = Revstore::open("./my-store")?;
///
/// let created = db.resources.create("Patient", &json!({"name": "Alice"}))?;
/// let current = db.resources.read(&created.key)?;
///
/// db.close()?;
/// ```
pub struct Revstore {
    pub(crate) inner: Arc<ResourceStore>,

    /// Resource operations
    pub resources: Resources,
}

impl Revstore {
    /// Open a store at the given directory.
    ///
    /// Reads `revstore.toml` from the directory when present; otherwise uses
    /// the defaults (batched durability).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an in-memory store with no disk I/O.
    ///
    /// | Method | Disk Files | Recovery |
    /// |--------|------------|----------|
    /// | `Revstore::ephemeral()` | None | No |
    /// | `Revstore::builder().open_temp()` | Temp dir | Yes |
    /// | `Revstore::open(path)` | User dir | Yes |
    pub fn ephemeral() -> Self {
        Self::from_store(ResourceStore::ephemeral())
    }

    /// Create a builder for store configuration.
    pub fn builder() -> RevstoreBuilder {
        RevstoreBuilder::new()
    }

    /// Underlying engine store (raw byte payloads).
    pub fn store(&self) -> &ResourceStore {
        &self.inner
    }

    /// Force pending journal writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.inner.flush().map_err(Into::into)
    }

    /// Rewrite the journal from live state, dropping erased payloads.
    ///
    /// Returns the new journal size in bytes.
    pub fn compact(&self) -> Result<u64> {
        self.inner.compact().map_err(Into::into)
    }

    /// Flush and release the store.
    pub fn close(self) -> Result<()> {
        self.flush()?;
        tracing::info!(data_dir = ?self.inner.config().data_dir, "closed store");
        Ok(())
    }

    /// Data directory, if the store is persistent.
    pub fn path(&self) -> Option<&Path> {
        self.inner.config().data_dir.as_deref()
    }

    /// Journal fsync policy in effect.
    pub fn durability_mode(&self) -> DurabilityMode {
        self.inner.info().durability
    }

    /// Check if this store keeps nothing on disk.
    pub fn is_ephemeral(&self) -> bool {
        !self.inner.config().is_persistent()
    }

    /// Store summary.
    pub fn info(&self) -> StoreInfo {
        self.inner.info()
    }

    fn from_store(store: ResourceStore) -> Self {
        let inner = Arc::new(store);
        Self {
            resources: Resources::new(inner.clone()),
            inner,
        }
    }
}

impl std::fmt::Debug for Revstore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Revstore").field("inner", &self.inner).finish()
    }
}

/// Builder for store configuration.
///
/// Settings made on the builder override the directory's `revstore.toml`.
///
/// # Example
///
/// ```ignore
/// let db = Revstore::builder()
///     .path("./my-store")
///     .strict()
///     .create_on_update(false)
///     .lock_timeout(Duration::from_millis(500))
///     .open()?;
/// ```
#[derive(Debug, Default)]
pub struct RevstoreBuilder {
    path: Option<PathBuf>,
    durability: Option<DurabilityMode>,
    create_on_update: Option<bool>,
    allow_delete: Option<bool>,
    delete_policy: Option<DeletePolicy>,
    erase_semantics: Option<EraseSemantics>,
    lock_timeout: Option<Duration>,
    compact_on_erase: Option<bool>,
}

impl RevstoreBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data directory.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep no journal. Nothing survives a restart.
    pub fn no_durability(mut self) -> Self {
        self.durability = Some(DurabilityMode::None);
        self
    }

    /// Batched fsync (default): every 100ms or 1000 writes.
    pub fn buffered(mut self) -> Self {
        self.durability = Some(DurabilityMode::buffered_default());
        self
    }

    /// Batched fsync with custom limits.
    pub fn buffered_with(mut self, interval_ms: u64, batch_size: usize) -> Self {
        self.durability = Some(DurabilityMode::Batched {
            interval_ms,
            batch_size,
        });
        self
    }

    /// fsync on every write.
    pub fn strict(mut self) -> Self {
        self.durability = Some(DurabilityMode::Strict);
        self
    }

    /// Whether unconditional writes to an absent or deleted id create it.
    pub fn create_on_update(mut self, enabled: bool) -> Self {
        self.create_on_update = Some(enabled);
        self
    }

    /// Whether logical delete is available.
    pub fn allow_delete(mut self, enabled: bool) -> Self {
        self.allow_delete = Some(enabled);
        self
    }

    /// Behaviour of delete on an already-deleted resource.
    pub fn delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = Some(policy);
        self
    }

    /// Behaviour of writes queued behind an erase.
    pub fn erase_semantics(mut self, semantics: EraseSemantics) -> Self {
        self.erase_semantics = Some(semantics);
        self
    }

    /// Maximum wait for a resource's writer lock.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Compact the journal after every erase.
    pub fn compact_on_erase(mut self, enabled: bool) -> Self {
        self.compact_on_erase = Some(enabled);
        self
    }

    /// Open the store.
    ///
    /// Without a path the store is in memory.
    pub fn open(self) -> Result<Revstore> {
        let config = self.config()?;
        Ok(Revstore::from_store(ResourceStore::open(config)?))
    }

    /// Open in a fresh temporary directory.
    pub fn open_temp(mut self) -> Result<Revstore> {
        let dir = std::env::temp_dir().join(format!("revstore-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir)?;
        self.path = Some(dir);
        self.open()
    }

    /// Resolve the configuration this builder would open with.
    pub fn config(&self) -> Result<StoreConfig> {
        let mut config = match &self.path {
            Some(path) => StoreConfig::load_or_default(path)?,
            None => StoreConfig::ephemeral(),
        };
        if let Some(durability) = self.durability {
            config.durability = durability;
        }
        if let Some(enabled) = self.create_on_update {
            config.create_on_update = enabled;
        }
        if let Some(enabled) = self.allow_delete {
            config.allow_delete = enabled;
        }
        if let Some(policy) = self.delete_policy {
            config.delete_policy = policy;
        }
        if let Some(semantics) = self.erase_semantics {
            config.erase_semantics = semantics;
        }
        if let Some(timeout) = self.lock_timeout {
            config.lock_timeout_ms = Some(timeout.as_millis() as u64);
        }
        if let Some(enabled) = self.compact_on_erase {
            config.compact_on_erase = enabled;
        }
        Ok(config)
    }
}
