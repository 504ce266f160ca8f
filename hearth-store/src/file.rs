//! File-backed entry store with snapshot persistence.
//!
//! Wraps a memory store and periodically snapshots it to a single binary
//! file. Suitable for single-node deployments where cached results should
//! survive a restart.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use hearth_core::error::{HearthError, Result};
use hearth_core::traits::EntryStore;
use hearth_core::CacheEntry;

use crate::MemoryStore;

/// Length of the fixed file header (magic + version + count).
const HEADER_LEN: usize = 13;

/// File format magic bytes
const MAGIC: &[u8; 4] = b"HRTH";
/// Current file format version
const VERSION: u8 = 1;

/// File-backed entry store.
///
/// Serves reads and writes from an in-memory store and snapshots to disk.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "HRTH"
/// version (1 byte): 1
/// count (8 bytes): number of entries
/// entries (variable): JSON array of entries
/// ```
///
/// The body is JSON rather than a packed binary encoding because entry
/// payloads are arbitrary JSON values, which a non-self-describing format
/// cannot round-trip.
pub struct FileStore {
    /// Path to the snapshot file
    path: PathBuf,
    /// In-memory storage
    memory: MemoryStore,
    /// Whether there are unsaved changes
    dirty: AtomicBool,
    /// Auto-save threshold (save after N writes)
    auto_save_threshold: u64,
    /// Writes since last save
    writes_since_save: AtomicU64,
}

impl FileStore {
    /// Creates a file store at the given path.
    ///
    /// If the file exists, it is loaded. Otherwise the store starts empty
    /// and the file is created on first save.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let store = Self {
            path,
            memory: MemoryStore::new(),
            dirty: AtomicBool::new(false),
            auto_save_threshold: 100,
            writes_since_save: AtomicU64::new(0),
        };

        if store.path.exists() {
            store.load().await?;
        }

        Ok(store)
    }

    /// Creates a file store with a custom auto-save threshold.
    pub async fn with_auto_save(path: impl AsRef<Path>, threshold: u64) -> Result<Self> {
        let mut store = Self::new(path).await?;
        store.auto_save_threshold = threshold;
        Ok(store)
    }

    /// Loads entries from the snapshot file.
    #[instrument(skip(self))]
    async fn load(&self) -> Result<()> {
        let mut file = fs::File::open(&self.path).await?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await?;

        if contents.len() < HEADER_LEN {
            return Err(HearthError::StoreUnavailable(
                "snapshot file too short".into(),
            ));
        }

        if &contents[0..4] != MAGIC {
            return Err(HearthError::StoreUnavailable(
                "snapshot has invalid magic bytes".into(),
            ));
        }

        let version = contents[4];
        if version != VERSION {
            return Err(HearthError::StoreUnavailable(format!(
                "snapshot format version {version} not supported (expected {VERSION})"
            )));
        }

        let count = u64::from_le_bytes(
            contents[5..HEADER_LEN]
                .try_into()
                .map_err(|_| HearthError::StoreUnavailable("snapshot header truncated".into()))?,
        );
        info!(count, "loading cache entries from snapshot");

        if contents.len() > HEADER_LEN {
            let entries: Vec<CacheEntry> = serde_json::from_slice(&contents[HEADER_LEN..])
                .map_err(|e| HearthError::StoreUnavailable(format!("corrupt snapshot body: {e}")))?;

            if entries.len() as u64 != count {
                return Err(HearthError::StoreUnavailable(format!(
                    "snapshot count mismatch: header says {count}, body has {}",
                    entries.len()
                )));
            }

            self.memory.import(entries);
        } else if count != 0 {
            return Err(HearthError::StoreUnavailable(
                "snapshot body missing".into(),
            ));
        }

        self.dirty.store(false, Ordering::SeqCst);
        debug!("snapshot loaded");

        Ok(())
    }

    /// Writes a snapshot of the current entries.
    #[instrument(skip(self))]
    pub async fn save(&self) -> Result<()> {
        let entries = self.memory.all_entries();
        let count = entries.len() as u64;

        info!(count, path = ?self.path, "saving cache snapshot");

        let serialized = serde_json::to_vec(&entries)?;

        let mut contents = Vec::with_capacity(HEADER_LEN + serialized.len());
        contents.extend_from_slice(MAGIC);
        contents.push(VERSION);
        contents.extend_from_slice(&count.to_le_bytes());
        contents.extend_from_slice(&serialized);

        // Write atomically (write to temp, then rename)
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.path).await?;

        self.dirty.store(false, Ordering::SeqCst);
        self.writes_since_save.store(0, Ordering::SeqCst);

        debug!("snapshot saved");
        Ok(())
    }

    /// Checks if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Forces a save if dirty.
    pub async fn flush(&self) -> Result<()> {
        if self.is_dirty() {
            self.save().await?;
        }
        Ok(())
    }

    /// Returns the snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the underlying memory store for direct access.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Checks if the auto-save threshold is reached and saves if needed.
    async fn maybe_auto_save(&self) -> Result<()> {
        let writes = self.writes_since_save.fetch_add(1, Ordering::SeqCst);
        if writes >= self.auto_save_threshold {
            self.save().await?;
        }
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        // Best-effort only; async save is not possible in Drop.
        if self.is_dirty() {
            warn!("FileStore dropped with unsaved changes");
        }
    }
}

#[async_trait]
impl EntryStore for FileStore {
    async fn get(&self, namespace: &str, cache_key: &str) -> Result<Option<CacheEntry>> {
        self.memory.get(namespace, cache_key).await
    }

    async fn put(
        &self,
        namespace: &str,
        cache_key: &str,
        payload: Value,
        fetched_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        expected_version: Option<u64>,
    ) -> Result<CacheEntry> {
        let written = self
            .memory
            .put(
                namespace,
                cache_key,
                payload,
                fetched_at,
                expires_at,
                expected_version,
            )
            .await?;
        self.dirty.store(true, Ordering::SeqCst);
        self.maybe_auto_save().await?;
        Ok(written)
    }

    async fn delete_expired(&self, namespace: &str, older_than: DateTime<Utc>) -> Result<u64> {
        let removed = self.memory.delete_expired(namespace, older_than).await?;
        if removed > 0 {
            self.dirty.store(true, Ordering::SeqCst);
        }
        Ok(removed)
    }
}
