//! In-memory entry store.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, instrument};

use hearth_core::error::{HearthError, Result};
use hearth_core::traits::EntryStore;
use hearth_core::CacheEntry;

/// Counters kept by the memory store.
#[derive(Clone, Debug, Default)]
pub struct StoreStats {
    /// Total `get` calls.
    pub reads: u64,
    /// Reads that found an entry (fresh or not).
    pub read_hits: u64,
    /// Writes accepted.
    pub writes: u64,
    /// Writes rejected with a version conflict.
    pub conflicts: u64,
    /// Entries removed by expiry sweeps.
    pub swept: u64,
}

/// In-memory entry store.
///
/// Entries are keyed by `(namespace, cache_key)` flattened into a single
/// composite key. The conditional write in `put` runs under the dashmap
/// shard guard for the key, so two racing writers with the same expected
/// version cannot both succeed.
#[derive(Debug)]
pub struct MemoryStore {
    /// Primary storage: composite key → entry
    entries: DashMap<String, CacheEntry>,
    /// Store statistics
    stats: RwLock<StoreStats>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            stats: RwLock::new(StoreStats::default()),
        }
    }

    /// Creates a store with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
            stats: RwLock::new(StoreStats::default()),
        }
    }

    /// The composite map key. 0x1f cannot appear in a hex cache key, so
    /// namespace and key cannot bleed into each other.
    fn composite_key(namespace: &str, cache_key: &str) -> String {
        format!("{namespace}\u{1f}{cache_key}")
    }

    /// Returns the current statistics.
    pub fn stats(&self) -> StoreStats {
        self.stats.read().clone()
    }

    /// Returns the number of stored entries across all namespaces.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.clear();
        *self.stats.write() = StoreStats::default();
    }

    /// Returns all entries (for export/snapshot).
    pub fn all_entries(&self) -> Vec<CacheEntry> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Imports entries, replacing any existing entry with the same key.
    ///
    /// Used when restoring a snapshot; versions are kept as stored.
    pub fn import(&self, entries: Vec<CacheEntry>) -> usize {
        let mut imported = 0;
        for entry in entries {
            let key = Self::composite_key(&entry.namespace, &entry.cache_key);
            self.entries.insert(key, entry);
            imported += 1;
        }
        imported
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    #[instrument(skip(self))]
    async fn get(&self, namespace: &str, cache_key: &str) -> Result<Option<CacheEntry>> {
        let found = self
            .entries
            .get(&Self::composite_key(namespace, cache_key))
            .map(|entry| entry.clone());

        let mut stats = self.stats.write();
        stats.reads += 1;
        if found.is_some() {
            stats.read_hits += 1;
        }

        Ok(found)
    }

    /// Conditionally writes an entry.
    ///
    /// `expected_version` must name the stored version (`None` when the
    /// writer expects no entry). On mismatch the write is rejected and the
    /// store is unchanged. An accepted write stores version
    /// `expected + 1`, or 0 for a first write.
    #[instrument(skip(self, payload))]
    async fn put(
        &self,
        namespace: &str,
        cache_key: &str,
        payload: Value,
        fetched_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        expected_version: Option<u64>,
    ) -> Result<CacheEntry> {
        // Validate the horizon before taking the shard guard.
        if fetched_at >= expires_at {
            return Err(HearthError::EntryBornStale {
                fetched_at,
                expires_at,
            });
        }

        let key = Self::composite_key(namespace, cache_key);
        let written = match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let found = occupied.get().version;
                if expected_version != Some(found) {
                    self.stats.write().conflicts += 1;
                    return Err(HearthError::VersionConflict {
                        namespace: namespace.to_string(),
                        cache_key: cache_key.to_string(),
                        expected: expected_version,
                        found: Some(found),
                    });
                }
                let entry = CacheEntry::new(
                    namespace,
                    cache_key,
                    payload,
                    fetched_at,
                    expires_at,
                    found + 1,
                )?;
                occupied.insert(entry.clone());
                entry
            }
            Entry::Vacant(vacant) => {
                if expected_version.is_some() {
                    self.stats.write().conflicts += 1;
                    return Err(HearthError::VersionConflict {
                        namespace: namespace.to_string(),
                        cache_key: cache_key.to_string(),
                        expected: expected_version,
                        found: None,
                    });
                }
                let entry =
                    CacheEntry::new(namespace, cache_key, payload, fetched_at, expires_at, 0)?;
                vacant.insert(entry.clone());
                entry
            }
        };

        self.stats.write().writes += 1;
        debug!(namespace, cache_key, version = written.version, "entry written");
        Ok(written)
    }

    #[instrument(skip(self))]
    async fn delete_expired(&self, namespace: &str, older_than: DateTime<Utc>) -> Result<u64> {
        let mut removed = 0u64;
        self.entries.retain(|_, entry| {
            let expired = entry.namespace == namespace && entry.expires_at <= older_than;
            if expired {
                removed += 1;
            }
            !expired
        });

        if removed > 0 {
            self.stats.write().swept += removed;
            debug!(namespace, removed, "expired entries removed");
        }
        Ok(removed)
    }
}
