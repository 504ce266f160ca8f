//! Store interfaces for Hearth.
//!
//! These traits define the seams between the cache/catalog logic and the
//! persistence backends, enabling swappable implementations and testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::types::{CacheEntry, CommunityView};

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Keyed persistence for [`CacheEntry`] records.
///
/// The store is a dumb backend: the fetch cache exclusively owns the entry
/// lifecycle and the store only enforces keyed storage plus the optimistic
/// version check on writes.
///
/// Implementations might use:
/// - In-memory storage (development, testing, single-process deployments)
/// - A file snapshot (single-node durability)
/// - A relational table (multi-process deployments)
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Looks up the entry stored under `(namespace, cache_key)`.
    async fn get(&self, namespace: &str, cache_key: &str) -> Result<Option<CacheEntry>>;

    /// Writes a full replacement entry, guarded by optimistic concurrency.
    ///
    /// `expected_version` must match the currently stored version exactly:
    /// `None` means "expect nothing stored". On mismatch the write fails
    /// with [`HearthError::VersionConflict`](crate::HearthError) and the
    /// stored entry is left untouched. The first successful write for a key
    /// gets version 0; each replacement increments it.
    async fn put(
        &self,
        namespace: &str,
        cache_key: &str,
        payload: Value,
        fetched_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        expected_version: Option<u64>,
    ) -> Result<CacheEntry>;

    /// Removes entries in `namespace` whose `expires_at` is older than
    /// `older_than`. Maintenance sweep; never called on the hit/miss path.
    ///
    /// Returns the number of entries removed.
    async fn delete_expired(&self, namespace: &str, older_than: DateTime<Utc>) -> Result<u64>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CATALOG STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Read access to the listing catalog.
///
/// Callers request the nested shape they need explicitly; there is no lazy
/// loading. The one read implemented today mirrors the catalog's community
/// listing endpoint: communities with their listings and each listing's
/// price snapshots, loaded together.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns a page of communities with listings and price snapshots
    /// eagerly attached, ordered by creation time.
    async fn list_communities(&self, skip: usize, limit: usize) -> Result<Vec<CommunityView>>;
}
