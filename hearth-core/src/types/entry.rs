//! The unit of cached data.
//!
//! A `CacheEntry` is immutable once written: refresh produces a whole new
//! `(payload, fetched_at, expires_at, version)` tuple, never a field edit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HearthError, Result};

/// One cached producer result, bounded in time.
///
/// Keyed by `(namespace, cache_key)`; the key is unique within its
/// namespace. Every entry carries an explicit expiry horizon; "never
/// expires" is not representable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Producer family this entry belongs to (e.g. "routing").
    pub namespace: String,
    /// Canonical key derived from the query's semantic parameters.
    pub cache_key: String,
    /// The producer's result, stored verbatim.
    pub payload: Value,
    /// Timestamp of successful production.
    pub fetched_at: DateTime<Utc>,
    /// Horizon after which the entry is stale. Always strictly after
    /// `fetched_at`.
    pub expires_at: DateTime<Utc>,
    /// Incremented on every overwrite; 0 for a first write.
    pub version: u64,
}

impl CacheEntry {
    /// Creates a validated entry.
    ///
    /// Fails with [`HearthError::EntryBornStale`] unless
    /// `fetched_at < expires_at` strictly.
    pub fn new(
        namespace: impl Into<String>,
        cache_key: impl Into<String>,
        payload: Value,
        fetched_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        version: u64,
    ) -> Result<Self> {
        if fetched_at >= expires_at {
            return Err(HearthError::EntryBornStale {
                fetched_at,
                expires_at,
            });
        }
        Ok(Self {
            namespace: namespace.into(),
            cache_key: cache_key.into(),
            payload,
            fetched_at,
            expires_at,
            version,
        })
    }

    /// Returns true iff the entry still satisfies a read at `now`.
    ///
    /// The interval is half-open: exactly at `expires_at` the entry is
    /// already stale.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Builds the replacement entry for a refresh: same key, new payload
    /// and horizon, version incremented.
    pub fn refreshed(
        &self,
        payload: Value,
        fetched_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Self> {
        Self::new(
            self.namespace.clone(),
            self.cache_key.clone(),
            payload,
            fetched_at,
            expires_at,
            self.version + 1,
        )
    }
}
