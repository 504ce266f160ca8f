//! Get-or-fetch orchestration.
//!
//! The single public entry point of the fetch cache: look the key up in the
//! store, return fresh hits directly, and otherwise run the producer under
//! single-flight coordination before writing the refreshed entry back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use hearth_core::error::{HearthError, Result};
use hearth_core::traits::EntryStore;
use hearth_core::CacheEntry;

use crate::flight::{FlightFailure, FlightRegistry, FlightResult, FlightSlot};
use crate::key::KeyParams;
use crate::policy::TtlPolicy;

/// Computes a fresh value for a semantic key.
///
/// Supplied by the caller per invocation; typically wraps a rate-limited
/// upstream client (routing matrix, place details). Must be shareable
/// because the flight leader hands it to a spawned task.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Produces the payload for `params`.
    async fn produce(&self, params: &KeyParams) -> Result<Value>;
}

/// How a caller wants producer failures handled when a stale entry exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// Fail on producer error; never return stale data.
    #[default]
    Strict,
    /// On producer error, fall back to the stale entry (flagged) if one
    /// exists.
    BestEffort,
}

/// A resolved read, with staleness metadata.
#[derive(Clone, Debug)]
pub struct Fetched {
    /// The payload, verbatim as produced.
    pub payload: Value,
    /// True when the payload comes from an expired entry served under
    /// best-effort mode.
    pub is_stale: bool,
    /// True when no producer ran for this call (fresh hit or shared
    /// flight result).
    pub from_cache: bool,
    /// Stored version of the entry backing this read.
    pub version: u64,
    /// When the backing entry was produced.
    pub fetched_at: DateTime<Utc>,
}

impl Fetched {
    fn hit(entry: CacheEntry) -> Self {
        Self {
            is_stale: false,
            from_cache: true,
            version: entry.version,
            fetched_at: entry.fetched_at,
            payload: entry.payload,
        }
    }

    fn produced(entry: CacheEntry) -> Self {
        Self {
            is_stale: false,
            from_cache: false,
            version: entry.version,
            fetched_at: entry.fetched_at,
            payload: entry.payload,
        }
    }

    fn stale(entry: CacheEntry) -> Self {
        Self {
            is_stale: true,
            from_cache: true,
            version: entry.version,
            fetched_at: entry.fetched_at,
            payload: entry.payload,
        }
    }
}

/// The time-bounded fetch cache.
///
/// Owns the read/write lifecycle of cache entries; the store underneath is
/// a dumb keyed backend. Safe under concurrent callers: per-key
/// single-flight bounds each `(namespace, cache_key)` to at most one
/// in-flight producer invocation, and the store's conditional versioned
/// writes linearize refreshes.
pub struct FetchCache<S> {
    store: Arc<S>,
    policy: TtlPolicy,
    flights: Arc<FlightRegistry>,
}

impl<S> FetchCache<S>
where
    S: EntryStore + 'static,
{
    /// Creates a cache over `store` with the given TTL policy.
    pub fn new(store: Arc<S>, policy: TtlPolicy) -> Self {
        Self {
            store,
            policy,
            flights: Arc::new(FlightRegistry::new()),
        }
    }

    /// Returns the TTL policy.
    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    /// Resolves a read for `(namespace, params)`.
    ///
    /// Fresh hits return without touching the producer. On miss or expiry
    /// the producer runs (deduplicated per key across concurrent callers)
    /// and the result is written back with `expires_at = now + ttl`.
    ///
    /// In [`FetchMode::Strict`] a producer failure surfaces unchanged. In
    /// [`FetchMode::BestEffort`] the stale entry, if any, is returned with
    /// `is_stale = true` instead.
    #[instrument(skip(self, params, producer))]
    pub async fn get_or_fetch(
        &self,
        namespace: &str,
        params: &KeyParams,
        producer: Arc<dyn Producer>,
        mode: FetchMode,
    ) -> Result<Fetched> {
        let cache_key = params.cache_key()?;
        // Fail before producing if no policy exists for the namespace.
        let ttl = self.policy.ttl_for(namespace)?;

        let mut stale = None;
        if let Some(entry) = self.store.get(namespace, &cache_key).await? {
            if entry.is_fresh(Utc::now()) {
                debug!(namespace, cache_key, "cache hit");
                return Ok(Fetched::hit(entry));
            }
            stale = Some(entry);
        }
        debug!(namespace, cache_key, "cache miss, producing");

        let flight_key = FlightRegistry::flight_key(namespace, &cache_key);
        match self.flights.join(&flight_key) {
            FlightSlot::Follower(rx) => self.await_flight(rx, namespace, &cache_key, stale, mode).await,
            FlightSlot::Leader(tx) => {
                // Production runs on the runtime so it completes for the
                // other waiters even if this caller is cancelled.
                let handle = tokio::spawn(run_flight(
                    Arc::clone(&self.store),
                    Arc::clone(&self.flights),
                    flight_key,
                    tx,
                    namespace.to_string(),
                    cache_key,
                    params.clone(),
                    producer,
                    ttl,
                    stale.as_ref().map(|entry| entry.version),
                ));
                match handle.await {
                    Ok(Ok(entry)) => Ok(Fetched::produced(entry)),
                    Ok(Err(err)) => self.resolve_failure(err, stale, mode),
                    Err(join_err) => Err(HearthError::Internal(format!(
                        "flight task failed: {join_err}"
                    ))),
                }
            }
        }
    }

    /// Removes entries in `namespace` whose horizon passed more than
    /// `retention` ago. Maintenance sweep, never on the read path.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self, namespace: &str, retention: Duration) -> Result<u64> {
        let older_than = Utc::now() - retention;
        let removed = self.store.delete_expired(namespace, older_than).await?;
        if removed > 0 {
            info!(namespace, removed, "swept expired cache entries");
        }
        Ok(removed)
    }

    /// Waits out another caller's flight and maps its shared outcome.
    async fn await_flight(
        &self,
        mut rx: broadcast::Receiver<FlightResult>,
        namespace: &str,
        cache_key: &str,
        stale: Option<CacheEntry>,
        mode: FetchMode,
    ) -> Result<Fetched> {
        match rx.recv().await {
            Ok(FlightResult::Fresh(entry)) => Ok(Fetched::hit(entry)),
            Ok(FlightResult::Failed(failure)) => {
                let err = match failure {
                    FlightFailure::Producer(msg) => HearthError::Producer(msg),
                    FlightFailure::Store(msg) => HearthError::StoreUnavailable(msg),
                };
                self.resolve_failure(err, stale, mode)
            }
            // The sender dropped without broadcasting (leader task aborted).
            // The flight is gone from the registry, so re-read the store.
            Err(_) => match self.store.get(namespace, cache_key).await? {
                Some(entry) if entry.is_fresh(Utc::now()) => Ok(Fetched::hit(entry)),
                _ => Err(HearthError::Internal(
                    "shared fetch resolved without a result".into(),
                )),
            },
        }
    }

    /// Applies strict/best-effort semantics to a failed production.
    fn resolve_failure(
        &self,
        err: HearthError,
        stale: Option<CacheEntry>,
        mode: FetchMode,
    ) -> Result<Fetched> {
        match (mode, stale) {
            (FetchMode::BestEffort, Some(entry)) if matches!(err, HearthError::Producer(_)) => {
                warn!(
                    namespace = entry.namespace,
                    error = %err,
                    "producer failed, serving stale entry"
                );
                Ok(Fetched::stale(entry))
            }
            _ => Err(err),
        }
    }
}

/// Leader side of a flight: produce, write back, publish to waiters.
#[allow(clippy::too_many_arguments)]
async fn run_flight<S: EntryStore>(
    store: Arc<S>,
    flights: Arc<FlightRegistry>,
    flight_key: String,
    tx: broadcast::Sender<FlightResult>,
    namespace: String,
    cache_key: String,
    params: KeyParams,
    producer: Arc<dyn Producer>,
    ttl: Duration,
    expected_version: Option<u64>,
) -> Result<CacheEntry> {
    let outcome = produce_and_store(
        store,
        &namespace,
        &cache_key,
        &params,
        producer,
        ttl,
        expected_version,
    )
    .await;

    // Remove the flight before broadcasting so callers arriving from here
    // on perform a fresh store lookup rather than joining a spent flight.
    flights.complete(&flight_key);
    let shared = match &outcome {
        Ok(entry) => FlightResult::Fresh(entry.clone()),
        Err(HearthError::Producer(msg)) => FlightResult::Failed(FlightFailure::Producer(msg.clone())),
        Err(err) => FlightResult::Failed(FlightFailure::Store(err.to_string())),
    };
    // Send fails only when no follower is subscribed; that is fine.
    let _ = tx.send(shared);

    outcome
}

/// Runs the producer and writes the refreshed entry with optimistic
/// concurrency. A version conflict means another writer already refreshed
/// the key: adopt its entry when fresh, otherwise retry the write once
/// against the observed version.
async fn produce_and_store<S: EntryStore>(
    store: Arc<S>,
    namespace: &str,
    cache_key: &str,
    params: &KeyParams,
    producer: Arc<dyn Producer>,
    ttl: Duration,
    expected_version: Option<u64>,
) -> Result<CacheEntry> {
    let payload = producer.produce(params).await?;

    let fetched_at = Utc::now();
    let put = store
        .put(
            namespace,
            cache_key,
            payload.clone(),
            fetched_at,
            fetched_at + ttl,
            expected_version,
        )
        .await;

    match put {
        Ok(entry) => {
            info!(namespace, cache_key, version = entry.version, "entry refreshed");
            Ok(entry)
        }
        Err(HearthError::VersionConflict { .. }) => {
            debug!(namespace, cache_key, "write raced another refresh, re-reading");
            match store.get(namespace, cache_key).await? {
                Some(current) if current.is_fresh(Utc::now()) => Ok(current),
                Some(current) => {
                    let now = Utc::now();
                    store
                        .put(
                            namespace,
                            cache_key,
                            payload,
                            now,
                            now + ttl,
                            Some(current.version),
                        )
                        .await
                }
                None => {
                    // The conflicting entry was swept in between; write as
                    // a first entry.
                    let now = Utc::now();
                    store
                        .put(namespace, cache_key, payload, now, now + ttl, None)
                        .await
                }
            }
        }
        Err(err) => Err(err),
    }
}
