//! Error types for Hearth.
//!
//! One `thiserror` hierarchy covers the whole workspace. Every error carries
//! enough context to be actionable at the call site.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias using `HearthError`.
pub type Result<T> = std::result::Result<T, HearthError>;

/// Main error type for all Hearth operations.
#[derive(Debug, Error)]
pub enum HearthError {
    // ═══════════════════════════════════════════════════════════════════════════
    // KEY & POLICY ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// A cache-key parameter was missing or empty; caller bug, not retried.
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// No TTL is configured for the namespace. Surfaced instead of silently
    /// defaulting, to force an explicit policy choice.
    #[error("no TTL configured for namespace '{0}'")]
    UnconfiguredNamespace(String),

    /// Configuration error (bad TTL, malformed policy).
    #[error("configuration error: {0}")]
    Config(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // FETCH ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// The upstream producer failed to compute a fresh value.
    #[error("producer failed: {0}")]
    Producer(String),

    /// A conditional write raced another refresh of the same entry.
    #[error(
        "version conflict on {namespace}/{cache_key}: expected {expected:?}, found {found:?}"
    )]
    VersionConflict {
        /// Namespace of the contested entry.
        namespace: String,
        /// Cache key of the contested entry.
        cache_key: String,
        /// Version the writer expected to replace (`None` = expected absent).
        expected: Option<u64>,
        /// Version actually stored (`None` = nothing stored).
        found: Option<u64>,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // STORE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Persistence/transport failure. Not retried here; the caller owns
    /// retry and backoff policy.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A catalog write referenced a record that does not exist.
    #[error("unknown {kind} id: {id}")]
    UnknownRecord {
        /// Record kind ("community", "listing", ...).
        kind: &'static str,
        /// The id that failed to resolve.
        id: String,
    },

    /// An entry was constructed with `fetched_at >= expires_at`.
    #[error("entry born stale: fetched_at {fetched_at} >= expires_at {expires_at}")]
    EntryBornStale {
        /// Timestamp of production.
        fetched_at: DateTime<Utc>,
        /// Proposed expiry horizon.
        expires_at: DateTime<Utc>,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION & I/O
    // ═══════════════════════════════════════════════════════════════════════════
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL
    // ═══════════════════════════════════════════════════════════════════════════
    /// Internal invariant violation (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl HearthError {
    /// Returns true if retrying the operation may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HearthError::Producer(_)
                | HearthError::VersionConflict { .. }
                | HearthError::StoreUnavailable(_)
        )
    }

    /// Returns true if the error indicates a caller bug rather than a
    /// runtime condition.
    pub fn is_caller_bug(&self) -> bool {
        matches!(
            self,
            HearthError::InvalidKey(_)
                | HearthError::UnconfiguredNamespace(_)
                | HearthError::Config(_)
                | HearthError::UnknownRecord { .. }
        )
    }
}
