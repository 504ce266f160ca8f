//! # Hearth Cache
//!
//! The time-bounded fetch cache: mediates between callers that need a value
//! identified by a semantic key and an expensive external producer (routing
//! matrices, place-details lookups, generic JSON APIs).
//!
//! ## Control flow
//!
//! ```text
//! caller → FetchCache::get_or_fetch(key)
//!        → store lookup
//!        → [hit & fresh: return]
//!        | [miss or stale: single-flight produce → store write → return]
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use hearth_cache::{FetchCache, FetchMode, KeyParams, TtlPolicy};
//!
//! let cache = FetchCache::new(store, TtlPolicy::with_defaults());
//! let params = KeyParams::route("c1", "Downtown", "driving");
//! let fetched = cache
//!     .get_or_fetch("routing", &params, producer, FetchMode::Strict)
//!     .await?;
//! assert!(!fetched.is_stale);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod fetch;
mod flight;
mod key;
mod policy;

pub use fetch::{FetchCache, FetchMode, Fetched, Producer};
pub use key::KeyParams;
pub use policy::TtlPolicy;
