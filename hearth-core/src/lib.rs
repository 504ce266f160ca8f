//! # Hearth Core
//!
//! Core types, errors, and traits for the Hearth listing-catalog data layer.
//!
//! This crate provides the foundational building blocks used by the other
//! Hearth crates:
//!
//! - **Types**: cache entries and the catalog records (communities,
//!   listings, price snapshots, amenities)
//! - **Errors**: a single error taxonomy with context
//! - **Constants**: cache namespaces and default TTL horizons
//! - **Traits**: the store interfaces implemented by the backend crates
//!
//! ## Example
//!
//! ```rust
//! use hearth_core::{CacheEntry, HearthError};
//! use chrono::{Duration, Utc};
//!
//! let now = Utc::now();
//! let entry = CacheEntry::new(
//!     "routing",
//!     "a1b2c3",
//!     serde_json::json!({"duration_seconds": 600}),
//!     now,
//!     now + Duration::days(7),
//!     0,
//! ).unwrap();
//! assert!(entry.is_fresh(now));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{HearthError, Result};
pub use traits::*;
pub use types::*;
