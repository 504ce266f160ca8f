//! # Hearth Store
//!
//! Backends implementing [`hearth_core::traits::EntryStore`], the keyed
//! store underneath the fetch cache.
//!
//! Two backends are provided:
//!
//! - [`MemoryStore`]: concurrent in-process storage, the default for tests
//!   and single-process deployments.
//! - [`FileStore`]: a memory store with snapshot persistence to a single
//!   binary file, for deployments that need entries to survive restarts.
//!
//! Both enforce the same write contract: a put must name the version it
//! expects to replace (or expect absence), and a mismatch is rejected with
//! a version conflict rather than silently overwriting.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod file;
mod memory;

pub use file::FileStore;
pub use memory::{MemoryStore, StoreStats};
