//! # Hearth Catalog
//!
//! The listing-catalog side of the workspace: storage for communities,
//! their listings, and observed prices, implementing
//! [`hearth_core::traits::CatalogStore`].
//!
//! Reads return explicitly nested shapes ([`hearth_core::CommunityView`]);
//! there is no lazy loading.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;

pub use memory::MemoryCatalog;
