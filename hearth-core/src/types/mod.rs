//! Domain types for Hearth.

mod catalog;
mod entry;

pub use catalog::{
    Amenity, Community, CommunityView, Listing, ListingAmenity, ListingView, LocalityMetric,
    PriceSnapshot, Ranking, SourceSnapshot, UnitType,
};
pub use entry::CacheEntry;
