//! Listing-catalog records.
//!
//! These mirror the catalog's relational schema: a tree of owned records
//! linked by explicit foreign-key ids. There are no back-references and no
//! lazy loading; nested read shapes are composed by the catalog store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// An apartment community (one physical property, possibly many listings).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Community {
    /// Unique id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Canonicalized address used for de-duplication across sources.
    pub normalized_address: Option<String>,
    /// Street address.
    pub street: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Postal code.
    pub zip: Option<String>,
    /// Latitude, if geocoded.
    pub lat: Option<f64>,
    /// Longitude, if geocoded.
    pub lon: Option<f64>,
    /// The source that first surfaced this community.
    pub primary_source: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Community {
    /// Creates a community with a fresh id and timestamps.
    pub fn new(name: impl Into<String>, primary_source: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            normalized_address: None,
            street: None,
            city: None,
            zip: None,
            lat: None,
            lon: None,
            primary_source: primary_source.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One scraped/ingested listing for a community.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Listing {
    /// Unique id.
    pub id: Uuid,
    /// Owning community.
    pub community_id: Uuid,
    /// Originating source (e.g. "zillow", "avalon").
    pub source: Option<String>,
    /// The source's own listing id, unique per source.
    pub source_listing_id: Option<String>,
    /// Canonical listing URL.
    pub url: Option<String>,
    /// Listing title.
    pub title: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Last time the source page was scraped.
    pub last_scraped: Option<DateTime<Utc>>,
    /// Whether the listing is currently live at the source.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Creates an active listing with a fresh id.
    pub fn new(community_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            community_id,
            source: None,
            source_listing_id: None,
            url: None,
            title: None,
            description: None,
            last_scraped: None,
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// A floor-plan grouping within a listing (e.g. "1BR/1BA").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitType {
    /// Unique id.
    pub id: Uuid,
    /// Owning listing.
    pub listing_id: Uuid,
    /// Display name.
    pub name: Option<String>,
    /// Bedroom count.
    pub bedrooms: Option<i32>,
    /// Bathroom count.
    pub bathrooms: Option<i32>,
    /// Smallest advertised square footage.
    pub sqft_min: Option<i32>,
    /// Largest advertised square footage.
    pub sqft_max: Option<i32>,
    /// Availability text as reported by the source.
    pub availability: Option<String>,
    /// Source-specific detail blob.
    pub details: Option<Value>,
}

/// A point-in-time observed price for a listing (optionally per unit type).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Unique id.
    pub id: Uuid,
    /// Owning listing.
    pub listing_id: Uuid,
    /// Unit type this price applies to, when the source breaks prices out.
    pub unit_type_id: Option<Uuid>,
    /// Observed price in minor units of `currency`.
    pub price: i64,
    /// ISO currency code.
    pub currency: String,
    /// When the price was observed.
    pub fetched_at: DateTime<Utc>,
}

impl PriceSnapshot {
    /// Creates a snapshot observed now.
    pub fn new(listing_id: Uuid, price: i64, currency: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            listing_id,
            unit_type_id: None,
            price,
            currency: currency.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// A named amenity (pool, gym, in-unit laundry, ...).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Amenity {
    /// Unique id.
    pub id: Uuid,
    /// Amenity name.
    pub name: String,
    /// Grouping: community, unit, or shared.
    pub category: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
}

/// Join record attaching an amenity to a listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListingAmenity {
    /// Unique id.
    pub id: Uuid,
    /// The listing side of the join.
    pub listing_id: Uuid,
    /// The amenity side of the join.
    pub amenity_id: Uuid,
    /// Whether the source itself reported the amenity (vs. inferred).
    pub source_reported: bool,
    /// Confidence of an inferred attachment, 0.0..=1.0.
    pub confidence: Option<f64>,
}

/// Raw capture of a source page for a listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceSnapshot {
    /// Unique id.
    pub id: Uuid,
    /// Owning listing.
    pub listing_id: Uuid,
    /// URL that was scraped.
    pub url: Option<String>,
    /// Raw HTML body, if captured.
    pub raw_html: Option<String>,
    /// Raw structured payload, if the source exposes one.
    pub raw_json: Option<Value>,
    /// When the capture happened.
    pub last_scraped: Option<DateTime<Utc>>,
}

/// Neighborhood-level metrics for a community. Schema only; no scoring
/// computation lives in this workspace.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalityMetric {
    /// Unique id.
    pub id: Uuid,
    /// Community the metrics describe.
    pub community_id: Uuid,
    /// Walkability score.
    pub walk_score: Option<i32>,
    /// Transit access score.
    pub transit_score: Option<i32>,
    /// Bikeability score.
    pub bike_score: Option<i32>,
    /// Point-of-interest counts by category.
    pub poi_counts: Option<Value>,
    /// Nearby school count.
    pub schools_nearby: Option<i32>,
    /// H3 cell the community falls in.
    pub h3_cell: Option<String>,
    /// Safety score.
    pub safety_score: Option<f64>,
    /// Crime incidents over the trailing 12 months.
    pub crime_count_12mo: Option<i32>,
    /// Median rent within the H3 cell, minor currency units.
    pub median_rent_by_h3: Option<i64>,
    /// When the metrics were computed.
    pub computed_at: DateTime<Utc>,
}

/// A scored ranking row for a community. Schema only; the scoring formula
/// is produced elsewhere.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ranking {
    /// Unique id.
    pub id: Uuid,
    /// Community being ranked.
    pub community_id: Uuid,
    /// Price component.
    pub price_score: f64,
    /// Locality component.
    pub locality_score: f64,
    /// Amenity component.
    pub amenity_score: f64,
    /// Combined score.
    pub composite_score: f64,
    /// Batch id of the ranking run that produced this row.
    pub rank_run_id: Uuid,
    /// When the row was computed.
    pub computed_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// NESTED READ SHAPES
// ═══════════════════════════════════════════════════════════════════════════════

/// A listing with its price history attached.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListingView {
    /// The listing record.
    pub listing: Listing,
    /// Observed prices, oldest first.
    pub price_snapshots: Vec<PriceSnapshot>,
}

/// A community with listings and their price snapshots eagerly attached.
/// This is the shape returned by the catalog's community read.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommunityView {
    /// The community record.
    pub community: Community,
    /// The community's listings with prices attached.
    pub listings: Vec<ListingView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_community_new_sets_timestamps() {
        let community = Community::new("The Elm", "zillow");
        assert_eq!(community.name, "The Elm");
        assert_eq!(community.primary_source, "zillow");
        assert_eq!(community.created_at, community.updated_at);
    }

    #[test]
    fn test_listing_new_is_active() {
        let community = Community::new("The Elm", "zillow");
        let listing = Listing::new(community.id);
        assert!(listing.active);
        assert_eq!(listing.community_id, community.id);
    }

    #[test]
    fn test_price_snapshot_new() {
        let listing = Listing::new(Uuid::new_v4());
        let snap = PriceSnapshot::new(listing.id, 2350_00, "USD");
        assert_eq!(snap.listing_id, listing.id);
        assert_eq!(snap.price, 2350_00);
        assert_eq!(snap.currency, "USD");
        assert!(snap.unit_type_id.is_none());
    }
}
