//! In-memory listing catalog.
//!
//! Thread-safe storage for communities, listings, and price snapshots,
//! suitable for development, testing, and single-process deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use hearth_core::error::{HearthError, Result};
use hearth_core::traits::CatalogStore;
use hearth_core::{Community, CommunityView, Listing, ListingView, PriceSnapshot};

/// In-memory listing catalog.
///
/// Writes enforce the schema's foreign keys: a listing must name an
/// existing community and a price snapshot an existing listing. Reads
/// compose the nested view shapes by joining on those ids.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    /// Community id → community
    communities: DashMap<Uuid, Community>,
    /// Listing id → listing
    listings: DashMap<Uuid, Listing>,
    /// Price snapshot id → snapshot
    price_snapshots: DashMap<Uuid, PriceSnapshot>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a community.
    #[instrument(skip(self, community), fields(name = %community.name))]
    pub fn add_community(&self, community: Community) -> Uuid {
        let id = community.id;
        debug!(%id, "community added");
        self.communities.insert(id, community);
        id
    }

    /// Adds a listing. Its `community_id` must resolve.
    pub fn add_listing(&self, listing: Listing) -> Result<Uuid> {
        if !self.communities.contains_key(&listing.community_id) {
            return Err(HearthError::UnknownRecord {
                kind: "community",
                id: listing.community_id.to_string(),
            });
        }
        let id = listing.id;
        self.listings.insert(id, listing);
        Ok(id)
    }

    /// Adds a price snapshot. Its `listing_id` must resolve.
    pub fn add_price_snapshot(&self, snapshot: PriceSnapshot) -> Result<Uuid> {
        if !self.listings.contains_key(&snapshot.listing_id) {
            return Err(HearthError::UnknownRecord {
                kind: "listing",
                id: snapshot.listing_id.to_string(),
            });
        }
        let id = snapshot.id;
        self.price_snapshots.insert(id, snapshot);
        Ok(id)
    }

    /// Returns the number of communities.
    pub fn community_count(&self) -> usize {
        self.communities.len()
    }

    /// Returns true if the catalog holds no communities.
    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// Removes all records.
    pub fn clear(&self) {
        self.communities.clear();
        self.listings.clear();
        self.price_snapshots.clear();
    }

    /// Builds the nested view for one community's listings.
    fn listing_views(&self, community_id: Uuid) -> Vec<ListingView> {
        let mut listings: Vec<Listing> = self
            .listings
            .iter()
            .filter(|entry| entry.value().community_id == community_id)
            .map(|entry| entry.value().clone())
            .collect();
        listings.sort_by_key(|listing| (listing.created_at, listing.id));

        listings
            .into_iter()
            .map(|listing| {
                let mut price_snapshots: Vec<PriceSnapshot> = self
                    .price_snapshots
                    .iter()
                    .filter(|entry| entry.value().listing_id == listing.id)
                    .map(|entry| entry.value().clone())
                    .collect();
                price_snapshots.sort_by_key(|snap| (snap.fetched_at, snap.id));

                ListingView {
                    listing,
                    price_snapshots,
                }
            })
            .collect()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    /// Returns a page of communities with listings and price snapshots
    /// attached, ordered by creation time (ties broken by id).
    #[instrument(skip(self))]
    async fn list_communities(&self, skip: usize, limit: usize) -> Result<Vec<CommunityView>> {
        let mut communities: Vec<Community> = self
            .communities
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        communities.sort_by_key(|community| (community.created_at, community.id));

        let page: Vec<CommunityView> = communities
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|community| {
                let listings = self.listing_views(community.id);
                CommunityView {
                    community,
                    listings,
                }
            })
            .collect();

        debug!(skip, limit, count = page.len(), "communities listed");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_community(catalog: &MemoryCatalog, name: &str) -> Uuid {
        catalog.add_community(Community::new(name, "zillow"))
    }

    #[tokio::test]
    async fn test_empty_catalog_lists_nothing() {
        let catalog = MemoryCatalog::new();
        let page = catalog.list_communities(0, 10).await.unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_eager_nested_shape() {
        let catalog = MemoryCatalog::new();
        let community_id = seed_community(&catalog, "The Elm");

        let listing_id = catalog.add_listing(Listing::new(community_id)).unwrap();
        catalog
            .add_price_snapshot(PriceSnapshot::new(listing_id, 2350_00, "USD"))
            .unwrap();
        catalog
            .add_price_snapshot(PriceSnapshot::new(listing_id, 2400_00, "USD"))
            .unwrap();

        let page = catalog.list_communities(0, 10).await.unwrap();
        assert_eq!(page.len(), 1);

        let view = &page[0];
        assert_eq!(view.community.name, "The Elm");
        assert_eq!(view.listings.len(), 1);
        assert_eq!(view.listings[0].listing.id, listing_id);
        assert_eq!(view.listings[0].price_snapshots.len(), 2);
    }

    #[tokio::test]
    async fn test_price_snapshots_oldest_first() {
        let catalog = MemoryCatalog::new();
        let community_id = seed_community(&catalog, "The Elm");
        let listing_id = catalog.add_listing(Listing::new(community_id)).unwrap();

        let mut older = PriceSnapshot::new(listing_id, 2200_00, "USD");
        older.fetched_at = older.fetched_at - chrono::Duration::days(30);
        let newer = PriceSnapshot::new(listing_id, 2350_00, "USD");

        // Insert newest first to exercise the sort.
        catalog.add_price_snapshot(newer).unwrap();
        catalog.add_price_snapshot(older).unwrap();

        let page = catalog.list_communities(0, 10).await.unwrap();
        let snaps = &page[0].listings[0].price_snapshots;
        assert_eq!(snaps[0].price, 2200_00);
        assert_eq!(snaps[1].price, 2350_00);
    }

    #[tokio::test]
    async fn test_pagination_bounds() {
        let catalog = MemoryCatalog::new();
        for i in 0..5 {
            seed_community(&catalog, &format!("Community {i}"));
        }

        let first = catalog.list_communities(0, 2).await.unwrap();
        assert_eq!(first.len(), 2);

        let middle = catalog.list_communities(2, 2).await.unwrap();
        assert_eq!(middle.len(), 2);

        let tail = catalog.list_communities(4, 2).await.unwrap();
        assert_eq!(tail.len(), 1);

        let past_end = catalog.list_communities(10, 2).await.unwrap();
        assert!(past_end.is_empty());

        // Pages do not overlap.
        let first_ids: Vec<Uuid> = first.iter().map(|v| v.community.id).collect();
        let middle_ids: Vec<Uuid> = middle.iter().map(|v| v.community.id).collect();
        assert!(first_ids.iter().all(|id| !middle_ids.contains(id)));
    }

    #[tokio::test]
    async fn test_ordering_is_stable_by_created_at() {
        let catalog = MemoryCatalog::new();

        let mut late = Community::new("Late", "zillow");
        late.created_at = late.created_at + chrono::Duration::hours(1);
        let early = Community::new("Early", "zillow");

        catalog.add_community(late);
        catalog.add_community(early);

        let page = catalog.list_communities(0, 10).await.unwrap();
        assert_eq!(page[0].community.name, "Early");
        assert_eq!(page[1].community.name, "Late");
    }

    #[tokio::test]
    async fn test_listing_requires_existing_community() {
        let catalog = MemoryCatalog::new();

        let result = catalog.add_listing(Listing::new(Uuid::new_v4()));
        assert!(matches!(
            result,
            Err(HearthError::UnknownRecord { kind: "community", .. })
        ));
    }

    #[tokio::test]
    async fn test_snapshot_requires_existing_listing() {
        let catalog = MemoryCatalog::new();

        let result = catalog.add_price_snapshot(PriceSnapshot::new(Uuid::new_v4(), 1000_00, "USD"));
        assert!(matches!(
            result,
            Err(HearthError::UnknownRecord { kind: "listing", .. })
        ));
    }

    #[tokio::test]
    async fn test_listings_scoped_to_their_community() {
        let catalog = MemoryCatalog::new();
        let a = seed_community(&catalog, "A");
        let b = seed_community(&catalog, "B");

        catalog.add_listing(Listing::new(a)).unwrap();
        catalog.add_listing(Listing::new(a)).unwrap();
        catalog.add_listing(Listing::new(b)).unwrap();

        let page = catalog.list_communities(0, 10).await.unwrap();
        let by_id: std::collections::HashMap<Uuid, usize> = page
            .iter()
            .map(|v| (v.community.id, v.listings.len()))
            .collect();

        assert_eq!(by_id[&a], 2);
        assert_eq!(by_id[&b], 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let catalog = MemoryCatalog::new();
        let community_id = seed_community(&catalog, "The Elm");
        catalog.add_listing(Listing::new(community_id)).unwrap();

        catalog.clear();
        assert!(catalog.is_empty());
        assert!(catalog.list_communities(0, 10).await.unwrap().is_empty());
    }
}
