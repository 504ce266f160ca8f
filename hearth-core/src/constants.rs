//! Namespace names and default TTL horizons for the fetch cache.
//!
//! Each namespace groups the entries of one producer family and carries its
//! own TTL policy, so keys from different producers can never collide.

// ═══════════════════════════════════════════════════════════════════════════════
// NAMESPACES
// ═══════════════════════════════════════════════════════════════════════════════

/// Routing-matrix responses (origin community → labeled destination, per
/// travel mode).
pub const NS_ROUTING: &str = "routing";

/// Place-details lookups keyed by upstream place id.
pub const NS_PLACE_DETAILS: &str = "place-details";

/// Generic JSON API responses keyed by API name plus serialized request.
/// No default TTL; callers configure one explicitly.
pub const NS_GENERIC_API: &str = "generic-api";

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULT TTL HORIZONS
// ═══════════════════════════════════════════════════════════════════════════════
// Route matrices drift slowly (road networks change over months); place
// details drift even more slowly. Both are measured in days.

/// Default TTL for routing-matrix entries, in days.
pub const ROUTING_TTL_DAYS: i64 = 7;

/// Default TTL for place-details entries, in days.
pub const PLACE_DETAILS_TTL_DAYS: i64 = 30;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_are_distinct() {
        assert_ne!(NS_ROUTING, NS_PLACE_DETAILS);
        assert_ne!(NS_ROUTING, NS_GENERIC_API);
        assert_ne!(NS_PLACE_DETAILS, NS_GENERIC_API);
    }
}
