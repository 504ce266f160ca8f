//! Canonical cache keys from semantic query parameters.
//!
//! Logically identical queries must always map to the same key and logically
//! different queries must never collide. Parameters are held sorted by name,
//! so caller insertion order never affects the digest, and values are
//! normalized (trimmed, optionally case-folded) before serialization.

use std::collections::BTreeMap;

use serde_json::Value;
use sha3::{Digest, Sha3_256};

use hearth_core::error::{HearthError, Result};

/// Byte separating a parameter name from its value inside the digest input.
const NAME_VALUE_SEP: u8 = 0x1f;
/// Byte terminating each parameter pair inside the digest input.
const PAIR_SEP: u8 = 0x1e;

/// An ordered set of named key parameters.
///
/// Built with the builder-style `with`/`with_folded` methods or one of the
/// per-producer constructors, then turned into a stable key string with
/// [`cache_key`](KeyParams::cache_key).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyParams {
    params: BTreeMap<String, String>,
}

impl KeyParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter. The value is trimmed; case is preserved.
    /// Re-adding a name replaces its value.
    pub fn with(mut self, name: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.params
            .insert(name.into(), value.as_ref().trim().to_string());
        self
    }

    /// Adds a case-insensitive parameter: trimmed and lowercased. Use for
    /// values with case-insensitive semantics, such as travel mode names.
    pub fn with_folded(mut self, name: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.params
            .insert(name.into(), value.as_ref().trim().to_lowercase());
        self
    }

    /// Key parameters for a routing-matrix query.
    pub fn route(
        origin_id: impl AsRef<str>,
        destination_label: impl AsRef<str>,
        mode: impl AsRef<str>,
    ) -> Self {
        Self::new()
            .with("origin_id", origin_id)
            .with("destination_label", destination_label)
            .with_folded("mode", mode)
    }

    /// Key parameters for a place-details lookup.
    pub fn place(place_id: impl AsRef<str>) -> Self {
        Self::new().with("place_id", place_id)
    }

    /// Key parameters for a generic API call: API name plus the serialized
    /// request body. `serde_json` renders object keys in sorted order, so
    /// the serialization is stable.
    pub fn api(api_name: impl AsRef<str>, request_body: &Value) -> Self {
        Self::new()
            .with("api_name", api_name)
            .with("request_body", request_body.to_string())
    }

    /// Returns the normalized value of a parameter, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if no parameters have been added.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Computes the canonical cache key: parameters serialized in
    /// sorted-name order, digested with SHA3-256, hex-encoded.
    ///
    /// Deterministic across process restarts. Fails with
    /// [`HearthError::InvalidKey`] if the set is empty or any name or value
    /// is empty after trimming.
    pub fn cache_key(&self) -> Result<String> {
        self.validate()?;

        let mut hasher = Sha3_256::new();
        for (name, value) in &self.params {
            hasher.update(name.as_bytes());
            hasher.update([NAME_VALUE_SEP]);
            hasher.update(value.as_bytes());
            hasher.update([PAIR_SEP]);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    fn validate(&self) -> Result<()> {
        if self.params.is_empty() {
            return Err(HearthError::InvalidKey(
                "no key parameters supplied".into(),
            ));
        }
        for (name, value) in &self.params {
            if name.trim().is_empty() {
                return Err(HearthError::InvalidKey("empty parameter name".into()));
            }
            if value.is_empty() {
                return Err(HearthError::InvalidKey(format!(
                    "parameter '{name}' is empty"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = KeyParams::new()
            .with("origin_id", "c1")
            .with("destination_label", "Downtown")
            .with_folded("mode", "driving");
        let b = KeyParams::new()
            .with_folded("mode", "driving")
            .with("destination_label", "Downtown")
            .with("origin_id", "c1");

        assert_eq!(a.cache_key().unwrap(), b.cache_key().unwrap());
    }

    #[test]
    fn test_values_are_normalized() {
        let a = KeyParams::route("c1", "Downtown", "DRIVING");
        let b = KeyParams::route(" c1 ", "Downtown", "driving ");

        assert_eq!(a.cache_key().unwrap(), b.cache_key().unwrap());
    }

    #[test]
    fn test_case_preserved_unless_folded() {
        let a = KeyParams::route("c1", "Downtown", "driving");
        let b = KeyParams::route("c1", "downtown", "driving");

        // destination_label is case-sensitive
        assert_ne!(a.cache_key().unwrap(), b.cache_key().unwrap());
    }

    #[test]
    fn test_differing_semantic_fields_never_collide() {
        let a = KeyParams::route("c1", "Downtown", "driving");
        let b = KeyParams::route("c1", "Downtown", "walking");
        let c = KeyParams::route("c2", "Downtown", "driving");

        assert_ne!(a.cache_key().unwrap(), b.cache_key().unwrap());
        assert_ne!(a.cache_key().unwrap(), c.cache_key().unwrap());
    }

    #[test]
    fn test_value_cannot_leak_into_name() {
        // "ab"="c" and "a"="bc" must not digest identically.
        let a = KeyParams::new().with("ab", "c");
        let b = KeyParams::new().with("a", "bc");

        assert_ne!(a.cache_key().unwrap(), b.cache_key().unwrap());
    }

    #[test]
    fn test_empty_set_rejected() {
        let result = KeyParams::new().cache_key();
        assert!(matches!(result, Err(HearthError::InvalidKey(_))));
    }

    #[test]
    fn test_empty_value_rejected() {
        let result = KeyParams::route("c1", "  ", "driving").cache_key();
        assert!(matches!(result, Err(HearthError::InvalidKey(_))));
    }

    #[test]
    fn test_place_and_api_constructors() {
        let place = KeyParams::place("ChIJabc123");
        assert_eq!(place.get("place_id"), Some("ChIJabc123"));
        assert!(place.cache_key().is_ok());

        let api = KeyParams::api("walkscore", &json!({"lat": 40.7, "lon": -74.0}));
        assert_eq!(api.get("api_name"), Some("walkscore"));
        assert!(api.cache_key().is_ok());
    }

    #[test]
    fn test_repeated_name_keeps_last_value() {
        let a = KeyParams::new().with("r", "A").with("r", "0");
        let b = KeyParams::new().with("r", "0");
        let other = KeyParams::new().with("r", "A");

        assert_eq!(a.get("r"), Some("0"));
        assert_eq!(a.cache_key().unwrap(), b.cache_key().unwrap());
        assert_ne!(a.cache_key().unwrap(), other.cache_key().unwrap());
    }

    #[test]
    fn test_key_is_stable_across_calls() {
        let params = KeyParams::route("c1", "Downtown", "transit");
        assert_eq!(params.cache_key().unwrap(), params.cache_key().unwrap());
    }

    proptest! {
        #[test]
        fn prop_key_is_order_independent(
            // A btree_map guarantees unique names, so forward and reverse
            // insertion are true permutations of the same parameter set.
            params in proptest::collection::btree_map(
                "[a-z]{1,8}",
                "[a-zA-Z0-9]{1,16}",
                1..6,
            ),
        ) {
            let forward = params
                .iter()
                .fold(KeyParams::new(), |p, (n, v)| p.with(n.clone(), v));
            let reverse = params
                .iter()
                .rev()
                .fold(KeyParams::new(), |p, (n, v)| p.with(n.clone(), v));

            prop_assert_eq!(forward.cache_key().unwrap(), reverse.cache_key().unwrap());
        }

        #[test]
        fn prop_differing_value_changes_key(
            name in "[a-z]{1,8}",
            v1 in "[a-zA-Z0-9]{1,16}",
            v2 in "[a-zA-Z0-9]{1,16}",
        ) {
            prop_assume!(v1 != v2);
            let a = KeyParams::new().with(name.clone(), &v1);
            let b = KeyParams::new().with(name, &v2);
            prop_assert_ne!(a.cache_key().unwrap(), b.cache_key().unwrap());
        }
    }
}
