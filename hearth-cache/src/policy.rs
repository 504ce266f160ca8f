//! Per-namespace TTL policy.
//!
//! Every namespace gets an explicit duration at construction time; an
//! unknown namespace fails rather than silently defaulting, so policy
//! choices stay visible.

use std::collections::HashMap;

use chrono::Duration;

use hearth_core::constants::{
    NS_PLACE_DETAILS, NS_ROUTING, PLACE_DETAILS_TTL_DAYS, ROUTING_TTL_DAYS,
};
use hearth_core::error::{HearthError, Result};

/// Mapping from namespace to the TTL assigned on write.
#[derive(Clone, Debug, Default)]
pub struct TtlPolicy {
    ttls: HashMap<String, Duration>,
}

impl TtlPolicy {
    /// Creates an empty policy. Every namespace must be configured before
    /// use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy preconfigured with the routing and place-details
    /// horizons. The generic-api namespace stays caller-configured.
    pub fn with_defaults() -> Self {
        let mut ttls = HashMap::new();
        ttls.insert(NS_ROUTING.to_string(), Duration::days(ROUTING_TTL_DAYS));
        ttls.insert(
            NS_PLACE_DETAILS.to_string(),
            Duration::days(PLACE_DETAILS_TTL_DAYS),
        );
        Self { ttls }
    }

    /// Adds or replaces the TTL for a namespace.
    ///
    /// Zero and negative durations are rejected: they would make every
    /// entry born stale.
    pub fn with_namespace(mut self, namespace: impl Into<String>, ttl: Duration) -> Result<Self> {
        let namespace = namespace.into();
        if ttl <= Duration::zero() {
            return Err(HearthError::Config(format!(
                "TTL for namespace '{namespace}' must be positive, got {ttl}"
            )));
        }
        self.ttls.insert(namespace, ttl);
        Ok(self)
    }

    /// Returns the configured TTL for a namespace.
    pub fn ttl_for(&self, namespace: &str) -> Result<Duration> {
        self.ttls
            .get(namespace)
            .copied()
            .ok_or_else(|| HearthError::UnconfiguredNamespace(namespace.to_string()))
    }

    /// Eager startup check: verifies every listed namespace has a TTL.
    pub fn validate(&self, namespaces: &[&str]) -> Result<()> {
        for namespace in namespaces {
            self.ttl_for(namespace)?;
        }
        Ok(())
    }
}
