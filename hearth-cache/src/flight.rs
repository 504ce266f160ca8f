//! Per-key single-flight coordination.
//!
//! While no fresh entry exists for a `(namespace, cache_key)`, at most one
//! producer invocation may be in flight. The first caller to register
//! becomes the leader; everyone else subscribes to the leader's broadcast.
//! The registry entry is removed when the flight resolves, before the
//! result is broadcast, so callers arriving afterwards re-read the store
//! instead of attaching to a spent flight.
//!
//! Lock scope is the registry insert/remove only, never the producer call.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;

use hearth_core::CacheEntry;

/// Outcome of a resolved flight, shared with all waiters.
#[derive(Clone, Debug)]
pub(crate) enum FlightResult {
    /// Production succeeded and the entry was written.
    Fresh(CacheEntry),
    /// Production or the subsequent write failed.
    Failed(FlightFailure),
}

/// Cloneable failure carried across the broadcast channel.
#[derive(Clone, Debug)]
pub(crate) enum FlightFailure {
    /// The producer itself failed.
    Producer(String),
    /// The store rejected the write.
    Store(String),
}

/// What a caller got when joining a flight.
pub(crate) enum FlightSlot {
    /// This caller runs the producer and broadcasts the outcome.
    Leader(broadcast::Sender<FlightResult>),
    /// Another caller is already producing; wait on its broadcast.
    Follower(broadcast::Receiver<FlightResult>),
}

/// In-process registry of pending flights keyed by namespace + cache key.
#[derive(Debug, Default)]
pub(crate) struct FlightRegistry {
    flights: DashMap<String, broadcast::Sender<FlightResult>>,
}

impl FlightRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Composite registry key. The separator byte cannot appear in a hex
    /// cache key, so namespaces cannot collide.
    pub(crate) fn flight_key(namespace: &str, cache_key: &str) -> String {
        format!("{namespace}\u{1f}{cache_key}")
    }

    /// Joins the flight for `key`, becoming leader if none is pending.
    pub(crate) fn join(&self, key: &str) -> FlightSlot {
        match self.flights.entry(key.to_string()) {
            Entry::Occupied(occupied) => FlightSlot::Follower(occupied.get().subscribe()),
            Entry::Vacant(vacant) => {
                let (tx, _rx) = broadcast::channel(1);
                vacant.insert(tx.clone());
                FlightSlot::Leader(tx)
            }
        }
    }

    /// Removes the pending flight for `key`. Called by the leader once the
    /// producer call has completed, success or failure, before the result
    /// is broadcast.
    pub(crate) fn complete(&self, key: &str) {
        self.flights.remove(key);
    }

    /// Number of currently pending flights.
    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.flights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_join_is_leader() {
        let registry = FlightRegistry::new();
        let key = FlightRegistry::flight_key("routing", "abc");

        assert!(matches!(registry.join(&key), FlightSlot::Leader(_)));
        assert!(matches!(registry.join(&key), FlightSlot::Follower(_)));
        assert_eq!(registry.pending(), 1);
    }

    #[test]
    fn test_complete_clears_flight() {
        let registry = FlightRegistry::new();
        let key = FlightRegistry::flight_key("routing", "abc");

        let _slot = registry.join(&key);
        registry.complete(&key);
        assert_eq!(registry.pending(), 0);

        // A later caller starts a fresh flight.
        assert!(matches!(registry.join(&key), FlightSlot::Leader(_)));
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let registry = FlightRegistry::new();
        let a = FlightRegistry::flight_key("routing", "abc");
        let b = FlightRegistry::flight_key("place-details", "abc");

        assert!(matches!(registry.join(&a), FlightSlot::Leader(_)));
        assert!(matches!(registry.join(&b), FlightSlot::Leader(_)));
        assert_eq!(registry.pending(), 2);
    }

    #[tokio::test]
    async fn test_followers_receive_broadcast() {
        let registry = FlightRegistry::new();
        let key = FlightRegistry::flight_key("routing", "abc");

        let tx = match registry.join(&key) {
            FlightSlot::Leader(tx) => tx,
            FlightSlot::Follower(_) => unreachable!(),
        };
        let mut rx = match registry.join(&key) {
            FlightSlot::Follower(rx) => rx,
            FlightSlot::Leader(_) => unreachable!(),
        };

        registry.complete(&key);
        tx.send(FlightResult::Failed(FlightFailure::Producer("boom".into())))
            .unwrap();

        match rx.recv().await.unwrap() {
            FlightResult::Failed(FlightFailure::Producer(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
