//! Subscription management for live stream clients.
//!
//! The registry owns both directions of the mapping between connections and
//! vehicles: `vehicle -> set of connections` for publish-time lookup and
//! `connection -> vehicle` for O(1) re-subscribe and cleanup. This replaces
//! a full scan over every connected client per publish.
//!
//! The lock is read-mostly (one read per publish, writes only on connection
//! lifecycle events) and is never held across an await point.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tokio::sync::mpsc;
use tracing::debug;

use fleetwatch_protocol::ServerMessage;

/// Depth of each connection's bounded outbound queue. A connection that
/// falls this far behind is dropped rather than buffered further.
pub const OUTBOUND_QUEUE_DEPTH: usize = 64;

/// Identifies one live connection for the lifetime of the process.
pub type ConnectionId = u64;

struct Connection {
    sender: mpsc::Sender<ServerMessage>,
    vehicle_id: Option<String>,
}

#[derive(Default)]
struct Inner {
    by_vehicle: HashMap<String, HashSet<ConnectionId>>,
    connections: HashMap<ConnectionId, Connection>,
}

/// Tracks which live connections want updates for which vehicle.
#[derive(Default)]
pub struct SubscriptionRegistry {
    next_id: AtomicU64,
    inner: RwLock<Inner>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection with its outbound queue sender.
    ///
    /// The connection starts with no subscription; it receives nothing until
    /// it subscribes to a vehicle.
    pub fn register(&self, sender: mpsc::Sender<ServerMessage>) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.connections.insert(
            id,
            Connection {
                sender,
                vehicle_id: None,
            },
        );
        id
    }

    /// Subscribe a connection to one vehicle's stream.
    ///
    /// Idempotent; a later subscribe replaces the earlier one (a connection
    /// holds at most one vehicle subscription). Unknown connection ids are
    /// ignored.
    pub fn subscribe(&self, conn: ConnectionId, vehicle_id: &str) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        let previous = match inner.connections.get_mut(&conn) {
            Some(connection) => connection.vehicle_id.replace(vehicle_id.to_string()),
            None => {
                debug!(conn, vehicle_id, "subscribe from unknown connection");
                return;
            }
        };

        if let Some(previous) = previous {
            if previous == vehicle_id {
                return;
            }
            remove_from_vehicle(&mut inner.by_vehicle, &previous, conn);
        }

        inner
            .by_vehicle
            .entry(vehicle_id.to_string())
            .or_default()
            .insert(conn);
    }

    /// Remove a connection's subscription, keeping the connection alive.
    ///
    /// Safe to call for unsubscribed or unknown connections (no-op).
    pub fn unsubscribe(&self, conn: ConnectionId) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let previous = inner
            .connections
            .get_mut(&conn)
            .and_then(|c| c.vehicle_id.take());
        if let Some(vehicle_id) = previous {
            remove_from_vehicle(&mut inner.by_vehicle, &vehicle_id, conn);
        }
    }

    /// Forget a connection entirely: subscription and outbound queue.
    ///
    /// Called on connection close and by the hub when delivery fails.
    pub fn deregister(&self, conn: ConnectionId) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if let Some(connection) = inner.connections.remove(&conn) {
            if let Some(vehicle_id) = connection.vehicle_id {
                remove_from_vehicle(&mut inner.by_vehicle, &vehicle_id, conn);
            }
        }
    }

    /// Snapshot of the connections subscribed to a vehicle.
    ///
    /// The returned senders are clones; callers iterate without holding the
    /// registry lock, so concurrent subscribe/unsubscribe stays safe.
    pub fn subscribers_of(
        &self,
        vehicle_id: &str,
    ) -> Vec<(ConnectionId, mpsc::Sender<ServerMessage>)> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let Some(conns) = inner.by_vehicle.get(vehicle_id) else {
            return Vec::new();
        };
        conns
            .iter()
            .filter_map(|id| {
                inner
                    .connections
                    .get(id)
                    .map(|c| (*id, c.sender.clone()))
            })
            .collect()
    }

    /// Number of registered connections, subscribed or not.
    pub fn connection_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .connections
            .len()
    }

    /// Number of connections subscribed to a vehicle.
    pub fn subscriber_count(&self, vehicle_id: &str) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .by_vehicle
            .get(vehicle_id)
            .map_or(0, HashSet::len)
    }
}

fn remove_from_vehicle(
    by_vehicle: &mut HashMap<String, HashSet<ConnectionId>>,
    vehicle_id: &str,
    conn: ConnectionId,
) {
    if let Some(set) = by_vehicle.get_mut(vehicle_id) {
        set.remove(&conn);
        if set.is_empty() {
            by_vehicle.remove(vehicle_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> mpsc::Sender<ServerMessage> {
        mpsc::channel(OUTBOUND_QUEUE_DEPTH).0
    }

    #[test]
    fn test_register_starts_unsubscribed() {
        let registry = SubscriptionRegistry::new();
        let conn = registry.register(sender());

        assert_eq!(registry.connection_count(), 1);
        assert_eq!(registry.subscriber_count("V1"), 0);
        assert!(registry.subscribers_of("V1").is_empty());
        let _ = conn;
    }

    #[test]
    fn test_subscribe_and_lookup() {
        let registry = SubscriptionRegistry::new();
        let conn = registry.register(sender());
        registry.subscribe(conn, "V1");

        let subs = registry.subscribers_of("V1");
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].0, conn);
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let registry = SubscriptionRegistry::new();
        let conn = registry.register(sender());
        registry.subscribe(conn, "V1");
        registry.subscribe(conn, "V1");

        assert_eq!(registry.subscriber_count("V1"), 1);
    }

    #[test]
    fn test_last_subscribe_wins() {
        let registry = SubscriptionRegistry::new();
        let conn = registry.register(sender());
        registry.subscribe(conn, "V1");
        registry.subscribe(conn, "V2");

        assert_eq!(registry.subscriber_count("V1"), 0);
        assert_eq!(registry.subscriber_count("V2"), 1);
    }

    #[test]
    fn test_unsubscribe_without_subscription_is_noop() {
        let registry = SubscriptionRegistry::new();
        let conn = registry.register(sender());

        registry.unsubscribe(conn);
        registry.unsubscribe(9999);

        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn test_unsubscribe_keeps_connection_registered() {
        let registry = SubscriptionRegistry::new();
        let conn = registry.register(sender());
        registry.subscribe(conn, "V1");
        registry.unsubscribe(conn);

        assert_eq!(registry.subscriber_count("V1"), 0);
        assert_eq!(registry.connection_count(), 1);

        // Can re-subscribe afterwards.
        registry.subscribe(conn, "V1");
        assert_eq!(registry.subscriber_count("V1"), 1);
    }

    #[test]
    fn test_deregister_removes_everywhere() {
        let registry = SubscriptionRegistry::new();
        let conn = registry.register(sender());
        registry.subscribe(conn, "V1");
        registry.deregister(conn);

        assert_eq!(registry.connection_count(), 0);
        assert!(registry.subscribers_of("V1").is_empty());

        // Late subscribe from the dead connection is ignored.
        registry.subscribe(conn, "V1");
        assert_eq!(registry.subscriber_count("V1"), 0);
    }

    #[test]
    fn test_multiple_connections_one_vehicle() {
        let registry = SubscriptionRegistry::new();
        let a = registry.register(sender());
        let b = registry.register(sender());
        registry.subscribe(a, "V1");
        registry.subscribe(b, "V1");

        assert_eq!(registry.subscriber_count("V1"), 2);

        registry.deregister(a);
        assert_eq!(registry.subscriber_count("V1"), 1);
        assert_eq!(registry.subscribers_of("V1")[0].0, b);
    }

    #[test]
    fn test_snapshot_survives_concurrent_mutation() {
        let registry = SubscriptionRegistry::new();
        let a = registry.register(sender());
        let b = registry.register(sender());
        registry.subscribe(a, "V1");
        registry.subscribe(b, "V1");

        let snapshot = registry.subscribers_of("V1");
        // Mutating the registry does not invalidate the snapshot.
        registry.deregister(a);
        registry.deregister(b);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.subscriber_count("V1"), 0);
    }
}
