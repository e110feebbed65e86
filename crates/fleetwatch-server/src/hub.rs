//! Best-effort, non-blocking event fan-out.
//!
//! The hub delivers readings and alerts to every connection subscribed to a
//! vehicle. Delivery never blocks the publisher: each connection has a
//! bounded outbound queue, and a connection whose queue is full or whose
//! receiver is gone is dropped from the registry instead of retried.
//! Delivery failures never propagate past this module.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use fleetwatch_protocol::ServerMessage;

use crate::registry::{ConnectionId, SubscriptionRegistry};

/// Why delivery to one connection failed. Contained within the hub; the
/// failing connection is deregistered in response.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The connection's bounded outbound queue is full (slow consumer).
    #[error("outbound queue full")]
    QueueFull,

    /// The connection's receive side is gone (closed consumer).
    #[error("connection closed")]
    Closed,
}

/// Fans events out to all subscribed connections for a vehicle.
#[derive(Clone)]
pub struct BroadcastHub {
    registry: Arc<SubscriptionRegistry>,
}

impl BroadcastHub {
    pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Deliver a message to every connection subscribed to `vehicle_id`.
    ///
    /// Returns the number of connections delivered to. Per-connection
    /// failures drop that connection and continue with the rest; within one
    /// vehicle's stream, queued messages preserve publish order.
    pub fn publish(&self, vehicle_id: &str, message: ServerMessage) -> usize {
        let subscribers = self.registry.subscribers_of(vehicle_id);
        if subscribers.is_empty() {
            return 0;
        }

        let mut delivered = 0;
        for (conn, sender) in subscribers {
            match deliver(&sender, message.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    match err {
                        DeliveryError::QueueFull => {
                            warn!(conn, vehicle_id, "dropping lagging connection")
                        }
                        DeliveryError::Closed => {
                            debug!(conn, vehicle_id, "dropping closed connection")
                        }
                    }
                    self.registry.deregister(conn);
                }
            }
        }
        delivered
    }
}

fn deliver(
    sender: &tokio::sync::mpsc::Sender<ServerMessage>,
    message: ServerMessage,
) -> Result<(), DeliveryError> {
    sender.try_send(message).map_err(|err| match err {
        TrySendError::Full(_) => DeliveryError::QueueFull,
        TrySendError::Closed(_) => DeliveryError::Closed,
    })
}
