//! # fleetwatch-server
//!
//! Live stream side of the fleetwatch pipeline:
//! - [`registry::SubscriptionRegistry`] - which connection wants which vehicle
//! - [`hub::BroadcastHub`] - non-blocking fan-out of readings and alerts
//! - [`server::StreamServer`] - the WebSocket endpoint viewers connect to

pub mod hub;
pub mod registry;
pub mod server;

pub use hub::{BroadcastHub, DeliveryError};
pub use registry::{ConnectionId, SubscriptionRegistry, OUTBOUND_QUEUE_DEPTH};
pub use server::{StreamServer, StreamServerConfig};
