//! Protocol message types for the live stream connection.
//!
//! All messages are JSON over WebSocket text frames, tagged by a `type`
//! field:
//! - Client → Server: `{"type": "subscribe", "vehicleId": "..."}`
//! - Server → Client: `{"type": "vehicle_update", "data": Reading}` and
//!   `{"type": "alert", "data": AlertEvent}`
//!
//! The HTTP ingestion acknowledgment lives here too since devices consume it.

use serde::{Deserialize, Serialize};

use fleetwatch_core::{AlertEvent, Reading};

/// Messages a client may send over the stream connection.
///
/// A connection holds at most one vehicle subscription; a later subscribe
/// replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Declare interest in one vehicle's event stream.
    Subscribe {
        #[serde(rename = "vehicleId")]
        vehicle_id: String,
    },
}

/// Messages pushed from server to subscribed clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A new reading was ingested for the subscribed vehicle.
    VehicleUpdate(Reading),

    /// An alert was detected and persisted for the subscribed vehicle.
    Alert(AlertEvent),
}

impl ServerMessage {
    /// The vehicle this message belongs to.
    pub fn vehicle_id(&self) -> &str {
        match self {
            ServerMessage::VehicleUpdate(reading) => &reading.vehicle_id,
            ServerMessage::Alert(event) => &event.vehicle_id,
        }
    }
}

/// Acknowledgment returned by the ingestion endpoint.
///
/// Success is defined solely by the reading persist; alert and broadcast
/// outcomes never surface here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestAck {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestAck {
    /// A success acknowledgment.
    pub fn ok() -> Self {
        Self {
            success: true,
            message: Some("Reading received".to_string()),
            error: None,
        }
    }

    /// A failure acknowledgment with the given error text.
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}
