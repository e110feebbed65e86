//! # fleetwatch-protocol
//!
//! Wire message types and codec for the fleetwatch live stream and the
//! ingestion acknowledgment.

pub mod codec;
pub mod messages;

pub use codec::{decode_client_message, encode_server_message, CodecError};
pub use messages::{ClientMessage, IngestAck, ServerMessage};
