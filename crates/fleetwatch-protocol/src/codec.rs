//! WebSocket message codec.
//!
//! The stream protocol is JSON over WebSocket text frames. This module
//! provides encoding and decoding utilities for the protocol messages.

use thiserror::Error;

use crate::messages::{ClientMessage, ServerMessage};

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON serialization or deserialization failed.
    #[error("failed to encode or decode message: {0}")]
    Json(#[from] serde_json::Error),

    /// Received binary frame instead of text.
    #[error("expected text frame, received binary")]
    BinaryFrame,
}

/// Encode a server message to a JSON string for WebSocket transmission.
pub fn encode_server_message(msg: &ServerMessage) -> Result<String, CodecError> {
    serde_json::to_string(msg).map_err(CodecError::from)
}

/// Decode a client message from a JSON string received over WebSocket.
pub fn decode_client_message(text: &str) -> Result<ClientMessage, CodecError> {
    serde_json::from_str(text).map_err(CodecError::from)
}
