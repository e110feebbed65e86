//! Fleetwatch WebSocket stream server.
//!
//! This module provides the WebSocket endpoint viewers connect to:
//! - Connection accept and registration
//! - Subscribe message handling (one vehicle per connection)
//! - Outbound delivery of readings and alerts queued by the hub

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};

use fleetwatch_protocol::{decode_client_message, encode_server_message, ClientMessage, ServerMessage};

use crate::registry::{ConnectionId, SubscriptionRegistry, OUTBOUND_QUEUE_DEPTH};

/// Configuration for the stream server.
#[derive(Debug, Clone)]
pub struct StreamServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
}

impl Default for StreamServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
        }
    }
}

/// The WebSocket server fanning readings and alerts out to viewers.
pub struct StreamServer {
    config: StreamServerConfig,
    registry: Arc<SubscriptionRegistry>,
}

impl StreamServer {
    /// Create a new stream server sharing the given subscription registry
    /// (the same registry the broadcast hub publishes through).
    pub fn new(config: StreamServerConfig, registry: Arc<SubscriptionRegistry>) -> Self {
        Self { config, registry }
    }

    /// Run the server, listening for WebSocket connections.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("stream server listening on {}", self.config.bind_addr);

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let registry = self.registry.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, registry).await {
                            error!("connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    registry: Arc<SubscriptionRegistry>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;

    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
    let conn = registry.register(outbound_tx);
    info!("client {} connected as connection {}", addr, conn);

    let result = connection_loop(ws_stream, addr, conn, &registry, outbound_rx).await;

    // Connection closed => unsubscribe and forget the outbound queue.
    registry.deregister(conn);
    info!("client {} disconnected", addr);
    result
}

async fn connection_loop(
    ws_stream: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    conn: ConnectionId,
    registry: &SubscriptionRegistry,
    mut outbound_rx: mpsc::Receiver<ServerMessage>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        tokio::select! {
            // Messages from the client: subscribe frames and pings.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_message(&text, addr, conn, registry);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        ws_tx.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("client {} closed connection", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("websocket error from {}: {}", addr, e);
                        break;
                    }
                    None => break,
                    _ => {} // Ignore other message types
                }
            }

            // Events queued for this connection by the broadcast hub.
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(message) => {
                        let text = encode_server_message(&message)?;
                        if let Err(e) = ws_tx.send(Message::Text(text)).await {
                            warn!("failed to send to {}: {}", addr, e);
                            break;
                        }
                    }
                    // Sender dropped: the hub deregistered this connection.
                    None => break,
                }
            }
        }
    }

    Ok(())
}

/// Handle a text frame received from a client.
///
/// Malformed frames are dropped silently (logged); the connection stays open.
fn handle_client_message(
    text: &str,
    addr: SocketAddr,
    conn: ConnectionId,
    registry: &SubscriptionRegistry,
) {
    match decode_client_message(text) {
        Ok(ClientMessage::Subscribe { vehicle_id }) => {
            debug!("client {} subscribed to vehicle {}", addr, vehicle_id);
            registry.subscribe(conn, &vehicle_id);
        }
        Err(e) => {
            debug!("dropping malformed message from {}: {}", addr, e);
        }
    }
}
