use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetwatch_core::{
    MemoryAlertStore, MemoryTelemetryStore, MemoryVehicleRegistry, ServerSettings,
};
use fleetwatch_server::{BroadcastHub, StreamServer, StreamServerConfig, SubscriptionRegistry};
use fleetwatch_web::{create_router, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,fleetwatch_server=debug,fleetwatch_web=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Fleetwatch server starting...");

    let settings = ServerSettings::from_env();
    let http_addr: SocketAddr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let ws_addr: SocketAddr = SocketAddr::from(([0, 0, 0, 0], settings.ws_port));

    // Stores and the fan-out pair shared by both servers.
    let telemetry = Arc::new(MemoryTelemetryStore::new());
    let vehicles = Arc::new(MemoryVehicleRegistry::new());
    let alerts = Arc::new(MemoryAlertStore::new());
    let registry = Arc::new(SubscriptionRegistry::new());
    let hub = BroadcastHub::new(registry.clone());

    let state = Arc::new(ServerState::new(
        telemetry,
        vehicles,
        alerts,
        hub,
        settings.clone(),
    ));

    // Spawn the WebSocket stream server
    let stream_server = StreamServer::new(StreamServerConfig { bind_addr: ws_addr }, registry);
    let ws_handle = tokio::spawn(async move {
        if let Err(e) = stream_server.run().await {
            tracing::error!("stream server error: {}", e);
        }
    });

    // Spawn the HTTP API server
    let http_handle = tokio::spawn(async move {
        if let Err(e) = start_http_server(http_addr, state).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tracing::info!("Fleetwatch server ready");
    tracing::info!("   HTTP API:  http://localhost:{}/api", settings.port);
    tracing::info!("   Stream:    ws://localhost:{}", settings.ws_port);
    tracing::info!("");
    tracing::info!("Try these commands:");
    tracing::info!(
        "   curl -X POST http://localhost:{}/api/vehicle-data -H 'vehicle-id: VEH001' \
         -H 'content-type: application/json' -d '{{\"lat\":19.43,\"lng\":-99.13,\"speed\":42,\"rpm\":1800,\"fuel\":55}}'",
        settings.port
    );
    tracing::info!("   websocat ws://localhost:{}", settings.ws_port);

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = ws_handle => {
            tracing::warn!("stream server stopped");
        }
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Start the HTTP API server
async fn start_http_server(
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
