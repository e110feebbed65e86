//! # fleetwatch-web
//!
//! HTTP surface of the fleetwatch server.
//!
//! This crate provides:
//! - The telemetry ingestion endpoint (`POST /api/vehicle-data`) driving the
//!   persist → evaluate → broadcast pipeline
//! - Read-only query endpoints for current position, history, alerts and
//!   simple per-vehicle statistics
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fleetwatch_web::{create_router, ServerState};
//!
//! let state = ServerState::new(telemetry, vehicles, alerts, hub, settings);
//! let app = create_router(Arc::new(state));
//!
//! let listener = TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod ingest;
pub mod routes;

// Re-exports
pub use routes::create_router;

use std::sync::Arc;

use fleetwatch_core::{AlertStore, ServerSettings, TelemetryStore, VehicleRegistry};
use fleetwatch_server::BroadcastHub;

/// Shared server state for all route handlers.
pub struct ServerState {
    pub telemetry: Arc<dyn TelemetryStore>,
    pub vehicles: Arc<dyn VehicleRegistry>,
    pub alerts: Arc<dyn AlertStore>,
    pub hub: BroadcastHub,
    pub settings: ServerSettings,
}

impl ServerState {
    pub fn new(
        telemetry: Arc<dyn TelemetryStore>,
        vehicles: Arc<dyn VehicleRegistry>,
        alerts: Arc<dyn AlertStore>,
        hub: BroadcastHub,
        settings: ServerSettings,
    ) -> Self {
        Self {
            telemetry,
            vehicles,
            alerts,
            hub,
            settings,
        }
    }
}

/// Type alias for shared state in Axum handlers.
pub type AppState = Arc<ServerState>;
