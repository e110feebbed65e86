//! HTTP route handlers.
//!
//! Route groups:
//! - `POST /api/vehicle-data` - device ingestion (vehicle id from the
//!   `vehicle-id` header, sentinel default when absent)
//! - `GET /api/vehicle/:vehicleId/...` - current reading, history, alerts
//!   and simple statistics
//! - `GET /` - service banner

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use fleetwatch_core::{
    AlertEvent, AlertStore, CoreError, RawReading, Reading, TelemetryStore, DEFAULT_VEHICLE_ID,
};
use fleetwatch_protocol::IngestAck;

use crate::{ingest, AppState};

/// Build the HTTP router with all API routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner_handler))
        .route("/api/vehicle-data", post(ingest_handler))
        .route("/api/vehicle/:vehicle_id/current", get(current_handler))
        .route("/api/vehicle/:vehicle_id/history", get(history_handler))
        .route("/api/vehicle/:vehicle_id/alerts", get(alerts_handler))
        .route("/api/vehicle/:vehicle_id/stats", get(stats_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Service banner with the endpoint map.
async fn banner_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Fleetwatch GPS + OBD-II monitoring",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "data": "/api/vehicle-data",
            "vehicles": "/api/vehicle/:vehicleId",
        }
    }))
}

/// Device ingestion endpoint.
async fn ingest_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(raw): Json<RawReading>,
) -> (StatusCode, Json<IngestAck>) {
    let vehicle_id = headers
        .get("vehicle-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_VEHICLE_ID)
        .to_string();

    match ingest::ingest_reading(&state, &vehicle_id, raw) {
        Ok(_) => (StatusCode::OK, Json(IngestAck::ok())),
        Err(CoreError::Validation(msg)) => {
            (StatusCode::BAD_REQUEST, Json(IngestAck::error(msg)))
        }
        Err(e) => {
            error!("ingestion failed for {}: {}", vehicle_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(IngestAck::error(e.to_string())),
            )
        }
    }
}

/// Latest reading for a vehicle.
async fn current_handler(
    Path(vehicle_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Reading>, StatusCode> {
    match state.telemetry.latest(&vehicle_id) {
        Ok(Some(reading)) => Ok(Json(reading)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("current lookup failed for {}: {}", vehicle_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_history_limit")]
    limit: usize,
}

fn default_history_limit() -> usize {
    100
}

/// Reading history for a vehicle, newest first.
async fn history_handler(
    Path(vehicle_id): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Reading>>, StatusCode> {
    state
        .telemetry
        .range(&vehicle_id, query.start_date, query.end_date, query.limit)
        .map(Json)
        .map_err(|e| {
            error!("history lookup failed for {}: {}", vehicle_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertsQuery {
    #[serde(default = "default_alerts_limit")]
    limit: usize,
    #[serde(default)]
    unread_only: bool,
}

fn default_alerts_limit() -> usize {
    50
}

/// Recent alerts for a vehicle, newest first.
async fn alerts_handler(
    Path(vehicle_id): Path<String>,
    Query(query): Query<AlertsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<AlertEvent>>, StatusCode> {
    state
        .alerts
        .recent(&vehicle_id, query.limit, query.unread_only)
        .map(Json)
        .map_err(|e| {
            error!("alerts lookup failed for {}: {}", vehicle_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    #[serde(default = "default_stats_days")]
    days: i64,
}

fn default_stats_days() -> i64 {
    7
}

/// Simple aggregation over a vehicle's recent readings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStats {
    pub samples: usize,
    pub avg_speed: f64,
    pub max_speed: f64,
    pub avg_fuel_level: f64,
    pub avg_temperature: f64,
    pub engine_on_samples: usize,
}

impl VehicleStats {
    fn from_readings(readings: &[Reading]) -> Self {
        let samples = readings.len();
        if samples == 0 {
            return Self {
                samples: 0,
                avg_speed: 0.0,
                max_speed: 0.0,
                avg_fuel_level: 0.0,
                avg_temperature: 0.0,
                engine_on_samples: 0,
            };
        }

        let n = samples as f64;
        Self {
            samples,
            avg_speed: readings.iter().map(|r| r.speed).sum::<f64>() / n,
            max_speed: readings.iter().map(|r| r.speed).fold(0.0, f64::max),
            avg_fuel_level: readings.iter().map(|r| r.fuel_level).sum::<f64>() / n,
            avg_temperature: readings.iter().map(|r| r.temperature).sum::<f64>() / n,
            engine_on_samples: readings.iter().filter(|r| r.is_engine_on).count(),
        }
    }
}

/// Aggregated statistics over the last `days` days.
async fn stats_handler(
    Path(vehicle_id): Path<String>,
    Query(query): Query<StatsQuery>,
    State(state): State<AppState>,
) -> Result<Json<VehicleStats>, StatusCode> {
    let from = Utc::now() - Duration::days(query.days.max(0));
    let readings = state
        .telemetry
        .range(&vehicle_id, Some(from), None, usize::MAX)
        .map_err(|e| {
            error!("stats lookup failed for {}: {}", vehicle_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(VehicleStats::from_readings(&readings)))
}
