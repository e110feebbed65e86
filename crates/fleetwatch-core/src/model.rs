//! Fleetwatch data model types.
//!
//! These types represent the core structures flowing through the pipeline:
//! - Raw device payloads and normalized readings
//! - Per-vehicle configuration (limits, geofence, alert toggles)
//! - Alert events produced by the evaluator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Vehicle identifier used when a device omits the `vehicle-id` header.
///
/// Preserved legacy behavior: unidentified devices all land on this id.
pub const DEFAULT_VEHICLE_ID: &str = "default-vehicle";

/// A raw telemetry payload as posted by a device.
///
/// Field names match the device wire format (`lat`, `lng`, `temp`, `fuel`,
/// ...). Every field is optional; normalization fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReading {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Speed over ground in km/h.
    pub speed: Option<f64>,
    pub rpm: Option<u32>,
    /// Engine temperature in °C.
    pub temp: Option<f64>,
    /// Fuel level in percent (0-100).
    pub fuel: Option<f64>,
    /// Battery voltage in V.
    pub battery: Option<f64>,
    pub engine_load: Option<f64>,
    pub throttle: Option<f64>,
    /// Heading in degrees (0-360).
    pub heading: Option<f64>,
    pub altitude: Option<f64>,
    pub satellites: Option<u32>,
    /// Horizontal dilution of precision.
    pub hdop: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawReading {
    /// Check latitude/longitude presence and bounds.
    ///
    /// Only called when strict coordinate validation is enabled; the default
    /// policy accepts anything, matching the legacy ingestion behavior.
    pub fn validate_coordinates(&self) -> Result<(), CoreError> {
        let lat = self
            .lat
            .ok_or_else(|| CoreError::Validation("missing latitude".into()))?;
        let lng = self
            .lng
            .ok_or_else(|| CoreError::Validation("missing longitude".into()))?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::Validation(format!(
                "latitude out of range: {lat}"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoreError::Validation(format!(
                "longitude out of range: {lng}"
            )));
        }
        Ok(())
    }
}

/// One normalized telemetry sample. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Speed over ground in km/h.
    pub speed: f64,
    pub rpm: u32,
    pub temperature: f64,
    pub fuel_level: f64,
    pub battery_voltage: f64,
    pub engine_load: f64,
    pub throttle_position: f64,
    pub heading: f64,
    pub altitude: f64,
    pub satellites: u32,
    pub hdop: f64,
    pub timestamp: DateTime<Utc>,
    /// Derived: true whenever rpm > 0.
    pub is_engine_on: bool,
}

impl Reading {
    /// Normalize a raw payload into a reading.
    ///
    /// Missing numeric fields default to zero, a missing timestamp defaults
    /// to the ingestion time, and `is_engine_on` is derived from rpm.
    pub fn from_raw(vehicle_id: impl Into<String>, raw: RawReading) -> Self {
        let rpm = raw.rpm.unwrap_or(0);
        Self {
            vehicle_id: vehicle_id.into(),
            latitude: raw.lat.unwrap_or(0.0),
            longitude: raw.lng.unwrap_or(0.0),
            speed: raw.speed.unwrap_or(0.0),
            rpm,
            temperature: raw.temp.unwrap_or(0.0),
            fuel_level: raw.fuel.unwrap_or(0.0),
            battery_voltage: raw.battery.unwrap_or(0.0),
            engine_load: raw.engine_load.unwrap_or(0.0),
            throttle_position: raw.throttle.unwrap_or(0.0),
            heading: raw.heading.unwrap_or(0.0),
            altitude: raw.altitude.unwrap_or(0.0),
            satellites: raw.satellites.unwrap_or(0),
            hdop: raw.hdop.unwrap_or(0.0),
            timestamp: raw.timestamp.unwrap_or_else(Utc::now),
            is_engine_on: rpm > 0,
        }
    }
}

/// A geographic point in WGS84 coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Geofence settings for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeofenceConfig {
    pub enabled: bool,
    pub center: GeoPoint,
    /// Radius in meters.
    pub radius: f64,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            center: GeoPoint::default(),
            radius: 1000.0,
        }
    }
}

/// Per-rule alert toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertToggles {
    pub speed_exceeded: bool,
    pub engine_on_without_movement: bool,
    pub geofence_exit: bool,
}

impl Default for AlertToggles {
    fn default() -> Self {
        Self {
            speed_exceeded: true,
            engine_on_without_movement: true,
            geofence_exit: false,
        }
    }
}

/// Mutable per-vehicle settings read by the evaluator on every reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleConfig {
    /// Speed limit in km/h.
    pub speed_limit: f64,
    pub geofence: GeofenceConfig,
    pub alerts: AlertToggles,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            speed_limit: 120.0,
            geofence: GeofenceConfig::default(),
            alerts: AlertToggles::default(),
        }
    }
}

/// Alert categories, in the device/browser wire spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    SpeedExceeded,
    EngineOnNoMovement,
    GeofenceExit,
    LowFuel,
    MaintenanceDue,
}

/// Alert severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// One detected alert condition, tied to a vehicle and a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub id: Uuid,
    pub vehicle_id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub severity: Severity,
    /// Kind-specific payload, e.g. `{"speed": 130.0, "limit": 100.0}`.
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    pub is_resolved: bool,
}

impl AlertEvent {
    /// Create a new unread, unresolved alert stamped with the current time.
    pub fn new(
        vehicle_id: impl Into<String>,
        kind: AlertKind,
        message: impl Into<String>,
        severity: Severity,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id: vehicle_id.into(),
            kind,
            message: message.into(),
            severity,
            data,
            timestamp: Utc::now(),
            is_read: false,
            is_resolved: false,
        }
    }
}
