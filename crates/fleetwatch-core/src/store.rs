//! Store abstractions for telemetry, vehicle configuration and alerts.
//!
//! The durable stores are external collaborators; the pipeline only sees the
//! traits below. In-memory implementations back the tests and the default
//! server binary. All methods take `&self` so stores can be shared behind an
//! `Arc` across concurrent ingestion requests; each implementation provides
//! its own internal consistency (no cross-store transactions exist).

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::model::{AlertEvent, Reading, VehicleConfig};

/// Append-only storage of readings, keyed by vehicle, queryable by time.
pub trait TelemetryStore: Send + Sync {
    /// Append one reading. Insertion must not require timestamp ordering;
    /// readings may arrive out of order over an unreliable transport.
    fn append(&self, reading: Reading) -> Result<(), CoreError>;

    /// The newest reading by timestamp for a vehicle, if any.
    fn latest(&self, vehicle_id: &str) -> Result<Option<Reading>, CoreError>;

    /// Readings within `[from, to]`, newest first, capped at `limit`.
    /// Open bounds are unbounded on that side.
    fn range(
        &self,
        vehicle_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Reading>, CoreError>;
}

/// Per-vehicle configuration and ownership records.
pub trait VehicleRegistry: Send + Sync {
    /// Current committed configuration for a vehicle. `None` for unknown
    /// vehicles and for shell records created by [`touch_last_seen`]
    /// (those have no settings yet, so the evaluator is skipped).
    ///
    /// [`touch_last_seen`]: VehicleRegistry::touch_last_seen
    fn get(&self, vehicle_id: &str) -> Result<Option<VehicleConfig>, CoreError>;

    /// Record that the vehicle reported in. Upserts: an unknown vehicle id
    /// silently creates a shell record with no configuration (preserved
    /// legacy behavior, flagged in DESIGN.md).
    fn touch_last_seen(&self, vehicle_id: &str) -> Result<(), CoreError>;

    /// Create or replace a vehicle's configuration.
    fn upsert_config(&self, vehicle_id: &str, config: VehicleConfig) -> Result<(), CoreError>;
}

/// Durable storage of alert events.
pub trait AlertStore: Send + Sync {
    /// Append one alert event.
    fn append(&self, event: AlertEvent) -> Result<(), CoreError>;

    /// Most recent alerts for a vehicle, newest first.
    fn recent(
        &self,
        vehicle_id: &str,
        limit: usize,
        unread_only: bool,
    ) -> Result<Vec<AlertEvent>, CoreError>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// In-memory telemetry store, keyed by vehicle id.
#[derive(Debug, Default)]
pub struct MemoryTelemetryStore {
    readings: RwLock<HashMap<String, Vec<Reading>>>,
}

impl MemoryTelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TelemetryStore for MemoryTelemetryStore {
    fn append(&self, reading: Reading) -> Result<(), CoreError> {
        let mut readings = self
            .readings
            .write()
            .map_err(|_| CoreError::storage("telemetry store lock poisoned"))?;
        readings
            .entry(reading.vehicle_id.clone())
            .or_default()
            .push(reading);
        Ok(())
    }

    fn latest(&self, vehicle_id: &str) -> Result<Option<Reading>, CoreError> {
        let readings = self
            .readings
            .read()
            .map_err(|_| CoreError::storage("telemetry store lock poisoned"))?;
        // Readings are stored in arrival order; newest by timestamp wins.
        Ok(readings.get(vehicle_id).and_then(|rs| {
            rs.iter()
                .max_by_key(|r| r.timestamp)
                .cloned()
        }))
    }

    fn range(
        &self,
        vehicle_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Reading>, CoreError> {
        let readings = self
            .readings
            .read()
            .map_err(|_| CoreError::storage("telemetry store lock poisoned"))?;

        let mut matched: Vec<Reading> = readings
            .get(vehicle_id)
            .map(|rs| {
                rs.iter()
                    .filter(|r| from.map_or(true, |f| r.timestamp >= f))
                    .filter(|r| to.map_or(true, |t| r.timestamp <= t))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matched.truncate(limit);
        Ok(matched)
    }
}

#[derive(Debug, Default, Clone)]
struct VehicleEntry {
    config: Option<VehicleConfig>,
    last_seen: Option<DateTime<Utc>>,
}

/// In-memory vehicle registry.
#[derive(Debug, Default)]
pub struct MemoryVehicleRegistry {
    vehicles: RwLock<HashMap<String, VehicleEntry>>,
}

impl MemoryVehicleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last time the vehicle reported in, if ever. Test/diagnostic accessor.
    pub fn last_seen(&self, vehicle_id: &str) -> Option<DateTime<Utc>> {
        self.vehicles
            .read()
            .ok()?
            .get(vehicle_id)
            .and_then(|e| e.last_seen)
    }
}

impl VehicleRegistry for MemoryVehicleRegistry {
    fn get(&self, vehicle_id: &str) -> Result<Option<VehicleConfig>, CoreError> {
        let vehicles = self
            .vehicles
            .read()
            .map_err(|_| CoreError::storage("vehicle registry lock poisoned"))?;
        Ok(vehicles.get(vehicle_id).and_then(|e| e.config.clone()))
    }

    fn touch_last_seen(&self, vehicle_id: &str) -> Result<(), CoreError> {
        let mut vehicles = self
            .vehicles
            .write()
            .map_err(|_| CoreError::storage("vehicle registry lock poisoned"))?;
        let entry = vehicles.entry(vehicle_id.to_string()).or_default();
        entry.last_seen = Some(Utc::now());
        Ok(())
    }

    fn upsert_config(&self, vehicle_id: &str, config: VehicleConfig) -> Result<(), CoreError> {
        let mut vehicles = self
            .vehicles
            .write()
            .map_err(|_| CoreError::storage("vehicle registry lock poisoned"))?;
        vehicles
            .entry(vehicle_id.to_string())
            .or_default()
            .config = Some(config);
        Ok(())
    }
}

/// In-memory alert store, keyed by vehicle id.
#[derive(Debug, Default)]
pub struct MemoryAlertStore {
    alerts: RwLock<HashMap<String, Vec<AlertEvent>>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored alerts across all vehicles. Test accessor.
    pub fn len(&self) -> usize {
        self.alerts
            .read()
            .map(|a| a.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlertStore for MemoryAlertStore {
    fn append(&self, event: AlertEvent) -> Result<(), CoreError> {
        let mut alerts = self
            .alerts
            .write()
            .map_err(|_| CoreError::storage("alert store lock poisoned"))?;
        alerts
            .entry(event.vehicle_id.clone())
            .or_default()
            .push(event);
        Ok(())
    }

    fn recent(
        &self,
        vehicle_id: &str,
        limit: usize,
        unread_only: bool,
    ) -> Result<Vec<AlertEvent>, CoreError> {
        let alerts = self
            .alerts
            .read()
            .map_err(|_| CoreError::storage("alert store lock poisoned"))?;

        let mut matched: Vec<AlertEvent> = alerts
            .get(vehicle_id)
            .map(|evs| {
                evs.iter()
                    .filter(|e| !unread_only || !e.is_read)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matched.truncate(limit);
        Ok(matched)
    }
}
