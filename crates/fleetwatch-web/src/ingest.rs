//! The ingestion pipeline.
//!
//! One call per inbound reading: normalize, persist, evaluate, persist
//! alerts, broadcast. Ingestion success is defined solely by the reading
//! persist; everything after it is best-effort and isolated per step.

use tracing::warn;

use fleetwatch_core::evaluator::evaluate;
use fleetwatch_core::{
    AlertStore, CoreError, RawReading, Reading, TelemetryStore, VehicleRegistry,
};
use fleetwatch_protocol::ServerMessage;

use crate::ServerState;

/// Drive one raw payload through the full pipeline.
///
/// Returns the normalized reading on success. Fails only on strict-mode
/// validation or on the primary reading persist; no side effects occur
/// before either failure.
pub fn ingest_reading(
    state: &ServerState,
    vehicle_id: &str,
    raw: RawReading,
) -> Result<Reading, CoreError> {
    if state.settings.strict_coordinates {
        raw.validate_coordinates()?;
    }
    let reading = Reading::from_raw(vehicle_id, raw);

    // Persist the reading. Fatal to the request.
    state.telemetry.append(reading.clone())?;

    // Best-effort last-seen touch; may create a shell registry record.
    if let Err(e) = state.vehicles.touch_last_seen(vehicle_id) {
        warn!("failed to update last seen for {}: {}", vehicle_id, e);
    }

    // Evaluate alerts when the vehicle has committed settings. Persistence
    // failures are isolated per event: a failed event is neither broadcast
    // nor allowed to block its siblings.
    let mut persisted_alerts = Vec::new();
    match state.vehicles.get(vehicle_id) {
        Ok(Some(config)) => {
            for event in evaluate(&reading, &config) {
                match state.alerts.append(event.clone()) {
                    Ok(()) => persisted_alerts.push(event),
                    Err(e) => {
                        warn!(
                            "failed to persist {:?} alert for {}: {}",
                            event.kind, vehicle_id, e
                        );
                    }
                }
            }
        }
        // Unknown vehicle or shell record: skip evaluation, not an error.
        Ok(None) => {}
        Err(e) => {
            warn!("failed to load config for {}: {}", vehicle_id, e);
        }
    }

    // Broadcast the reading, then each persisted alert, in order.
    state
        .hub
        .publish(vehicle_id, ServerMessage::VehicleUpdate(reading.clone()));
    for event in persisted_alerts {
        state.hub.publish(vehicle_id, ServerMessage::Alert(event));
    }

    Ok(reading)
}
