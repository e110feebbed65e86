//! Alert rule evaluation.
//!
//! The evaluator is a pure function from (reading, config) to a sequence of
//! alert events. It performs no I/O and holds no state; rules run in a fixed
//! order and every rule sees the already-normalized reading, so absent
//! numeric fields are zeros and no rule can panic.

use serde_json::json;

use crate::model::{AlertEvent, AlertKind, GeoPoint, Reading, Severity, VehicleConfig};

/// Fuel percentage below which a low_fuel alert fires.
///
/// Not gated on a config toggle: the rule is always evaluated.
pub const LOW_FUEL_THRESHOLD: f64 = 20.0;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Evaluate all alert rules against one reading.
///
/// Rule order is fixed: speed_exceeded, low_fuel, geofence_exit. Calling
/// twice with the same input yields the same kinds, messages, severities and
/// payloads in the same order (event ids and creation timestamps are stamped
/// fresh per call).
///
/// engine_on_no_movement is declared in [`crate::model::AlertToggles`] but
/// has no rule here: detecting it needs displacement over a sustained window
/// of readings, which this single-reading contract cannot express.
pub fn evaluate(reading: &Reading, config: &VehicleConfig) -> Vec<AlertEvent> {
    let mut events = Vec::new();

    if config.alerts.speed_exceeded && reading.speed > config.speed_limit {
        events.push(AlertEvent::new(
            &reading.vehicle_id,
            AlertKind::SpeedExceeded,
            format!(
                "Speed limit exceeded: {:.0} km/h (limit: {:.0} km/h)",
                reading.speed, config.speed_limit
            ),
            Severity::High,
            json!({"speed": reading.speed, "limit": config.speed_limit}),
        ));
    }

    if reading.fuel_level < LOW_FUEL_THRESHOLD {
        events.push(AlertEvent::new(
            &reading.vehicle_id,
            AlertKind::LowFuel,
            format!("Low fuel: {:.0}%", reading.fuel_level),
            Severity::Medium,
            json!({"fuelLevel": reading.fuel_level}),
        ));
    }

    if config.geofence.enabled && config.alerts.geofence_exit {
        let position = GeoPoint {
            lat: reading.latitude,
            lng: reading.longitude,
        };
        let distance = haversine_distance_m(config.geofence.center, position);
        if distance > config.geofence.radius {
            events.push(AlertEvent::new(
                &reading.vehicle_id,
                AlertKind::GeofenceExit,
                format!(
                    "Geofence exit: {:.0} m from center (radius: {:.0} m)",
                    distance, config.geofence.radius
                ),
                Severity::High,
                json!({"distance": distance, "radius": config.geofence.radius}),
            ));
        }
    }

    events
}

/// Great-circle distance between two points in meters.
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawReading;
    use pretty_assertions::assert_eq;

    fn reading(raw: RawReading) -> Reading {
        Reading::from_raw("V1", raw)
    }

    #[test]
    fn test_speed_exceeded_alert() {
        // Scenario A: 130 km/h against a 100 km/h limit.
        let reading = reading(RawReading {
            speed: Some(130.0),
            rpm: Some(1500),
            fuel: Some(50.0),
            ..Default::default()
        });
        let config = VehicleConfig {
            speed_limit: 100.0,
            ..Default::default()
        };

        let events = evaluate(&reading, &config);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::SpeedExceeded);
        assert_eq!(events[0].severity, Severity::High);
        assert!(events[0].message.contains("130"));
        assert!(events[0].message.contains("100"));
        assert_eq!(events[0].data["speed"], 130.0);
        assert_eq!(events[0].data["limit"], 100.0);
    }

    #[test]
    fn test_speed_exceeded_respects_toggle() {
        let reading = reading(RawReading {
            speed: Some(130.0),
            fuel: Some(50.0),
            ..Default::default()
        });
        let mut config = VehicleConfig {
            speed_limit: 100.0,
            ..Default::default()
        };
        config.alerts.speed_exceeded = false;

        assert!(evaluate(&reading, &config).is_empty());
    }

    #[test]
    fn test_speed_at_limit_does_not_alert() {
        let reading = reading(RawReading {
            speed: Some(100.0),
            fuel: Some(50.0),
            ..Default::default()
        });
        let config = VehicleConfig {
            speed_limit: 100.0,
            ..Default::default()
        };

        assert!(evaluate(&reading, &config).is_empty());
    }

    #[test]
    fn test_low_fuel_alert() {
        // Scenario B: fuel at 15% within the speed limit.
        let reading = reading(RawReading {
            speed: Some(40.0),
            rpm: Some(1200),
            fuel: Some(15.0),
            ..Default::default()
        });
        let config = VehicleConfig {
            speed_limit: 120.0,
            ..Default::default()
        };

        let events = evaluate(&reading, &config);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::LowFuel);
        assert_eq!(events[0].severity, Severity::Medium);
        assert!(events[0].message.contains("15"));
        assert_eq!(events[0].data["fuelLevel"], 15.0);
    }

    #[test]
    fn test_low_fuel_ignores_toggles() {
        // low_fuel has no config gate: it fires with every toggle off.
        let reading = reading(RawReading {
            fuel: Some(10.0),
            ..Default::default()
        });
        let config = VehicleConfig {
            alerts: crate::model::AlertToggles {
                speed_exceeded: false,
                engine_on_without_movement: false,
                geofence_exit: false,
            },
            ..Default::default()
        };

        let events = evaluate(&reading, &config);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::LowFuel);
    }

    #[test]
    fn test_engine_off_produces_no_engine_alert() {
        // Scenario C: rpm 0, engine off, no engine-related rule fires.
        let reading = reading(RawReading {
            rpm: Some(0),
            fuel: Some(80.0),
            ..Default::default()
        });
        assert!(!reading.is_engine_on);

        let events = evaluate(&reading, &VehicleConfig::default());
        assert!(events.is_empty());
    }

    #[test]
    fn test_rule_order_speed_before_fuel() {
        let reading = reading(RawReading {
            speed: Some(150.0),
            fuel: Some(5.0),
            ..Default::default()
        });
        let config = VehicleConfig {
            speed_limit: 100.0,
            ..Default::default()
        };

        let events = evaluate(&reading, &config);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, AlertKind::SpeedExceeded);
        assert_eq!(events[1].kind, AlertKind::LowFuel);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let reading = reading(RawReading {
            speed: Some(150.0),
            fuel: Some(5.0),
            ..Default::default()
        });
        let config = VehicleConfig {
            speed_limit: 100.0,
            ..Default::default()
        };

        let first = evaluate(&reading, &config);
        let second = evaluate(&reading, &config);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.message, b.message);
            assert_eq!(a.severity, b.severity);
            assert_eq!(a.data, b.data);
        }
    }

    #[test]
    fn test_geofence_exit_alert() {
        // Center in Mexico City, reading ~15 km away, radius 2 km.
        let reading = reading(RawReading {
            lat: Some(19.30),
            lng: Some(-99.1332),
            fuel: Some(80.0),
            ..Default::default()
        });
        let mut config = VehicleConfig::default();
        config.geofence.enabled = true;
        config.geofence.center = GeoPoint {
            lat: 19.4326,
            lng: -99.1332,
        };
        config.geofence.radius = 2000.0;
        config.alerts.geofence_exit = true;

        let events = evaluate(&reading, &config);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::GeofenceExit);
        assert_eq!(events[0].severity, Severity::High);
        assert_eq!(events[0].data["radius"], 2000.0);
    }

    #[test]
    fn test_geofence_inside_radius_no_alert() {
        let reading = reading(RawReading {
            lat: Some(19.4330),
            lng: Some(-99.1330),
            fuel: Some(80.0),
            ..Default::default()
        });
        let mut config = VehicleConfig::default();
        config.geofence.enabled = true;
        config.geofence.center = GeoPoint {
            lat: 19.4326,
            lng: -99.1332,
        };
        config.geofence.radius = 2000.0;
        config.alerts.geofence_exit = true;

        assert!(evaluate(&reading, &config).is_empty());
    }

    #[test]
    fn test_geofence_disabled_never_alerts() {
        // Way outside the radius, but the geofence itself is disabled.
        let reading = reading(RawReading {
            lat: Some(40.0),
            lng: Some(-3.0),
            fuel: Some(80.0),
            ..Default::default()
        });
        let mut config = VehicleConfig::default();
        config.geofence.center = GeoPoint {
            lat: 19.4326,
            lng: -99.1332,
        };
        config.alerts.geofence_exit = true;

        assert!(evaluate(&reading, &config).is_empty());
    }

    #[test]
    fn test_empty_reading_never_panics() {
        // All-defaults reading (everything zero) against all-defaults config.
        // fuel_level 0 < 20 so exactly the low_fuel rule fires.
        let reading = reading(RawReading::default());
        let events = evaluate(&reading, &VehicleConfig::default());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::LowFuel);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Mexico City Zocalo to Angel de la Independencia, roughly 4.2 km.
        let zocalo = GeoPoint {
            lat: 19.4326,
            lng: -99.1332,
        };
        let angel = GeoPoint {
            lat: 19.4270,
            lng: -99.1677,
        };

        let d = haversine_distance_m(zocalo, angel);
        assert!((3500.0..4500.0).contains(&d), "distance was {d}");
    }

    #[test]
    fn test_haversine_zero_distance() {
        let p = GeoPoint {
            lat: 19.4326,
            lng: -99.1332,
        };
        assert_eq!(haversine_distance_m(p, p), 0.0);
    }
}
