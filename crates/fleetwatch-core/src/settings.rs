//! Server settings.
//!
//! Settings are read from the environment at startup; anything absent or
//! unparseable falls back to its default so a bare `fleetwatch-server`
//! invocation always starts.

use serde::{Deserialize, Serialize};

/// Runtime settings for the server binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// HTTP API port.
    pub port: u16,

    /// WebSocket stream port.
    pub ws_port: u16,

    /// Reject readings with missing or out-of-range coordinates.
    ///
    /// Off by default: the legacy ingestion endpoint accepted anything, and
    /// the default policy preserves that observable behavior.
    pub strict_coordinates: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 3000,
            ws_port: 8080,
            strict_coordinates: false,
        }
    }
}

impl ServerSettings {
    /// Build settings from `FLEETWATCH_PORT`, `FLEETWATCH_WS_PORT` and
    /// `FLEETWATCH_STRICT_COORDINATES`, defaulting field-by-field.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("FLEETWATCH_PORT").unwrap_or(defaults.port),
            ws_port: env_parse("FLEETWATCH_WS_PORT").unwrap_or(defaults.ws_port),
            strict_coordinates: env_parse("FLEETWATCH_STRICT_COORDINATES")
                .unwrap_or(defaults.strict_coordinates),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}
