//! # fleetwatch-core
//!
//! Core fleetwatch data model and store implementation.
//!
//! This crate provides:
//! - Data model types (Reading, VehicleConfig, AlertEvent, etc.)
//! - Store traits for telemetry, vehicle configuration and alerts,
//!   with in-memory reference implementations
//! - The pure alert evaluator (without I/O)
//! - Server settings
//!
//! This crate is intentionally runtime-agnostic and contains no async code.

pub mod error;
pub mod evaluator;
pub mod model;
pub mod settings;
pub mod store;

pub use error::CoreError;
pub use model::*;
pub use settings::ServerSettings;
pub use store::{
    AlertStore, MemoryAlertStore, MemoryTelemetryStore, MemoryVehicleRegistry, TelemetryStore,
    VehicleRegistry,
};
