//! Error taxonomy shared across the fleetwatch crates.

use thiserror::Error;

/// Errors produced by the core pipeline components.
///
/// Per-connection delivery failures are deliberately absent: they are owned
/// by the broadcast hub and never cross a crate boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or out-of-range input, rejected before any side effect.
    #[error("invalid reading: {0}")]
    Validation(String),

    /// A store operation failed. Fatal only to the operation that issued it.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Unknown vehicle, reading or alert.
    #[error("not found: {0}")]
    NotFound(String),
}

impl CoreError {
    /// Shorthand for a storage failure with a formatted message.
    pub fn storage(msg: impl Into<String>) -> Self {
        CoreError::Storage(msg.into())
    }
}
