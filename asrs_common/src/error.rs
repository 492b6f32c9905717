//! Top-level simulator error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::register::RegisterError;

/// Errors surfaced by the supervisor and the binary.
///
/// Per-line register faults are normally contained inside the owning line
/// and only reach this type when returned from a line's join handle.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Register access fault.
    #[error("Register access fault: {0}")]
    Register(#[from] RegisterError),

    /// Register endpoint failed to bind or serve.
    #[error("Endpoint error: {0}")]
    Endpoint(#[source] std::io::Error),

    /// A line or endpoint thread could not be spawned.
    #[error("Failed to spawn {name}: {source}")]
    Spawn {
        /// Thread name
        name: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}
