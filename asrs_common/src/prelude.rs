//! Prelude module for common re-exports.
//!
//! ```rust
//! use asrs_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SimulatorConfig};

// ─── Registers ──────────────────────────────────────────────────────
pub use crate::register::{LineId, Register, RegisterError, RegisterKind, parse_node_id};

// ─── Codes ──────────────────────────────────────────────────────────
pub use crate::codes::{CommandCode, StatusCode};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::SimError;
