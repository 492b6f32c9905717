//! # ASRS Line Simulator
//!
//! Simulates a row of automated storage and retrieval crane lines. Each line
//! exposes a small set of PLC-style registers; a client writes commands and
//! level ranges and polls status and position while the line runs its state
//! machine.
//!
//! # Module Structure
//!
//! - [`clock`] - Stop signal and sub-stepped cancellable waits
//! - [`registers`] - Per-line atomic register namespaces
//! - [`line`] - State machine, geometry, motion and the line runner
//! - [`supervisor`] - Line threads, endpoint and shutdown
//! - [`endpoint`] - Optional TCP text protocol over the register space
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Supervisor                          │
//! │   StopSignal ─────┬──────────────┬──────────────┐            │
//! │                   ▼              ▼              ▼            │
//! │            ┌────────────┐ ┌────────────┐ ┌────────────┐      │
//! │            │ LINE01-MP  │ │ LINE02-MP  │ │  Endpoint  │      │
//! │            │  Machine   │ │  Machine   │ │ GET / SET  │      │
//! │            └─────┬──────┘ └─────┬──────┘ └─────┬──────┘      │
//! │                  ▼              ▼              ▼            │
//! │            ┌──────────────────────────────────────────┐      │
//! │            │        RegisterSpace (atomic cells)       │      │
//! │            └──────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod clock;
pub mod endpoint;
pub mod line;
pub mod registers;
pub mod supervisor;

pub use crate::clock::{SimulationClock, StopSignal};
pub use crate::line::{LineSimulator, Machine, Mode, Phase};
pub use crate::registers::{LineRegisters, LineSnapshot, RegisterSpace};
pub use crate::supervisor::{ShutdownReport, Supervisor};
