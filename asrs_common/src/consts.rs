//! System-wide constants for the ASRS simulator.
//!
//! Single source of truth for crane geometry, motion limits and default
//! timings. Imported by both crates.

use static_assertions::const_assert;

/// Canonical service name (used for logging and the default config).
pub const SERVICE_NAME: &str = "asrs-sim";

/// Default number of simulated lines.
pub const DEFAULT_LINE_COUNT: u8 = 8;

/// Maximum number of lines (namespace ids are two decimal digits).
pub const MAX_LINES: usize = 99;

/// Lowest crane level.
pub const LEVEL_MIN: i64 = 1;

/// Highest crane level reachable by position.
pub const LEVEL_MAX: i64 = 20;

/// Highest level accepted as a sweep bound.
pub const SWEEP_LEVEL_MAX: i64 = 19;

/// PositionY of level 1.
pub const LEVEL_BASE_Y: i64 = 500;

/// Vertical distance between two adjacent levels.
pub const LEVEL_PITCH_Y: i64 = 1000;

/// Randomized start position range, X axis.
pub const START_X_MIN: i64 = 5000;
/// Randomized start position range, X axis (inclusive).
pub const START_X_MAX: i64 = 28000;
/// Randomized start position range, Y axis.
pub const START_Y_MIN: i64 = 3000;
/// Randomized start position range, Y axis (inclusive).
pub const START_Y_MAX: i64 = 6000;

/// Default X step range per macro-tick.
pub const X_STEP_MIN: i64 = 900;
/// Default X step range per macro-tick (inclusive).
pub const X_STEP_MAX: i64 = 1100;
/// Default Y step range per macro-tick.
pub const Y_STEP_MIN: i64 = 230;
/// Default Y step range per macro-tick (inclusive).
pub const Y_STEP_MAX: i64 = 270;

/// Default macro-tick (one state machine decision cycle) in milliseconds.
pub const MACRO_TICK_MS: u64 = 500;

/// Default clock sub-step in milliseconds. Bounds shutdown latency.
pub const SUB_STEP_MS: u64 = 100;

/// Default sweep preparation delay (status 78 hold) in milliseconds.
pub const PREP_DELAY_MS: u64 = 1000;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/asrs/asrs.toml";

const_assert!(LEVEL_MIN <= SWEEP_LEVEL_MAX && SWEEP_LEVEL_MAX < LEVEL_MAX);
const_assert!(SUB_STEP_MS > 0 && SUB_STEP_MS <= MACRO_TICK_MS);
const_assert!(X_STEP_MIN <= X_STEP_MAX && Y_STEP_MIN <= Y_STEP_MAX);
// Every level's Y must fit the u16 Distance_Y register.
const_assert!(LEVEL_BASE_Y + (LEVEL_MAX - 1) * LEVEL_PITCH_Y <= u16::MAX as i64);
const_assert!(START_Y_MAX <= u16::MAX as i64);
