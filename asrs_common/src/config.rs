//! Configuration loading traits and types.
//!
//! The simulator reads a single TOML file. Every section is optional and
//! falls back to the defaults in [`crate::consts`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use asrs_common::config::{ConfigLoader, ConfigError, SimulatorConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = SimulatorConfig::load(Path::new("asrs.toml"))?;
//!     config.validate()?;
//!     println!("Simulating {} lines", config.simulation.line_count);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::consts::{
    DEFAULT_LINE_COUNT, MACRO_TICK_MS, MAX_LINES, PREP_DELAY_MS, SERVICE_NAME, SUB_STEP_MS,
    X_STEP_MAX, X_STEP_MIN, Y_STEP_MAX, Y_STEP_MIN,
};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, per-step motion traces.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common fields every service carries.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "asrs-sim-bench"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    SERVICE_NAME.to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Line count and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of lines to simulate.
    pub line_count: u8,
    /// Number of the first line (`LINE{first_line:02}-MP`).
    pub first_line: u8,
    /// State machine decision cycle.
    pub macro_tick_ms: u64,
    /// Cancellable wait granularity.
    pub sub_step_ms: u64,
    /// Status 78 hold before a sweep starts.
    pub prep_delay_ms: u64,
    /// Stop at X_MIN after preparation, clearing Command, until the client
    /// writes Command=38 again.
    pub confirm_after_prep: bool,
    /// Deterministic RNG seed; line N uses `seed + N`.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            line_count: DEFAULT_LINE_COUNT,
            first_line: 1,
            macro_tick_ms: MACRO_TICK_MS,
            sub_step_ms: SUB_STEP_MS,
            prep_delay_ms: PREP_DELAY_MS,
            confirm_after_prep: false,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Macro-tick as a `Duration`.
    pub fn macro_tick(&self) -> Duration {
        Duration::from_millis(self.macro_tick_ms)
    }

    /// Sub-step as a `Duration`.
    pub fn sub_step(&self) -> Duration {
        Duration::from_millis(self.sub_step_ms)
    }

    /// Prep delay as a `Duration`.
    pub fn prep_delay(&self) -> Duration {
        Duration::from_millis(self.prep_delay_ms)
    }
}

/// Randomized step ranges (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Smallest X step per tick.
    pub x_step_min: i64,
    /// Largest X step per tick.
    pub x_step_max: i64,
    /// Smallest Y step per tick.
    pub y_step_min: i64,
    /// Largest Y step per tick.
    pub y_step_max: i64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            x_step_min: X_STEP_MIN,
            x_step_max: X_STEP_MAX,
            y_step_min: Y_STEP_MIN,
            y_step_max: Y_STEP_MAX,
        }
    }
}

/// Optional TCP register endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Listen address; the endpoint is disabled when absent.
    pub listen: Option<SocketAddr>,
}

/// Complete simulator configuration (`asrs.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Logging and service identity.
    #[serde(default)]
    pub shared: SharedConfig,
    /// Lines and timing.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Step ranges.
    #[serde(default)]
    pub motion: MotionConfig,
    /// Register endpoint.
    #[serde(default)]
    pub endpoint: EndpointConfig,
}

impl SimulatorConfig {
    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `service_name` is not empty
    /// 2. `1 <= line_count` and the last line number is at most `MAX_LINES`
    /// 3. `first_line >= 1`
    /// 4. `sub_step_ms > 0`
    /// 5. step ranges are positive and `min <= max`
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let sim = &self.simulation;
        if sim.line_count == 0 {
            return Err(ConfigError::ValidationError(
                "line_count must be greater than 0".to_string(),
            ));
        }
        if sim.first_line == 0 {
            return Err(ConfigError::ValidationError(
                "first_line must be at least 1".to_string(),
            ));
        }
        let last_line = sim.first_line as usize + sim.line_count as usize - 1;
        if last_line > MAX_LINES {
            return Err(ConfigError::ValidationError(format!(
                "Too many lines: last line {} (max {})",
                last_line, MAX_LINES
            )));
        }
        if sim.sub_step_ms == 0 {
            return Err(ConfigError::ValidationError(
                "sub_step_ms must be greater than 0".to_string(),
            ));
        }

        let m = &self.motion;
        for (axis, min, max) in [
            ("x", m.x_step_min, m.x_step_max),
            ("y", m.y_step_min, m.y_step_max),
        ] {
            if min <= 0 || min > max {
                return Err(ConfigError::ValidationError(format!(
                    "{axis} step range {min}..={max} is empty or not positive"
                )));
            }
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading configuration from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Any serde-deserializable struct can be loaded.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (raw, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: TestWrapper = toml::from_str(&format!("level = \"{raw}\"")).unwrap();
            assert_eq!(parsed.level, level);
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation.line_count, 8);
        assert_eq!(config.simulation.macro_tick(), Duration::from_millis(500));
        assert_eq!(config.simulation.sub_step(), Duration::from_millis(100));
        assert!(config.endpoint.listen.is_none());
    }

    #[test]
    fn test_empty_service_name_rejected() {
        let mut config = SimulatorConfig::default();
        config.shared.service_name.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_line_bounds_rejected() {
        let mut config = SimulatorConfig::default();
        config.simulation.line_count = 0;
        assert!(config.validate().is_err());

        config.simulation.line_count = 10;
        config.simulation.first_line = 95;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Too many lines"));
    }

    #[test]
    fn test_zero_sub_step_rejected() {
        let mut config = SimulatorConfig::default();
        config.simulation.sub_step_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_step_range_rejected() {
        let mut config = SimulatorConfig::default();
        config.motion.y_step_min = 300;
        config.motion.y_step_max = 200;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("y step range"));
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = SimulatorConfig::load(Path::new("/nonexistent/path/asrs.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = SimulatorConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_loader_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
log_level = "debug"

[simulation]
line_count = 2
macro_tick_ms = 50
seed = 7

[endpoint]
listen = "127.0.0.1:4840"
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = SimulatorConfig::load(file.path()).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.shared.service_name, SERVICE_NAME);
        assert_eq!(config.simulation.line_count, 2);
        assert_eq!(config.simulation.macro_tick_ms, 50);
        assert_eq!(config.simulation.sub_step_ms, SUB_STEP_MS);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.motion, MotionConfig::default());
        assert_eq!(
            config.endpoint.listen,
            Some("127.0.0.1:4840".parse().unwrap())
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config: SimulatorConfig =
            toml::from_str(include_str!("../../config/asrs.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation.line_count, DEFAULT_LINE_COUNT);
        assert_eq!(config.simulation.prep_delay_ms, PREP_DELAY_MS);
        assert!(!config.simulation.confirm_after_prep);
        assert_eq!(config.motion, MotionConfig::default());
    }
}
