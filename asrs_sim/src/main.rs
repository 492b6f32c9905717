//! # ASRS Simulator Binary
//!
//! Runs the configured crane lines until SIGINT/SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! # Default config (/etc/asrs/asrs.toml if present, else built-in defaults)
//! asrs_sim
//!
//! # Explicit config, 4 lines, register endpoint on port 4840
//! asrs_sim --config config/asrs.toml --lines 4 --listen 127.0.0.1:4840
//!
//! # Reproducible run with verbose JSON logs
//! asrs_sim --seed 42 -v --json
//! ```

use asrs_common::prelude::{ConfigLoader, SimulatorConfig};
use asrs_common::consts::DEFAULT_CONFIG_PATH;
use asrs_sim::Supervisor;
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// ASRS line simulator - PLC-style crane lines over a shared register space
#[derive(Parser, Debug)]
#[command(name = "asrs_sim")]
#[command(version)]
#[command(about = "Simulated ASRS crane lines with a register endpoint")]
#[command(long_about = None)]
struct Args {
    /// Path to configuration file (asrs.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of lines to simulate (overrides simulation.line_count)
    #[arg(short, long)]
    lines: Option<u8>,

    /// Register endpoint address (overrides endpoint.listen)
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// RNG seed for reproducible motion (overrides simulation.seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Simulator startup failed: {}", e);
        eprintln!("asrs_sim: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;

    setup_tracing(&args, &config);
    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    let mut supervisor = Supervisor::new(config)?;

    let stop = supervisor.stop_signal();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        stop.stop();
    })?;

    supervisor.start()?;
    if let Some(addr) = supervisor.endpoint_addr() {
        info!("Register endpoint on {}", addr);
    }

    supervisor.wait_for_stop();
    let report = supervisor.shutdown();
    if !report.is_clean() {
        warn!(
            "{} line(s) faulted, {} panicked",
            report.faulted.len(),
            report.panicked.len()
        );
    }

    info!("Simulator shutdown complete");
    Ok(())
}

/// Load the config file and apply CLI overrides.
///
/// An explicit `--config` must exist; the default path is optional.
fn load_config(args: &Args) -> Result<SimulatorConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => SimulatorConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            SimulatorConfig::load(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => SimulatorConfig::default(),
    };

    if let Some(lines) = args.lines {
        config.simulation.line_count = lines;
    }
    if let Some(listen) = args.listen {
        config.endpoint.listen = Some(listen);
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }

    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber based on CLI arguments and config.
fn setup_tracing(args: &Args, config: &SimulatorConfig) {
    let directive = if args.verbose {
        "debug"
    } else {
        config.shared.log_level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
