//! Supervisor: owns the register space, the line threads and the endpoint.
//!
//! Lifecycle: [`Supervisor::new`] validates the configuration and builds the
//! register space, [`Supervisor::start`] spawns one thread per line (plus the
//! optional endpoint), and [`Supervisor::shutdown`] sets the stop signal and
//! joins everything, lines first.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;

use asrs_common::config::{ConfigError, SimulatorConfig};
use asrs_common::error::SimError;
use asrs_common::register::{LineId, RegisterError};
use tracing::{error, info, warn};

use crate::clock::{SimulationClock, StopSignal};
use crate::endpoint::Endpoint;
use crate::line::{LineSimulator, Machine, RandomMotion, Timing};
use crate::registers::RegisterSpace;

/// How each line thread ended.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Lines that stopped on the stop signal.
    pub completed: Vec<LineId>,
    /// Lines that ended on a register fault.
    pub faulted: Vec<(LineId, RegisterError)>,
    /// Lines whose thread panicked.
    pub panicked: Vec<LineId>,
}

impl ShutdownReport {
    /// True if every line stopped cleanly.
    pub fn is_clean(&self) -> bool {
        self.faulted.is_empty() && self.panicked.is_empty()
    }
}

/// Top-level simulator.
pub struct Supervisor {
    config: SimulatorConfig,
    lines: Vec<LineId>,
    registers: Arc<RegisterSpace>,
    stop: StopSignal,
    handles: Vec<(LineId, JoinHandle<Result<(), RegisterError>>)>,
    endpoint: Option<JoinHandle<()>>,
    endpoint_addr: Option<SocketAddr>,
}

impl Supervisor {
    /// Validate `config` and build the register space.
    ///
    /// # Errors
    /// Returns error if configuration validation fails.
    pub fn new(config: SimulatorConfig) -> Result<Self, SimError> {
        config.validate()?;

        let sim = &config.simulation;
        let lines: Vec<LineId> = (0..sim.line_count)
            .map(|offset| {
                let number = sim.first_line.saturating_add(offset);
                LineId::new(number).ok_or_else(|| {
                    ConfigError::ValidationError(format!(
                        "Line number {} out of range",
                        number
                    ))
                })
            })
            .collect::<Result<_, _>>()?;
        let registers = Arc::new(RegisterSpace::new(lines.iter().copied()));

        info!(
            "Supervisor created with {} lines, macro_tick={}ms sub_step={}ms",
            lines.len(),
            sim.macro_tick_ms,
            sim.sub_step_ms
        );

        Ok(Self {
            config,
            lines,
            registers,
            stop: StopSignal::new(),
            handles: Vec::new(),
            endpoint: None,
            endpoint_addr: None,
        })
    }

    /// Shared register space.
    pub fn registers(&self) -> Arc<RegisterSpace> {
        Arc::clone(&self.registers)
    }

    /// Stop signal, for signal handlers and tests.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Lines managed by this supervisor.
    pub fn lines(&self) -> &[LineId] {
        &self.lines
    }

    /// Endpoint address once started, if enabled.
    pub fn endpoint_addr(&self) -> Option<SocketAddr> {
        self.endpoint_addr
    }

    /// Spawn the endpoint (if configured) and every line thread.
    ///
    /// # Errors
    /// Returns error if the endpoint cannot bind or a thread cannot be spawned.
    /// Threads already started keep running until [`Supervisor::shutdown`].
    pub fn start(&mut self) -> Result<(), SimError> {
        let sim = &self.config.simulation;
        let clock = SimulationClock::new(sim.sub_step(), self.stop.clone());
        let timing = Timing::from_config(sim);

        if let Some(addr) = self.config.endpoint.listen {
            let endpoint = Endpoint::bind(addr, self.registers(), clock.clone())?;
            self.endpoint_addr = Some(endpoint.local_addr()?);
            let name = "asrs-endpoint".to_string();
            let handle = std::thread::Builder::new()
                .name(name.clone())
                .spawn(move || endpoint.serve())
                .map_err(|source| SimError::Spawn { name, source })?;
            self.endpoint = Some(handle);
        }

        for &line in &self.lines {
            let motion = RandomMotion::for_line(sim.seed, line.number(), self.config.motion);
            let simulator = LineSimulator::new(
                line,
                self.registers(),
                Machine::new(sim.confirm_after_prep),
                motion,
                clock.clone(),
                timing,
            );
            let name = format!("asrs-line-{:02}", line.number());
            let handle = std::thread::Builder::new()
                .name(name.clone())
                .spawn(move || simulator.run())
                .map_err(|source| SimError::Spawn { name, source })?;
            self.handles.push((line, handle));
        }

        info!("{} line(s) running", self.handles.len());
        Ok(())
    }

    /// Block until the stop signal is set.
    pub fn wait_for_stop(&self) {
        let clock = SimulationClock::new(self.config.simulation.sub_step(), self.stop.clone());
        while clock.wait(self.config.simulation.macro_tick()) {}
    }

    /// Stop every line, join them, then join the endpoint.
    pub fn shutdown(&mut self) -> ShutdownReport {
        info!("Shutting down {} line(s)", self.handles.len());
        self.stop.stop();

        let mut report = ShutdownReport::default();
        for (line, handle) in self.handles.drain(..) {
            match handle.join() {
                Ok(Ok(())) => report.completed.push(line),
                Ok(Err(e)) => {
                    error!("{} ended with fault: {}", line, e);
                    report.faulted.push((line, e));
                }
                Err(_) => {
                    error!("{} thread panicked", line);
                    report.panicked.push(line);
                }
            }
        }

        if let Some(handle) = self.endpoint.take() {
            if handle.join().is_err() {
                warn!("Endpoint thread panicked");
            }
        }

        for line in &self.lines {
            if let Ok(regs) = self.registers.line(*line) {
                info!("Final state {}", regs.snapshot().to_json());
            }
        }

        info!(
            "Shutdown complete: {} completed, {} faulted, {} panicked",
            report.completed.len(),
            report.faulted.len(),
            report.panicked.len()
        );
        report
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if !self.handles.is_empty() || self.endpoint.is_some() {
            self.shutdown();
        }
    }
}
