//! One simulated crane line.
//!
//! A [`LineSimulator`] owns its [`Machine`], its motion source and a clone of
//! the shared clock. Each step takes a register snapshot, asks the machine
//! what to do, then performs the resulting writes and waits in order.

pub mod geometry;
pub mod machine;
pub mod mode;
pub mod motion;

use std::sync::Arc;
use std::time::Duration;

use asrs_common::config::SimulationConfig;
use asrs_common::register::{LineId, Register, RegisterError};
use tracing::{debug, error, info, info_span};

use crate::clock::SimulationClock;
use crate::registers::RegisterSpace;

pub use self::geometry::{Direction, level_to_y, y_to_level};
pub use self::machine::{Action, Machine, Pause, Tick};
pub use self::mode::{Mode, Phase, Target};
pub use self::motion::{Motion, RandomMotion};

/// Wait lengths a line uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Length of one state machine cycle.
    pub macro_tick: Duration,
    /// Hold time during sweep preparation.
    pub prep_delay: Duration,
}

impl Timing {
    /// Timing from the simulation section of the config.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            macro_tick: config.macro_tick(),
            prep_delay: config.prep_delay(),
        }
    }

    fn duration(&self, pause: Pause) -> Duration {
        match pause {
            Pause::MacroTick => self.macro_tick,
            Pause::PrepDelay => self.prep_delay,
        }
    }
}

/// Runner for one line's state machine.
pub struct LineSimulator<M: Motion = RandomMotion> {
    line: LineId,
    registers: Arc<RegisterSpace>,
    machine: Machine,
    motion: M,
    clock: SimulationClock,
    timing: Timing,
}

impl<M: Motion> LineSimulator<M> {
    /// Create a runner for `line`. The line must exist in `registers`.
    pub fn new(
        line: LineId,
        registers: Arc<RegisterSpace>,
        machine: Machine,
        motion: M,
        clock: SimulationClock,
        timing: Timing,
    ) -> Self {
        Self {
            line,
            registers,
            machine,
            motion,
            clock,
            timing,
        }
    }

    /// Line driven by this runner.
    pub fn line(&self) -> LineId {
        self.line
    }

    /// Current machine mode.
    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    /// Place the crane at a random start position.
    pub fn initialize(&mut self) -> Result<(), RegisterError> {
        let regs = self.registers.line(self.line)?;
        let (x, y) = self.motion.start_position();
        regs.set(Register::PositionX, x)?;
        regs.set(Register::PositionY, y)?;
        regs.set(Register::PresentLevel, y_to_level(y))?;
        info!("Initialized at x={} y={} level={}", x, y, y_to_level(y));
        Ok(())
    }

    /// Run one tick.
    ///
    /// Returns `Ok(false)` once the stop signal interrupts a wait. Writes
    /// queued after an interrupted wait are dropped.
    pub fn step(&mut self) -> Result<bool, RegisterError> {
        if self.clock.stop_signal().is_stopped() {
            return Ok(false);
        }
        let regs = self.registers.line(self.line)?;
        let tick = self.machine.tick(&regs.snapshot(), &mut self.motion);

        for action in tick.actions() {
            match *action {
                Action::Write(register, value) => regs.set(register, value)?,
                Action::Wait(pause) => {
                    if !self.clock.wait(self.timing.duration(pause)) {
                        debug!("Wait interrupted in mode {}", self.machine.mode().label());
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    /// Initialize, then step until stopped or faulted.
    pub fn run(mut self) -> Result<(), RegisterError> {
        let span = info_span!("line", id = %self.line);
        let _enter = span.enter();

        let result = self.initialize().and_then(|()| {
            while self.step()? {}
            Ok(())
        });

        match &result {
            Ok(()) => info!("Stopped in mode {}", self.machine.mode().label()),
            Err(e) => error!("Line fault: {}", e),
        }
        result
    }
}
