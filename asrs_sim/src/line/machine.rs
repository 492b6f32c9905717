//! Per-tick decision function of a line.
//!
//! [`Machine::tick`] looks at one register snapshot and returns the writes
//! and waits to perform, in order. It never touches the register space or
//! sleeps itself, so every rule is testable without threads or clocks.
//!
//! Rule precedence, checked every tick:
//!
//! | # | Condition | Effect |
//! |---|-----------|--------|
//! | 1 | ResetFlag = 1 | random position, clear command/range registers, WAIT |
//! | 2 | Command 36 | status 76, mode unchanged |
//! | 3 | Command 37 | status 0, wait, clear command, WAIT |
//! | 4 | Command 10 in WAIT | TOURING |
//! | 5 | Command 35 in WAIT | capture target, FREE_MOVING |
//! | 6 | Command 38 in READY_TO_MOVE | status 7, MOVING/MOVE_X |
//! | 7 | Command 38 in WAIT | status 78, prep delay, validate range, PREP |
//! | 8 | PREP | X toward X_MIN |
//! | 9 | MOVING/MOVE_X | X toward the level's bound |
//! | 10 | MOVING/MOVE_Y | Y toward the next level |
//! | 11 | TOURING | X then Y toward BayStart / LevelStart |
//! | 12 | FREE_MOVING | X and Y toward the captured target |
//! | 13 | otherwise | finish an overshot sweep, else idle |

use asrs_common::codes::{CommandCode, StatusCode};
use asrs_common::consts::{LEVEL_MIN, SWEEP_LEVEL_MAX};
use asrs_common::register::Register;
use tracing::{debug, info, trace, warn};

use super::geometry::{Direction, level_to_y, reachable_level, step_toward, y_to_level};
use super::mode::{Mode, Phase, Target};
use super::motion::Motion;
use crate::registers::LineSnapshot;

/// Upper bound on actions a single tick can emit (reset is the largest).
pub const MAX_TICK_ACTIONS: usize = 16;

/// Which configured delay a wait uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// One state machine cycle.
    MacroTick,
    /// Sweep preparation hold.
    PrepDelay,
}

/// One step of a tick's effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Store a value.
    Write(Register, i64),
    /// Cancellable wait.
    Wait(Pause),
}

/// Ordered effects of one tick.
#[derive(Debug, Clone, Default)]
pub struct Tick {
    actions: heapless::Vec<Action, MAX_TICK_ACTIONS>,
}

impl Tick {
    /// Actions in execution order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// True if the tick ends in (or contains) a wait.
    pub fn waits(&self) -> bool {
        self.actions.iter().any(|a| matches!(a, Action::Wait(_)))
    }

    /// Last value written to `register` by this tick, if any.
    pub fn written(&self, register: Register) -> Option<i64> {
        self.actions.iter().rev().find_map(|a| match *a {
            Action::Write(r, v) if r == register => Some(v),
            _ => None,
        })
    }

    fn push(&mut self, action: Action) {
        let pushed = self.actions.push(action);
        debug_assert!(pushed.is_ok(), "tick action budget exceeded");
    }

    fn write(&mut self, register: Register, value: i64) {
        self.push(Action::Write(register, value));
    }

    /// Status and its mirror always change together.
    fn status(&mut self, code: StatusCode) {
        self.write(Register::Status, code.raw());
        self.write(Register::StatusMirror, code.raw());
    }

    fn wait(&mut self, pause: Pause) {
        self.push(Action::Wait(pause));
    }
}

/// Sweep progress, kept after the sweep ends for the overshoot guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sweep {
    level: i64,
}

/// State machine of one line.
#[derive(Debug, Clone, Default)]
pub struct Machine {
    mode: Mode,
    sweep: Option<Sweep>,
    confirm_after_prep: bool,
}

impl Machine {
    /// New machine in WAIT.
    ///
    /// With `confirm_after_prep`, reaching X_MIN during preparation enters
    /// READY_TO_MOVE and clears Command, so the sweep only starts once the
    /// client writes Command=38 again.
    pub fn new(confirm_after_prep: bool) -> Self {
        Self {
            confirm_after_prep,
            ..Self::default()
        }
    }

    /// Current mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Level currently being swept, if a sweep is tracked.
    #[inline]
    pub fn sweep_level(&self) -> Option<i64> {
        self.sweep.map(|s| s.level)
    }

    /// Decide the effects of one tick.
    pub fn tick<M: Motion>(&mut self, regs: &LineSnapshot, motion: &mut M) -> Tick {
        let mut tick = Tick::default();

        if regs.get(Register::ResetFlag) == 1 {
            self.reset(motion, &mut tick);
            return tick;
        }

        let command = CommandCode::from_raw(regs.get(Register::Command));
        match (command, self.mode) {
            (Some(CommandCode::Hold), _) => {
                trace!("Hold (mode {})", self.mode.label());
                tick.status(StatusCode::Held);
                tick.wait(Pause::MacroTick);
            }
            (Some(CommandCode::EmergencyStop), _) => {
                info!("Emergency stop in mode {}", self.mode.label());
                tick.status(StatusCode::Idle);
                self.sweep = None;
                tick.wait(Pause::MacroTick);
                tick.write(Register::Command, 0);
                self.mode = Mode::Wait;
            }
            (Some(CommandCode::StartTouring), Mode::Wait) => {
                info!("Touring to bay/level start");
                self.mode = Mode::Touring;
            }
            (Some(CommandCode::StartFreeMove), Mode::Wait) => {
                let target = Target {
                    x: regs.get(Register::BayEnd),
                    y: level_to_y(reachable_level(regs.get(Register::LevelEnd))),
                };
                info!("Free move to x={} y={}", target.x, target.y);
                self.mode = Mode::FreeMoving(target);
            }
            (Some(CommandCode::Sweep), Mode::ReadyToMove) => {
                info!("Sweep resumed after preparation");
                tick.status(StatusCode::Traversing);
                self.mode = Mode::Moving(Phase::MoveX);
            }
            (Some(CommandCode::Sweep), Mode::Wait) => self.start_sweep(regs, &mut tick),
            (_, Mode::Prep) => self.prepare(regs, motion, &mut tick),
            (_, Mode::Moving(Phase::MoveX)) => self.move_x(regs, motion, &mut tick),
            (_, Mode::Moving(Phase::MoveY)) => self.move_y(regs, motion, &mut tick),
            (_, Mode::Touring) => self.tour(regs, motion, &mut tick),
            (_, Mode::FreeMoving(target)) => self.free_move(target, regs, motion, &mut tick),
            _ => self.settle(regs, motion, &mut tick),
        }
        tick
    }

    fn reset<M: Motion>(&mut self, motion: &mut M, tick: &mut Tick) {
        let (x, y) = motion.start_position();
        let level = y_to_level(y);
        info!("Reset: start x={} y={} level={}", x, y, level);

        tick.write(Register::PositionX, x);
        tick.write(Register::PositionY, y);
        tick.write(Register::PresentLevel, level);
        for register in Register::CLEARED_ON_RESET {
            tick.write(register, 0);
        }
        self.sweep = None;
        self.mode = Mode::Wait;
    }

    fn start_sweep(&mut self, regs: &LineSnapshot, tick: &mut Tick) {
        let start = regs.get(Register::LevelStart);
        let end = regs.get(Register::LevelEnd);

        tick.status(StatusCode::Preparing);
        tick.wait(Pause::PrepDelay);

        if !(LEVEL_MIN <= start && start <= end && end <= SWEEP_LEVEL_MAX) {
            warn!("Invalid level range {}..={}, sweep rejected", start, end);
            tick.write(Register::LevelStart, 0);
            tick.write(Register::LevelEnd, 0);
            tick.write(Register::Command, 0);
            return;
        }

        info!("Sweep accepted: levels {}..={}", start, end);
        self.sweep = Some(Sweep { level: start });
        tick.write(Register::PresentLevel, start);
        tick.write(Register::PositionY, level_to_y(start));
        tick.status(StatusCode::Moving);
        self.mode = Mode::Prep;
    }

    fn prepare<M: Motion>(&mut self, regs: &LineSnapshot, motion: &mut M, tick: &mut Tick) {
        let x = regs.get(Register::PositionX);
        let x_min = regs.get(Register::BayStart);

        if x > x_min {
            let next = (x - motion.x_step()).max(x_min);
            debug!("PREP: x {} -> {}", x, next);
            tick.write(Register::PositionX, next);
        } else if self.confirm_after_prep {
            info!("At bay start, waiting for sweep confirmation");
            tick.write(Register::Command, 0);
            self.mode = Mode::ReadyToMove;
        } else {
            info!("At bay start, sweep moving");
            tick.status(StatusCode::Traversing);
            self.mode = Mode::Moving(Phase::MoveX);
        }
        tick.wait(Pause::MacroTick);
    }

    fn move_x<M: Motion>(&mut self, regs: &LineSnapshot, motion: &mut M, tick: &mut Tick) {
        let Some(sweep) = self.sweep else {
            warn!("MOVE_X without a sweep level, returning to WAIT");
            self.mode = Mode::Wait;
            tick.wait(Pause::MacroTick);
            return;
        };

        let x = regs.get(Register::PositionX);
        let x_min = regs.get(Register::BayStart);
        let x_max = regs.get(Register::BayEnd);
        let direction = Direction::for_sweep_level(sweep.level, regs.get(Register::LevelStart));
        let target = direction.bound(x_min, x_max);

        if direction.short_of(x, target) {
            let next = step_toward(x, target, motion.x_step());
            debug!(
                "MOVE_X: level {} {:?} x {} -> {} (target {})",
                sweep.level, direction, x, next, target
            );
            tick.write(Register::PositionX, next);
            tick.status(StatusCode::Traversing);
        } else if sweep.level >= regs.get(Register::LevelEnd) {
            info!("Final level {} reached, sweep stopped", sweep.level);
            tick.status(StatusCode::Idle);
            self.mode = Mode::Stopped;
        } else {
            debug!("MOVE_X done on level {}, climbing", sweep.level);
            self.mode = Mode::Moving(Phase::MoveY);
        }
        tick.wait(Pause::MacroTick);
    }

    fn move_y<M: Motion>(&mut self, regs: &LineSnapshot, motion: &mut M, tick: &mut Tick) {
        let Some(mut sweep) = self.sweep else {
            warn!("MOVE_Y without a sweep level, returning to WAIT");
            self.mode = Mode::Wait;
            tick.wait(Pause::MacroTick);
            return;
        };

        let y = regs.get(Register::PositionY);
        let next_level = sweep.level + 1;
        let target = level_to_y(next_level);

        if y < target {
            let next = (y + motion.y_step()).min(target);
            debug!("MOVE_Y: toward level {} y {} -> {}", next_level, y, next);
            tick.write(Register::PositionY, next);
            tick.write(Register::PresentLevel, y_to_level(next));
            tick.status(StatusCode::Moving);
        } else {
            sweep.level = next_level;
            self.sweep = Some(sweep);
            info!("Reached level {}", next_level);
            tick.write(Register::PresentLevel, y_to_level(target));
            tick.status(StatusCode::Traversing);
            self.mode = Mode::Moving(Phase::MoveX);
        }
        tick.wait(Pause::MacroTick);
    }

    fn tour<M: Motion>(&mut self, regs: &LineSnapshot, motion: &mut M, tick: &mut Tick) {
        let x = regs.get(Register::PositionX);
        let y = regs.get(Register::PositionY);
        let x_target = regs.get(Register::BayStart);
        let y_target = level_to_y(reachable_level(regs.get(Register::LevelStart)));

        if x != x_target {
            let next = step_toward(x, x_target, motion.x_step());
            debug!("TOURING: x {} -> {}", x, next);
            tick.write(Register::PositionX, next);
            tick.status(StatusCode::Moving);
        } else if y != y_target {
            let next = step_toward(y, y_target, motion.y_step());
            debug!("TOURING: y {} -> {}", y, next);
            tick.write(Register::PositionY, next);
            tick.write(Register::PresentLevel, y_to_level(next));
            tick.status(StatusCode::Moving);
        } else {
            info!("Touring complete at x={} y={}", x, y);
            tick.write(Register::Command, 0);
            tick.status(StatusCode::Idle);
            self.mode = Mode::Wait;
        }
        tick.wait(Pause::MacroTick);
    }

    fn free_move<M: Motion>(
        &mut self,
        target: Target,
        regs: &LineSnapshot,
        motion: &mut M,
        tick: &mut Tick,
    ) {
        let x = regs.get(Register::PositionX);
        let y = regs.get(Register::PositionY);
        let mut moved = false;

        if x != target.x {
            let next = step_toward(x, target.x, motion.x_step());
            tick.write(Register::PositionX, next);
            moved = true;
        }
        if y != target.y {
            let next = step_toward(y, target.y, motion.y_step());
            tick.write(Register::PositionY, next);
            tick.write(Register::PresentLevel, y_to_level(next));
            moved = true;
        }

        if moved {
            trace!("FREE_MOVING toward x={} y={}", target.x, target.y);
            tick.status(StatusCode::Moving);
            tick.wait(Pause::MacroTick);
        } else {
            info!("Free move complete at x={} y={}", x, y);
            tick.status(StatusCode::Idle);
            tick.write(Register::Command, 0);
            self.mode = Mode::Wait;
        }
    }

    /// Finish a sweep whose level ran past LevelEnd, otherwise idle.
    fn settle<M: Motion>(&mut self, regs: &LineSnapshot, motion: &mut M, tick: &mut Tick) {
        let level_end = regs.get(Register::LevelEnd);
        if let Some(sweep) = self.sweep {
            if sweep.level > level_end {
                let x = regs.get(Register::PositionX);
                let direction = Direction::for_final_level(level_end);
                let target =
                    direction.bound(regs.get(Register::BayStart), regs.get(Register::BayEnd));

                if direction.short_of(x, target) {
                    let next = step_toward(x, target, motion.x_step());
                    debug!("Final pass {:?}: x {} -> {}", direction, x, next);
                    tick.write(Register::PositionX, next);
                } else {
                    if self.mode != Mode::Stopped {
                        info!("Final X reached past level end, stopped");
                    }
                    tick.status(StatusCode::Idle);
                    self.mode = Mode::Stopped;
                }
            }
        }
        tick.wait(Pause::MacroTick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::LineRegisters;
    use asrs_common::register::LineId;
    use proptest::prelude::*;

    /// Fixed steps so positions are predictable.
    struct FixedMotion {
        x: i64,
        y: i64,
        start: (i64, i64),
    }

    impl Motion for FixedMotion {
        fn x_step(&mut self) -> i64 {
            self.x
        }
        fn y_step(&mut self) -> i64 {
            self.y
        }
        fn start_position(&mut self) -> (i64, i64) {
            self.start
        }
    }

    fn motion() -> FixedMotion {
        FixedMotion {
            x: 1000,
            y: 250,
            start: (10_000, 4_200),
        }
    }

    fn regs() -> LineRegisters {
        LineRegisters::new(LineId::new(1).unwrap())
    }

    /// Apply a tick's writes, ignoring waits.
    fn apply(regs: &LineRegisters, tick: &Tick) {
        for action in tick.actions() {
            if let Action::Write(reg, value) = *action {
                regs.set(reg, value).unwrap();
            }
        }
    }

    fn run(machine: &mut Machine, regs: &LineRegisters, motion: &mut FixedMotion) -> Tick {
        let tick = machine.tick(&regs.snapshot(), motion);
        apply(regs, &tick);
        tick
    }

    #[test]
    fn idle_wait_tick_only_waits() {
        let mut machine = Machine::default();
        let regs = regs();
        let tick = run(&mut machine, &regs, &mut motion());
        assert_eq!(tick.actions(), &[Action::Wait(Pause::MacroTick)]);
        assert_eq!(machine.mode(), Mode::Wait);
    }

    #[test]
    fn reset_clears_everything_and_loops_immediately() {
        let mut machine = Machine::default();
        machine.mode = Mode::Moving(Phase::MoveY);
        machine.sweep = Some(Sweep { level: 4 });
        let regs = regs();
        for (reg, value) in [
            (Register::ResetFlag, 1),
            (Register::Command, 38),
            (Register::Status, 7),
            (Register::StatusMirror, 7),
            (Register::BayStart, 2000),
            (Register::BayEnd, 25_000),
            (Register::LevelStart, 3),
            (Register::LevelEnd, 5),
            (Register::BayStartAux, 1),
            (Register::BayEndAux, 1),
        ] {
            regs.set(reg, value).unwrap();
        }

        let tick = run(&mut machine, &regs, &mut motion());
        assert!(!tick.waits());
        assert_eq!(machine.mode(), Mode::Wait);
        assert_eq!(machine.sweep_level(), None);
        for reg in Register::CLEARED_ON_RESET {
            assert_eq!(regs.get(reg), 0, "{reg} not cleared");
        }
        assert_eq!(regs.get(Register::PositionX), 10_000);
        assert_eq!(regs.get(Register::PositionY), 4_200);
        assert_eq!(regs.get(Register::PresentLevel), 4);
    }

    #[test]
    fn reset_beats_every_command() {
        let mut machine = Machine::default();
        let regs = regs();
        regs.set(Register::ResetFlag, 1).unwrap();
        regs.set(Register::Command, 36).unwrap();
        run(&mut machine, &regs, &mut motion());
        assert_eq!(regs.get(Register::Status), 0);
        assert_eq!(regs.get(Register::Command), 0);
    }

    #[test]
    fn hold_is_idempotent_in_every_mode() {
        for mode in [
            Mode::Wait,
            Mode::Prep,
            Mode::Moving(Phase::MoveX),
            Mode::Touring,
            Mode::Stopped,
        ] {
            let mut machine = Machine::default();
            machine.mode = mode;
            let regs = regs();
            regs.set(Register::Command, 36).unwrap();
            regs.set(Register::PositionX, 7000).unwrap();

            for _ in 0..5 {
                let tick = run(&mut machine, &regs, &mut motion());
                assert!(tick.waits());
                assert_eq!(regs.get(Register::Status), 76);
                assert_eq!(regs.get(Register::StatusMirror), 76);
                assert_eq!(machine.mode(), mode);
            }
            assert_eq!(regs.get(Register::PositionX), 7000);
        }
    }

    #[test]
    fn emergency_stop_clears_command_after_wait() {
        let mut machine = Machine::default();
        machine.mode = Mode::Moving(Phase::MoveX);
        machine.sweep = Some(Sweep { level: 3 });
        let regs = regs();
        regs.set(Register::Command, 37).unwrap();
        regs.set(Register::Status, 7).unwrap();

        let tick = run(&mut machine, &regs, &mut motion());
        assert_eq!(
            tick.actions(),
            &[
                Action::Write(Register::Status, 0),
                Action::Write(Register::StatusMirror, 0),
                Action::Wait(Pause::MacroTick),
                Action::Write(Register::Command, 0),
            ]
        );
        assert_eq!(machine.mode(), Mode::Wait);
        assert_eq!(machine.sweep_level(), None);
    }

    #[test]
    fn touring_moves_x_before_y_then_completes() {
        let mut machine = Machine::default();
        let regs = regs();
        regs.set(Register::PositionX, 4_500).unwrap();
        regs.set(Register::PositionY, 1_000).unwrap();
        regs.set(Register::BayStart, 2_000).unwrap();
        regs.set(Register::LevelStart, 2).unwrap();
        regs.set(Register::Command, 10).unwrap();
        let mut motion = motion();

        let accept = run(&mut machine, &regs, &mut motion);
        assert!(accept.actions().is_empty());
        assert_eq!(machine.mode(), Mode::Touring);

        // X: 4500 -> 3500 -> 2500 -> 2000 (clamped)
        for expected in [3_500, 2_500, 2_000] {
            run(&mut machine, &regs, &mut motion);
            assert_eq!(regs.get(Register::PositionX), expected);
            assert_eq!(regs.get(Register::PositionY), 1_000);
            assert_eq!(regs.get(Register::Status), 2);
        }
        // Y: 1000 -> 1250 -> 1500 (level 2 at 1500)
        for expected in [1_250, 1_500] {
            run(&mut machine, &regs, &mut motion);
            assert_eq!(regs.get(Register::PositionY), expected);
        }
        assert_eq!(regs.get(Register::PresentLevel), 2);

        run(&mut machine, &regs, &mut motion);
        assert_eq!(machine.mode(), Mode::Wait);
        assert_eq!(regs.get(Register::Command), 0);
        assert_eq!(regs.get(Register::Status), 0);
        assert_eq!(regs.get(Register::StatusMirror), 0);
    }

    #[test]
    fn free_move_steps_both_axes_together() {
        let mut machine = Machine::default();
        let regs = regs();
        regs.set(Register::PositionX, 10_000).unwrap();
        regs.set(Register::PositionY, 3_000).unwrap();
        regs.set(Register::BayEnd, 11_500).unwrap();
        regs.set(Register::LevelEnd, 4).unwrap();
        regs.set(Register::Command, 35).unwrap();
        let mut motion = motion();

        run(&mut machine, &regs, &mut motion);
        assert_eq!(
            machine.mode(),
            Mode::FreeMoving(Target { x: 11_500, y: 3_500 })
        );

        let tick = run(&mut machine, &regs, &mut motion);
        assert_eq!(tick.written(Register::PositionX), Some(11_000));
        assert_eq!(tick.written(Register::PositionY), Some(3_250));
        assert_eq!(regs.get(Register::Status), 2);

        run(&mut machine, &regs, &mut motion);
        assert_eq!(regs.get(Register::PositionX), 11_500);
        assert_eq!(regs.get(Register::PositionY), 3_500);
        assert_eq!(regs.get(Register::PresentLevel), 4);

        let done = run(&mut machine, &regs, &mut motion);
        assert!(!done.waits());
        assert_eq!(machine.mode(), Mode::Wait);
        assert_eq!(regs.get(Register::Command), 0);
        assert_eq!(regs.get(Register::Status), 0);
    }

    #[test]
    fn free_move_target_is_captured_at_accept() {
        let mut machine = Machine::default();
        let regs = regs();
        regs.set(Register::PositionX, 10_000).unwrap();
        regs.set(Register::PositionY, 500).unwrap();
        regs.set(Register::BayEnd, 12_000).unwrap();
        regs.set(Register::LevelEnd, 1).unwrap();
        regs.set(Register::Command, 35).unwrap();
        let mut motion = motion();
        run(&mut machine, &regs, &mut motion);

        regs.set(Register::BayEnd, 30_000).unwrap();
        run(&mut machine, &regs, &mut motion);
        run(&mut machine, &regs, &mut motion);
        run(&mut machine, &regs, &mut motion);
        assert_eq!(regs.get(Register::PositionX), 12_000);
        assert_eq!(machine.mode(), Mode::Wait);
    }

    #[test]
    fn accept_rules_only_fire_in_wait() {
        let mut machine = Machine::default();
        machine.mode = Mode::Stopped;
        let regs = regs();
        regs.set(Register::Command, 10).unwrap();
        run(&mut machine, &regs, &mut motion());
        assert_eq!(machine.mode(), Mode::Stopped);
    }

    #[test]
    fn sweep_prep_holds_preparing_status_then_prep() {
        let mut machine = Machine::default();
        let regs = regs();
        regs.set(Register::Command, 38).unwrap();
        regs.set(Register::LevelStart, 3).unwrap();
        regs.set(Register::LevelEnd, 5).unwrap();
        regs.set(Register::PositionY, 4_200).unwrap();

        let tick = run(&mut machine, &regs, &mut motion());
        assert_eq!(
            &tick.actions()[..3],
            &[
                Action::Write(Register::Status, 78),
                Action::Write(Register::StatusMirror, 78),
                Action::Wait(Pause::PrepDelay),
            ]
        );
        assert_eq!(machine.mode(), Mode::Prep);
        assert_eq!(machine.sweep_level(), Some(3));
        assert_eq!(regs.get(Register::PositionY), 2_500);
        assert_eq!(regs.get(Register::PresentLevel), 3);
        assert_eq!(regs.get(Register::Status), 2);
    }

    #[test]
    fn confirm_after_prep_holds_until_sweep_is_written_again() {
        let mut machine = Machine::new(true);
        let regs = regs();
        regs.set(Register::PositionX, 4_000).unwrap();
        regs.set(Register::BayStart, 2_000).unwrap();
        regs.set(Register::BayEnd, 9_000).unwrap();
        regs.set(Register::LevelStart, 1).unwrap();
        regs.set(Register::LevelEnd, 2).unwrap();
        regs.set(Register::Command, 38).unwrap();
        let mut motion = motion();

        // Accept, then PREP: 4000 -> 3000 -> 2000 -> arrival.
        run(&mut machine, &regs, &mut motion);
        assert_eq!(machine.mode(), Mode::Prep);
        for _ in 0..3 {
            run(&mut machine, &regs, &mut motion);
        }
        assert_eq!(machine.mode(), Mode::ReadyToMove);
        assert_eq!(regs.get(Register::Command), 0);

        for _ in 0..5 {
            run(&mut machine, &regs, &mut motion);
            assert_eq!(machine.mode(), Mode::ReadyToMove);
            assert_eq!(regs.get(Register::PositionX), 2_000);
        }

        regs.set(Register::Command, 38).unwrap();
        let tick = run(&mut machine, &regs, &mut motion);
        assert!(!tick.waits());
        assert_eq!(machine.mode(), Mode::Moving(Phase::MoveX));
        assert_eq!(regs.get(Register::Status), 7);
        assert_eq!(regs.get(Register::StatusMirror), 7);
    }

    #[test]
    fn present_level_stays_clamped_when_level_end_is_raised() {
        let mut machine = Machine::default();
        machine.mode = Mode::Moving(Phase::MoveY);
        machine.sweep = Some(Sweep { level: 20 });
        let regs = regs();
        regs.set(Register::LevelStart, 1).unwrap();
        regs.set(Register::LevelEnd, 25).unwrap();
        // Already at Y(21): arrival on the next tick.
        regs.set(Register::PositionY, level_to_y(21)).unwrap();

        run(&mut machine, &regs, &mut motion());
        assert_eq!(machine.sweep_level(), Some(21));
        assert_eq!(regs.get(Register::PresentLevel), 20);
    }

    #[test]
    fn sweep_without_level_falls_back_to_wait() {
        let mut machine = Machine::default();
        machine.mode = Mode::Moving(Phase::MoveX);
        let regs = regs();
        run(&mut machine, &regs, &mut motion());
        assert_eq!(machine.mode(), Mode::Wait);
    }

    #[test]
    fn overshoot_guard_finishes_final_pass() {
        let mut machine = Machine::default();
        machine.mode = Mode::Stopped;
        machine.sweep = Some(Sweep { level: 5 });
        let regs = regs();
        regs.set(Register::BayStart, 2_000).unwrap();
        regs.set(Register::BayEnd, 6_000).unwrap();
        regs.set(Register::PositionX, 4_500).unwrap();
        // Level end lowered below the tracked level; 3 is odd so travel right.
        regs.set(Register::LevelEnd, 3).unwrap();
        regs.set(Register::Status, 2).unwrap();
        let mut motion = motion();

        run(&mut machine, &regs, &mut motion);
        assert_eq!(regs.get(Register::PositionX), 5_500);
        run(&mut machine, &regs, &mut motion);
        assert_eq!(regs.get(Register::PositionX), 6_000);
        run(&mut machine, &regs, &mut motion);
        assert_eq!(regs.get(Register::Status), 0);
        assert_eq!(machine.mode(), Mode::Stopped);
    }

    proptest! {
        #[test]
        fn invalid_sweep_ranges_are_rejected(start in -5i64..25, end in -5i64..25) {
            prop_assume!(!(1 <= start && start <= end && end <= 19));
            let mut machine = Machine::default();
            let regs = regs();
            regs.set(Register::Command, 38).unwrap();
            regs.set(Register::LevelStart, start).unwrap();
            regs.set(Register::LevelEnd, end).unwrap();

            run(&mut machine, &regs, &mut motion());
            prop_assert_eq!(machine.mode(), Mode::Wait);
            prop_assert_eq!(machine.sweep_level(), None);
            prop_assert_eq!(regs.get(Register::LevelStart), 0);
            prop_assert_eq!(regs.get(Register::LevelEnd), 0);
            prop_assert_eq!(regs.get(Register::Command), 0);
        }

        #[test]
        fn reset_always_lands_in_wait_with_valid_level(
            y in 0i64..=65_535,
            mode_idx in 0usize..6,
        ) {
            let modes = [
                Mode::Wait,
                Mode::Prep,
                Mode::Moving(Phase::MoveX),
                Mode::Moving(Phase::MoveY),
                Mode::Touring,
                Mode::Stopped,
            ];
            let mut machine = Machine::default();
            machine.mode = modes[mode_idx];
            let regs = regs();
            regs.set(Register::ResetFlag, 1).unwrap();
            let mut motion = FixedMotion { x: 1000, y: 250, start: (5_000, y) };

            run(&mut machine, &regs, &mut motion);
            prop_assert_eq!(machine.mode(), Mode::Wait);
            let level = regs.get(Register::PresentLevel);
            prop_assert!((1..=20).contains(&level));
        }
    }
}
