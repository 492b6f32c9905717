//! Line operating mode.

/// What the crane is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Idle, accepting commands.
    #[default]
    Wait,
    /// Sweep accepted, moving X to X_MIN.
    Prep,
    /// At X_MIN after preparation, waiting for Command=38.
    ReadyToMove,
    /// Sweeping across levels.
    Moving(Phase),
    /// Point-to-point move to BayStart / LevelStart, X first then Y.
    Touring,
    /// Move to a captured target, both axes together.
    FreeMoving(Target),
    /// Sweep finished; only reset or emergency stop leave this mode.
    Stopped,
}

/// Sub-phase of [`Mode::Moving`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Horizontal pass along the current level.
    MoveX,
    /// Climb to the next level.
    MoveY,
}

/// Free-move destination captured when the command is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    /// Destination PositionX.
    pub x: i64,
    /// Destination PositionY.
    pub y: i64,
}

impl Mode {
    /// Short label for logs.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Wait => "WAIT",
            Self::Prep => "PREP",
            Self::ReadyToMove => "READY_TO_MOVE",
            Self::Moving(Phase::MoveX) => "MOVING/MOVE_X",
            Self::Moving(Phase::MoveY) => "MOVING/MOVE_Y",
            Self::Touring => "TOURING",
            Self::FreeMoving(_) => "FREE_MOVING",
            Self::Stopped => "STOPPED",
        }
    }
}
