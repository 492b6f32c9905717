//! Command and status code catalogs.
//!
//! Command codes are written by clients into `D0148`; status codes are
//! written by the simulator into `D0328` and mirrored into `D0147`.

use serde::{Deserialize, Serialize};

/// Control code written by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum CommandCode {
    /// Point-to-point move to BayStart / LevelStart.
    StartTouring = 10,
    /// Move to BayEnd / LevelEnd, both axes at once.
    StartFreeMove = 35,
    /// Pause progress without resetting.
    Hold = 36,
    /// Stop and return to WAIT.
    EmergencyStop = 37,
    /// Start (or resume) a multi-level sweep.
    Sweep = 38,
}

impl CommandCode {
    /// Decode a raw register value. Returns `None` for unknown codes
    /// (including 0, "no command").
    #[inline]
    pub const fn from_raw(value: i64) -> Option<Self> {
        match value {
            10 => Some(Self::StartTouring),
            35 => Some(Self::StartFreeMove),
            36 => Some(Self::Hold),
            37 => Some(Self::EmergencyStop),
            38 => Some(Self::Sweep),
            _ => None,
        }
    }

    /// Raw register value.
    #[inline]
    pub const fn raw(self) -> i64 {
        self as i64
    }
}

/// Motion status emitted by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u16)]
pub enum StatusCode {
    /// Idle or stopped.
    #[default]
    Idle = 0,
    /// Vertical motion (also used for touring, free moves and prep).
    Moving = 2,
    /// Horizontal sweep motion.
    Traversing = 7,
    /// Held by command 36.
    Held = 76,
    /// Sweep preparation in progress.
    Preparing = 78,
}

impl StatusCode {
    /// Decode a raw register value.
    #[inline]
    pub const fn from_raw(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            2 => Some(Self::Moving),
            7 => Some(Self::Traversing),
            76 => Some(Self::Held),
            78 => Some(Self::Preparing),
            _ => None,
        }
    }

    /// Raw register value.
    #[inline]
    pub const fn raw(self) -> i64 {
        self as i64
    }
}
