//! Register catalog and namespacing.
//!
//! Every line owns one namespace holding the same fixed set of registers.
//! Registers are identified by the [`Register`] enum so that access from the
//! simulator is checked at compile time; the string node names are only used
//! at the client boundary (`LINE{NN}-MP.ASRS.{name}`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::consts::MAX_LINES;

/// Errors raised by register access (the "register access fault").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// No namespace exists for this line.
    #[error("unknown line {0}")]
    UnknownLine(LineId),

    /// Node name does not name a catalog register.
    #[error("unknown register: {name}")]
    UnknownRegister {
        /// Name as supplied by the client
        name: String,
    },

    /// Value does not fit the register's type.
    #[error("value {value} out of range for {register} ({kind})")]
    OutOfRange {
        /// Target register
        register: Register,
        /// Register type
        kind: RegisterKind,
        /// Rejected value
        value: i64,
    },

    /// Node id does not follow `LINE{NN}-MP.ASRS.{name}`.
    #[error("malformed node id: {0}")]
    MalformedNode(String),
}

/// Scalar type of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegisterKind {
    /// Signed 16-bit
    I16,
    /// Unsigned 16-bit
    U16,
    /// Unsigned 32-bit
    U32,
}

impl RegisterKind {
    /// Inclusive value range of this type.
    pub const fn range(self) -> (i64, i64) {
        match self {
            Self::I16 => (i16::MIN as i64, i16::MAX as i64),
            Self::U16 => (0, u16::MAX as i64),
            Self::U32 => (0, u32::MAX as i64),
        }
    }

    /// True if `value` can be stored in this type.
    #[inline]
    pub const fn accepts(self, value: i64) -> bool {
        let (min, max) = self.range();
        value >= min && value <= max
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::I16 => "Int16",
            Self::U16 => "UInt16",
            Self::U32 => "UInt32",
        })
    }
}

/// Catalog of per-line registers.
///
/// Variant names are the semantic role; [`Register::name`] is the node name
/// exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Register {
    /// `D0147`, status mirror.
    StatusMirror = 0,
    /// `D0148`, command code written by clients.
    Command = 1,
    /// `D0328`, status code.
    Status = 2,
    /// `Distance_X`, horizontal position.
    PositionX = 3,
    /// `Distance_Y`, vertical position.
    PositionY = 4,
    /// `PresentLevel`, level derived from PositionY.
    PresentLevel = 5,
    /// `ResetFlag`, 1 requests reinitialization.
    ResetFlag = 6,
    /// `D0130`, auxiliary bay start.
    BayStartAux = 7,
    /// `D0131`, bay start (X lower bound).
    BayStart = 8,
    /// `D0133`, level start.
    LevelStart = 9,
    /// `D0134`, auxiliary bay end.
    BayEndAux = 10,
    /// `D0135`, bay end (X upper bound).
    BayEnd = 11,
    /// `D0137`, level end.
    LevelEnd = 12,
    /// `D0149`, spare.
    Spare = 13,
}

impl Register {
    /// Number of registers per line.
    pub const COUNT: usize = 14;

    /// All registers in catalog order.
    pub const ALL: [Register; Self::COUNT] = [
        Self::StatusMirror,
        Self::Command,
        Self::Status,
        Self::PositionX,
        Self::PositionY,
        Self::PresentLevel,
        Self::ResetFlag,
        Self::BayStartAux,
        Self::BayStart,
        Self::LevelStart,
        Self::BayEndAux,
        Self::BayEnd,
        Self::LevelEnd,
        Self::Spare,
    ];

    /// Registers cleared by a reset, besides the position registers.
    pub const CLEARED_ON_RESET: [Register; 10] = [
        Self::Command,
        Self::Status,
        Self::StatusMirror,
        Self::ResetFlag,
        Self::BayStartAux,
        Self::BayStart,
        Self::LevelStart,
        Self::BayEndAux,
        Self::BayEnd,
        Self::LevelEnd,
    ];

    /// Cell index inside a line namespace.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Node name as seen by clients.
    pub const fn name(self) -> &'static str {
        match self {
            Self::StatusMirror => "D0147",
            Self::Command => "D0148",
            Self::Status => "D0328",
            Self::PositionX => "Distance_X",
            Self::PositionY => "Distance_Y",
            Self::PresentLevel => "PresentLevel",
            Self::ResetFlag => "ResetFlag",
            Self::BayStartAux => "D0130",
            Self::BayStart => "D0131",
            Self::LevelStart => "D0133",
            Self::BayEndAux => "D0134",
            Self::BayEnd => "D0135",
            Self::LevelEnd => "D0137",
            Self::Spare => "D0149",
        }
    }

    /// Storage type.
    pub const fn kind(self) -> RegisterKind {
        match self {
            Self::Status | Self::PositionY => RegisterKind::U16,
            Self::PositionX | Self::BayStart | Self::BayEnd => RegisterKind::U32,
            _ => RegisterKind::I16,
        }
    }

    /// True for registers only the line itself writes (status and position).
    pub const fn is_simulator_owned(self) -> bool {
        matches!(
            self,
            Self::Status
                | Self::StatusMirror
                | Self::PositionX
                | Self::PositionY
                | Self::PresentLevel
        )
    }

    /// Look up a register by node name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.name() == name)
    }

    /// Check that `value` fits this register.
    pub fn check(self, value: i64) -> Result<i64, RegisterError> {
        if self.kind().accepts(value) {
            Ok(value)
        } else {
            Err(RegisterError::OutOfRange {
                register: self,
                kind: self.kind(),
                value,
            })
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Register {
    type Err = RegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| RegisterError::UnknownRegister {
            name: s.to_string(),
        })
    }
}

static_assertions::const_assert_eq!(Register::Spare as usize + 1, Register::COUNT);

/// Line identifier (1-based, two decimal digits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineId(u8);

impl LineId {
    /// Create a line id. Returns `None` outside `1..=MAX_LINES`.
    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && (number as usize) <= MAX_LINES {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Line number.
    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Fully qualified node id of `register` in this line's namespace.
    pub fn node_id(self, register: Register) -> String {
        format!("{self}.ASRS.{}", register.name())
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LINE{:02}-MP", self.0)
    }
}

/// Parse `LINE{NN}-MP.ASRS.{name}` into its line and register.
pub fn parse_node_id(node: &str) -> Result<(LineId, Register), RegisterError> {
    let malformed = || RegisterError::MalformedNode(node.to_string());

    let (line_part, name) = node.split_once(".ASRS.").ok_or_else(malformed)?;
    let digits = line_part
        .strip_prefix("LINE")
        .and_then(|rest| rest.strip_suffix("-MP"))
        .ok_or_else(malformed)?;
    if digits.len() != 2 {
        return Err(malformed());
    }
    let number: u8 = digits.parse().map_err(|_| malformed())?;
    let line = LineId::new(number).ok_or_else(malformed)?;
    let register = name.parse()?;
    Ok((line, register))
}
