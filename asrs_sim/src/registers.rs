//! In-process register space.
//!
//! One [`LineRegisters`] namespace per line, each a fixed array of atomic
//! cells indexed by [`Register`]. Reads and writes are atomic per key and
//! visible to every other holder immediately, so external clients (the TCP
//! endpoint, tests) can poll while the owning line mutates.

use asrs_common::register::{LineId, Register, RegisterError, parse_node_id};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};

/// Registers of one line.
#[derive(Debug)]
pub struct LineRegisters {
    line: LineId,
    cells: [AtomicI64; Register::COUNT],
}

impl LineRegisters {
    /// Create a zero-valued namespace.
    pub fn new(line: LineId) -> Self {
        Self {
            line,
            cells: std::array::from_fn(|_| AtomicI64::new(0)),
        }
    }

    /// Owning line.
    pub fn line(&self) -> LineId {
        self.line
    }

    /// Read a register.
    #[inline]
    pub fn get(&self, register: Register) -> i64 {
        self.cells[register.index()].load(Ordering::SeqCst)
    }

    /// Write a register, rejecting values outside its type.
    #[inline]
    pub fn set(&self, register: Register, value: i64) -> Result<(), RegisterError> {
        let value = register.check(value)?;
        self.cells[register.index()].store(value, Ordering::SeqCst);
        Ok(())
    }

    /// Copy of every register.
    pub fn snapshot(&self) -> LineSnapshot {
        let mut values = [0; Register::COUNT];
        for reg in Register::ALL {
            values[reg.index()] = self.get(reg);
        }
        LineSnapshot {
            line: self.line,
            values,
        }
    }
}

/// Point-in-time copy of a line's registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSnapshot {
    line: LineId,
    values: [i64; Register::COUNT],
}

impl LineSnapshot {
    /// Line the snapshot was taken from.
    pub fn line(&self) -> LineId {
        self.line
    }

    /// Value of `register` at snapshot time.
    #[inline]
    pub fn get(&self, register: Register) -> i64 {
        self.values[register.index()]
    }

    /// JSON object keyed by node name.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for LineSnapshot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(Register::COUNT + 1))?;
        map.serialize_entry("line", &self.line.to_string())?;
        for reg in Register::ALL {
            map.serialize_entry(reg.name(), &self.get(reg))?;
        }
        map.end()
    }
}

/// All line namespaces.
#[derive(Debug)]
pub struct RegisterSpace {
    lines: Vec<LineRegisters>,
}

impl RegisterSpace {
    /// Create one zero-valued namespace per line.
    pub fn new(lines: impl IntoIterator<Item = LineId>) -> Self {
        Self {
            lines: lines.into_iter().map(LineRegisters::new).collect(),
        }
    }

    /// Namespace of `line`.
    pub fn line(&self, line: LineId) -> Result<&LineRegisters, RegisterError> {
        self.lines
            .iter()
            .find(|regs| regs.line() == line)
            .ok_or(RegisterError::UnknownLine(line))
    }

    /// Lines in creation order.
    pub fn line_ids(&self) -> impl Iterator<Item = LineId> + '_ {
        self.lines.iter().map(LineRegisters::line)
    }

    /// Read a register of `line`.
    pub fn get(&self, line: LineId, register: Register) -> Result<i64, RegisterError> {
        Ok(self.line(line)?.get(register))
    }

    /// Write a register of `line`.
    pub fn set(&self, line: LineId, register: Register, value: i64) -> Result<(), RegisterError> {
        self.line(line)?.set(register, value)
    }

    /// Read by node id (`LINE{NN}-MP.ASRS.{name}`).
    pub fn get_node(&self, node: &str) -> Result<i64, RegisterError> {
        let (line, register) = parse_node_id(node)?;
        self.get(line, register)
    }

    /// Write by node id (`LINE{NN}-MP.ASRS.{name}`).
    pub fn set_node(&self, node: &str, value: i64) -> Result<(), RegisterError> {
        let (line, register) = parse_node_id(node)?;
        self.set(line, register, value)
    }

    /// Every node id in the space, line by line in catalog order.
    pub fn node_ids(&self) -> Vec<String> {
        self.line_ids()
            .flat_map(|line| Register::ALL.into_iter().map(move |reg| line.node_id(reg)))
            .collect()
    }
}
