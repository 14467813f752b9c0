//! Simulated machine state used to seed positions.
//!
//! The text form has one assignment per line:
//!
//! ```text
//! # Comments start with #
//! sp = 0x7fff_0000
//! r0 = 3
//! r5 = 0x10
//! ```

use std::str::FromStr;

use crate::{Error, Result};

/// Number of general purpose registers in [`MachineState`].
pub const NUM_REGS: usize = 32;

/// Register file plus stack pointer of a simulated thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    registers: [u64; NUM_REGS],
    stack_pointer: u64,
}

impl MachineState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            registers: [0; NUM_REGS],
            stack_pointer: 0,
        }
    }

    #[must_use]
    pub fn with_stack_pointer(mut self, value: u64) -> Self {
        self.stack_pointer = value;
        self
    }

    pub fn with_register(mut self, index: usize, value: u64) -> Result<Self> {
        let slot = self
            .registers
            .get_mut(index)
            .ok_or(Error::RegisterOutOfRange(index))?;
        *slot = value;
        Ok(self)
    }

    #[must_use]
    pub const fn stack_pointer(&self) -> u64 {
        self.stack_pointer
    }

    #[must_use]
    pub fn register(&self, index: usize) -> Option<u64> {
        self.registers.get(index).copied()
    }

    /// Parse the line-based text form (see the module docs).
    ///
    /// Later assignments to the same name win.
    pub fn parse(text: &str) -> Result<Self> {
        let mut state = Self::new();

        for (line_num, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let invalid = |message: String| Error::InvalidState {
                line: line_num + 1,
                message,
            };

            let (name, value) = line
                .split_once('=')
                .ok_or_else(|| invalid("expected 'name = value'".to_string()))?;
            let name = name.trim();
            let value = parse_value(value).map_err(|e| invalid(e.to_string()))?;

            if name == "sp" {
                state.stack_pointer = value;
            } else if let Some(index) = name.strip_prefix('r') {
                let index: usize = index
                    .parse()
                    .map_err(|_| invalid(format!("unknown register '{name}'")))?;
                state = state
                    .with_register(index, value)
                    .map_err(|e| invalid(e.to_string()))?;
            } else {
                return Err(invalid(format!(
                    "unknown name '{name}', expected 'sp' or 'rN'"
                )));
            }
        }

        Ok(state)
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for MachineState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse a decimal or `0x`-prefixed hex number. Underscores are ignored.
pub fn parse_value(text: &str) -> Result<u64> {
    let cleaned: String = text.trim().chars().filter(|&c| c != '_').collect();
    let parsed = if let Some(hex) = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
    } else {
        cleaned.parse()
    };
    parsed.map_err(|_| Error::InvalidValue(text.trim().to_string()))
}
