//! Instruction parameters and their addressing modes.

use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::vm::Memory;
use std::fmt;

/// Addressing mode encoded in the decimal digits above the opcode.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterMode {
    /// The raw value is an address.
    Position = 0,
    /// The raw value is the operand itself.
    Immediate = 1,
    /// The raw value is an offset from the relative base.
    Relative = 2,
}

impl ParameterMode {
    pub const fn name(&self) -> &'static str {
        match self {
            ParameterMode::Position => "position",
            ParameterMode::Immediate => "immediate",
            ParameterMode::Relative => "relative",
        }
    }
}

impl TryFrom<i64> for ParameterMode {
    type Error = VMError;

    /// Context fields of the returned error are zeroed; the decoder fills them in.
    fn try_from(digit: i64) -> Result<Self, Self::Error> {
        match digit {
            0 => Ok(Self::Position),
            1 => Ok(Self::Immediate),
            2 => Ok(Self::Relative),
            _ => Err(VMError::InvalidParameterMode {
                mode: digit,
                cell: 0,
                ip: 0,
            }),
        }
    }
}

/// A decoded parameter: the raw cell that followed the opcode plus its mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub raw: i64,
    pub mode: ParameterMode,
}

impl Parameter {
    pub const fn new(raw: i64, mode: ParameterMode) -> Self {
        Self { raw, mode }
    }

    pub const fn position(raw: i64) -> Self {
        Self::new(raw, ParameterMode::Position)
    }

    pub const fn immediate(raw: i64) -> Self {
        Self::new(raw, ParameterMode::Immediate)
    }

    pub const fn relative(raw: i64) -> Self {
        Self::new(raw, ParameterMode::Relative)
    }

    /// Effective memory address, or `None` for immediate parameters.
    pub fn address(&self, relative_base: i64) -> Result<Option<i64>, VMError> {
        match self.mode {
            ParameterMode::Position => Ok(Some(self.raw)),
            ParameterMode::Immediate => Ok(None),
            ParameterMode::Relative => relative_base
                .checked_add(self.raw)
                .map(Some)
                .ok_or(VMError::AddressOverflow {
                    base: relative_base,
                    offset: self.raw,
                }),
        }
    }

    /// Resolves the parameter to its operand value.
    pub fn read(&self, memory: &Memory, relative_base: i64) -> Result<i64, VMError> {
        match self.address(relative_base)? {
            Some(address) => memory.get(address),
            None => Ok(self.raw),
        }
    }

    /// Stores `value` at the parameter's effective address.
    ///
    /// Returns [`VMError::IllegalWriteTarget`] for immediate parameters.
    pub fn write(
        &self,
        memory: &mut Memory,
        relative_base: i64,
        value: i64,
        instruction: &'static str,
        ip: i64,
    ) -> Result<(), VMError> {
        match self.address(relative_base)? {
            Some(address) => memory.set(address, value),
            None => Err(VMError::IllegalWriteTarget { instruction, ip }),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ParameterMode::Position => write!(f, "[{}]", self.raw),
            ParameterMode::Immediate => write!(f, "#{}", self.raw),
            ParameterMode::Relative if self.raw < 0 => write!(f, "[rb{}]", self.raw),
            ParameterMode::Relative => write!(f, "[rb+{}]", self.raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Memory {
        Memory::new(&[10, 20, 30, 40, 50])
    }

    #[test]
    fn mode_try_from_valid() {
        assert_eq!(ParameterMode::try_from(0).unwrap(), ParameterMode::Position);
        assert_eq!(ParameterMode::try_from(1).unwrap(), ParameterMode::Immediate);
        assert_eq!(ParameterMode::try_from(2).unwrap(), ParameterMode::Relative);
    }

    #[test]
    fn mode_try_from_invalid() {
        for digit in [3, 4, 9, -1] {
            let err = ParameterMode::try_from(digit).unwrap_err();
            assert!(matches!(err, VMError::InvalidParameterMode { mode, .. } if mode == digit));
        }
    }

    #[test]
    fn immediate_ignores_memory() {
        let p = Parameter::immediate(3);
        assert_eq!(p.read(&memory(), 0).unwrap(), 3);
        assert_eq!(p.read(&memory(), 100).unwrap(), 3);
    }

    #[test]
    fn position_reads_cell() {
        assert_eq!(Parameter::position(3).read(&memory(), 0).unwrap(), 40);
        assert_eq!(Parameter::position(3).read(&memory(), 2).unwrap(), 40);
    }

    #[test]
    fn relative_reads_offset_cell() {
        assert_eq!(Parameter::relative(1).read(&memory(), 2).unwrap(), 40);
        assert_eq!(Parameter::relative(-2).read(&memory(), 4).unwrap(), 30);
    }

    #[test]
    fn reads_past_end_are_zero() {
        assert_eq!(Parameter::position(1000).read(&memory(), 0).unwrap(), 0);
        assert_eq!(Parameter::relative(5).read(&memory(), 1000).unwrap(), 0);
    }

    #[test]
    fn negative_effective_address() {
        let err = Parameter::relative(-3).read(&memory(), 1).unwrap_err();
        assert_eq!(err, VMError::NegativeAddress { address: -2 });
    }

    #[test]
    fn relative_base_overflow() {
        let err = Parameter::relative(1).read(&memory(), i64::MAX).unwrap_err();
        assert!(matches!(err, VMError::AddressOverflow { .. }));
    }

    #[test]
    fn write_through_position_and_relative() {
        let mut mem = memory();
        Parameter::position(0).write(&mut mem, 0, 7, "ADD", 0).unwrap();
        Parameter::relative(1).write(&mut mem, 2, 8, "ADD", 0).unwrap();
        assert_eq!(mem.get(0).unwrap(), 7);
        assert_eq!(mem.get(3).unwrap(), 8);
    }

    #[test]
    fn write_through_immediate_fails() {
        let mut mem = memory();
        let err = Parameter::immediate(0)
            .write(&mut mem, 0, 7, "MUL", 12)
            .unwrap_err();
        assert_eq!(
            err,
            VMError::IllegalWriteTarget {
                instruction: "MUL",
                ip: 12
            }
        );
        assert_eq!(mem.get(0).unwrap(), 10);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Parameter::position(7).to_string(), "[7]");
        assert_eq!(Parameter::immediate(-7).to_string(), "#-7");
        assert_eq!(Parameter::relative(7).to_string(), "[rb+7]");
        assert_eq!(Parameter::relative(-7).to_string(), "[rb-7]");
    }
}
