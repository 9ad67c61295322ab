//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the
//! canonical instruction table and hands it to a callback macro, so the opcode
//! enum, the decoded [`Instruction`] enum and the ISA fingerprint test are all
//! generated from one list.
//!
//! # Cell format
//!
//! An instruction cell is a non-negative decimal number:
//! - the low two digits select the opcode
//! - the digit at `10^(k+1)` is the addressing mode of parameter `k` (1-based):
//!   `0` position, `1` immediate, `2` relative
//!
//! The parameters follow the cell in memory, one cell each. `1002` is
//! therefore `MUL` with a position, an immediate and a position parameter.

use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::operand::{Parameter, ParameterMode};
use crate::virtual_machine::vm::Memory;

/// Largest parameter count of any instruction.
pub const MAX_ARITY: usize = 3;

/// Invokes a callback macro with the complete instruction definition list.
///
/// Each entry is `Name = opcode, "MNEMONIC" => [field: Kind, ...]`, where
/// `Kind` is `Read` for operands and `Write` for result targets.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            /// ADD lhs, rhs, dst ; dst = lhs + rhs
            Add = 1, "ADD" => [lhs: Read, rhs: Read, dst: Write],
            /// MUL lhs, rhs, dst ; dst = lhs * rhs
            Multiply = 2, "MUL" => [lhs: Read, rhs: Read, dst: Write],
            /// IN dst ; dst = next inbound value
            Input = 3, "IN" => [dst: Write],
            /// OUT src ; push src to the outbound queue
            Output = 4, "OUT" => [src: Read],
            /// JNZ cond, target ; if cond != 0 then IP = target
            JumpIfTrue = 5, "JNZ" => [cond: Read, target: Read],
            /// JZ cond, target ; if cond == 0 then IP = target
            JumpIfFalse = 6, "JZ" => [cond: Read, target: Read],
            /// LT lhs, rhs, dst ; dst = (lhs < rhs) as 1 | 0
            LessThan = 7, "LT" => [lhs: Read, rhs: Read, dst: Write],
            /// EQ lhs, rhs, dst ; dst = (lhs == rhs) as 1 | 0
            Equals = 8, "EQ" => [lhs: Read, rhs: Read, dst: Write],
            /// ARB offset ; relative base += offset
            AdjustRelativeBase = 9, "ARB" => [offset: Read],
            /// HALT ; stop the machine permanently
            Halt = 99, "HALT" => [],
        }
    };
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        // =========================
        // Opcode enum
        // =========================
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<i64> for Opcode {
            type Error = VMError;

            /// The `ip` of the returned error is zeroed; the decoder fills it in.
            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Opcode::$name), )*
                    _ => Err(VMError::UnknownOpcode { opcode: value, ip: 0 }),
                }
            }
        }

        impl Opcode {
            /// Every opcode in table order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name ),* ];

            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Number of parameter cells following the instruction cell.
            pub const fn arity(&self) -> usize {
                match self {
                    $( Opcode::$name => 0 $( + define_instructions!(@one $field) )*, )*
                }
            }

            /// Encoded length in cells, opcode included.
            pub const fn length(&self) -> i64 {
                1 + self.arity() as i64
            }

            /// For each parameter, whether it is a write target.
            pub const fn write_targets(&self) -> &'static [bool] {
                match self {
                    $( Opcode::$name => &[ $( define_instructions!(@writes $kind) ),* ], )*
                }
            }
        }

        // =========================
        // Decoded instruction enum
        // =========================
        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        pub enum Instruction {
            $(
                $(#[$doc])*
                $name { $( $field: Parameter ),* },
            )*
        }

        impl Instruction {
            /// Decodes the instruction whose cell sits at `ip`.
            #[allow(unused_assignments, unused_mut, unused_variables)]
            pub fn decode(memory: &Memory, ip: i64) -> Result<Self, VMError> {
                let cell = memory.get(ip)?;
                let opcode = Opcode::try_from(cell % 100)
                    .map_err(|_| VMError::UnknownOpcode { opcode: cell, ip })?;
                match opcode {
                    $(
                        Opcode::$name => {
                            let mut position = 0u32;
                            Ok(Instruction::$name {
                                $(
                                    $field: {
                                        position += 1;
                                        decode_parameter(memory, ip, cell, position)?
                                    },
                                )*
                            })
                        }
                    )*
                }
            }

            pub const fn opcode(&self) -> Opcode {
                match self {
                    $( Instruction::$name { .. } => Opcode::$name, )*
                }
            }

            /// Parameters in encoding order.
            pub fn parameters(&self) -> Vec<Parameter> {
                match self {
                    $( Instruction::$name { $( $field ),* } => vec![ $( *$field ),* ], )*
                }
            }
        }
    };

    (@one $field:ident) => { 1 };
    (@writes Read) => { false };
    (@writes Write) => { true };
}

for_each_instruction!(define_instructions);

/// Decodes parameter `position` (1-based) of the instruction cell `cell` at `ip`.
fn decode_parameter(memory: &Memory, ip: i64, cell: i64, position: u32) -> Result<Parameter, VMError> {
    let mode = (cell / 10i64.pow(position + 1)) % 10;
    let mode = ParameterMode::try_from(mode)
        .map_err(|_| VMError::InvalidParameterMode { mode, cell, ip })?;
    let address = ip
        .checked_add(i64::from(position))
        .ok_or(VMError::AddressOverflow {
            base: ip,
            offset: i64::from(position),
        })?;
    Ok(Parameter::new(memory.get(address)?, mode))
}

impl Instruction {
    pub const fn mnemonic(&self) -> &'static str {
        self.opcode().mnemonic()
    }

    pub const fn length(&self) -> i64 {
        self.opcode().length()
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())?;
        for (i, param) in self.parameters().iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, param)?;
        }
        Ok(())
    }
}
