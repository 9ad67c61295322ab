/// Errors that can occur while decoding or executing an Intcode program.
///
/// Every variant is fatal for the machine that raised it. Orchestrators wrap
/// these in [`NetworkError`](crate::network::NetworkError) together with the
/// index of the failing machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VMError {
    /// The low two digits of an instruction cell name no instruction.
    #[error("unknown opcode {opcode} at address {ip}")]
    UnknownOpcode { opcode: i64, ip: i64 },
    /// A parameter mode digit is not 0, 1 or 2.
    #[error("invalid parameter mode {mode} in cell {cell} at address {ip}")]
    InvalidParameterMode { mode: i64, cell: i64, ip: i64 },
    /// An instruction tried to write through an immediate parameter.
    #[error("{instruction} at address {ip} writes through an immediate parameter")]
    IllegalWriteTarget { instruction: &'static str, ip: i64 },
    /// Input executed with no value available in a non-suspending run.
    #[error("input requested at address {ip} but the inbound channel is empty")]
    ChannelUnderflow { ip: i64 },
    /// An effective address resolved below zero.
    #[error("negative memory address {address}")]
    NegativeAddress { address: i64 },
    /// Relative base plus offset does not fit in 64 bits.
    #[error("address overflow: relative base {base} + offset {offset}")]
    AddressOverflow { base: i64, offset: i64 },
    /// An arithmetic result does not fit in 64 bits.
    #[error("{instruction} overflowed: {lhs} and {rhs}")]
    ArithmeticOverflow {
        instruction: &'static str,
        lhs: i64,
        rhs: i64,
    },
    /// The configured step budget ran out before the program halted.
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },
    /// A token in the textual program form is not an integer.
    #[error("cannot parse program cell {index}: {token:?}")]
    ParseError { index: usize, token: String },
    /// The textual program form contains no cells.
    #[error("program is empty")]
    EmptyProgram,
}
