//! Intcode virtual machine.
//!
//! An Intcode program is a flat list of signed 64-bit integers that is both
//! code and data. The machine executes it in place, reading and writing its
//! own memory, and talks to the outside world only through a pair of integer
//! queues.
//!
//! # Architecture
//!
//! - **Memory**: zero-initialised, grows on write, negative addresses rejected
//! - **Cursor**: instruction pointer plus a relative base for relative mode
//! - **Channel**: inbound and outbound FIFO queues of integers
//! - **Instruction format**: low two decimal digits select the opcode, higher
//!   digits carry one addressing mode per parameter
//! - **Suspension**: a machine can stop at Input on an empty queue, after each
//!   Output, or at Halt, and resume later exactly where it left off
//!
//! # Modules
//!
//! - [`disasm`]: Human-readable listing of a program image
//! - [`errors`]: Execution and parse error types
//! - [`isa`]: Instruction set definition and decoding
//! - [`operand`]: Parameter modes and resolution
//! - [`program`]: Program images and their textual form
//! - [`vm`]: The machine, its memory and its I/O channel

pub mod disasm;
pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod operand;
pub mod program;
pub mod vm;
