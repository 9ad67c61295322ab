//! Intcode library.
//!
//! Provides a resumable Intcode virtual machine and the orchestrators that
//! wire several machines together (amplifier chains, feedback rings and a
//! NAT-mediated packet network).

pub mod network;
pub mod utils;
pub mod virtual_machine;
