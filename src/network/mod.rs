//! Orchestrators composing several Intcode machines.
//!
//! Machines never share memory. An orchestrator owns every machine it drives
//! and moves values between their channels itself, so all wiring is explicit
//! and single-threaded.
//!
//! - [`amplifier`]: Linear chain, each stage run to completion
//! - [`feedback`]: Ring of machines interleaved on output
//! - [`nat`]: Addressed packet network with idle detection

pub mod amplifier;
pub mod feedback;
pub mod nat;

use crate::virtual_machine::errors::VMError;

/// Errors raised while driving a group of machines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// A machine failed; the whole network is aborted.
    #[error("machine {machine} failed: {source}")]
    Machine { machine: usize, source: VMError },

    /// A machine halted without producing the value its successor needed.
    #[error("machine {machine} produced no output")]
    MissingOutput { machine: usize },

    /// Every machine halted before the network reached its stop condition.
    #[error("all machines halted")]
    AllHalted,

    /// The configured number of scheduling rounds ran out.
    #[error("round limit of {limit} exceeded")]
    RoundLimitExceeded { limit: u64 },

    #[error("invalid topology: {reason}")]
    InvalidTopology { reason: String },
}

impl NetworkError {
    /// Returns a mapper tagging a [`VMError`] with the failing machine's index.
    pub(crate) fn machine(machine: usize) -> impl FnOnce(VMError) -> NetworkError {
        move |source| NetworkError::Machine { machine, source }
    }
}

/// Scheduling limits for orchestrators that may never settle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Maximum number of round-robin passes; `None` runs unbounded.
    pub round_limit: Option<u64>,
}

/// Runs `run` for every ordering of `phases` and keeps the highest result.
///
/// Ties go to the ordering generated first.
pub(crate) fn best_ordering<F>(phases: &[i64], mut run: F) -> Result<(i64, Vec<i64>), NetworkError>
where
    F: FnMut(&[i64]) -> Result<i64, NetworkError>,
{
    let mut best: Option<(i64, Vec<i64>)> = None;
    for ordering in permutations(phases) {
        let signal = run(&ordering)?;
        let better = match &best {
            Some((top, _)) => signal > *top,
            None => true,
        };
        if better {
            best = Some((signal, ordering));
        }
    }
    best.ok_or_else(|| NetworkError::InvalidTopology {
        reason: "no phase settings given".to_string(),
    })
}

/// Every ordering of `items`, generated with Heap's algorithm.
pub(crate) fn permutations(items: &[i64]) -> Vec<Vec<i64>> {
    let mut current = items.to_vec();
    let mut out = vec![current.clone()];
    let mut counters = vec![0usize; current.len()];
    let mut i = 1;
    while i < current.len() {
        if counters[i] < i {
            let j = if i % 2 == 0 { 0 } else { counters[i] };
            current.swap(j, i);
            out.push(current.clone());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
    out
}
