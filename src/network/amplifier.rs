//! Linear amplifier chain.
//!
//! Stage `i` receives its phase setting followed by the signal produced by
//! stage `i - 1` (the first stage gets the initial signal) and runs to
//! completion. The chain's result is the last stage's final output.

use crate::network::{best_ordering, NetworkError};
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::Machine;
use crate::{debug, info};

/// Runs one chain with the given phase settings, starting from `signal`.
pub fn run_chain(program: &Program, phases: &[i64], signal: i64) -> Result<i64, NetworkError> {
    if phases.is_empty() {
        return Err(NetworkError::InvalidTopology {
            reason: "amplifier chain needs at least one stage".to_string(),
        });
    }
    phases
        .iter()
        .enumerate()
        .try_fold(signal, |signal, (stage, &phase)| {
            let outputs = Machine::new(program)
                .run_to_completion([phase, signal])
                .map_err(NetworkError::machine(stage))?;
            let next = outputs
                .last()
                .copied()
                .ok_or(NetworkError::MissingOutput { machine: stage })?;
            debug!("amplifier {stage} (phase {phase}): {signal} -> {next}");
            Ok(next)
        })
}

/// Tries every ordering of `phases` and returns the strongest final signal
/// together with the ordering that produced it.
pub fn max_signal(program: &Program, phases: &[i64]) -> Result<(i64, Vec<i64>), NetworkError> {
    let best = best_ordering(phases, |ordering| run_chain(program, ordering, 0))?;
    info!("best amplifier signal {} with phases {:?}", best.0, best.1);
    Ok(best)
}
