//! Feedback ring of amplifiers.
//!
//! Machine `i` feeds machine `(i + 1) % n`. Machines are resumed round-robin,
//! each until it produces one value or halts, and every produced value is
//! moved straight onto the successor's inbound queue. The ring settles once
//! every machine reports Halted in the same pass.

use crate::network::{best_ordering, NetworkError};
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::{Interrupt, InterruptSet, Machine};
use crate::{debug, info};

/// Runs one ring with the given phase settings, seeding machine 0 with
/// `signal`. Returns the last value machine `n - 1` sent back to machine 0.
pub fn run_ring(program: &Program, phases: &[i64], signal: i64) -> Result<i64, NetworkError> {
    if phases.is_empty() {
        return Err(NetworkError::InvalidTopology {
            reason: "feedback ring needs at least one machine".to_string(),
        });
    }
    let mut machines: Vec<Machine> = phases
        .iter()
        .map(|&phase| Machine::with_input(program, [phase]))
        .collect();
    machines[0].push_input(signal);

    let last = machines.len() - 1;
    let mut closing = None;
    let mut pass = 0u64;
    loop {
        pass += 1;
        let mut all_halted = true;
        for i in 0..machines.len() {
            let interrupt = machines[i]
                .resume_until(InterruptSet::HAS_OUTPUT)
                .map_err(NetworkError::machine(i))?;
            if interrupt == Interrupt::Halted {
                continue;
            }
            all_halted = false;
            let value = machines[i]
                .pop_output()
                .ok_or(NetworkError::MissingOutput { machine: i })?;
            let next = (i + 1) % machines.len();
            if i == last {
                closing = Some(value);
            }
            machines[next].push_input(value);
        }
        if all_halted {
            break;
        }
    }

    let result = closing.ok_or(NetworkError::MissingOutput { machine: last })?;
    debug!("feedback ring settled after {pass} passes with {result}");
    Ok(result)
}

/// Tries every ordering of `phases` and returns the strongest ring output
/// together with the ordering that produced it.
pub fn max_signal(program: &Program, phases: &[i64]) -> Result<(i64, Vec<i64>), NetworkError> {
    let best = best_ordering(phases, |ordering| run_ring(program, ordering, 0))?;
    info!("best feedback signal {} with phases {:?}", best.0, best.1);
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::errors::VMError;

    const RING: &str = "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,\
                        27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5";

    const RING_LONG: &str = "3,52,1001,52,-5,52,3,53,1,52,56,54,1007,54,5,55,1005,55,26,1001,54,\
                             -5,54,1105,1,12,1,53,54,53,1008,54,0,55,1001,55,1,55,2,53,55,53,4,\
                             53,1001,56,-1,56,1005,56,6,99,0,0,0,0,10";

    #[test]
    fn ring_with_fixed_phases() {
        let program: Program = RING.parse().unwrap();
        assert_eq!(run_ring(&program, &[9, 8, 7, 6, 5], 0).unwrap(), 139629729);
    }

    #[test]
    fn ring_search() {
        let program: Program = RING.parse().unwrap();
        assert_eq!(
            max_signal(&program, &[5, 6, 7, 8, 9]).unwrap(),
            (139629729, vec![9, 8, 7, 6, 5])
        );
        let program: Program = RING_LONG.parse().unwrap();
        assert_eq!(
            max_signal(&program, &[5, 6, 7, 8, 9]).unwrap(),
            (18216, vec![9, 7, 8, 5, 6])
        );
    }

    #[test]
    fn linear_program_in_a_ring() {
        // each machine adds its phase once and halts
        let program: Program = "3,20,3,21,1,20,21,20,4,20,99".parse().unwrap();
        assert_eq!(run_ring(&program, &[1, 2, 3], 10).unwrap(), 16);
    }

    #[test]
    fn starved_machine_aborts_ring() {
        // every machine wants three inputs and nothing ever outputs
        let program: Program = "3,0,3,0,3,0,99".parse().unwrap();
        let err = run_ring(&program, &[1, 2], 0).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Machine {
                source: VMError::ChannelUnderflow { .. },
                ..
            }
        ));
    }

    #[test]
    fn empty_ring_is_rejected() {
        let program: Program = RING.parse().unwrap();
        assert!(matches!(
            run_ring(&program, &[], 0),
            Err(NetworkError::InvalidTopology { .. })
        ));
    }
}
