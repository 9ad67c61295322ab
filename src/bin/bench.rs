//! Intcode benchmark binary.
//!
//! Measures execution time for a handful of representative programs.
//! Run with: `cargo run --release --bin bench -- [--iterations N] [--quiet]`

use std::process::ExitCode;
use std::time::{Duration, Instant};

use intcode::network::feedback;
use intcode::utils::log::{self, Level};
use intcode::virtual_machine::errors::VMError;
use intcode::virtual_machine::program::Program;
use intcode::virtual_machine::vm::Machine;
use intcode::{error, info};

const DEFAULT_ITERATIONS: u64 = 200;

// ---------------------------------------------------------------------------
// Benchmark harness
// ---------------------------------------------------------------------------

struct BenchResult {
    name: &'static str,
    iterations: u64,
    total: Duration,
    /// Instructions executed by one run (None to omit the column).
    steps: Option<u64>,
}

impl BenchResult {
    fn avg_nanos(&self) -> u128 {
        self.total.as_nanos() / u128::from(self.iterations.max(1))
    }

    fn print(&self) {
        let ns_per_iter = self.avg_nanos();
        let ns_per_step = self
            .steps
            .filter(|&n| n > 0)
            .map(|n| format!("{:>8.1}", ns_per_iter as f64 / n as f64))
            .unwrap_or_else(|| "       -".to_string());
        let steps = self
            .steps
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<24} {:>7} iters {:>10.3} us/iter {:>10} steps  {} ns/step",
            self.name,
            self.iterations,
            ns_per_iter as f64 / 1000.0,
            steps,
            ns_per_step,
        );
    }
}

/// Runs `f` `iterations` times after a short warmup.
///
/// `f` returns the number of instructions one run executed, if known.
fn bench<F, E>(name: &'static str, iterations: u64, mut f: F) -> Result<BenchResult, E>
where
    F: FnMut() -> Result<Option<u64>, E>,
{
    for _ in 0..3 {
        f()?;
    }
    let mut steps = None;
    let start = Instant::now();
    for _ in 0..iterations {
        steps = f()?;
    }
    Ok(BenchResult {
        name,
        iterations,
        total: start.elapsed(),
        steps,
    })
}

/// Runs `program` to completion on `input` and returns the step count.
fn run_steps(program: &Program, input: &[i64]) -> Result<Option<u64>, VMError> {
    let mut machine = Machine::new(program);
    machine.run_to_completion(input.iter().copied())?;
    Ok(Some(machine.steps()))
}

// ---------------------------------------------------------------------------
// Benchmark programs
// ---------------------------------------------------------------------------

const QUINE: &str = "109,1,204,-1,1001,100,1,100,1008,100,16,101,1006,101,0,99";

const LARGE_MULTIPLY: &str = "1102,34915192,34915192,7,4,7,99,0";

const COMPARE: &str = "3,21,1008,21,8,20,1005,20,22,107,8,21,20,1006,20,31,1106,0,36,98,0,0,\
                       1002,21,125,20,4,20,1105,1,46,104,999,1105,1,46,1101,1000,1,20,4,20,\
                       1105,1,46,98,99";

// [20] = 100000; loop: [20] -= 1 while [20] != 0
const COUNTDOWN: &str = "1101,0,100000,20,1001,20,-1,20,1005,20,4,99";

const FEEDBACK_RING: &str = "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,\
                             27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5";

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

struct Options {
    iterations: u64,
    quiet: bool,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        iterations: DEFAULT_ITERATIONS,
        quiet: false,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--quiet" => options.quiet = true,
            "--iterations" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--iterations needs a value".to_string())?;
                options.iterations = value
                    .parse()
                    .map_err(|_| format!("invalid iteration count: {value}"))?;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(options)
}

fn run(options: &Options) -> Result<Vec<BenchResult>, Box<dyn std::error::Error>> {
    let n = options.iterations;
    let quine: Program = QUINE.parse()?;
    let multiply: Program = LARGE_MULTIPLY.parse()?;
    let compare: Program = COMPARE.parse()?;
    let countdown: Program = COUNTDOWN.parse()?;
    let ring: Program = FEEDBACK_RING.parse()?;

    Ok(vec![
        bench("quine", n, || run_steps(&quine, &[]))?,
        bench("large_multiply", n, || run_steps(&multiply, &[]))?,
        bench("compare", n, || run_steps(&compare, &[8]))?,
        bench("countdown_100k", n.div_ceil(10), || run_steps(&countdown, &[]))?,
        bench("feedback_ring_search", n.div_ceil(10), || {
            feedback::max_signal(&ring, &[5, 6, 7, 8, 9]).map(|_| None)
        })?,
    ])
}

fn main() -> ExitCode {
    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            error!("{message}");
            eprintln!("usage: bench [--iterations N] [--quiet]");
            return ExitCode::FAILURE;
        }
    };
    if options.quiet {
        log::set_level(Level::Warn);
    }

    info!("running benchmarks with {} iterations", options.iterations);
    match run(&options) {
        Ok(results) => {
            if !options.quiet {
                println!("Intcode Benchmarks\n");
            }
            for result in &results {
                result.print();
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("benchmark failed: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(iterations: u64, total: Duration) -> BenchResult {
        BenchResult {
            name: "test",
            iterations,
            total,
            steps: None,
        }
    }

    #[test]
    fn average_handles_counts_beyond_u32() {
        let r = result(1 << 32, Duration::from_secs(8));
        assert_eq!(r.avg_nanos(), 1);
        let r = result(u64::MAX, Duration::from_secs(1));
        assert_eq!(r.avg_nanos(), 0);
    }

    #[test]
    fn average_of_zero_iterations_is_total() {
        assert_eq!(result(0, Duration::from_micros(3)).avg_nanos(), 3000);
        assert_eq!(result(4, Duration::from_micros(2)).avg_nanos(), 500);
    }
}
