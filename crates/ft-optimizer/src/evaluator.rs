//! Objective evaluation, either in a freshly forked process or in-process.
//!
//! The forked child never computes the objective itself. It becomes the trial
//! context: its stdout is wired to a pipe, the engine hands it the candidate
//! vertex, and whatever workload the caller then runs prints the objective as
//! its last line. The parent reads that line once the child is gone.

use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsRawFd, OwnedFd};

use ft_types::{isolation_error, FtError, FtResult, Role};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{dup2, fork, pipe, ForkResult, Pid};
use tracing::{debug, warn};

/// Produces one objective value (or a role switch) per candidate vertex.
pub trait Evaluator {
    fn evaluate(&mut self, vertex: &[f64]) -> FtResult<Role>;
}

/// Forks the current process for every evaluation.
///
/// The parent keeps the [`Role::Orchestrator`] role and receives the objective
/// parsed from the child's output. The child receives [`Role::Isolated`] with
/// stdout already redirected into the pipe.
#[derive(Debug, Default)]
pub struct ForkEvaluator {
    trials: usize,
}

impl ForkEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trial processes forked so far by this process.
    pub fn trials(&self) -> usize {
        self.trials
    }

    fn orchestrate(&self, child: Pid, read_end: OwnedFd) -> FtResult<Role> {
        let mut reader = File::from(read_end);
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        drop(reader);

        match retry_on_eintr(|| waitpid(child, None)) {
            Ok(WaitStatus::Exited(_, 0)) => {}
            Ok(status) => warn!("trial process {child} ended with {status:?}"),
            Err(errno) => return Err(isolation_error!("waitpid({child}) failed: {errno}")),
        }

        let output = String::from_utf8_lossy(&raw);
        let objective = parse_objective(&output)?;
        debug!("trial process {child} reported objective {objective}");
        Ok(Role::Orchestrator { objective })
    }

    fn isolate(read_end: OwnedFd, write_end: OwnedFd) -> FtResult<Role> {
        drop(read_end);
        let stdout_fd = std::io::stdout().as_raw_fd();
        dup2(write_end.as_raw_fd(), stdout_fd)
            .map_err(|errno| isolation_error!("redirecting stdout failed: {errno}"))?;
        drop(write_end);
        Ok(Role::Isolated)
    }
}

impl Evaluator for ForkEvaluator {
    fn evaluate(&mut self, _vertex: &[f64]) -> FtResult<Role> {
        // Anything still buffered would otherwise be printed by both processes.
        std::io::stdout().flush()?;

        let (read_end, write_end) =
            pipe().map_err(|errno| isolation_error!("pipe creation failed: {errno}"))?;

        // SAFETY: the child only closes and duplicates descriptors before handing
        // control back to the caller, which owns the rest of the child's lifetime.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                self.trials += 1;
                drop(write_end);
                self.orchestrate(child, read_end)
            }
            Ok(ForkResult::Child) => Self::isolate(read_end, write_end),
            Err(errno) => Err(isolation_error!("fork failed: {errno}")),
        }
    }
}

/// Repeat a system call interrupted by a signal.
fn retry_on_eintr<T>(mut call: impl FnMut() -> nix::Result<T>) -> nix::Result<T> {
    loop {
        match call() {
            Err(Errno::EINTR) => continue,
            result => return result,
        }
    }
}

/// Scores vertices by calling a function in the current process.
///
/// Never isolates. Suited to objectives that do not touch process-global state.
pub struct FnEvaluator<F>
where
    F: FnMut(&[f64]) -> f64,
{
    objective: F,
}

impl<F> FnEvaluator<F>
where
    F: FnMut(&[f64]) -> f64,
{
    pub fn new(objective: F) -> Self {
        Self { objective }
    }
}

impl<F> Evaluator for FnEvaluator<F>
where
    F: FnMut(&[f64]) -> f64,
{
    fn evaluate(&mut self, vertex: &[f64]) -> FtResult<Role> {
        Ok(Role::Orchestrator {
            objective: (self.objective)(vertex),
        })
    }
}

/// Parse the objective from a trial's captured stdout: the last non-blank line,
/// trimmed, as a decimal floating point literal.
pub fn parse_objective(output: &str) -> FtResult<f64> {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .ok_or_else(|| FtError::EvaluationParse {
            output: output.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_last_line() {
        assert_eq!(parse_objective("a\nb\n3\n").unwrap(), 3.0);
    }

    #[test]
    fn ignores_trailing_blank_lines_and_whitespace() {
        assert_eq!(parse_objective("epoch 1\n  -0.25  \n\n   \n").unwrap(), -0.25);
    }

    #[test]
    fn accepts_exponent_notation() {
        assert_eq!(parse_objective("1.5e-3").unwrap(), 1.5e-3);
    }

    #[test]
    fn earlier_numbers_do_not_count() {
        let err = parse_objective("42\nfinished\n").unwrap_err();
        assert!(matches!(err, FtError::EvaluationParse { .. }));
    }

    #[test]
    fn empty_output_is_a_parse_error() {
        assert!(matches!(
            parse_objective(""),
            Err(FtError::EvaluationParse { .. })
        ));
        assert!(matches!(
            parse_objective("\n \n"),
            Err(FtError::EvaluationParse { .. })
        ));
    }

    #[test]
    fn interrupted_calls_are_retried() {
        let mut attempts = 0;
        let result = retry_on_eintr(|| {
            attempts += 1;
            if attempts < 3 {
                Err(Errno::EINTR)
            } else {
                Ok(attempts)
            }
        });
        assert_eq!(result, Ok(3));
    }

    #[test]
    fn other_errors_are_not_retried() {
        let mut attempts = 0;
        let result: nix::Result<()> = retry_on_eintr(|| {
            attempts += 1;
            Err(Errno::ECHILD)
        });
        assert_eq!(result, Err(Errno::ECHILD));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn fn_evaluator_stays_orchestrator() {
        let mut evaluator = FnEvaluator::new(|x: &[f64]| x.iter().sum());
        assert_eq!(
            evaluator.evaluate(&[1.0, 2.5]).unwrap(),
            Role::Orchestrator { objective: 3.5 }
        );
    }
}
