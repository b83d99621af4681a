//! Real fork/pipe round trips. Kept in a single test so the harness never forks
//! while another test thread is running.

use ft_optimizer::{tune, Evaluator, ForkEvaluator};
use ft_types::{FtError, Role, RunConfig, Termination};

/// Write the trial output straight to fd 1 and leave; the harness's output
/// capture only intercepts the print macros.
fn finish_trial(output: &str) -> ! {
    let _ = nix::unistd::write(std::io::stdout(), output.as_bytes());
    std::process::exit(0);
}

fn forked_value_reaches_parent() {
    let mut evaluator = ForkEvaluator::new();
    match evaluator.evaluate(&[1.0]).unwrap() {
        Role::Isolated => finish_trial("warming up\n2.75\n"),
        Role::Orchestrator { objective } => assert_eq!(objective, 2.75),
    }
    assert_eq!(evaluator.trials(), 1);
}

fn unparsable_output_is_reported() {
    let mut evaluator = ForkEvaluator::new();
    match evaluator.evaluate(&[1.0]) {
        Ok(Role::Isolated) => finish_trial("1.0\nno number here\n"),
        other => assert!(matches!(other, Err(FtError::EvaluationParse { .. }))),
    }
}

fn forked_run_converges() {
    let config = RunConfig::new(vec![6.0, 8.0]).with_convergence_threshold(1e-6);
    for outcome in tune(config) {
        let outcome = outcome.unwrap();
        let (x, y) = (outcome.vertex[0], outcome.vertex[1]);
        let objective = (x - 5.0).powi(2) + (y - 7.0).powi(2);
        if outcome.is_isolated() {
            finish_trial(&format!("{objective}\n"));
        }
        assert_eq!(outcome.termination, Termination::Converged);
        assert!((x - 5.0).abs() < 1e-2 && (y - 7.0).abs() < 1e-2, "{x}, {y}");
    }
}

#[test]
fn fork_round_trips() {
    forked_value_reaches_parent();
    unparsable_output_is_reported();
    forked_run_converges();
}
