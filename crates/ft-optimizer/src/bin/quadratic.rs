//! Minimizes (x - 5)^2 + (y - 7)^2 with one forked trial per evaluation.

use ft_optimizer::{logging, tune};
use ft_types::RunConfig;

const CONFIG_ENV: &str = "FORKTUNE_CONFIG";

fn main() -> anyhow::Result<()> {
    logging::init_from_env()?;

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => RunConfig::from_json_file(path)?,
        Err(_) => RunConfig::new(vec![22.0, 2.0])
            .with_step_sizes(vec![11.0, 1.0])
            .with_convergence_threshold(1e-8),
    };

    let tuner = tune(config).with_apply(|vertex| {
        println!("applying {vertex:?}");
        Ok(())
    });

    for outcome in tuner {
        let outcome = outcome?;
        let (x, y) = (outcome.vertex[0], outcome.vertex[1]);
        if !outcome.is_isolated() {
            println!(
                "Optimal parameters for (x - 5)^2 + (y - 7)^2 are: {:?} ({}, {} evaluations)",
                outcome.vertex, outcome.termination, outcome.evaluations
            );
        }
        // Last line of a trial's output is its objective.
        println!("{}", (x - 5.0).powi(2) + (y - 7.0).powi(2));
    }

    Ok(())
}
