//! Tunes the rayon pool size and batch concurrency for a CPU-bound workload.
//!
//! Each trial process builds its global pool once, times the workload and
//! prints the elapsed seconds.

use std::time::Instant;

use ft_optimizer::{logging, tune, ThreadingConfig};
use ft_types::RunConfig;
use rayon::prelude::*;
use tracing::info;

const CONFIG_ENV: &str = "FORKTUNE_CONFIG";
const BATCH_SIZE: u64 = 2_000_000;
const BATCHES: usize = 16;

fn workload(threading: &ThreadingConfig) -> f64 {
    let start = Instant::now();
    let per_lane = BATCHES.div_ceil(threading.inter_op_threads);
    threading.for_each_batch(|lane| {
        for batch in (lane * per_lane)..((lane + 1) * per_lane).min(BATCHES) {
            let offset = batch as u64 * BATCH_SIZE;
            let sum: f64 = (offset..offset + BATCH_SIZE)
                .into_par_iter()
                .map(|i| (i as f64).sqrt())
                .sum();
            std::hint::black_box(sum);
        }
    });
    start.elapsed().as_secs_f64()
}

fn main() -> anyhow::Result<()> {
    logging::init_from_env()?;

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => RunConfig::from_json_file(path)?,
        Err(_) => RunConfig::new(vec![2.0, 2.0])
            .with_step_sizes(vec![4.0, 2.0])
            .with_max_iterations(20),
    };

    let tuner = tune(config)
        .with_apply(|vertex| ThreadingConfig::from_vertex(vertex)?.install_global());

    for outcome in tuner {
        let outcome = outcome?;
        let threading = ThreadingConfig::from_vertex(&outcome.vertex)?.capped(BATCHES);
        if !outcome.is_isolated() {
            info!(?threading, termination = %outcome.termination, "tuned thread pool");
            println!("best threading: {threading:?}");
        }
        println!("{}", workload(&threading));
    }

    Ok(())
}
