//! Stock apply hook: thread-pool sizing.
//!
//! The rayon global pool can be built once per process, which makes its size
//! a natural target for fork-isolated tuning. Axis 0 of a vertex is the pool
//! size, axis 1 is how many independent batches the workload runs side by side.

use ft_types::{config_error, FtResult};
use rayon::ThreadPoolBuilder;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadingConfig {
    pub intra_op_threads: usize,
    pub inter_op_threads: usize,
}

impl ThreadingConfig {
    /// Truncate the first two axes to whole thread counts of at least one.
    pub fn from_vertex(vertex: &[f64]) -> FtResult<Self> {
        match vertex {
            [intra, inter, ..] => Ok(Self {
                intra_op_threads: thread_count(*intra),
                inter_op_threads: thread_count(*inter),
            }),
            _ => Err(config_error!(
                "threading needs two axes, vertex has {}",
                vertex.len()
            )),
        }
    }

    /// Build the rayon global pool with `intra_op_threads` workers. Fails if the
    /// global pool of this process already exists.
    pub fn install_global(&self) -> FtResult<()> {
        ThreadPoolBuilder::new()
            .num_threads(self.intra_op_threads)
            .thread_name(|i| format!("forktune-worker-{i}"))
            .build_global()
            .map_err(|e| config_error!("cannot size the global thread pool: {e}"))?;
        info!(
            intra_op_threads = self.intra_op_threads,
            inter_op_threads = self.inter_op_threads,
            "installed global thread pool"
        );
        Ok(())
    }

    /// Limit `inter_op_threads` to `max_inter_op` (and at least one). Vertices from
    /// expansion steps can carry arbitrarily large axis values.
    pub fn capped(self, max_inter_op: usize) -> Self {
        Self {
            inter_op_threads: self.inter_op_threads.min(max_inter_op).max(1),
            ..self
        }
    }

    /// Run `inter_op_threads` batches concurrently on the current rayon pool.
    ///
    /// One task is spawned per batch with no upper bound; cap the count with
    /// [`ThreadingConfig::capped`] when it comes from an unbounded vertex.
    pub fn for_each_batch<F>(&self, batch: F)
    where
        F: Fn(usize) + Sync,
    {
        rayon::scope(|scope| {
            for index in 0..self.inter_op_threads {
                let batch = &batch;
                scope.spawn(move |_| batch(index));
            }
        });
    }
}

fn thread_count(axis: f64) -> usize {
    // `as` saturates: NaN and negatives become 0.
    (axis as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ft_types::FtError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn truncates_and_clamps() {
        let config = ThreadingConfig::from_vertex(&[3.9, -2.0]).unwrap();
        assert_eq!(
            config,
            ThreadingConfig {
                intra_op_threads: 3,
                inter_op_threads: 1,
            }
        );

        let config = ThreadingConfig::from_vertex(&[0.4, 8.0, 100.0]).unwrap();
        assert_eq!(config.intra_op_threads, 1);
        assert_eq!(config.inter_op_threads, 8);
    }

    #[test]
    fn nan_axis_means_one_thread() {
        let config = ThreadingConfig::from_vertex(&[f64::NAN, f64::NAN]).unwrap();
        assert_eq!(config.intra_op_threads, 1);
        assert_eq!(config.inter_op_threads, 1);
    }

    #[test]
    fn cap_bounds_batch_concurrency() {
        let config = ThreadingConfig::from_vertex(&[4.0, 1e9]).unwrap().capped(16);
        assert_eq!(config.inter_op_threads, 16);
        assert_eq!(config.intra_op_threads, 4);

        let config = ThreadingConfig::from_vertex(&[4.0, 3.0]).unwrap().capped(16);
        assert_eq!(config.inter_op_threads, 3);

        let config = ThreadingConfig::from_vertex(&[4.0, 3.0]).unwrap().capped(0);
        assert_eq!(config.inter_op_threads, 1);
    }

    #[test]
    fn needs_two_axes() {
        assert!(matches!(
            ThreadingConfig::from_vertex(&[4.0]),
            Err(FtError::Configuration(_))
        ));
    }

    #[test]
    fn global_pool_installs_once() {
        let config = ThreadingConfig::from_vertex(&[2.0, 1.0]).unwrap();
        assert!(config.install_global().is_ok());
        assert!(matches!(
            config.install_global(),
            Err(FtError::Configuration(_))
        ));
    }

    #[test]
    fn every_batch_runs() {
        let config = ThreadingConfig::from_vertex(&[1.0, 5.0]).unwrap();
        let seen = AtomicUsize::new(0);
        // A local pool keeps the global one free for `global_pool_installs_once`.
        let pool = ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        pool.install(|| {
            config.for_each_batch(|index| {
                seen.fetch_add(index + 1, Ordering::SeqCst);
            })
        });
        assert_eq!(seen.load(Ordering::SeqCst), 1 + 2 + 3 + 4 + 5);
    }
}
