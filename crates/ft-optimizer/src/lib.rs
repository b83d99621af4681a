//! # ft-optimizer
//!
//! Nelder-Mead tuning of parameters that can only be applied once per process.
//!
//! Every objective evaluation forks the process. The child becomes the trial:
//! it receives the candidate vertex as the run's single result, applies it,
//! runs the real workload and prints the objective as its last stdout line.
//! The parent reads that line and keeps iterating.
//!
//! ```no_run
//! use ft_optimizer::tune;
//! use ft_types::RunConfig;
//!
//! let config = RunConfig::new(vec![22.0, 2.0]).with_step_sizes(vec![11.0, 1.0]);
//! for outcome in tune(config) {
//!     let outcome = outcome.unwrap();
//!     let (x, y) = (outcome.vertex[0], outcome.vertex[1]);
//!     println!("{}", (x - 5.0).powi(2) + (y - 7.0).powi(2));
//! }
//! ```

pub mod evaluator;
pub mod logging;
mod search;
pub mod simplex;
pub mod threading;
mod trial;

pub use evaluator::{parse_objective, Evaluator, FnEvaluator, ForkEvaluator};
pub use search::{tune, NelderMead};
pub use threading::ThreadingConfig;
pub use trial::{RunId, Step, TrialLog, TrialRecord};
