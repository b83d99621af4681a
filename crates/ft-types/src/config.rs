//! Run configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::FtResult;
use crate::simplex::{StepSizes, Vertex};

pub const DEFAULT_MAX_ITERATIONS: usize = 200;
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 1e-2;

/// Options recognized by a Nelder-Mead run.
///
/// Reporting and apply hooks are closures and live on the engine, not here, so
/// this struct stays plain data that can be loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub initial_vertex: Vertex,

    /// One step per axis; every axis steps by 1.0 when absent.
    #[serde(default)]
    pub step_sizes: Option<StepSizes>,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Population standard deviation of the objectives below which the run stops.
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_convergence_threshold() -> f64 {
    DEFAULT_CONVERGENCE_THRESHOLD
}

impl RunConfig {
    pub fn new(initial_vertex: Vertex) -> Self {
        Self {
            initial_vertex,
            step_sizes: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
        }
    }

    pub fn with_step_sizes(mut self, step_sizes: StepSizes) -> Self {
        self.step_sizes = Some(step_sizes);
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn from_json_str(json: &str) -> FtResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> FtResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
