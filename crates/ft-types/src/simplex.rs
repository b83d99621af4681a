//! Vertices, scored vertices and the simplex that holds them.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One candidate parameter setting.
pub type Vertex = Vec<f64>;

/// Optional per-axis step sizes used to build the initial simplex.
pub type StepSizes = Vec<f64>;

/// A vertex together with the objective measured for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredVertex {
    pub objective: f64,
    pub vertex: Vertex,
}

impl ScoredVertex {
    pub fn new(objective: f64, vertex: Vertex) -> Self {
        Self { objective, vertex }
    }
}

impl fmt::Display for ScoredVertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.vertex, self.objective)
    }
}

/// The n+1 scored points of a Nelder-Mead run.
///
/// The number of points never changes after construction. Once [`Simplex::order`]
/// has run, index 0 holds the best (lowest) objective and the last index the worst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simplex {
    points: Vec<ScoredVertex>,
}

impl Simplex {
    /// Wrap already scored points. Callers are responsible for passing n+1 points
    /// of dimension n.
    pub fn from_scored(points: Vec<ScoredVertex>) -> Self {
        Self { points }
    }

    /// Sort ascending by objective. NaN objectives of either sign go last, so a
    /// NaN point is always the first candidate for replacement.
    pub fn order(&mut self) {
        self.points.sort_unstable_by(|a, b| {
            a.objective
                .is_nan()
                .cmp(&b.objective.is_nan())
                .then_with(|| a.objective.total_cmp(&b.objective))
        });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dimension n of the vertices.
    pub fn dimension(&self) -> usize {
        self.points.first().map(|p| p.vertex.len()).unwrap_or(0)
    }

    pub fn points(&self) -> &[ScoredVertex] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [ScoredVertex] {
        &mut self.points
    }

    pub fn best(&self) -> &ScoredVertex {
        &self.points[0]
    }

    pub fn worst(&self) -> &ScoredVertex {
        &self.points[self.points.len() - 1]
    }

    /// The point just better than the worst. For a one-dimensional simplex this
    /// is the best point.
    pub fn second_worst(&self) -> &ScoredVertex {
        &self.points[self.points.len().saturating_sub(2)]
    }

    pub fn replace_worst(&mut self, replacement: ScoredVertex) {
        let last = self.points.len() - 1;
        self.points[last] = replacement;
    }

    pub fn objectives(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.objective)
    }

    /// Population standard deviation of the objectives.
    pub fn objective_std_dev(&self) -> f64 {
        let count = self.points.len() as f64;
        if count == 0.0 {
            return 0.0;
        }
        let mean = self.objectives().sum::<f64>() / count;
        let variance = self
            .objectives()
            .map(|o| (o - mean) * (o - mean))
            .sum::<f64>()
            / count;
        variance.sqrt()
    }
}

/// The result of one objective evaluation, seen from the process that asked for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Role {
    /// Still the long-lived driving process; the trial produced this objective.
    Orchestrator { objective: f64 },
    /// This process is the freshly forked trial context and must stop iterating.
    Isolated,
}

impl Role {
    pub fn is_isolated(&self) -> bool {
        matches!(self, Role::Isolated)
    }
}

/// Why a run produced its terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Objective spread fell below the convergence threshold.
    Converged,
    /// `max_iterations` loops ran without converging.
    IterationsExhausted,
    /// The current process became an isolated trial context.
    Isolated,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::IterationsExhausted => write!(f, "iterations exhausted"),
            Self::Isolated => write!(f, "isolated"),
        }
    }
}

/// The single terminal value a run yields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub run_id: Uuid,
    pub vertex: Vertex,
    /// Known only on the orchestrator side; an isolated trial has not been scored yet.
    pub objective: Option<f64>,
    pub termination: Termination,
    pub iterations: usize,
    pub evaluations: usize,
}

impl Outcome {
    pub fn is_isolated(&self) -> bool {
        self.termination == Termination::Isolated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Simplex {
        Simplex::from_scored(vec![
            ScoredVertex::new(3.0, vec![9.0, 11.0]),
            ScoredVertex::new(1.0, vec![2.0, 3.0]),
            ScoredVertex::new(2.0, vec![4.0, 7.0]),
        ])
    }

    #[test]
    fn order_puts_best_first_and_worst_last() {
        let mut simplex = sample();
        simplex.order();
        assert_eq!(simplex.best().objective, 1.0);
        assert_eq!(simplex.second_worst().objective, 2.0);
        assert_eq!(simplex.worst().objective, 3.0);
        assert_eq!(simplex.dimension(), 2);
        assert_eq!(simplex.len(), 3);
    }

    #[test]
    fn nan_sorts_last_whatever_its_sign() {
        let negative_nan = -f64::NAN;
        assert!(negative_nan.is_sign_negative());

        let mut simplex = Simplex::from_scored(vec![
            ScoredVertex::new(2.0, vec![1.0]),
            ScoredVertex::new(negative_nan, vec![0.0]),
            ScoredVertex::new(f64::NAN, vec![3.0]),
            ScoredVertex::new(-5.0, vec![2.0]),
        ]);
        simplex.order();
        assert_eq!(simplex.best().objective, -5.0);
        assert_eq!(simplex.points()[1].objective, 2.0);
        assert!(simplex.points()[2].objective.is_nan());
        assert!(simplex.worst().objective.is_nan());
    }

    #[test]
    fn population_std_dev() {
        let simplex = sample();
        let expected = (2.0f64 / 3.0).sqrt();
        assert!((simplex.objective_std_dev() - expected).abs() < 1e-12);
    }

    #[test]
    fn identical_objectives_have_zero_spread() {
        let simplex = Simplex::from_scored(vec![
            ScoredVertex::new(4.2, vec![0.0]),
            ScoredVertex::new(4.2, vec![1.0]),
        ]);
        assert_eq!(simplex.objective_std_dev(), 0.0);
    }

    #[test]
    fn replace_worst_keeps_size() {
        let mut simplex = sample();
        simplex.order();
        simplex.replace_worst(ScoredVertex::new(0.5, vec![0.0, 0.0]));
        assert_eq!(simplex.len(), 3);
        assert_eq!(simplex.worst().objective, 0.5);
    }
}
