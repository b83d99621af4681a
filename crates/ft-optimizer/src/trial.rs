//! Per-evaluation trial records kept by the orchestrating process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use ft_types::Vertex;

/// Unique identifier of one optimizer run.
pub type RunId = Uuid;

/// Which part of the Nelder-Mead iteration asked for an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Initial,
    Reflection,
    Expansion,
    Contraction,
    Shrink,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Reflection => write!(f, "reflection"),
            Self::Expansion => write!(f, "expansion"),
            Self::Contraction => write!(f, "contraction"),
            Self::Shrink => write!(f, "shrink"),
        }
    }
}

/// One completed evaluation (one forked trial, seen from the parent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub id: Uuid,
    pub run_id: RunId,
    /// Zero-based position in the run's evaluation order.
    pub number: usize,
    /// Outer loop iteration the trial belongs to; initial scoring is iteration 0.
    pub iteration: usize,
    pub step: Step,
    pub vertex: Vertex,
    pub objective: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TrialRecord {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Ordered history of a run's trials.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrialLog {
    records: Vec<TrialRecord>,
}

impl TrialLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished trial; its `number` is assigned from the log length.
    pub fn record(
        &mut self,
        run_id: RunId,
        iteration: usize,
        step: Step,
        vertex: Vertex,
        objective: f64,
        started_at: DateTime<Utc>,
    ) -> &TrialRecord {
        let number = self.records.len();
        self.records.push(TrialRecord {
            id: Uuid::new_v4(),
            run_id,
            number,
            iteration,
            step,
            vertex,
            objective,
            started_at,
            finished_at: Utc::now(),
        });
        &self.records[number]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    /// Lowest objective seen. NaN objectives never win.
    pub fn best(&self) -> Option<&TrialRecord> {
        self.records
            .iter()
            .filter(|r| !r.objective.is_nan())
            .min_by(|a, b| a.objective.total_cmp(&b.objective))
    }

    pub fn count_by_step(&self, step: Step) -> usize {
        self.records.iter().filter(|r| r.step == step).count()
    }

    /// Serialize the history, e.g. for a post-run report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }
}
