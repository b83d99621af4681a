//! The Nelder-Mead engine.
//!
//! [`NelderMead`] is an iterator that yields exactly one [`Outcome`]. In the
//! orchestrating process that is the best vertex after convergence or after
//! `max_iterations` loops. In a forked trial process it is the candidate the
//! trial was forked for, and the caller is expected to run its real workload
//! with that candidate applied and print the objective as its last line.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ft_types::{FtResult, Outcome, Role, RunConfig, ScoredVertex, Simplex, Termination, Vertex};

use crate::evaluator::{Evaluator, ForkEvaluator};
use crate::simplex;
use crate::trial::{RunId, Step, TrialLog};

type IterationHook<'a> = Box<dyn FnMut(&[ScoredVertex]) + 'a>;
type ApplyHook<'a> = Box<dyn FnMut(&[f64]) -> FtResult<()> + 'a>;

/// Start a fork-isolated run.
pub fn tune(config: RunConfig) -> NelderMead<'static, ForkEvaluator> {
    NelderMead::new(config, ForkEvaluator::new())
}

pub struct NelderMead<'a, E>
where
    E: Evaluator,
{
    config: RunConfig,
    evaluator: E,
    on_iteration: Option<IterationHook<'a>>,
    apply: Option<ApplyHook<'a>>,
    run_id: RunId,
    trials: TrialLog,
    iteration: usize,
    evaluations: usize,
    finished: bool,
}

impl<'a, E> NelderMead<'a, E>
where
    E: Evaluator,
{
    pub fn new(config: RunConfig, evaluator: E) -> Self {
        Self {
            config,
            evaluator,
            on_iteration: None,
            apply: None,
            run_id: Uuid::new_v4(),
            trials: TrialLog::new(),
            iteration: 0,
            evaluations: 0,
            finished: false,
        }
    }

    /// Called in the orchestrating process with the ordered simplex at the start
    /// of every iteration, before the convergence check.
    pub fn with_on_iteration(mut self, hook: impl FnMut(&[ScoredVertex]) + 'a) -> Self {
        self.on_iteration = Some(Box::new(hook));
        self
    }

    /// Called with the terminal vertex just before it is yielded, in whichever
    /// process yields it. This is where once-per-process configuration goes; an
    /// error from the hook is yielded instead of the outcome.
    pub fn with_apply(mut self, hook: impl FnMut(&[f64]) -> FtResult<()> + 'a) -> Self {
        self.apply = Some(Box::new(hook));
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Trials scored so far by this process.
    pub fn trials(&self) -> &TrialLog {
        &self.trials
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    fn run(&mut self) -> FtResult<Outcome> {
        let vertices = simplex::initial_vertices(
            &self.config.initial_vertex,
            self.config.step_sizes.as_deref(),
        )?;
        info!(
            run_id = %self.run_id,
            dimension = self.config.initial_vertex.len(),
            max_iterations = self.config.max_iterations,
            threshold = self.config.convergence_threshold,
            "starting Nelder-Mead run"
        );

        let mut points = Vec::with_capacity(vertices.len());
        for vertex in vertices {
            let Some(objective) = self.score(&vertex, Step::Initial)? else {
                return self.diverge(vertex);
            };
            points.push(ScoredVertex::new(objective, vertex));
        }
        let mut simplex = Simplex::from_scored(points);

        let mut termination = Termination::IterationsExhausted;
        for iteration in 1..=self.config.max_iterations {
            self.iteration = iteration;
            simplex.order();
            self.report(&simplex);

            let spread = simplex.objective_std_dev();
            if spread < self.config.convergence_threshold {
                debug!(iteration, spread, "objective spread below threshold");
                termination = Termination::Converged;
                break;
            }

            if let Some(candidate) = self.iterate(&mut simplex)? {
                return self.diverge(candidate);
            }
        }

        simplex.order();
        let best = simplex.best().clone();
        info!(
            run_id = %self.run_id,
            %termination,
            iterations = self.iteration,
            evaluations = self.evaluations,
            objective = best.objective,
            vertex = ?best.vertex,
            "Nelder-Mead run finished"
        );
        if let Some(apply) = self.apply.as_mut() {
            apply(&best.vertex)?;
        }
        Ok(Outcome {
            run_id: self.run_id,
            vertex: best.vertex,
            objective: Some(best.objective),
            termination,
            iterations: self.iteration,
            evaluations: self.evaluations,
        })
    }

    /// One reflection/expansion/contraction/shrink step on an ordered simplex.
    /// Returns the candidate vertex if an evaluation isolated this process.
    fn iterate(&mut self, simplex: &mut Simplex) -> FtResult<Option<Vertex>> {
        let center = simplex::centroid(simplex);

        let reflected = simplex::reflect(simplex, &center);
        let Some(reflected_objective) = self.score(&reflected, Step::Reflection)? else {
            return Ok(Some(reflected));
        };
        let best_objective = simplex.best().objective;
        if best_objective <= reflected_objective
            && reflected_objective < simplex.second_worst().objective
        {
            simplex.replace_worst(ScoredVertex::new(reflected_objective, reflected));
            return Ok(None);
        }

        if reflected_objective < best_objective {
            let expanded = simplex::expand(&reflected, &center);
            let Some(expanded_objective) = self.score(&expanded, Step::Expansion)? else {
                return Ok(Some(expanded));
            };
            if expanded_objective < reflected_objective {
                simplex.replace_worst(ScoredVertex::new(expanded_objective, expanded));
            } else {
                simplex.replace_worst(ScoredVertex::new(reflected_objective, reflected));
            }
            return Ok(None);
        }

        let contracted = simplex::contract(simplex, &center);
        let Some(contracted_objective) = self.score(&contracted, Step::Contraction)? else {
            return Ok(Some(contracted));
        };
        if contracted_objective < simplex.worst().objective {
            simplex.replace_worst(ScoredVertex::new(contracted_objective, contracted));
            return Ok(None);
        }

        simplex::shrink(simplex);
        for index in 1..simplex.len() {
            let vertex = simplex.points()[index].vertex.clone();
            let Some(objective) = self.score(&vertex, Step::Shrink)? else {
                return Ok(Some(vertex));
            };
            simplex.points_mut()[index].objective = objective;
        }
        Ok(None)
    }

    /// Evaluate one vertex. `None` means this process is now the isolated trial.
    fn score(&mut self, vertex: &[f64], step: Step) -> FtResult<Option<f64>> {
        let started_at = Utc::now();
        self.evaluations += 1;
        match self.evaluator.evaluate(vertex)? {
            Role::Orchestrator { objective } => {
                if !objective.is_finite() {
                    warn!(%step, ?vertex, objective, "trial reported a non-finite objective");
                }
                let record = self.trials.record(
                    self.run_id,
                    self.iteration,
                    step,
                    vertex.to_vec(),
                    objective,
                    started_at,
                );
                debug!(trial = record.number, %step, ?vertex, objective, "trial scored");
                Ok(Some(objective))
            }
            Role::Isolated => Ok(None),
        }
    }

    fn report(&mut self, simplex: &Simplex) {
        debug!(iteration = self.iteration, "simplex with objectives:");
        for point in simplex.points() {
            debug!("\t{point}");
        }
        if let Some(hook) = self.on_iteration.as_mut() {
            hook(simplex.points());
        }
    }

    fn diverge(&mut self, vertex: Vertex) -> FtResult<Outcome> {
        if let Some(apply) = self.apply.as_mut() {
            apply(&vertex)?;
        }
        Ok(Outcome {
            run_id: self.run_id,
            vertex,
            objective: None,
            termination: Termination::Isolated,
            iterations: self.iteration,
            evaluations: self.evaluations,
        })
    }
}

impl<E> Iterator for NelderMead<'_, E>
where
    E: Evaluator,
{
    type Item = FtResult<Outcome>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.finished = true;
        Some(self.run())
    }
}
