//! Successive Halving under a global time/evaluation budget.
//!
//! A sampled population is evaluated at increasing checkpoints of a fidelity
//! schedule; after every round the better half (rounded up) survives. Cost is
//! accounted per evaluation, and the evaluation that pushes cumulative time to
//! the ceiling is rolled back before returning.

use nb_types::{BudgetUsage, Candidate, FidelitySchedule, NbResult, SearchError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::algorithm::{RoundSummary, SearchAlgorithm, SearchResult, SearchRng, Termination};
use crate::problem::{EvaluationRequest, Problem};
use crate::space::SearchSpace;

/// Option names accepted by [`SuccessiveHalvingConfig::from_options`],
/// including the legacy aliases.
const KNOWN_OPTIONS: &[&str] = &[
    "population_size",
    "n_candidate",
    "fidelity_schedule",
    "list_iepoch",
    "metric",
    "use_proxy_metric",
    "using_zc_metric",
    "max_sampling_attempts",
];

fn default_metric() -> String {
    "val_acc".to_string()
}

fn default_max_sampling_attempts() -> usize {
    10_000
}

/// Configuration of a Successive-Halving search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuccessiveHalvingConfig {
    /// Number of candidates sampled for the first round.
    #[serde(alias = "n_candidate")]
    pub population_size: usize,

    /// Checkpoints evaluated round by round.
    #[serde(alias = "list_iepoch")]
    pub fidelity_schedule: FidelitySchedule,

    /// Base metric name; each round asks for `"{metric}_{checkpoint}"`.
    #[serde(default = "default_metric")]
    pub metric: String,

    /// Ask the evaluator for its cheap proxy metric instead of training.
    #[serde(default, alias = "using_zc_metric")]
    pub use_proxy_metric: bool,

    /// Draws allowed per candidate before sampling gives up.
    #[serde(default = "default_max_sampling_attempts")]
    pub max_sampling_attempts: usize,
}

impl SuccessiveHalvingConfig {
    pub fn new(population_size: usize, fidelity_schedule: FidelitySchedule) -> Self {
        Self {
            population_size,
            fidelity_schedule,
            metric: default_metric(),
            use_proxy_metric: false,
            max_sampling_attempts: default_max_sampling_attempts(),
        }
    }

    pub fn with_metric(mut self, metric: &str) -> Self {
        self.metric = metric.to_string();
        self
    }

    pub fn with_proxy_metric(mut self, enabled: bool) -> Self {
        self.use_proxy_metric = enabled;
        self
    }

    pub fn with_max_sampling_attempts(mut self, attempts: usize) -> Self {
        self.max_sampling_attempts = attempts;
        self
    }

    /// Build a configuration from a JSON option map, rejecting unknown keys.
    pub fn from_options(options: &serde_json::Map<String, serde_json::Value>) -> NbResult<Self> {
        if let Some(key) = options.keys().find(|key| !KNOWN_OPTIONS.contains(&key.as_str())) {
            return Err(SearchError::UnknownOption { key: key.clone() }.into());
        }

        let schedule = options
            .get("fidelity_schedule")
            .or_else(|| options.get("list_iepoch"));
        let schedule_missing = match schedule {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::Array(checkpoints)) => checkpoints.is_empty(),
            Some(_) => false,
        };
        if schedule_missing {
            return Err(SearchError::EmptySchedule.into());
        }

        serde_json::from_value(serde_json::Value::Object(options.clone()))
            .map_err(|e| nb_types::config_error!("invalid successive halving options: {e}"))
    }
}

/// Successive-Halving scheduler bound to a problem.
#[derive(Debug)]
pub struct SuccessiveHalving<P> {
    config: SuccessiveHalvingConfig,
    problem: P,
}

impl<P: Problem> SuccessiveHalving<P> {
    pub fn new(config: SuccessiveHalvingConfig, problem: P) -> Self {
        Self { config, problem }
    }

    pub fn config(&self) -> &SuccessiveHalvingConfig {
        &self.config
    }

    /// Replace the configuration from an option map. On error the current
    /// configuration is left untouched.
    pub fn configure(&mut self, options: &serde_json::Map<String, serde_json::Value>) -> NbResult<()> {
        self.config = SuccessiveHalvingConfig::from_options(options)?;
        Ok(())
    }

    /// Bind a different problem, returning the previous one.
    pub fn bind(&mut self, problem: P) -> P {
        std::mem::replace(&mut self.problem, problem)
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn into_problem(self) -> P {
        self.problem
    }

    /// Draw the initial population by rejection sampling.
    fn sample(&self, rng: &mut SearchRng) -> NbResult<Vec<Candidate>> {
        let space = self.problem.search_space();
        let mut population = Vec::with_capacity(self.config.population_size);
        for id in 0..self.config.population_size {
            let genotype = space.sample_valid(&mut *rng, self.config.max_sampling_attempts)?;
            population.push(Candidate::new(id, genotype));
        }
        debug!("Sampled {} candidates", population.len());
        Ok(population)
    }

    /// Run the halving tournament over `population`.
    fn tournament(&mut self, mut population: Vec<Candidate>) -> NbResult<SearchResult> {
        if population.is_empty() {
            return Err(SearchError::EmptyPopulation.into());
        }

        let schedule = &self.config.fidelity_schedule;
        let budget = self.problem.budget();

        let mut checkpoint = 0;
        let mut iepoch = schedule.first_checkpoint();
        let mut last_iepoch = 0;
        let mut usage = BudgetUsage::new();
        let mut best: Option<Candidate> = None;
        let mut best_score = f64::NEG_INFINITY;
        let mut rounds = Vec::new();

        // Never incremented, so the evaluation ceiling does not stop a run;
        // only the time ceiling does.
        let n_eval = 0;
        let mut last_round = schedule.is_final(iepoch);

        while usage.within(&budget, n_eval) {
            let request = EvaluationRequest::new(&self.config.metric, iepoch, self.config.use_proxy_metric);
            info!(
                "Round {}: evaluating {} candidates at epoch {}",
                checkpoint + 1,
                population.len(),
                iepoch
            );

            for (evaluated, candidate) in population.iter_mut().enumerate() {
                let elapsed = self.problem.evaluate(candidate, &request)?;
                let epochs = incremental_epochs(candidate, last_iepoch);
                usage.charge(elapsed, epochs);

                if usage.time_exhausted(&budget) {
                    usage.refund(elapsed, epochs);
                    warn!(
                        "Time budget of {:.2}s reached while evaluating {}; discarding its {:.2}s",
                        budget.max_time,
                        candidate.network_id(),
                        elapsed
                    );
                    rounds.push(RoundSummary {
                        checkpoint: iepoch,
                        evaluated,
                        survivors: 0,
                        best_score: best.as_ref().and_then(|b| b.score),
                    });
                    return Ok(SearchResult::new(best, usage, Termination::TimeBudgetExhausted, rounds));
                }

                if candidate.fitness() > best_score {
                    best_score = candidate.fitness();
                    best = Some(candidate.clone());
                }
            }

            rank(&mut population);
            let evaluated = population.len();
            population.truncate(evaluated.div_ceil(2));
            rounds.push(RoundSummary {
                checkpoint: iepoch,
                evaluated,
                survivors: population.len(),
                best_score: best.as_ref().and_then(|b| b.score),
            });
            info!(
                "Round {} done: kept {} of {}, best {:.4}, {:.2}s / {} epochs used",
                checkpoint + 1,
                population.len(),
                evaluated,
                best_score,
                usage.total_time,
                usage.total_epoch
            );

            if population.len() == 1 {
                return Ok(SearchResult::new(best, usage, Termination::SingleSurvivor, rounds));
            }
            if last_round {
                return Ok(SearchResult::new(best, usage, Termination::FinalCheckpoint, rounds));
            }

            checkpoint += 1;
            last_iepoch = iepoch;
            iepoch = schedule.get(checkpoint).ok_or_else(|| {
                nb_types::internal_error!("fidelity schedule has no checkpoint at index {checkpoint}")
            })?;
            if schedule.is_final(iepoch) {
                last_round = true;
            }
        }

        Ok(SearchResult::new(best, usage, Termination::BudgetExhausted, rounds))
    }
}

impl<P: Problem> SearchAlgorithm for SuccessiveHalving<P> {
    fn name(&self) -> &str {
        "successive_halving"
    }

    fn search(&mut self, rng: &mut SearchRng) -> NbResult<SearchResult> {
        let population = self.sample(rng)?;
        self.tournament(population)
    }
}

/// Epochs actually trained by the last evaluation of `candidate`, given that
/// every survivor had already been paid up to `last_iepoch`.
fn incremental_epochs(candidate: &Candidate, last_iepoch: u32) -> u64 {
    let latest = candidate.history.latest_iepoch();
    if latest < last_iepoch {
        warn!(
            "{} reports checkpoint {} behind the paid-for {}",
            candidate.network_id(),
            latest,
            last_iepoch
        );
    }
    u64::from(latest.saturating_sub(last_iepoch))
}

/// Sort by score, best first: a stable ascending sort, then reversed, so
/// equal scores end up in reverse population order.
fn rank(population: &mut [Candidate]) {
    population.sort_by(|a, b| a.fitness().total_cmp(&b.fitness()));
    population.reverse();
}
