//! Run-file driven searches against a surrogate training problem.
//!
//! A run file is JSON:
//!
//! ```json
//! {
//!   "seed": 42,
//!   "algorithm": { "population_size": 32, "fidelity_schedule": [5, 10, 20, 40] },
//!   "problem": { "positions": 8, "num_ops": 5, "seconds_per_epoch": 30.0, "max_time": 36000.0 }
//! }
//! ```

use anyhow::Context;
use nb_search::{
    track_run, DiscreteSearchSpace, RunRecord, SearchResult, SuccessiveHalving,
    SuccessiveHalvingConfig, SurrogateProblem,
};
use nb_types::{Budget, Genotype, NbResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

fn default_seed() -> u64 {
    42
}

fn default_proxy_cost() -> f64 {
    1.0
}

fn default_curve_scale() -> f64 {
    20.0
}

/// Top-level run file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Successive-Halving options, see `SuccessiveHalvingConfig::from_options`.
    pub algorithm: serde_json::Map<String, serde_json::Value>,
    pub problem: SurrogateSettings,
}

impl RunFile {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read run file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid run file {}", path.display()))
    }
}

/// Shape, cost model and budget of the surrogate problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurrogateSettings {
    /// Genotype length.
    pub positions: usize,
    /// Operations available at each position.
    pub num_ops: u32,
    pub seconds_per_epoch: f64,
    #[serde(default = "default_proxy_cost")]
    pub proxy_cost: f64,
    /// Reject genotypes using any single operation more often than this.
    #[serde(default)]
    pub max_repeated_op: Option<usize>,
    /// Epoch count at which the learning curve reaches ~63% of its plateau.
    #[serde(default = "default_curve_scale")]
    pub curve_scale: f64,
    #[serde(default)]
    pub max_evaluations: Option<usize>,
    /// Seconds; unlimited when absent.
    #[serde(default)]
    pub max_time: Option<f64>,
}

impl SurrogateSettings {
    pub fn budget(&self) -> Budget {
        let unlimited = Budget::unlimited();
        Budget::new(
            self.max_evaluations.unwrap_or(unlimited.max_evaluations),
            self.max_time.unwrap_or(unlimited.max_time),
        )
    }

    pub fn search_space(&self) -> NbResult<DiscreteSearchSpace> {
        let space = DiscreteSearchSpace::uniform(self.positions, self.num_ops)?;
        Ok(match self.max_repeated_op {
            Some(limit) => space.with_validator(move |g| max_op_count(g) <= limit),
            None => space,
        })
    }
}

fn max_op_count(genotype: &Genotype) -> usize {
    let mut counts = std::collections::HashMap::new();
    for &choice in genotype.choices() {
        *counts.entry(choice).or_insert(0usize) += 1;
    }
    counts.into_values().max().unwrap_or(0)
}

/// Synthetic validation accuracy (0-100) of `genotype` after `iepoch` epochs:
/// a per-architecture plateau scaled by a saturating learning curve.
pub fn synthetic_score(genotype: &Genotype, iepoch: u32, curve_scale: f64) -> f64 {
    let positions = genotype.len().max(1) as f64;
    let plateau = genotype
        .choices()
        .iter()
        .enumerate()
        .map(|(i, &c)| ((c as f64 + 1.0) * (i as f64 + 1.0)).sin().abs())
        .sum::<f64>()
        / positions;
    let progress = 1.0 - (-(iepoch as f64) / curve_scale).exp();
    100.0 * plateau * progress
}

/// Build the scheduler described by `run_file`, run it and return the
/// record together with the search outcome.
pub fn execute(run_file: &RunFile) -> NbResult<(RunRecord, NbResult<SearchResult>)> {
    let config = SuccessiveHalvingConfig::from_options(&run_file.algorithm)?;
    let settings = &run_file.problem;
    let curve_scale = settings.curve_scale;

    let problem = SurrogateProblem::new(
        settings.search_space()?,
        move |g: &Genotype, iepoch: u32| synthetic_score(g, iepoch, curve_scale),
        settings.seconds_per_epoch,
    )
    .with_proxy_cost(settings.proxy_cost)
    .with_budget(settings.budget());

    info!(
        "Searching {} positions x {} ops, population {}, schedule {:?}",
        settings.positions,
        settings.num_ops,
        config.population_size,
        config.fidelity_schedule.checkpoints()
    );

    let mut scheduler = SuccessiveHalving::new(config, problem);
    Ok(track_run(&mut scheduler, run_file.seed))
}
