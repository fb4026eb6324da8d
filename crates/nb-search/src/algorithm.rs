//! The search algorithm contract shared by every scheduler.

use nb_types::{BudgetUsage, Candidate, NbResult, SearchError};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// The single source of randomness for a run.
pub type SearchRng = rand_chacha::ChaCha8Rng;

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The population was halved down to one candidate.
    SingleSurvivor,
    /// The round at the final checkpoint of the schedule completed.
    FinalCheckpoint,
    /// An evaluation pushed cumulative time to the ceiling and was rolled back.
    TimeBudgetExhausted,
    /// The budget check at the start of a round failed.
    BudgetExhausted,
}

/// Outcome of one evaluate-then-halve pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub checkpoint: u32,
    /// Evaluations that were counted; an aborted round counts only those
    /// before the rollback.
    pub evaluated: usize,
    /// Population size kept for the next round (0 for an aborted round).
    pub survivors: usize,
    pub best_score: Option<f64>,
}

/// What a search hands back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Snapshot of the best candidate observed; `None` when the budget ran
    /// out before any evaluation counted.
    pub best: Option<Candidate>,
    /// Cumulative evaluation time, in seconds.
    pub total_time: f64,
    /// Cumulative fidelity units (epochs) paid for.
    pub total_epoch: u64,
    pub termination: Termination,
    pub rounds: Vec<RoundSummary>,
}

impl SearchResult {
    pub fn new(
        best: Option<Candidate>,
        usage: BudgetUsage,
        termination: Termination,
        rounds: Vec<RoundSummary>,
    ) -> Self {
        Self {
            best,
            total_time: usage.total_time,
            total_epoch: usage.total_epoch,
            termination,
            rounds,
        }
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best.as_ref().and_then(|candidate| candidate.score)
    }
}

/// Common trait for all search algorithms.
///
/// Callers only use [`SearchAlgorithm::run`]; implementations provide
/// [`SearchAlgorithm::search`].
pub trait SearchAlgorithm {
    /// Human-readable algorithm name.
    fn name(&self) -> &str;

    /// The algorithm-specific search procedure.
    fn search(&mut self, _rng: &mut SearchRng) -> NbResult<SearchResult> {
        Err(SearchError::Unimplemented {
            algorithm: self.name().to_string(),
        }
        .into())
    }

    /// Seed the run's randomness from `seed`, then search.
    fn run(&mut self, seed: u64) -> NbResult<SearchResult> {
        let mut rng = SearchRng::seed_from_u64(seed);
        info!("Starting {} search with seed {}", self.name(), seed);

        let result = self.search(&mut rng)?;

        info!(
            "{} search finished ({:?}): best score {:?}, {:.2}s, {} epochs",
            self.name(),
            result.termination,
            result.best_score(),
            result.total_time,
            result.total_epoch
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nb_types::{Genotype, NbError};
    use rand::Rng;

    struct Unfinished;

    impl SearchAlgorithm for Unfinished {
        fn name(&self) -> &str {
            "unfinished"
        }
    }

    /// Returns a single candidate whose genotype is drawn from the run's RNG.
    struct OneShot;

    impl SearchAlgorithm for OneShot {
        fn name(&self) -> &str {
            "one_shot"
        }

        fn search(&mut self, rng: &mut SearchRng) -> NbResult<SearchResult> {
            let genotype = Genotype::new((0..8).map(|_| rng.random_range(0..5)).collect());
            Ok(SearchResult::new(
                Some(Candidate::new(0, genotype)),
                BudgetUsage::new(),
                Termination::SingleSurvivor,
                Vec::new(),
            ))
        }
    }

    #[test]
    fn missing_search_procedure_is_an_error() {
        let err = Unfinished.run(42).unwrap_err();
        match err {
            NbError::Search(SearchError::Unimplemented { algorithm }) => {
                assert_eq!(algorithm, "unfinished")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn run_is_reproducible_for_a_seed() {
        let first = OneShot.run(7).unwrap();
        let second = OneShot.run(7).unwrap();
        assert_eq!(first.best, second.best);
    }

    #[test]
    fn best_score_reads_snapshot() {
        let mut candidate = Candidate::new(0, Genotype::new(vec![1]));
        candidate.record_evaluation(10, "val_acc_10", 0.8, 1.0);
        let result = SearchResult::new(
            Some(candidate),
            BudgetUsage::new(),
            Termination::FinalCheckpoint,
            Vec::new(),
        );
        assert_eq!(result.best_score(), Some(0.8));
    }
}
