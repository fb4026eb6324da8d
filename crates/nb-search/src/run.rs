//! Run tracking: a serializable record of one search run's lifecycle.

use chrono::{DateTime, Utc};
use nb_types::NbResult;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::algorithm::{SearchAlgorithm, SearchResult, Termination};

/// Lifecycle state for a search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Status of a search run, suitable for writing next to its artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub algorithm: String,
    pub seed: u64,
    pub state: RunState,
    pub best_network_id: Option<String>,
    pub best_score: Option<f64>,
    /// Cumulative evaluation time, in seconds.
    pub total_time: f64,
    pub total_epoch: u64,
    pub rounds: usize,
    pub termination: Option<Termination>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl RunRecord {
    pub fn new(algorithm: &str, seed: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            algorithm: algorithm.to_string(),
            seed,
            state: RunState::Pending,
            best_network_id: None,
            best_score: None,
            total_time: 0.0,
            total_epoch: 0,
            rounds: 0,
            termination: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = RunState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self, result: &SearchResult) {
        self.state = RunState::Completed;
        self.finished_at = Some(Utc::now());
        self.best_network_id = result.best.as_ref().map(|c| c.network_id());
        self.best_score = result.best_score();
        self.total_time = result.total_time;
        self.total_epoch = result.total_epoch;
        self.rounds = result.rounds.len();
        self.termination = Some(result.termination);
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = RunState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }
}

/// Run `algorithm` with `seed`, recording the lifecycle alongside the result.
pub fn track_run<A>(algorithm: &mut A, seed: u64) -> (RunRecord, NbResult<SearchResult>)
where
    A: SearchAlgorithm + ?Sized,
{
    let mut record = RunRecord::new(algorithm.name(), seed);
    record.mark_running();

    let outcome = algorithm.run(seed);
    match &outcome {
        Ok(result) => record.mark_completed(result),
        Err(e) => {
            error!("{} run {} failed: {}", record.algorithm, record.id, e);
            record.mark_failed(e.to_string());
        }
    }
    (record, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::SearchRng;
    use nb_types::{BudgetUsage, Candidate, Genotype};

    struct Fixed;

    impl SearchAlgorithm for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn search(&mut self, _rng: &mut SearchRng) -> NbResult<SearchResult> {
            let mut best = Candidate::new(0, Genotype::new(vec![4, 0, 4, 1]));
            best.record_evaluation(40, "val_acc_40", 93.5, 120.0);
            let mut usage = BudgetUsage::new();
            usage.charge(480.0, 160);
            Ok(SearchResult::new(Some(best), usage, Termination::SingleSurvivor, Vec::new()))
        }
    }

    struct Broken;

    impl SearchAlgorithm for Broken {
        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn record_lifecycle() {
        let mut record = RunRecord::new("successive_halving", 42);
        assert_eq!(record.state, RunState::Pending);
        assert!(record.started_at.is_none());

        record.mark_running();
        assert_eq!(record.state, RunState::Running);
        assert!(record.started_at.is_some());

        record.mark_failed("worker lost".into());
        assert_eq!(record.state, RunState::Failed);
        assert!(record.finished_at.is_some());
        assert_eq!(record.error.as_deref(), Some("worker lost"));
    }

    #[test]
    fn tracks_successful_run() {
        let (record, outcome) = track_run(&mut Fixed, 7);
        assert!(outcome.is_ok());
        assert_eq!(record.state, RunState::Completed);
        assert_eq!(record.algorithm, "fixed");
        assert_eq!(record.best_network_id.as_deref(), Some("4041"));
        assert_eq!(record.best_score, Some(93.5));
        assert_eq!(record.total_epoch, 160);
        assert_eq!(record.termination, Some(Termination::SingleSurvivor));
    }

    #[test]
    fn tracks_failed_run() {
        let (record, outcome) = track_run(&mut Broken, 7);
        assert!(outcome.is_err());
        assert_eq!(record.state, RunState::Failed);
        assert!(record.error.unwrap().contains("broken"));
    }

    #[test]
    fn record_serialization() {
        let (record, _) = track_run(&mut Fixed, 1);
        let json = serde_json::to_string(&record).unwrap();
        let back: RunRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
