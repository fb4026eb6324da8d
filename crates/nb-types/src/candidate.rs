use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::NbError;

/// Encoding of an architecture inside a search space: one operation choice
/// per position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genotype(Vec<u32>);

impl Genotype {
    pub fn new(choices: Vec<u32>) -> Self {
        Self(choices)
    }

    pub fn choices(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact identifier used to name a network on disk and in logs: the
    /// decimal digits of every choice, concatenated.
    pub fn network_id(&self) -> String {
        self.0.iter().map(|choice| choice.to_string()).collect()
    }
}

impl From<Vec<u32>> for Genotype {
    fn from(choices: Vec<u32>) -> Self {
        Self(choices)
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.network_id())
    }
}

/// Parses a network id made of single-digit choices.
impl FromStr for Genotype {
    type Err = NbError;

    fn from_str(network_id: &str) -> Result<Self, Self::Err> {
        if network_id.is_empty() {
            return Err(crate::validation_error!("network id is empty"));
        }
        network_id
            .chars()
            .map(|c| {
                c.to_digit(10).ok_or_else(|| {
                    crate::validation_error!("invalid character {c:?} in network id {network_id}")
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// A single evaluation of a candidate at one fidelity checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Checkpoint (training epoch) the candidate was evaluated at.
    pub iepoch: u32,
    /// Metric name requested from the evaluator, e.g. "val_acc_20".
    pub metric: String,
    pub score: f64,
    /// Time the evaluator reported for this call, in seconds.
    pub elapsed: f64,
}

/// Ordered log of every evaluation a candidate went through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationHistory {
    records: Vec<EvaluationRecord>,
}

impl EvaluationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EvaluationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&EvaluationRecord> {
        self.records.last()
    }

    /// Checkpoint of the most recent evaluation; 0 for a candidate that has
    /// not been trained at all.
    pub fn latest_iepoch(&self) -> u32 {
        self.latest().map(|record| record.iepoch).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Position of a candidate in the population it was sampled into.
pub type CandidateId = usize;

/// A sampled architecture together with its evaluation state.
///
/// Candidates have value semantics: cloning one yields an independent
/// snapshot that later evaluations of the original do not touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub genotype: Genotype,
    /// Score from the most recent evaluation, `None` until evaluated.
    pub score: Option<f64>,
    pub history: EvaluationHistory,
}

impl Candidate {
    pub fn new(id: CandidateId, genotype: Genotype) -> Self {
        Self {
            id,
            genotype,
            score: None,
            history: EvaluationHistory::new(),
        }
    }

    pub fn network_id(&self) -> String {
        self.genotype.network_id()
    }

    /// Score used for ranking; unevaluated candidates and NaN scores rank last.
    pub fn fitness(&self) -> f64 {
        match self.score {
            Some(score) if !score.is_nan() => score,
            _ => f64::NEG_INFINITY,
        }
    }

    /// Store the outcome of an evaluation at `iepoch`.
    pub fn record_evaluation(&mut self, iepoch: u32, metric: impl Into<String>, score: f64, elapsed: f64) {
        self.score = Some(score);
        self.history.push(EvaluationRecord {
            iepoch,
            metric: metric.into(),
            score,
            elapsed,
        });
    }
}
