//! Problem interface: the search space, the evaluator and the budget an
//! algorithm is bound to.

use nb_types::{Budget, Candidate, EvaluationError, Genotype, NbResult};
use tracing::debug;

use crate::space::SearchSpace;

/// One evaluation call issued by a search algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    /// Metric name qualified by checkpoint, e.g. "val_acc_20".
    pub metric: String,
    /// Checkpoint (training epoch) to evaluate at.
    pub iepoch: u32,
    /// Score with a cheap proxy instead of training up to `iepoch`.
    pub use_proxy_metric: bool,
}

impl EvaluationRequest {
    pub fn new(base_metric: &str, iepoch: u32, use_proxy_metric: bool) -> Self {
        Self {
            metric: format!("{base_metric}_{iepoch}"),
            iepoch,
            use_proxy_metric,
        }
    }
}

/// Everything a search algorithm needs from the outside world.
pub trait Problem {
    type Space: SearchSpace;

    fn search_space(&self) -> &Self::Space;

    /// Resource ceilings for the whole run.
    fn budget(&self) -> Budget;

    /// Evaluate `candidate` at `request.iepoch`, updating its score and
    /// history in place. Returns the elapsed time in seconds.
    fn evaluate(&mut self, candidate: &mut Candidate, request: &EvaluationRequest) -> NbResult<f64>;
}

/// Deterministic stand-in for a training pipeline.
///
/// Scores come from a learning-curve function of (genotype, epoch). Training
/// resumes from the candidate's last checkpoint, so a call only pays for the
/// epochs between that checkpoint and the requested one.
pub struct SurrogateProblem<S, F> {
    space: S,
    score_fn: F,
    budget: Budget,
    seconds_per_epoch: f64,
    proxy_cost: f64,
    evaluations: usize,
}

impl<S, F> SurrogateProblem<S, F>
where
    S: SearchSpace,
    F: Fn(&Genotype, u32) -> f64,
{
    pub fn new(space: S, score_fn: F, seconds_per_epoch: f64) -> Self {
        Self {
            space,
            score_fn,
            budget: Budget::unlimited(),
            seconds_per_epoch,
            proxy_cost: 1.0,
            evaluations: 0,
        }
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    /// Flat cost, in seconds, of a proxy-metric evaluation.
    pub fn with_proxy_cost(mut self, seconds: f64) -> Self {
        self.proxy_cost = seconds;
        self
    }

    /// Number of evaluate calls served so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

impl<S, F> Problem for SurrogateProblem<S, F>
where
    S: SearchSpace,
    F: Fn(&Genotype, u32) -> f64,
{
    type Space = S;

    fn search_space(&self) -> &S {
        &self.space
    }

    fn budget(&self) -> Budget {
        self.budget
    }

    fn evaluate(&mut self, candidate: &mut Candidate, request: &EvaluationRequest) -> NbResult<f64> {
        if !request.metric.ends_with(&format!("_{}", request.iepoch)) {
            return Err(EvaluationError::UnsupportedMetric {
                metric: request.metric.clone(),
            }
            .into());
        }

        let trained = candidate.history.latest_iepoch();
        if request.iepoch < trained {
            return Err(EvaluationError::CheckpointRegression {
                network_id: candidate.network_id(),
                requested: request.iepoch,
                trained,
            }
            .into());
        }

        let score = (self.score_fn)(&candidate.genotype, request.iepoch);
        if !score.is_finite() {
            return Err(EvaluationError::Failed {
                network_id: candidate.network_id(),
                message: format!("non-finite score {score} for {}", request.metric),
            }
            .into());
        }

        let elapsed = if request.use_proxy_metric {
            self.proxy_cost
        } else {
            f64::from(request.iepoch - trained) * self.seconds_per_epoch
        };

        self.evaluations += 1;
        candidate.record_evaluation(request.iepoch, request.metric.as_str(), score, elapsed);
        debug!(
            "Evaluated {} at epoch {} (from {}): {} = {:.4} in {:.2}s",
            candidate.network_id(),
            request.iepoch,
            trained,
            request.metric,
            score,
            elapsed
        );
        Ok(elapsed)
    }
}
