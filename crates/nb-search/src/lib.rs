//! # nb-search
//!
//! Budget-aware architecture search for NasBudget.
//!
//! Provides the search algorithm contract, the search space and problem
//! interfaces an algorithm is bound to, the Successive-Halving scheduler,
//! and run tracking for harnesses.

mod algorithm;
mod halving;
mod problem;
mod run;
mod space;

pub use algorithm::{RoundSummary, SearchAlgorithm, SearchResult, SearchRng, Termination};
pub use halving::{SuccessiveHalving, SuccessiveHalvingConfig};
pub use problem::{EvaluationRequest, Problem, SurrogateProblem};
pub use run::{track_run, RunRecord, RunState};
pub use space::{DiscreteSearchSpace, SearchSpace};
