use thiserror::Error;

/// Main error type for the NasBudget system
#[derive(Error, Debug)]
pub enum NbError {
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Precondition and lifecycle errors raised by a search algorithm
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Fidelity schedule is empty")]
    EmptySchedule,

    #[error("Fidelity schedule must be strictly increasing and positive: {schedule:?}")]
    InvalidSchedule { schedule: Vec<u32> },

    #[error("Initial population is empty")]
    EmptyPopulation,

    #[error("Search space exhausted: no valid genotype after {attempts} attempts")]
    SearchSpaceExhausted { attempts: usize },

    #[error("Algorithm {algorithm} does not implement a search procedure")]
    Unimplemented { algorithm: String },

    #[error("Unknown option: {key}")]
    UnknownOption { key: String },
}

/// Errors reported by a problem while evaluating a candidate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Unsupported metric: {metric}")]
    UnsupportedMetric { metric: String },

    #[error("Checkpoint {requested} is behind the last trained checkpoint {trained} for network {network_id}")]
    CheckpointRegression {
        network_id: String,
        requested: u32,
        trained: u32,
    },

    #[error("Evaluation failed for network {network_id}: {message}")]
    Failed { network_id: String, message: String },
}

/// Result type alias for NasBudget operations
pub type NbResult<T> = Result<T, NbError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::NbError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::NbError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::NbError::Config(format!($($arg)*))
    };
}
