use serde::{Deserialize, Serialize};

/// Global resource ceilings for one search run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub max_evaluations: usize,
    /// Maximum cumulative evaluation time, in seconds.
    pub max_time: f64,
}

impl Budget {
    pub fn new(max_evaluations: usize, max_time: f64) -> Self {
        Self {
            max_evaluations,
            max_time,
        }
    }

    pub fn unlimited() -> Self {
        Self {
            max_evaluations: usize::MAX,
            max_time: f64::INFINITY,
        }
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Resources consumed so far: cumulative time and fidelity units (epochs).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetUsage {
    pub total_time: f64,
    pub total_epoch: u64,
}

impl BudgetUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charge(&mut self, time: f64, epochs: u64) {
        self.total_time += time;
        self.total_epoch += epochs;
    }

    /// Undo a previous `charge` with the same amounts.
    pub fn refund(&mut self, time: f64, epochs: u64) {
        self.total_time -= time;
        self.total_epoch -= epochs;
    }

    pub fn time_exhausted(&self, budget: &Budget) -> bool {
        self.total_time >= budget.max_time
    }

    /// Whether another round may start.
    pub fn within(&self, budget: &Budget, evaluations: usize) -> bool {
        evaluations <= budget.max_evaluations && self.total_time <= budget.max_time
    }
}
