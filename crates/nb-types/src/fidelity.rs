use serde::{Deserialize, Serialize};

use crate::errors::SearchError;

/// Ordered checkpoints (training epochs) a tournament advances through.
///
/// The last checkpoint marks the final round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct FidelitySchedule {
    checkpoints: Vec<u32>,
}

impl FidelitySchedule {
    pub fn new(checkpoints: Vec<u32>) -> Result<Self, SearchError> {
        if checkpoints.is_empty() {
            return Err(SearchError::EmptySchedule);
        }
        let increasing = checkpoints[0] > 0 && checkpoints.windows(2).all(|w| w[0] < w[1]);
        if !increasing {
            return Err(SearchError::InvalidSchedule {
                schedule: checkpoints,
            });
        }
        Ok(Self { checkpoints })
    }

    pub fn checkpoints(&self) -> &[u32] {
        &self.checkpoints
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.checkpoints.get(index).copied()
    }

    pub fn first_checkpoint(&self) -> u32 {
        self.checkpoints[0]
    }

    pub fn final_checkpoint(&self) -> u32 {
        self.checkpoints[self.checkpoints.len() - 1]
    }

    pub fn is_final(&self, checkpoint: u32) -> bool {
        checkpoint == self.final_checkpoint()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Always false: construction rejects an empty schedule.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl TryFrom<Vec<u32>> for FidelitySchedule {
    type Error = SearchError;

    fn try_from(checkpoints: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(checkpoints)
    }
}

impl From<FidelitySchedule> for Vec<u32> {
    fn from(schedule: FidelitySchedule) -> Self {
        schedule.checkpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_schedule() {
        assert_eq!(FidelitySchedule::new(vec![]), Err(SearchError::EmptySchedule));
    }

    #[test]
    fn rejects_unordered_or_zero_checkpoints() {
        assert!(matches!(
            FidelitySchedule::new(vec![10, 10, 20]),
            Err(SearchError::InvalidSchedule { .. })
        ));
        assert!(matches!(
            FidelitySchedule::new(vec![10, 40, 40]),
            Err(SearchError::InvalidSchedule { .. })
        ));
        assert!(matches!(
            FidelitySchedule::new(vec![20, 10]),
            Err(SearchError::InvalidSchedule { .. })
        ));
        assert!(matches!(
            FidelitySchedule::new(vec![0, 10]),
            Err(SearchError::InvalidSchedule { .. })
        ));
    }

    #[test]
    fn final_checkpoint_is_sentinel() {
        let schedule = FidelitySchedule::new(vec![10, 20, 40]).unwrap();
        assert_eq!(schedule.first_checkpoint(), 10);
        assert_eq!(schedule.final_checkpoint(), 40);
        assert!(schedule.is_final(40));
        assert!(!schedule.is_final(20));
        assert_eq!(schedule.get(3), None);
    }

    #[test]
    fn single_checkpoint_is_final_from_the_start() {
        let schedule = FidelitySchedule::new(vec![50]).unwrap();
        assert!(schedule.is_final(schedule.first_checkpoint()));
    }

    #[test]
    fn deserialization_validates() {
        let schedule: FidelitySchedule = serde_json::from_str("[5, 25, 50]").unwrap();
        assert_eq!(schedule.len(), 3);
        assert!(!schedule.is_empty());
        assert!(serde_json::from_str::<FidelitySchedule>("[]").is_err());
    }
}
