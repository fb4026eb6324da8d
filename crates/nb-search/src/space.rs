//! Search space interface and a discrete, cell-style implementation.

use nb_types::{Genotype, NbResult, SearchError};
use rand::{Rng, RngCore};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The set of architectures a search draws from.
pub trait SearchSpace {
    /// Draw one genotype. It may be invalid; see [`SearchSpace::is_valid`].
    fn sample(&self, rng: &mut dyn RngCore) -> Genotype;

    fn is_valid(&self, genotype: &Genotype) -> bool;

    /// Rejection-sample until a valid genotype comes up, giving up after
    /// `max_attempts` draws.
    fn sample_valid(&self, rng: &mut dyn RngCore, max_attempts: usize) -> Result<Genotype, SearchError> {
        for attempt in 1..=max_attempts {
            let genotype = self.sample(rng);
            if self.is_valid(&genotype) {
                if attempt > 1 {
                    debug!("Accepted {} after {} draws", genotype, attempt);
                }
                return Ok(genotype);
            }
        }
        Err(SearchError::SearchSpaceExhausted {
            attempts: max_attempts,
        })
    }
}

type Validator = Arc<dyn Fn(&Genotype) -> bool + Send + Sync>;

/// Fixed-length genotypes where position `i` picks one of `choices[i]`
/// operations, optionally filtered by an extra validity rule.
#[derive(Clone)]
pub struct DiscreteSearchSpace {
    choices: Vec<u32>,
    validator: Option<Validator>,
}

impl DiscreteSearchSpace {
    pub fn new(choices: Vec<u32>) -> NbResult<Self> {
        if choices.is_empty() {
            return Err(nb_types::validation_error!("search space has no positions"));
        }
        if let Some(position) = choices.iter().position(|&n| n == 0) {
            return Err(nb_types::validation_error!(
                "position {position} of the search space has no operations"
            ));
        }
        Ok(Self {
            choices,
            validator: None,
        })
    }

    /// `positions` slots sharing the same `num_ops` operations.
    pub fn uniform(positions: usize, num_ops: u32) -> NbResult<Self> {
        Self::new(vec![num_ops; positions])
    }

    pub fn with_validator(mut self, validator: impl Fn(&Genotype) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn positions(&self) -> usize {
        self.choices.len()
    }

    /// Number of distinct genotypes, ignoring the validity rule.
    pub fn size(&self) -> Option<u128> {
        self.choices
            .iter()
            .try_fold(1u128, |total, &n| total.checked_mul(n as u128))
    }
}

impl fmt::Debug for DiscreteSearchSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscreteSearchSpace")
            .field("choices", &self.choices)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl SearchSpace for DiscreteSearchSpace {
    fn sample(&self, rng: &mut dyn RngCore) -> Genotype {
        Genotype::new(self.choices.iter().map(|&n| rng.random_range(0..n)).collect())
    }

    fn is_valid(&self, genotype: &Genotype) -> bool {
        genotype.len() == self.choices.len()
            && genotype
                .choices()
                .iter()
                .zip(&self.choices)
                .all(|(choice, n)| choice < n)
            && self.validator.as_ref().map_or(true, |valid| valid(genotype))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn samples_respect_bounds() {
        let space = DiscreteSearchSpace::new(vec![2, 5, 3]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            let genotype = space.sample(&mut rng);
            assert!(space.is_valid(&genotype), "out of range: {genotype:?}");
        }
        assert_eq!(space.size(), Some(30));
    }

    #[test]
    fn rejects_degenerate_spaces() {
        assert!(DiscreteSearchSpace::new(vec![]).is_err());
        assert!(DiscreteSearchSpace::new(vec![3, 0]).is_err());
    }

    #[test]
    fn validity_checks_shape_and_rule() {
        let space = DiscreteSearchSpace::uniform(4, 3)
            .unwrap()
            .with_validator(|g| g.choices()[0] != 0);
        assert!(space.is_valid(&Genotype::new(vec![1, 0, 2, 2])));
        assert!(!space.is_valid(&Genotype::new(vec![0, 0, 2, 2])));
        assert!(!space.is_valid(&Genotype::new(vec![1, 0, 2])));
        assert!(!space.is_valid(&Genotype::new(vec![1, 0, 2, 3])));
    }

    #[test]
    fn rejection_sampling_finds_valid_genotype() {
        let space = DiscreteSearchSpace::uniform(6, 4)
            .unwrap()
            .with_validator(|g| g.choices().iter().sum::<u32>() % 2 == 0);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..20 {
            let genotype = space.sample_valid(&mut rng, 1_000).unwrap();
            assert_eq!(genotype.choices().iter().sum::<u32>() % 2, 0);
        }
    }

    #[test]
    fn rejection_sampling_gives_up() {
        let space = DiscreteSearchSpace::uniform(3, 2).unwrap().with_validator(|_| false);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            space.sample_valid(&mut rng, 50),
            Err(SearchError::SearchSpaceExhausted { attempts: 50 })
        );
    }
}
