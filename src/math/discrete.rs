use crate::Continous;
use rand::Rng;

/// Samples indices from a finite distribution by inverse-CDF lookup on a
/// precomputed unit partition.
#[derive(Debug, Clone)]
pub struct DiscreteDistribution {
    unit_partition: Vec<Continous>,
}

impl DiscreteDistribution {
    /// `probabilities` must be non-empty and sum to ~1.
    pub fn new(probabilities: &[Continous]) -> Self {
        assert!(
            !probabilities.is_empty(),
            "Distribution needs at least one outcome."
        );

        let mut lower_bound = 0.;
        let unit_partition = probabilities
            .iter()
            .map(|p| {
                lower_bound += p;
                lower_bound.min(1.)
            })
            .collect();

        Self { unit_partition }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let x: Continous = rng.gen();
        self.unit_partition
            .iter()
            .position(|&bound| x < bound)
            .unwrap_or(self.unit_partition.len() - 1)
    }
}
