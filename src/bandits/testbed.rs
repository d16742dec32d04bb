use crate::math::Gaussian;
use crate::Continous;
use rand::Rng;

/// The k-armed Gaussian testbed of Chapter 2: each arm's true mean is drawn
/// once from N(baseline, 1) and payouts are unit-variance around it.
#[derive(Debug, Clone)]
pub struct Testbed {
    arms: Vec<Gaussian>,
    optimal: Vec<usize>,
}

impl Testbed {
    pub fn new<R: Rng + ?Sized>(k: usize, baseline_mean: Continous, rng: &mut R) -> Self {
        assert!(k > 0, "Testbed needs at least one arm.");
        let prior = Gaussian::new(baseline_mean, 1.);
        let means = (0..k).map(|_| prior.sample(rng)).collect::<Vec<_>>();
        let best = means.iter().cloned().fold(Continous::NEG_INFINITY, Continous::max);
        let optimal = (0..k).filter(|&i| means[i] == best).collect();
        let arms = means.into_iter().map(|m| Gaussian::new(m, 1.)).collect();

        Self { arms, optimal }
    }

    pub fn k(&self) -> usize {
        self.arms.len()
    }

    pub fn pull<R: Rng + ?Sized>(&self, arm: usize, rng: &mut R) -> Continous {
        self.arms[arm].sample(rng)
    }

    pub fn true_mean(&self, arm: usize) -> Continous {
        self.arms[arm].mean
    }

    /// Arms whose true mean attains the maximum. Usually a singleton, but
    /// ties are preserved.
    pub fn optimal_arms(&self) -> &[usize] {
        &self.optimal
    }

    pub fn is_optimal(&self, arm: usize) -> bool {
        self.optimal.contains(&arm)
    }
}
