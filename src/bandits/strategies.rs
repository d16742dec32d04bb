use crate::math::DiscreteDistribution;
use crate::mdps::solvers::argmax_set;
use crate::Continous;
use rand::prelude::*;

/// How the action-value tracker moves toward a new reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepSize {
    /// `1 / pulls`, the unbiased sample average.
    SampleAverage,
    /// A fixed step, weighting recent rewards geometrically.
    Constant(Continous),
}

/// Incremental per-arm value estimates: `Q[a] += step * (reward - Q[a])`.
#[derive(Debug, Clone)]
pub struct ActionValues {
    q: Vec<Continous>,
    pulls: Vec<usize>,
    step: StepSize,
}

impl ActionValues {
    pub fn new(k: usize, initial: Continous, step: StepSize) -> Self {
        Self {
            q: vec![initial; k],
            pulls: vec![0; k],
            step,
        }
    }

    pub fn update(&mut self, arm: usize, reward: Continous) {
        self.pulls[arm] += 1;
        let step = match self.step {
            StepSize::SampleAverage => 1. / self.pulls[arm] as Continous,
            StepSize::Constant(alpha) => alpha,
        };
        self.q[arm] += step * (reward - self.q[arm]);
    }

    pub fn q(&self) -> &[Continous] {
        &self.q
    }

    pub fn pulls(&self) -> &[usize] {
        &self.pulls
    }
}

/// Value-based arm selection. All greedy ties are broken uniformly at
/// random.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Greedy,
    EpsilonGreedy(Continous),
    /// `Q[a] + c * sqrt(ln t / pulls[a])`; unpulled arms go first.
    Ucb {
        c: Continous,
    },
}

impl Strategy {
    /// Picks an arm at (1-based) step `t`.
    pub fn select<R: Rng + ?Sized>(&self, values: &ActionValues, t: usize, rng: &mut R) -> usize {
        match *self {
            Strategy::Greedy => *argmax_set(values.q()).choose(rng).unwrap(),
            Strategy::EpsilonGreedy(epsilon) => {
                if rng.gen::<Continous>() < epsilon {
                    rng.gen_range(0..values.q().len())
                } else {
                    *argmax_set(values.q()).choose(rng).unwrap()
                }
            }
            Strategy::Ucb { c } => {
                let unpulled = (0..values.q().len())
                    .filter(|&a| values.pulls()[a] == 0)
                    .collect::<Vec<_>>();
                if let Some(&a) = unpulled.choose(rng) {
                    return a;
                }
                let bonus = |a: usize| {
                    c * ((t as Continous).ln() / values.pulls()[a] as Continous).sqrt()
                };
                let scores = values
                    .q()
                    .iter()
                    .enumerate()
                    .map(|(a, &q)| q + bonus(a))
                    .collect::<Vec<_>>();
                *argmax_set(&scores).choose(rng).unwrap()
            }
        }
    }
}

/// Anything the simulation loop can drive: pick an arm, learn from the
/// payout.
pub trait BanditPolicy {
    fn select<R: Rng + ?Sized>(&mut self, t: usize, rng: &mut R) -> usize;
    fn update(&mut self, arm: usize, reward: Continous);
}

/// A [`Strategy`] paired with its value tracker.
#[derive(Debug, Clone)]
pub struct ValuePolicy {
    pub strategy: Strategy,
    pub values: ActionValues,
}

impl ValuePolicy {
    pub fn new(strategy: Strategy, k: usize, initial: Continous, step: StepSize) -> Self {
        Self {
            strategy,
            values: ActionValues::new(k, initial, step),
        }
    }
}

impl BanditPolicy for ValuePolicy {
    fn select<R: Rng + ?Sized>(&mut self, t: usize, rng: &mut R) -> usize {
        self.strategy.select(&self.values, t, rng)
    }

    fn update(&mut self, arm: usize, reward: Continous) {
        self.values.update(arm, reward);
    }
}

/// The gradient bandit of Section 2.8: softmax over a preference vector,
/// preferences climbed by `alpha * (reward - baseline)` in the direction
/// that makes the chosen arm more likely.
#[derive(Debug, Clone)]
pub struct GradientBandit {
    preferences: Vec<Continous>,
    alpha: Continous,
    use_baseline: bool,
    average_reward: Continous,
    t: usize,
}

impl GradientBandit {
    pub fn new(k: usize, alpha: Continous, use_baseline: bool) -> Self {
        Self {
            preferences: vec![0.; k],
            alpha,
            use_baseline,
            average_reward: 0.,
            t: 0,
        }
    }

    /// Softmax of the preferences; the max is subtracted first so the
    /// exponentials cannot overflow.
    pub fn probabilities(&self) -> Vec<Continous> {
        let max = self
            .preferences
            .iter()
            .cloned()
            .fold(Continous::NEG_INFINITY, Continous::max);
        let exp = self.preferences.iter().map(|p| (p - max).exp()).collect::<Vec<_>>();
        let total: Continous = exp.iter().sum();
        exp.into_iter().map(|e| e / total).collect()
    }
}

impl BanditPolicy for GradientBandit {
    fn select<R: Rng + ?Sized>(&mut self, _t: usize, rng: &mut R) -> usize {
        DiscreteDistribution::new(&self.probabilities()).sample(rng)
    }

    fn update(&mut self, arm: usize, reward: Continous) {
        self.t += 1;
        self.average_reward += (reward - self.average_reward) / self.t as Continous;
        let baseline = if self.use_baseline { self.average_reward } else { 0. };

        let probabilities = self.probabilities();
        for (a, p) in probabilities.into_iter().enumerate() {
            let indicator = if a == arm { 1. } else { 0. };
            self.preferences[a] += self.alpha * (reward - baseline) * (indicator - p);
        }
    }
}
