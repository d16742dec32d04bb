use super::strategies::BanditPolicy;
use super::testbed::Testbed;
use crate::Continous;
use rand::prelude::*;
use rayon::prelude::*;

/// Per-step learning curves averaged over independent runs.
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Mean reward at each step.
    pub average_reward: Vec<Continous>,
    /// Fraction of runs that pulled an optimal arm at each step.
    pub optimal_fraction: Vec<Continous>,
    /// Mean reward over every step of every run.
    pub mean_average_reward: Continous,
}

/// Runs `runs` independent experiments of `steps` pulls each and averages
/// their curves. Every run owns a fresh testbed, a fresh policy and a
/// private RNG seeded from `seed` and the run index, so the runs are
/// order-independent and the aggregate is reproducible.
pub fn run_many<P, F>(
    k: usize,
    baseline_mean: Continous,
    runs: usize,
    steps: usize,
    seed: u64,
    make_policy: F,
) -> RunStats
where
    P: BanditPolicy,
    F: Fn() -> P + Sync,
{
    let per_run: Vec<(Vec<Continous>, Vec<bool>)> = (0..runs)
        .into_par_iter()
        .map(|run| {
            let rng = &mut StdRng::seed_from_u64(seed.wrapping_add(run as u64));
            let testbed = Testbed::new(k, baseline_mean, rng);
            let mut policy = make_policy();

            let mut rewards = Vec::with_capacity(steps);
            let mut optimal = Vec::with_capacity(steps);
            for t in 1..=steps {
                let arm = policy.select(t, rng);
                let reward = testbed.pull(arm, rng);
                policy.update(arm, reward);
                rewards.push(reward);
                optimal.push(testbed.is_optimal(arm));
            }
            (rewards, optimal)
        })
        .collect();

    let mut average_reward = vec![0.; steps];
    let mut optimal_fraction = vec![0.; steps];
    for (rewards, optimal) in &per_run {
        for t in 0..steps {
            average_reward[t] += rewards[t];
            if optimal[t] {
                optimal_fraction[t] += 1.;
            }
        }
    }
    for t in 0..steps {
        average_reward[t] /= runs as Continous;
        optimal_fraction[t] /= runs as Continous;
    }
    let mean_average_reward = average_reward.iter().sum::<Continous>() / steps as Continous;

    RunStats {
        average_reward,
        optimal_fraction,
        mean_average_reward,
    }
}
