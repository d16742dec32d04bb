use crate::mdps::solvers::mc_methods::ImportanceSampling;
use crate::Continous;
use rand::Rng;

/// The one-state MDP of Section 5.5: `Left` terminates with reward 1 with
/// probability 0.1 and otherwise loops back, `Right` terminates with
/// reward 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IvAction {
    Left,
    Right,
}

/// Runs one episode under the behavior policy (each action with
/// probability 0.5) and returns the action sequence with the episode
/// return.
pub fn behavior_episode<R: Rng + ?Sized>(rng: &mut R) -> (Vec<IvAction>, Continous) {
    let mut actions = vec![];
    loop {
        if rng.gen::<bool>() {
            actions.push(IvAction::Right);
            return (actions, 0.);
        }
        actions.push(IvAction::Left);
        if rng.gen::<Continous>() < 0.1 {
            return (actions, 1.);
        }
    }
}

/// Importance-sampling ratio for the target policy that always picks
/// `Left`. Any `Right` zeroes the ratio; otherwise rho doubles per step.
pub fn rho(actions: &[IvAction]) -> Continous {
    if actions.contains(&IvAction::Right) {
        0.
    } else {
        2.0f64.powi(actions.len() as i32)
    }
}

/// The ordinary importance-sampling estimate after each of `n_episodes`
/// behavior episodes. The estimator's variance is unbounded, so the
/// series spikes instead of settling.
pub fn ordinary_is_series<R: Rng + ?Sized>(n_episodes: usize, rng: &mut R) -> Vec<Continous> {
    let mut is = ImportanceSampling::new();
    let mut series = Vec::with_capacity(n_episodes);
    for _ in 0..n_episodes {
        let (actions, g) = behavior_episode(rng);
        is.push(rho(&actions), g);
        series.push(is.ordinary());
    }
    series
}
