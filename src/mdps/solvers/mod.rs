pub mod mc_methods;
pub mod policy_evaluation;
pub mod policy_iteration;
pub mod td_methods;
pub mod value_iteration;

use super::{EpisodeEvent, EpisodeGenerator, Transitions};
use crate::{Continous, Discrete};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use std::rc::Rc;

/// Expected one-step return of `(s, a)` under the current value estimates.
/// Terminal outcomes do not bootstrap. Unlisted pairs contribute nothing.
pub(crate) fn expected_return(
    transitions: &Transitions,
    s: Discrete,
    a: Discrete,
    v: &[Continous],
    gamma: Continous,
) -> Continous {
    transitions
        .get(&(s, a))
        .map(|ts| {
            ts.iter()
                .map(|t| {
                    let bootstrap = if t.done { 0. } else { v[t.next_state as usize] };
                    t.probability * (t.reward + gamma * bootstrap)
                })
                .sum()
        })
        .unwrap_or(0.)
}

/// Largest-value action for `s`, first maximizer in enumeration order.
pub(crate) fn greedy_action(
    transitions: &Transitions,
    s: Discrete,
    n_a: usize,
    v: &[Continous],
    gamma: Continous,
) -> Discrete {
    let mut best_a = 0;
    let mut best = Continous::NEG_INFINITY;
    for a in 0..n_a as Discrete {
        let q = expected_return(transitions, s, a, v, gamma);
        if q > best {
            best = q;
            best_a = a;
        }
    }
    best_a
}

/// Generates episodes under the uniform-random policy by sampling the
/// transition table directly. `start` must be a non-terminal state with at
/// least one listed action.
pub struct EpisodeGeneratorForTransitions {
    pub transitions: Rc<Transitions>,
    pub start: Discrete,
    pub seed: u64,
}

impl EpisodeGenerator for EpisodeGeneratorForTransitions {
    fn generate(&self, n: usize) -> Vec<Vec<EpisodeEvent>> {
        let mut eps = vec![];

        let rng = &mut StdRng::seed_from_u64(self.seed);
        for _ in 0..n {
            let mut ep = vec![];
            let mut s = self.start;
            ep.push(EpisodeEvent {
                s,
                r: Default::default(),
            });
            loop {
                let kv = self
                    .transitions
                    .keys()
                    .filter(|&x| x.0 == s)
                    .choose(rng)
                    .unwrap();
                let ts = &self.transitions[kv];
                let dist = WeightedIndex::new(ts.iter().map(|item| item.probability)).unwrap();
                let next = &ts[dist.sample(rng)];
                ep.push(EpisodeEvent {
                    s: next.next_state,
                    r: next.reward,
                });
                if next.done {
                    break;
                }

                s = next.next_state;
            }
            eps.push(ep);
        }

        eps
    }
}

/// Which action set epsilon explores over. Both semantics occur in the
/// literature and they differ materially when ties are common, e.g. at
/// initialization when every Q estimate is equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Exploration {
    /// Explore uniformly over all actions, greedy ones included.
    #[default]
    ExploreAll,
    /// Explore uniformly over the strictly non-maximizing actions.
    ExploreNonGreedy,
}

/// Epsilon-greedy selection over a row of Q values. Greedy ties are broken
/// uniformly at random.
pub fn epsilon_greedy<R: Rng + ?Sized>(
    q_row: &[Continous],
    epsilon: Continous,
    exploration: Exploration,
    rng: &mut R,
) -> usize {
    let maximizers = argmax_set(q_row);

    if rng.gen::<Continous>() < epsilon {
        match exploration {
            Exploration::ExploreAll => return rng.gen_range(0..q_row.len()),
            Exploration::ExploreNonGreedy => {
                let others = (0..q_row.len())
                    .filter(|i| !maximizers.contains(i))
                    .collect::<Vec<_>>();
                if !others.is_empty() {
                    return *others.choose(rng).unwrap();
                }
            }
        }
    }

    *maximizers.choose(rng).unwrap()
}

/// Indices of all maximizing entries.
pub(crate) fn argmax_set(values: &[Continous]) -> Vec<usize> {
    let max = values.iter().cloned().fold(Continous::NEG_INFINITY, Continous::max);
    (0..values.len()).filter(|&i| values[i] == max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_set_supports_ties() {
        assert_eq!(argmax_set(&[1., 3., 3., 0.]), vec![1, 2]);
        assert_eq!(argmax_set(&[-1., -2.]), vec![0]);
    }

    #[test]
    fn explore_all_can_pick_greedy_action() {
        let rng = &mut StdRng::seed_from_u64(3);
        let q = [1., 0., 0., 0.];

        // with epsilon 1 every action stays reachable, including index 0
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[epsilon_greedy(&q, 1.0, Exploration::ExploreAll, rng)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn explore_non_greedy_never_picks_greedy_action() {
        let rng = &mut StdRng::seed_from_u64(3);
        let q = [1., 0., 0., 0.];

        for _ in 0..200 {
            assert_ne!(epsilon_greedy(&q, 1.0, Exploration::ExploreNonGreedy, rng), 0);
        }
    }

    #[test]
    fn zero_epsilon_is_greedy() {
        let rng = &mut StdRng::seed_from_u64(3);
        let q = [0., 2., 1.];
        for _ in 0..50 {
            assert_eq!(epsilon_greedy(&q, 0.0, Exploration::ExploreAll, rng), 1);
        }
    }
}
