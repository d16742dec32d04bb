use super::{argmax_set, epsilon_greedy, Exploration};
use crate::envs::grid_world::{Action, GridWorld, Point};
use crate::envs::random_walk::StateReward;
use crate::Continous;
use rand::Rng;
use tracing::debug;

/// One TD(0) pass over an episode. The value past the final state is the
/// terminal zero.
pub fn td_zero_episode(seq: &[StateReward], v: &mut [Continous], alpha: Continous, gamma: Continous) {
    for t in 0..seq.len() {
        let StateReward { s, r } = seq[t];
        let next_v = if t + 1 < seq.len() { v[seq[t + 1].s] } else { 0. };
        v[s] += alpha * (r + gamma * next_v - v[s]);
    }
}

/// Constant-alpha Monte Carlo: every state moves toward the return that
/// followed it.
pub fn constant_alpha_mc_episode(
    seq: &[StateReward],
    v: &mut [Continous],
    alpha: Continous,
    gamma: Continous,
) {
    let mut g = 0.;
    for sr in seq.iter().rev() {
        g = sr.r + gamma * g;
        v[sr.s] += alpha * (g - v[sr.s]);
    }
}

/// Batch TD(0): every pass accumulates the TD increments over the whole
/// episode set and applies their sum once, stopping when the largest
/// applied increment drops below `threshold`. Returns the values and the
/// number of passes taken.
pub fn batch_td(
    episodes: &[Vec<StateReward>],
    n_states: usize,
    alpha: Continous,
    gamma: Continous,
    threshold: Continous,
    max_passes: usize,
) -> (Vec<Continous>, usize) {
    batch_core(episodes, n_states, threshold, max_passes, |seq, v, updates| {
        for t in 0..seq.len() {
            let StateReward { s, r } = seq[t];
            let next_v = if t + 1 < seq.len() { v[seq[t + 1].s] } else { 0. };
            updates[s] += alpha * (r + gamma * next_v - v[s]);
        }
    })
}

/// Batch Monte Carlo under the same summed-update scheme as [`batch_td`].
pub fn batch_mc(
    episodes: &[Vec<StateReward>],
    n_states: usize,
    alpha: Continous,
    gamma: Continous,
    threshold: Continous,
    max_passes: usize,
) -> (Vec<Continous>, usize) {
    batch_core(episodes, n_states, threshold, max_passes, |seq, v, updates| {
        let mut g = 0.;
        for sr in seq.iter().rev() {
            g = sr.r + gamma * g;
            updates[sr.s] += alpha * (g - v[sr.s]);
        }
    })
}

fn batch_core(
    episodes: &[Vec<StateReward>],
    n_states: usize,
    threshold: Continous,
    max_passes: usize,
    mut accumulate: impl FnMut(&[StateReward], &[Continous], &mut [Continous]),
) -> (Vec<Continous>, usize) {
    let mut v = vec![0.; n_states];
    for pass in 1..=max_passes {
        let mut updates = vec![0.; n_states];
        for seq in episodes {
            accumulate(seq, &v, &mut updates);
        }
        for (value, update) in v.iter_mut().zip(&updates) {
            *value += update;
        }
        let largest = updates.iter().fold(0., |acc: Continous, u| acc.max(u.abs()));
        debug!(pass, largest, "batch sweep");
        // an oversized alpha makes the summed pass update overshoot and
        // blow up; report that as non-convergence instead of looping on NaN
        if !largest.is_finite() {
            return (v, max_passes);
        }
        if largest < threshold {
            return (v, pass);
        }
    }
    (v, max_passes)
}

fn state_index(world: &GridWorld, p: Point) -> usize {
    world.grid_to_int(p)
}

/// Sarsa on a gridworld: on-policy TD control under epsilon-greedy
/// behavior. Returns the learned Q table and the reward collected per
/// episode.
pub fn sarsa<R: Rng + ?Sized>(
    world: &GridWorld,
    n_episodes: usize,
    alpha: Continous,
    epsilon: Continous,
    gamma: Continous,
    rng: &mut R,
) -> (Vec<Vec<Continous>>, Vec<Continous>) {
    let mut q = vec![vec![0.; Action::ALL.len()]; world.n_states()];
    let mut rewards = Vec::with_capacity(n_episodes);

    for _ in 0..n_episodes {
        let mut total = 0.;
        let mut s = world.start();
        let mut a = epsilon_greedy(&q[state_index(world, s)], epsilon, Exploration::ExploreAll, rng);
        loop {
            let (next, r) = world.step(s, Action::from_index(a));
            total += r;
            let si = state_index(world, s);
            if world.is_terminal(next) {
                q[si][a] += alpha * (r - q[si][a]);
                break;
            }
            let ni = state_index(world, next);
            let na = epsilon_greedy(&q[ni], epsilon, Exploration::ExploreAll, rng);
            q[si][a] += alpha * (r + gamma * q[ni][na] - q[si][a]);
            s = next;
            a = na;
        }
        rewards.push(total);
    }
    (q, rewards)
}

/// Q-learning on a gridworld: off-policy control bootstrapping from the
/// greedy successor value.
pub fn q_learning<R: Rng + ?Sized>(
    world: &GridWorld,
    n_episodes: usize,
    alpha: Continous,
    epsilon: Continous,
    gamma: Continous,
    rng: &mut R,
) -> (Vec<Vec<Continous>>, Vec<Continous>) {
    td_control(world, n_episodes, alpha, epsilon, gamma, rng, |row, _| {
        row.iter().cloned().fold(Continous::NEG_INFINITY, Continous::max)
    })
}

/// Expected Sarsa: bootstraps from the expectation of the successor row
/// under the epsilon-greedy behavior distribution.
pub fn expected_sarsa<R: Rng + ?Sized>(
    world: &GridWorld,
    n_episodes: usize,
    alpha: Continous,
    epsilon: Continous,
    gamma: Continous,
    rng: &mut R,
) -> (Vec<Vec<Continous>>, Vec<Continous>) {
    td_control(world, n_episodes, alpha, epsilon, gamma, rng, expected_row_value)
}

fn td_control<R: Rng + ?Sized>(
    world: &GridWorld,
    n_episodes: usize,
    alpha: Continous,
    epsilon: Continous,
    gamma: Continous,
    rng: &mut R,
    successor_value: impl Fn(&[Continous], Continous) -> Continous,
) -> (Vec<Vec<Continous>>, Vec<Continous>) {
    let mut q = vec![vec![0.; Action::ALL.len()]; world.n_states()];
    let mut rewards = Vec::with_capacity(n_episodes);

    for _ in 0..n_episodes {
        let mut total = 0.;
        let mut s = world.start();
        loop {
            let si = state_index(world, s);
            let a = epsilon_greedy(&q[si], epsilon, Exploration::ExploreAll, rng);
            let (next, r) = world.step(s, Action::from_index(a));
            total += r;
            if world.is_terminal(next) {
                q[si][a] += alpha * (r - q[si][a]);
                break;
            }
            let target = successor_value(&q[state_index(world, next)], epsilon);
            q[si][a] += alpha * (r + gamma * target - q[si][a]);
            s = next;
        }
        rewards.push(total);
    }
    (q, rewards)
}

fn expected_row_value(row: &[Continous], epsilon: Continous) -> Continous {
    let maximizers = argmax_set(row);
    let uniform = epsilon / row.len() as Continous;
    let greedy_share = (1. - epsilon) / maximizers.len() as Continous;
    row.iter()
        .enumerate()
        .map(|(i, &q)| {
            let p = uniform + if maximizers.contains(&i) { greedy_share } else { 0. };
            p * q
        })
        .sum()
}

/// Follows the greedy policy of `q` from the start, first maximizer on
/// ties, for at most `max_steps` moves. The visited points include the
/// start and, when reached, the terminal.
pub fn greedy_trajectory(world: &GridWorld, q: &[Vec<Continous>], max_steps: usize) -> Vec<Point> {
    let mut path = vec![world.start()];
    let mut s = world.start();
    for _ in 0..max_steps {
        if world.is_terminal(s) {
            break;
        }
        let a = argmax_set(&q[state_index(world, s)])[0];
        let (next, _) = world.step(s, Action::from_index(a));
        path.push(next);
        s = next;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::random_walk::{generate_episode, true_values, N_STATES};
    use float_eq::*;
    use rand::prelude::*;

    fn rms_error(v: &[Continous]) -> Continous {
        let truth = true_values();
        let sq: Continous = v
            .iter()
            .zip(truth.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        (sq / truth.len() as Continous).sqrt()
    }

    #[test]
    fn td_zero_tracks_the_true_random_walk_values() {
        let rng = &mut StdRng::seed_from_u64(42);
        let mut v = vec![0.5; N_STATES];
        for _ in 0..20_000 {
            let ep = generate_episode(rng);
            td_zero_episode(&ep, &mut v, 0.02, 1.);
        }
        for (estimate, truth) in v.iter().zip(true_values().iter()) {
            assert_float_eq!(estimate, truth, abs <= 0.06);
        }
    }

    #[test]
    fn constant_alpha_mc_tracks_the_true_values() {
        let rng = &mut StdRng::seed_from_u64(42);
        let mut v = vec![0.5; N_STATES];
        for _ in 0..20_000 {
            let ep = generate_episode(rng);
            constant_alpha_mc_episode(&ep, &mut v, 0.01, 1.);
        }
        assert!(rms_error(&v) < 0.08, "rms {}", rms_error(&v));
    }

    #[test]
    fn batch_td_beats_batch_mc_on_a_fixed_episode_set() {
        let rng = &mut StdRng::seed_from_u64(6);
        let episodes = (0..100).map(|_| generate_episode(rng)).collect::<Vec<_>>();

        // the summed pass update scales with per-state visit counts, so
        // alpha has to stay well below 1 / visits to keep the pass stable
        let (v_td, passes_td) = batch_td(&episodes, N_STATES, 0.001, 1., 1e-5, 100_000);
        let (v_mc, passes_mc) = batch_mc(&episodes, N_STATES, 0.001, 1., 1e-5, 100_000);

        assert!(passes_td < 100_000, "batch TD did not settle");
        assert!(passes_mc < 100_000, "batch MC did not settle");
        assert!(rms_error(&v_td) < 0.12, "td rms {}", rms_error(&v_td));
        assert!(
            rms_error(&v_td) < rms_error(&v_mc),
            "td {} vs mc {}",
            rms_error(&v_td),
            rms_error(&v_mc)
        );
    }

    #[test]
    fn batch_values_are_monotone_left_to_right() {
        let rng = &mut StdRng::seed_from_u64(13);
        let episodes = (0..200).map(|_| generate_episode(rng)).collect::<Vec<_>>();
        let (v, _) = batch_td(&episodes, N_STATES, 0.001, 1., 1e-5, 100_000);
        assert!(v.windows(2).all(|w| w[0] < w[1]), "{v:?}");
    }

    #[test]
    fn oversized_alpha_reports_non_convergence() {
        let rng = &mut StdRng::seed_from_u64(6);
        let episodes = (0..100).map(|_| generate_episode(rng)).collect::<Vec<_>>();
        let (_, passes) = batch_td(&episodes, N_STATES, 0.5, 1., 1e-5, 1_000);
        assert_eq!(passes, 1_000);
    }

    #[test]
    fn batch_td_finds_the_certainty_equivalence_values() {
        use crate::math::linear;
        use ndarray::{Array1, Array2};

        let rng = &mut StdRng::seed_from_u64(6);
        let episodes = (0..100).map(|_| generate_episode(rng)).collect::<Vec<_>>();

        // empirical model of the pooled episodes: visit counts, mean exit
        // rewards, and transition frequencies between nonterminal states
        let mut visits = [0.; N_STATES];
        let mut reward_sums = [0.; N_STATES];
        let mut moves = [[0.; N_STATES]; N_STATES];
        for ep in &episodes {
            for t in 0..ep.len() {
                let s = ep[t].s;
                visits[s] += 1.;
                reward_sums[s] += ep[t].r;
                if t + 1 < ep.len() {
                    moves[s][ep[t + 1].s] += 1.;
                }
            }
        }

        // v = r + P v for the empirical model; exits to the terminals
        // carry value 0 and simply leave row mass off the matrix
        let mut a = Array2::<Continous>::zeros((N_STATES, N_STATES));
        let mut b = Array1::<Continous>::zeros(N_STATES);
        for s in 0..N_STATES {
            assert!(visits[s] > 0., "state {s} unvisited in the pool");
            a[[s, s]] += 1.;
            for n in 0..N_STATES {
                a[[s, n]] -= moves[s][n] / visits[s];
            }
            b[s] = reward_sums[s] / visits[s];
        }
        let ce = linear::solve(&a, &b).unwrap();

        let (v, passes) = batch_td(&episodes, N_STATES, 0.001, 1., 1e-5, 200_000);
        assert!(passes < 200_000);
        for s in 0..N_STATES {
            assert_float_eq!(v[s], ce[s], abs <= 1e-2);
        }
    }

    #[test]
    fn sarsa_solves_the_windy_gridworld() {
        let world = GridWorld::windy(10, 7, vec![0, 0, 0, 1, 1, 1, 2, 2, 1, 0], Point::new(7, 3));
        let rng = &mut StdRng::seed_from_u64(0);
        let (q, rewards) = sarsa(&world, 1_000, 0.5, 0.1, 1., rng);

        // late episodes are far shorter than early ones
        let early: Continous = rewards[..20].iter().sum::<Continous>() / 20.;
        let late: Continous = rewards[rewards.len() - 20..].iter().sum::<Continous>() / 20.;
        assert!(late > early, "early {early} late {late}");

        let path = greedy_trajectory(&world, &q, 50);
        assert_eq!(*path.last().unwrap(), Point::new(7, 3));
        // the optimal episode takes 15 moves
        assert!(path.len() <= 31, "path of {} points", path.len());
    }

    #[test]
    fn sarsa_outperforms_q_learning_online_on_the_cliff() {
        let world = GridWorld::cliff(12, 4);
        let n = 500;

        let rng = &mut StdRng::seed_from_u64(3);
        let (_, sarsa_rewards) = sarsa(&world, n, 0.5, 0.1, 1., rng);
        let rng = &mut StdRng::seed_from_u64(3);
        let (_, q_rewards) = q_learning(&world, n, 0.5, 0.1, 1., rng);

        // skip the shared exploration burn-in
        let tail = |r: &[Continous]| r[100..].iter().sum::<Continous>() / (n - 100) as Continous;
        assert!(
            tail(&sarsa_rewards) > tail(&q_rewards),
            "sarsa {} vs q {}",
            tail(&sarsa_rewards),
            tail(&q_rewards)
        );
    }

    #[test]
    fn q_learning_greedy_path_hugs_the_cliff() {
        let world = GridWorld::cliff(12, 4);
        let rng = &mut StdRng::seed_from_u64(7);
        let (q, _) = q_learning(&world, 1_000, 0.5, 0.1, 1., rng);

        let path = greedy_trajectory(&world, &q, 50);
        assert_eq!(*path.last().unwrap(), Point::new(11, 0));
        // the optimal route is 13 moves; allow a little slack
        assert!(path.len() <= 18, "path of {} points", path.len());
    }

    #[test]
    fn expected_sarsa_also_solves_the_cliff() {
        let world = GridWorld::cliff(12, 4);
        let rng = &mut StdRng::seed_from_u64(19);
        let (q, _) = expected_sarsa(&world, 1_000, 0.5, 0.1, 1., rng);

        let path = greedy_trajectory(&world, &q, 50);
        assert_eq!(*path.last().unwrap(), Point::new(11, 0));
    }
}
