use crate::Continous;
use tracing::debug;

/// The gambler's problem (Example 4.3): capital 1..=n, target n + 1, a
/// biased coin, wagers bounded by the current capital and the distance to
/// the target.
pub struct GamblersProblem {
    /// Number of non-terminal capital states; the target is `n + 1`.
    pub n: usize,
    pub p_head: Continous,
}

/// Slack when collecting near-optimal wagers; values this close to the best
/// count as ties.
const ACTION_SLACK: Continous = 1e-5;

impl GamblersProblem {
    pub fn new(n: usize, p_head: Continous) -> Self {
        assert!((0. ..=1.).contains(&p_head), "p_head must be a probability.");
        Self { n, p_head }
    }

    fn target(&self) -> usize {
        self.n + 1
    }

    /// Best attainable value of `state` under `v`, plus every wager within
    /// `ACTION_SLACK` of it. `v[i]` holds the value of capital `i + 1`.
    pub fn next_value(&self, state: usize, v: &[Continous]) -> (Continous, Vec<usize>) {
        let i = state - 1;
        let target = self.target();

        let mut best_value = 0.;
        let mut best_actions = vec![];
        for a in 0..=state.min(target - state) {
            let head_value = if state + a == target {
                self.p_head
            } else {
                self.p_head * v[i + a]
            };
            let tail_value = if state == a {
                0.
            } else {
                (1. - self.p_head) * v[i - a]
            };
            let expected = head_value + tail_value;
            if expected > best_value {
                best_value = expected;
            }
        }

        for a in 0..=state.min(target - state) {
            let head_value = if state + a == target {
                self.p_head
            } else {
                self.p_head * v[i + a]
            };
            let tail_value = if state == a {
                0.
            } else {
                (1. - self.p_head) * v[i - a]
            };
            if (head_value + tail_value - best_value).abs() < ACTION_SLACK {
                best_actions.push(a);
            }
        }

        (best_value, best_actions)
    }

    /// Value iteration over the capital states, returning the optimal value
    /// function and every intermediate sweep (the early sweeps are part of
    /// the published figure).
    pub fn value_iteration(&self, theta: Continous) -> Vec<Vec<Continous>> {
        let mut v = vec![0.; self.n];
        let mut sweeps = vec![v.clone()];

        let mut count = 0;
        loop {
            let mut delta: Continous = 0.;
            count += 1;
            for i in 0..self.n {
                let next_v = self.next_value(i + 1, &v).0;
                delta = delta.max((v[i] - next_v).abs());
                v[i] = next_v;
            }
            debug!(sweep = count, delta, "gambler value iteration sweep");
            sweeps.push(v.clone());
            if delta < theta {
                return sweeps;
            }
        }
    }

    /// Greedy stake per capital state. When several wagers tie for the best
    /// value the smallest non-zero one wins; the zero wager is never chosen
    /// even when it ties.
    pub fn policy_from_value(&self, v: &[Continous]) -> Vec<usize> {
        (1..=self.n)
            .map(|state| {
                let (_, actions) = self.next_value(state, v);
                actions
                    .into_iter()
                    .find(|&a| a != 0)
                    .expect("every capital state admits a non-zero wager")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;

    #[test]
    fn values_are_monotone_in_capital() {
        let gp = GamblersProblem::new(99, 0.4);
        let v = gp.value_iteration(1e-6).last().unwrap().clone();

        for i in 1..v.len() {
            assert!(v[i] >= v[i - 1] - 1e-9);
        }
        // near the target the win probability approaches p_head from above
        assert!(v[98] >= 0.4);
        assert!(v[0] > 0.);
    }

    #[test]
    fn tie_break_never_selects_the_null_wager() {
        let gp = GamblersProblem::new(99, 0.4);
        let v = gp.value_iteration(1e-6).last().unwrap().clone();
        let policy = gp.policy_from_value(&v);

        assert_eq!(policy.len(), 99);
        assert!(policy.iter().all(|&a| a > 0));
        // capital 50 stakes everything on one flip under p_head < 0.5
        assert_eq!(policy[49], 50);
    }

    #[test]
    fn wagers_are_bounded_by_capital_and_target() {
        let gp = GamblersProblem::new(99, 0.4);
        let v = vec![0.; 99];
        let (_, actions) = gp.next_value(3, &v);
        assert!(actions.iter().all(|&a| a <= 3));
        let (_, actions) = gp.next_value(98, &v);
        assert!(actions.iter().all(|&a| a <= 2));
    }

    #[test]
    fn all_zero_value_function_still_scores_terminal_wins() {
        let gp = GamblersProblem::new(99, 0.4);
        let v = vec![0.; 99];
        // from 99, staking 1 wins with p_head
        let (best, _) = gp.next_value(99, &v);
        assert_float_eq!(best, 0.4, abs <= 1e-12);
    }
}
