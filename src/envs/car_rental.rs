use crate::math::Poisson;
use crate::mdps::{TabularMdp, Transition, Transitions};
use crate::{Continous, Discrete};
use itertools::iproduct;
use std::collections::HashMap;

pub const MAX_TRANSFER: i32 = 5;

/// Jack's car rental (Example 4.2): two locations with Poisson-distributed
/// rental requests and returns, overnight transfers capped at
/// `MAX_TRANSFER`, and fleets capped at `max_cars` per location.
pub struct CarRental {
    max_cars: i32,
    /// Truncated pmf tables, one per demand/return stream.
    request1: Vec<Continous>,
    request2: Vec<Continous>,
    return1: Vec<Continous>,
    return2: Vec<Continous>,
}

impl CarRental {
    /// `max_draw` truncates the Poisson enumeration; the tail mass beyond
    /// it is dropped, matching the upstream treatment.
    pub fn new(
        max_cars: usize,
        request_means: (Continous, Continous),
        return_means: (Continous, Continous),
        max_draw: usize,
    ) -> Self {
        Self {
            max_cars: max_cars as i32,
            request1: Poisson::new(request_means.0).prob_table(max_draw),
            request2: Poisson::new(request_means.1).prob_table(max_draw),
            return1: Poisson::new(return_means.0).prob_table(max_draw),
            return2: Poisson::new(return_means.1).prob_table(max_draw),
        }
    }

    /// Cars per location, i.e. `max_cars + 1` counts.
    pub fn n(&self) -> usize {
        self.max_cars as usize + 1
    }

    pub fn n_states(&self) -> usize {
        self.n() * self.n()
    }

    /// Transfer actions, `-MAX_TRANSFER..=MAX_TRANSFER` (positive moves
    /// from location 1 to 2), as a dense index.
    pub fn n_actions(&self) -> usize {
        (2 * MAX_TRANSFER + 1) as usize
    }

    pub fn action_from_index(i: usize) -> i32 {
        i as i32 - MAX_TRANSFER
    }

    pub fn state_index(&self, s1: i32, s2: i32) -> usize {
        s1 as usize * self.n() + s2 as usize
    }

    pub fn state_from_index(&self, i: usize) -> (i32, i32) {
        ((i / self.n()) as i32, (i % self.n()) as i32)
    }

    /// Next fleet sizes and reward, given pre-sampled demand and returns.
    /// The transfer is capped at `MAX_TRANSFER` and at the cars actually
    /// available; fleets are capped at `max_cars`; the reward is
    /// `10 * rented - 2 * transferred`.
    pub fn next_state_and_reward(
        &self,
        s1: i32,
        s2: i32,
        action: i32,
        request1: i32,
        request2: i32,
        return1: i32,
        return2: i32,
    ) -> (i32, i32, Continous) {
        let capped = action.clamp(-MAX_TRANSFER, MAX_TRANSFER).clamp(-s2, s1);
        let transferred = capped.abs();
        let mid1 = s1 - capped;
        let mid2 = s2 + capped;

        let rented1 = request1.min(mid1);
        let rented2 = request2.min(mid2);

        let next1 = (mid1 - rented1 + return1).min(self.max_cars);
        let next2 = (mid2 - rented2 + return2).min(self.max_cars);

        let reward = 10. * (rented1 + rented2) as Continous - 2. * transferred as Continous;
        (next1, next2, reward)
    }

    /// Expectation of `reward + gamma * v[next]` over all demand/return
    /// combinations up to the truncation cap.
    pub fn expected_return(
        &self,
        s1: i32,
        s2: i32,
        action: i32,
        v: &[Vec<Continous>],
        gamma: Continous,
    ) -> Continous {
        let d = self.request1.len();
        iproduct!(0..d, 0..d, 0..d, 0..d)
            .map(|(req1, req2, ret1, ret2)| {
                let prob = self.request1[req1]
                    * self.request2[req2]
                    * self.return1[ret1]
                    * self.return2[ret2];
                let (n1, n2, reward) = self.next_state_and_reward(
                    s1,
                    s2,
                    action,
                    req1 as i32,
                    req2 as i32,
                    ret1 as i32,
                    ret2 as i32,
                );
                prob * (reward + gamma * v[n1 as usize][n2 as usize])
            })
            .sum()
    }

    /// Marginalizes the demand/return enumeration into a tabular MDP so the
    /// generic DP solvers can run on it. Outcomes landing on the same
    /// `(next_state, reward)` pair are merged.
    pub fn to_mdp(&self, gamma: Continous) -> TabularMdp {
        let d = self.request1.len();
        let mut transitions = Transitions::new();

        for s in 0..self.n_states() {
            let (s1, s2) = self.state_from_index(s);
            for a_idx in 0..self.n_actions() {
                let action = Self::action_from_index(a_idx);
                let mut merged: HashMap<(Discrete, i64), Continous> = HashMap::new();
                for (req1, req2, ret1, ret2) in iproduct!(0..d, 0..d, 0..d, 0..d) {
                    let prob = self.request1[req1]
                        * self.request2[req2]
                        * self.return1[ret1]
                        * self.return2[ret2];
                    let (n1, n2, reward) = self.next_state_and_reward(
                        s1,
                        s2,
                        action,
                        req1 as i32,
                        req2 as i32,
                        ret1 as i32,
                        ret2 as i32,
                    );
                    let key = (self.state_index(n1, n2) as Discrete, reward as i64);
                    *merged.entry(key).or_insert(0.) += prob;
                }

                let ts = merged
                    .into_iter()
                    .map(|((next_state, reward), probability)| Transition {
                        next_state,
                        probability,
                        reward: reward as Continous,
                        done: false,
                    })
                    .collect();
                transitions.insert((s as Discrete, a_idx as Discrete), ts);
            }
        }

        TabularMdp::new(self.n_states(), self.n_actions(), gamma, transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdps::{Mdp, MdpSolver};
    use crate::mdps::solvers::policy_iteration::PolicyIteration;
    use float_eq::*;
    use std::rc::Rc;

    #[test]
    fn transfer_then_rent_then_return() {
        let cr = CarRental::new(20, (3., 4.), (3., 2.), 15);

        // move 3 cars from lot 1 to lot 2, rent 2 + 4, return 1 + 0
        let (n1, n2, r) = cr.next_state_and_reward(10, 5, 3, 2, 4, 1, 0);
        assert_eq!(n1, 10 - 3 - 2 + 1);
        assert_eq!(n2, 5 + 3 - 4);
        assert_float_eq!(r, 10. * 6. - 2. * 3., abs <= 0.0);
    }

    #[test]
    fn transfer_is_capped_by_limit_and_availability() {
        let cr = CarRental::new(20, (3., 4.), (3., 2.), 15);

        // request of 9 exceeds the +/-5 cap
        let (n1, n2, r) = cr.next_state_and_reward(10, 5, 9, 0, 0, 0, 0);
        assert_eq!((n1, n2), (5, 10));
        assert_float_eq!(r, -10., abs <= 0.0);

        // only 2 cars available at lot 1
        let (n1, n2, r) = cr.next_state_and_reward(2, 5, 5, 0, 0, 0, 0);
        assert_eq!((n1, n2), (0, 7));
        assert_float_eq!(r, -4., abs <= 0.0);
    }

    #[test]
    fn fleets_are_capped_at_max_cars() {
        let cr = CarRental::new(20, (3., 4.), (3., 2.), 15);
        let (n1, n2, _) = cr.next_state_and_reward(20, 20, 0, 0, 0, 10, 10);
        assert_eq!((n1, n2), (20, 20));
    }

    #[test]
    fn policy_iteration_stabilizes_within_ten_rounds() {
        // reduced fleet to keep the test quick; dynamics are identical
        let cr = CarRental::new(5, (3., 4.), (3., 2.), 9);
        let mdp = Rc::new(cr.to_mdp(0.9)) as Rc<dyn Mdp>;

        // initial policy: never move any cars (transfer 0 sits at index 5)
        let zero_transfer = MAX_TRANSFER as Discrete;
        let mut pi = PolicyIteration::new(Rc::clone(&mdp), 0., zero_transfer);
        let (stable, rounds) = pi.exec(1e-5, Some(10));
        assert!(stable);
        assert!(rounds <= 10);

        // every state has a defined optimal transfer
        for s in 0..mdp.n_s() {
            assert!(pi.pi_star(s as Discrete).is_some());
        }

        // a stable policy stays stable: running the solver again must not
        // flip near-tied transfer actions back and forth
        let first = (0..mdp.n_s())
            .map(|s| pi.pi_star(s as Discrete))
            .collect::<Vec<_>>();
        let (still_stable, extra_rounds) = pi.exec(1e-5, Some(5));
        assert!(still_stable);
        assert_eq!(extra_rounds, 1);
        let second = (0..mdp.n_s())
            .map(|s| pi.pi_star(s as Discrete))
            .collect::<Vec<_>>();
        assert_eq!(first, second);
    }
}
