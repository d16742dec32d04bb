use super::{expected_return, greedy_action};
use crate::mdps::{Mdp, MdpSolver};
use crate::{Continous, Discrete};
use std::rc::Rc;
use tracing::debug;

/// Value iteration: each sweep replaces a state's value with the best
/// expected one-step return over all actions, terminating on the same
/// sup-norm delta rule as iterative policy evaluation.
#[derive(Clone)]
pub struct ValueIteration {
    mdp: Rc<dyn Mdp>,
    v: Vec<Continous>,
}

impl ValueIteration {
    pub fn new(mdp: Rc<dyn Mdp>, initial_v: Continous) -> Self {
        let n_s = mdp.n_s();
        Self {
            mdp,
            v: vec![initial_v; n_s],
        }
    }

    pub fn values(&self) -> &[Continous] {
        &self.v
    }
}

impl MdpSolver<bool> for ValueIteration {
    fn v_star(&self, s: Discrete) -> Continous {
        self.v[s as usize]
    }

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<Continous> {
        let transitions = self.mdp.transitions();
        transitions
            .contains_key(&(s, a))
            .then(|| expected_return(&transitions, s, a, &self.v, self.mdp.gamma()))
    }

    fn pi_star(&self, s: Discrete) -> Option<Discrete> {
        let transitions = self.mdp.transitions();
        (0..self.mdp.n_a() as Discrete)
            .any(|a| transitions.contains_key(&(s, a)))
            .then(|| greedy_action(&transitions, s, self.mdp.n_a(), &self.v, self.mdp.gamma()))
    }

    fn exec(&mut self, theta: Continous, num_iterations: Option<usize>) -> (bool, usize) {
        let transitions = self.mdp.transitions();
        let gamma = self.mdp.gamma();
        let cap = num_iterations.unwrap_or(usize::MAX);

        let mut count = 0;
        while count < cap {
            let mut delta: Continous = 0.;
            count += 1;
            for s in 0..self.mdp.n_s() {
                let next_v = (0..self.mdp.n_a() as Discrete)
                    .map(|a| expected_return(&transitions, s as Discrete, a, &self.v, gamma))
                    .fold(Continous::NEG_INFINITY, Continous::max);
                delta = delta.max((self.v[s] - next_v).abs());
                self.v[s] = next_v;
            }
            debug!(sweep = count, delta, "value iteration sweep");
            if delta < theta {
                return (true, count);
            }
        }
        (false, count)
    }
}
