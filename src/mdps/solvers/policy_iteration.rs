use super::{expected_return, greedy_action};
use crate::mdps::{Mdp, MdpSolver};
use crate::{Continous, Discrete};
use std::rc::Rc;
use tracing::debug;

/// Policy iteration: full policy evaluation alternated with greedy policy
/// improvement until the policy stops changing.
#[derive(Clone)]
pub struct PolicyIteration {
    mdp: Rc<dyn Mdp>,
    v: Vec<Continous>,
    pi: Vec<Discrete>,
}

impl PolicyIteration {
    pub fn new(mdp: Rc<dyn Mdp>, initial_v: Continous, initial_action: Discrete) -> Self {
        let n_s = mdp.n_s();
        Self {
            mdp,
            v: vec![initial_v; n_s],
            pi: vec![initial_action; n_s],
        }
    }

    /// Current (not necessarily optimal) policy table.
    pub fn policy(&self) -> &[Discrete] {
        &self.pi
    }

    /// Evaluation sweeps for the current fixed policy, in place. The sweep
    /// cap matters at gamma = 1: a policy that strands states away from
    /// every terminal diverges at a constant delta, and the cap turns that
    /// into a truncated evaluation the next improvement step recovers from.
    const MAX_EVAL_SWEEPS: usize = 10_000;

    fn evaluate(&mut self, theta: Continous) -> usize {
        let transitions = self.mdp.transitions();
        let gamma = self.mdp.gamma();

        let mut count = 0;
        while count < Self::MAX_EVAL_SWEEPS {
            let mut delta: Continous = 0.;
            count += 1;
            for s in 0..self.mdp.n_s() {
                let next_v =
                    expected_return(&transitions, s as Discrete, self.pi[s], &self.v, gamma);
                delta = delta.max((self.v[s] - next_v).abs());
                self.v[s] = next_v;
            }
            if delta < theta {
                return count;
            }
        }
        count
    }

    /// Q gaps below this count as ties and the incumbent action is kept.
    /// Evaluating to a finite theta leaves noise in the values, and
    /// re-picking the first maximizer from scratch would flip near-tied
    /// actions between rounds without ever reaching a stable policy.
    const IMPROVEMENT_SLACK: Continous = 1e-3;

    /// Greedy improvement; returns whether the policy was left unchanged.
    fn improve(&mut self) -> bool {
        let transitions = self.mdp.transitions();
        let gamma = self.mdp.gamma();

        let mut is_stable = true;
        for s in 0..self.mdp.n_s() {
            let incumbent = self.pi[s];
            let best = greedy_action(&transitions, s as Discrete, self.mdp.n_a(), &self.v, gamma);
            if best == incumbent {
                continue;
            }
            let q_best = expected_return(&transitions, s as Discrete, best, &self.v, gamma);
            let q_incumbent =
                expected_return(&transitions, s as Discrete, incumbent, &self.v, gamma);
            if q_best - q_incumbent < Self::IMPROVEMENT_SLACK {
                continue;
            }
            self.pi[s] = best;
            is_stable = false;
        }
        is_stable
    }
}

impl MdpSolver<bool> for PolicyIteration {
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
            .then(|| self.pi[s as usize])
    }

    fn exec(&mut self, theta: Continous, num_iterations: Option<usize>) -> (bool, usize) {
        let cap = num_iterations.unwrap_or(usize::MAX);
        let mut rounds = 0;
        while rounds < cap {
            rounds += 1;
            let sweeps = self.evaluate(theta);
            let is_stable = self.improve();
            debug!(round = rounds, sweeps, is_stable, "policy iteration round");
            if is_stable {
                return (true, rounds);
            }
        }
        (false, rounds)
    }
}
