pub mod solvers;

use crate::{Continous, Discrete};
use std::collections::HashMap;
use std::rc::Rc;

/// A single weighted outcome of taking an action in a state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next_state: Discrete,
    pub probability: Continous,
    pub reward: Continous,
    pub done: bool,
}

/// Tabular dynamics: `(state, action)` to the distribution over outcomes.
pub type Transitions = HashMap<(Discrete, Discrete), Vec<Transition>>;

/// Markov Decision Process - Sutton & Barto 2018.
pub trait Mdp {
    fn n_s(&self) -> usize;

    fn n_a(&self) -> usize;

    fn transitions(&self) -> Rc<Transitions>;

    fn gamma(&self) -> Continous;
}

/// A solver that has produced (or is producing) optimal value estimates.
///
/// `exec` runs the solver's convergence loop: `theta` is the sup-norm
/// termination threshold and `num_iterations` an optional sweep cap so a
/// non-converging loop surfaces as a `(false, cap)` result instead of
/// spinning forever.
pub trait MdpSolver<T> {
    fn v_star(&self, s: Discrete) -> Continous;

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<Continous>;

    fn pi_star(&self, s: Discrete) -> Option<Discrete>;

    fn exec(&mut self, theta: Continous, num_iterations: Option<usize>) -> (T, usize);
}

/// One event of an episode: the state entered and the reward received on
/// entering it. The first event carries the start state and reward 0.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeEvent {
    pub s: Discrete,
    pub r: Continous,
}

pub trait EpisodeGenerator {
    fn generate(&self, n: usize) -> Vec<Vec<EpisodeEvent>>;
}

/// A fully enumerated finite MDP, for environments whose dynamics are built
/// up-front rather than sampled.
pub struct TabularMdp {
    n_s: usize,
    n_a: usize,
    gamma: Continous,
    transitions: Rc<Transitions>,
}

impl TabularMdp {
    pub fn new(n_s: usize, n_a: usize, gamma: Continous, transitions: Transitions) -> Self {
        Self {
            n_s,
            n_a,
            gamma,
            transitions: Rc::new(transitions),
        }
    }
}

impl Mdp for TabularMdp {
    fn n_s(&self) -> usize {
        self.n_s
    }

    fn n_a(&self) -> usize {
        self.n_a
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }

    fn gamma(&self) -> Continous {
        self.gamma
    }
}
