use crate::mdps::{EpisodeEvent, EpisodeGenerator};
use crate::{Continous, Discrete};
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// First-visit Monte Carlo prediction over dense integer states.
/// Ref: https://youtu.be/P0ZvxeQqv0A?si=RLKdOUTNEfKXE63C
pub fn mc_first_visit(
    ep_gen: Rc<dyn EpisodeGenerator>,
    gamma: Continous,
    n_s: usize,
    n_ep: usize,
) -> Vec<Continous> {
    mc_core(ep_gen, gamma, n_s, n_ep, is_first_visit)
}

/// Every-visit variant: the same scan without the first-occurrence filter.
pub fn mc_every_visit(
    ep_gen: Rc<dyn EpisodeGenerator>,
    gamma: Continous,
    n_s: usize,
    n_ep: usize,
) -> Vec<Continous> {
    mc_core(ep_gen, gamma, n_s, n_ep, |_, _, _| true)
}

fn mc_core(
    ep_gen: Rc<dyn EpisodeGenerator>,
    gamma: Continous,
    n_s: usize,
    n_ep: usize,
    counts_visit: fn(&[EpisodeEvent], usize, Discrete) -> bool,
) -> Vec<Continous> {
    let mut returns = vec![0 as Continous; n_s];
    let mut visits = vec![0usize; n_s];

    let eps = ep_gen.generate(n_ep);
    for ep in eps.iter().take(n_ep) {
        let mut g = 0.;
        for t in (0..(ep.len() - 1)).rev() {
            g = gamma * g + ep[t + 1].r;
            if counts_visit(ep, t, ep[t].s) {
                returns[ep[t].s as usize] += g;
                visits[ep[t].s as usize] += 1;
            }
        }
    }

    returns
        .iter()
        .zip(&visits)
        .map(|(&r, &v)| if v == 0 { 0. } else { r / v as Continous })
        .collect()
}

fn is_first_visit(ep: &[EpisodeEvent], t: usize, s: Discrete) -> bool {
    if t == 0 {
        return true;
    }

    !ep.iter().take(t).any(|x| x.s == s)
}

/// First-visit prediction over a sparse, hashable state space: a growing
/// returns buffer per state whose mean is the running value estimate.
#[derive(Debug, Default)]
pub struct SparseMc<S> {
    returns: HashMap<S, Vec<Continous>>,
    v: HashMap<S, Continous>,
}

impl<S: Eq + Hash + Clone> SparseMc<S> {
    pub fn new() -> Self {
        Self {
            returns: HashMap::new(),
            v: HashMap::new(),
        }
    }

    /// Records the episode return `g` against the first visit of every
    /// state in `trace`.
    pub fn update(&mut self, trace: &[S], g: Continous) {
        for (t, s) in trace.iter().enumerate() {
            if trace[..t].contains(s) {
                continue;
            }
            let returns = self.returns.entry(s.clone()).or_default();
            returns.push(g);
            self.v.insert(
                s.clone(),
                returns.iter().sum::<Continous>() / returns.len() as Continous,
            );
        }
    }

    pub fn values(&self) -> &HashMap<S, Continous> {
        &self.v
    }

    pub fn into_values(self) -> HashMap<S, Continous> {
        self.v
    }
}

/// Monte Carlo control with exploring starts over `(state, action)` pairs.
/// The tables are pre-populated over the full cartesian domain so that a
/// lookup miss during training is a configuration bug, not a silent default.
/// After each first-visit Q update, the policy is immediately re-greedified
/// from the freshest estimates.
#[derive(Debug)]
pub struct McControlEs<S, A> {
    q: HashMap<(S, A), Continous>,
    returns: HashMap<(S, A), Vec<Continous>>,
    policy: HashMap<S, A>,
    actions: Vec<A>,
}

impl<S, A> McControlEs<S, A>
where
    S: Eq + Hash + Clone,
    A: Eq + Hash + Copy,
{
    pub fn new<I>(states: I, actions: Vec<A>, initial_policy: HashMap<S, A>) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        let mut q = HashMap::new();
        for s in states {
            for &a in &actions {
                q.insert((s.clone(), a), 0.);
            }
        }
        Self {
            q,
            returns: HashMap::new(),
            policy: initial_policy,
            actions,
        }
    }

    /// Records `g` against every first-visit `(state, action)` pair and
    /// re-greedifies the policy at each touched state.
    pub fn update(&mut self, trace: &[(S, A)], g: Continous) {
        for (t, sa) in trace.iter().enumerate() {
            if trace[..t].contains(sa) {
                continue;
            }
            let returns = self.returns.entry(sa.clone()).or_default();
            returns.push(g);
            let mean = returns.iter().sum::<Continous>() / returns.len() as Continous;
            assert!(
                self.q.insert(sa.clone(), mean).is_some(),
                "state-action pair missing from the pre-populated Q table"
            );

            // greedy improvement from the freshest Q; first maximizer in
            // the fixed action order wins ties
            let s = &sa.0;
            let mut best = self.actions[0];
            let mut best_q = self.q[&(s.clone(), best)];
            for &a in &self.actions[1..] {
                let q = self.q[&(s.clone(), a)];
                if q > best_q {
                    best_q = q;
                    best = a;
                }
            }
            self.policy.insert(s.clone(), best);
        }
    }

    pub fn policy(&self) -> &HashMap<S, A> {
        &self.policy
    }

    pub fn q(&self) -> &HashMap<(S, A), Continous> {
        &self.q
    }

    /// State values derived as the max over actions of Q.
    pub fn state_values(&self) -> HashMap<S, Continous> {
        let mut v: HashMap<S, Continous> = HashMap::new();
        for ((s, _), &q) in &self.q {
            v.entry(s.clone())
                .and_modify(|cur| *cur = cur.max(q))
                .or_insert(q);
        }
        v
    }
}

/// Running ordinary and weighted importance-sampling estimators, updated
/// one episode at a time for learning-curve plotting.
#[derive(Debug, Default, Clone)]
pub struct ImportanceSampling {
    rho_g_sum: Continous,
    rho_sum: Continous,
    n: usize,
}

impl ImportanceSampling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rho: Continous, g: Continous) {
        self.rho_g_sum += rho * g;
        self.rho_sum += rho;
        self.n += 1;
    }

    /// `sum(rho G) / n`.
    pub fn ordinary(&self) -> Continous {
        if self.n == 0 {
            0.
        } else {
            self.rho_g_sum / self.n as Continous
        }
    }

    /// `sum(rho G) / sum(rho)`, defined as 0 while the ratio mass is 0.
    pub fn weighted(&self) -> Continous {
        if self.rho_sum == 0. {
            0.
        } else {
            self.rho_g_sum / self.rho_sum
        }
    }
}
