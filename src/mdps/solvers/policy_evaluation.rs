use super::expected_return;
use crate::math::linear;
use crate::mdps::Mdp;
use crate::Continous;
use ndarray::{Array1, Array2};
use tracing::debug;

/// Iterative policy evaluation: sweep all states until the sup-norm change
/// of a full sweep drops below `theta`.
///
/// `policy` holds one action-probability row per state. Returns the value
/// function, whether the loop converged, and the number of sweeps taken.
pub fn iterative(
    mdp: &dyn Mdp,
    policy: &[Vec<Continous>],
    theta: Continous,
    num_iterations: Option<usize>,
) -> (Vec<Continous>, bool, usize) {
    assert_eq!(policy.len(), mdp.n_s(), "One policy row per state.");

    let transitions = mdp.transitions();
    let gamma = mdp.gamma();
    let mut v = vec![0.; mdp.n_s()];
    let cap = num_iterations.unwrap_or(usize::MAX);

    let mut count = 0;
    while count < cap {
        let mut delta: Continous = 0.;
        count += 1;
        for s in 0..mdp.n_s() {
            let next_v: Continous = (0..mdp.n_a())
                .map(|a| {
                    policy[s][a] * expected_return(&transitions, s as i32, a as i32, &v, gamma)
                })
                .sum();
            delta = delta.max((v[s] - next_v).abs());
            v[s] = next_v;
        }
        debug!(sweep = count, delta, "policy evaluation sweep");
        if delta < theta {
            return (v, true, count);
        }
    }

    (v, false, count)
}

/// Exact policy evaluation: build the Bellman system `V = R + gamma P V` as
/// the dense linear equation `A V = b` and solve it directly. One row per
/// state: self-coefficient -1, transition coefficients `pi(a|s) p gamma`,
/// and the negated expected immediate reward on the right-hand side.
///
/// Returns `None` when the system is singular (possible at gamma = 1 with
/// no terminal states).
pub fn exact(mdp: &dyn Mdp, policy: &[Vec<Continous>]) -> Option<Vec<Continous>> {
    assert_eq!(policy.len(), mdp.n_s(), "One policy row per state.");

    let transitions = mdp.transitions();
    let gamma = mdp.gamma();
    let n_s = mdp.n_s();

    let mut a_mat = Array2::<Continous>::zeros((n_s, n_s));
    let mut b = Array1::<Continous>::zeros(n_s);

    for s in 0..n_s {
        a_mat[[s, s]] -= 1.;
        for a in 0..mdp.n_a() {
            let pi = policy[s][a];
            if pi == 0. {
                continue;
            }
            if let Some(ts) = transitions.get(&(s as i32, a as i32)) {
                for t in ts {
                    if !t.done {
                        a_mat[[s, t.next_state as usize]] += pi * t.probability * gamma;
                    }
                    b[s] -= pi * t.probability * t.reward;
                }
            }
        }
    }

    linear::solve(&a_mat, &b).map(|x| x.to_vec())
}
