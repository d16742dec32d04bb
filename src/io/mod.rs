//! Serializable result shapes for the plotting side: value grids, policy
//! tables and metric series. Rendering happens elsewhere; this module only
//! fixes the JSON layout.

use crate::Continous;
use serde::Serialize;

/// A state-value function laid out as rows of a grid, `values[y][x]`.
#[derive(Debug, Clone, Serialize)]
pub struct ValueGrid {
    pub n_x: usize,
    pub n_y: usize,
    pub values: Vec<Vec<Continous>>,
}

impl ValueGrid {
    /// Reshapes a flat, x-major state-indexed vector into grid rows.
    pub fn from_flat(n_x: usize, n_y: usize, v: &[Continous]) -> Self {
        assert_eq!(v.len(), n_x * n_y, "Value vector must fill the grid.");
        let values = (0..n_y)
            .map(|y| v[y * n_x..(y + 1) * n_x].to_vec())
            .collect();
        Self { n_x, n_y, values }
    }
}

/// A deterministic policy over a grid, one action per cell.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyGrid<A> {
    pub n_x: usize,
    pub n_y: usize,
    pub actions: Vec<Vec<A>>,
}

impl<A: Clone> PolicyGrid<A> {
    pub fn from_flat(n_x: usize, n_y: usize, actions: &[A]) -> Self {
        assert_eq!(actions.len(), n_x * n_y, "Policy vector must fill the grid.");
        let actions = (0..n_y)
            .map(|y| actions[y * n_x..(y + 1) * n_x].to_vec())
            .collect();
        Self { n_x, n_y, actions }
    }
}

/// A named scalar series, e.g. reward per episode or RMS error per sweep.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Continous>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<Continous>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::grid_world::Action;

    #[test]
    fn value_grid_reshapes_x_major() {
        let grid = ValueGrid::from_flat(3, 2, &[0., 1., 2., 3., 4., 5.]);
        assert_eq!(grid.values, vec![vec![0., 1., 2.], vec![3., 4., 5.]]);
    }

    #[test]
    fn exports_parse_back_as_json() {
        let grid = ValueGrid::from_flat(2, 1, &[1.5, -2.]);
        let json: serde_json::Value = serde_json::from_str(&to_json(&grid).unwrap()).unwrap();
        assert_eq!(json["n_x"], 2);
        assert_eq!(json["values"][0][1], -2.);

        let policy = PolicyGrid::from_flat(2, 1, &[Action::North, Action::East]);
        let json: serde_json::Value = serde_json::from_str(&to_json(&policy).unwrap()).unwrap();
        assert_eq!(json["actions"][0][0], "North");

        let series = Series::new("reward", vec![0., -1.]);
        let json: serde_json::Value = serde_json::from_str(&to_json(&series).unwrap()).unwrap();
        assert_eq!(json["name"], "reward");
    }

    #[test]
    #[should_panic(expected = "fill the grid")]
    fn mismatched_shape_is_rejected() {
        ValueGrid::from_flat(3, 3, &[0.; 8]);
    }
}
