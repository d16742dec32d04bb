use crate::Continous;
use ndarray::{Array1, Array2};

/// Solves `A x = b` by Gaussian elimination with partial pivoting.
/// Returns `None` when the system is singular.
pub fn solve(a: &Array2<Continous>, b: &Array1<Continous>) -> Option<Array1<Continous>> {
    let n = a.nrows();
    assert_eq!(a.ncols(), n, "Coefficient matrix must be square.");
    assert_eq!(b.len(), n, "RHS length must match matrix dimension.");

    let mut m = a.clone();
    let mut rhs = b.clone();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| m[[i, col]].abs().partial_cmp(&m[[j, col]].abs()).unwrap())?;
        if m[[pivot_row, col]].abs() < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for k in 0..n {
                m.swap([pivot_row, k], [col, k]);
            }
            rhs.swap(pivot_row, col);
        }

        for row in (col + 1)..n {
            let factor = m[[row, col]] / m[[col, col]];
            if factor == 0. {
                continue;
            }
            for k in col..n {
                let v = m[[col, k]];
                m[[row, k]] -= factor * v;
            }
            let v = rhs[col];
            rhs[row] -= factor * v;
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut acc = rhs[row];
        for k in (row + 1)..n {
            acc -= m[[row, k]] * x[k];
        }
        x[row] = acc / m[[row, row]];
    }

    Some(x)
}
