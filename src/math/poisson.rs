use crate::Continous;
use rand::Rng;

/// Poisson sampler via the inverse transform method.
/// Ref: http://www.columbia.edu/~ks20/4404-Sigman/4404-Notes-ITM.pdf
#[derive(Debug, Clone, Copy)]
pub struct Poisson {
    pub lambda: Continous,
}

impl Poisson {
    pub fn new(mean: Continous) -> Self {
        assert!(mean > 0., "Poisson mean must be positive.");
        Self { lambda: mean }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let threshold = (-self.lambda).exp();
        let mut x = 0;
        let mut p: Continous = rng.gen();
        while p >= threshold {
            p *= rng.gen::<Continous>();
            x += 1;
        }
        x
    }

    /// pmf computed with a running product, so repeated calls inside DP
    /// sweeps never touch a factorial.
    pub fn prob(&self, n: usize) -> Continous {
        let mut p = (-self.lambda).exp();
        for i in 1..=n {
            p *= self.lambda / i as Continous;
        }
        p
    }

    /// pmf table for draws `0..cap`, for callers that enumerate outcomes.
    pub fn prob_table(&self, cap: usize) -> Vec<Continous> {
        (0..cap).map(|n| self.prob(n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;
    use rand::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.0)]
    #[case(3.0)]
    #[case(4.0)]
    fn sample_mean_tracks_lambda(#[case] lambda: Continous) {
        let d = Poisson::new(lambda);
        let rng = &mut StdRng::seed_from_u64(11);

        let n = 100_000;
        let mean = (0..n).map(|_| d.sample(rng)).sum::<usize>() as Continous / n as Continous;
        assert_float_eq!(mean, lambda, abs <= 3e-2);
    }

    #[test]
    fn pmf_matches_closed_form() {
        let d = Poisson::new(3.0);
        // e^-3 * 3^4 / 4!
        assert_float_eq!(d.prob(4), 0.16803135574154085, abs <= 1e-12);
        assert_float_eq!(d.prob(0), (-3.0f64).exp(), abs <= 1e-12);
    }

    #[test]
    fn pmf_table_nearly_sums_to_one() {
        let d = Poisson::new(4.0);
        let total = d.prob_table(15).iter().sum::<Continous>();
        assert_float_eq!(total, 1.0, abs <= 1e-4);
    }
}
