use crate::Continous;
use rand::Rng;

/// Gaussian sampler via the Box-Muller transform.
#[derive(Debug, Clone, Copy)]
pub struct Gaussian {
    pub mean: Continous,
    pub deviation: Continous,
}

impl Gaussian {
    pub fn new(mean: Continous, deviation: Continous) -> Self {
        assert!(deviation >= 0., "Deviation must be non-negative.");
        Self { mean, deviation }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Continous {
        if self.deviation == 0. {
            return self.mean;
        }

        // 1 - u maps [0, 1) onto (0, 1] so the log argument is never zero.
        let x1: Continous = 1. - rng.gen::<Continous>();
        let x2: Continous = rng.gen();
        let z1 = (-2. * x1.ln()).sqrt() * (2. * std::f64::consts::PI * x2).cos();

        z1 * self.deviation + self.mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;
    use rand::prelude::*;

    #[test]
    fn sample_moments() {
        let g = Gaussian::new(1.5, 2.0);
        let rng = &mut StdRng::seed_from_u64(7);

        let n = 200_000;
        let samples = (0..n).map(|_| g.sample(rng)).collect::<Vec<_>>();
        let mean = samples.iter().sum::<Continous>() / n as Continous;
        let var = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<Continous>() / n as Continous;

        assert_float_eq!(mean, 1.5, abs <= 2e-2);
        assert_float_eq!(var, 4.0, abs <= 6e-2);
    }

    #[test]
    fn zero_deviation_is_degenerate() {
        let g = Gaussian::new(-3.0, 0.0);
        let rng = &mut StdRng::seed_from_u64(7);
        assert_float_eq!(g.sample(rng), -3.0, abs <= 0.0);
    }
}
