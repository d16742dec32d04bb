pub mod discrete;
pub mod gaussian;
pub mod linear;
pub mod poisson;

pub use discrete::DiscreteDistribution;
pub use gaussian::Gaussian;
pub use poisson::Poisson;
