pub mod simulation;
pub mod strategies;
pub mod testbed;

pub use simulation::{run_many, RunStats};
pub use strategies::{ActionValues, BanditPolicy, GradientBandit, StepSize, Strategy, ValuePolicy};
pub use testbed::Testbed;
