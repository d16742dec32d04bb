pub mod bandits;
pub mod envs;
pub mod io;
pub mod math;
pub mod mdps;

pub type Discrete = i32;
pub type Continous = f64;
