pub mod blackjack;
pub mod car_rental;
pub mod gamblers;
pub mod grid_world;
pub mod infinite_variance;
pub mod random_walk;
