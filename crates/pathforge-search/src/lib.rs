pub mod budget;
pub mod config;
pub mod engine;
pub mod fitness;
pub mod operators;
pub mod rng;
pub mod seed;
