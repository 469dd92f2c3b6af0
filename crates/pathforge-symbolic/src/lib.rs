pub mod executor;
pub mod predicate;
pub mod solver;
