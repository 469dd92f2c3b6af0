//! Search configuration.
//!
//! Fixed for the duration of a run. `validate()` is called by the engine
//! before anything else happens.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Mutation only, no crossover.
    Random,
    Ga,
    Mosa,
    DynaMosa,
}

impl SearchStrategy {
    pub fn uses_crossover(self) -> bool {
        !matches!(self, SearchStrategy::Random)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SbstConfig {
    pub population_size: usize,
    pub max_generations: u32,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    /// Chromosomes carried unchanged into the next generation.
    pub elite_size: usize,
    /// Longest child (in lines) an operator may produce.
    pub max_test_length: usize,
    /// Cooperative wall-clock budget, checked between generations. 0 disables.
    pub timeout_seconds: u64,
    /// `None` draws one from OS entropy when the engine is built.
    pub seed: Option<u64>,
    pub strategy: SearchStrategy,
}

impl Default for SbstConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            elite_size: 5,
            max_test_length: 50,
            timeout_seconds: 60,
            seed: None,
            strategy: SearchStrategy::Mosa,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("population_size must be at least 1")]
    EmptyPopulation,

    #[error("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },

    #[error("elite_size {elite} exceeds population_size {population}")]
    EliteTooLarge { elite: usize, population: usize },

    #[error("no operator can produce children: {0}")]
    NoOperators(&'static str),

    #[error("max_test_length must be at least 1")]
    ZeroTestLength,
}

impl SbstConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        for (name, value) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        if self.elite_size > self.population_size {
            return Err(ConfigError::EliteTooLarge {
                elite: self.elite_size,
                population: self.population_size,
            });
        }
        if self.max_test_length == 0 {
            return Err(ConfigError::ZeroTestLength);
        }

        let crossover = self.strategy.uses_crossover() && self.crossover_rate > 0.0;
        if !crossover && self.mutation_rate == 0.0 {
            return Err(ConfigError::NoOperators(if self.strategy.uses_crossover() {
                "crossover_rate and mutation_rate are both 0"
            } else {
                "random strategy with mutation_rate 0"
            }));
        }
        Ok(())
    }
}
