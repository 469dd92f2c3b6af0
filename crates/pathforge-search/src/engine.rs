//! The generational search loop.
//!
//! Phase order per run:
//! 1. Initializing: seed tests for every declared method, padded with
//!    mutants up to `population_size`.
//! 2. Evaluating: fitness for every chromosome, in parallel. Each worker
//!    writes only its own chromosome.
//! 3. Archiving: chromosomes with fitness > 0.5 and an unseen id join the
//!    archive. The archive never evicts.
//! 4. Terminated when the archive holds at least 10 tests with mean
//!    fitness > 0.9, otherwise Evolving (elitism + crossover/mutation) and
//!    back to 2.
//!
//! Generation `g` draws all randomness from `stage_rng(seed, g)`, so a run
//! is fully determined by seed, configuration and class metadata.

use std::collections::HashSet;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use pathforge_ir::ids::IdGenerator;
use pathforge_ir::types::{BranchTarget, Chromosome, ClassInfo, TestCase};
use pathforge_symbolic::executor::SymbolicExecutor;

use crate::budget::{Budget, StopReason};
use crate::config::{ConfigError, SbstConfig};
use crate::fitness::FitnessCalculator;
use crate::operators::line_count;
use crate::rng::{resolve_seed, stage_rng, INIT_STAGE};
use crate::seed::{JavaTestGenerator, TestGenerator, ALL_METHODS};

/// Fitness a chromosome must exceed to be archived.
pub const ARCHIVE_THRESHOLD: f64 = 0.5;
/// Archive size at which convergence is checked.
pub const CONVERGENCE_ARCHIVE_SIZE: usize = 10;
/// Mean archived fitness that counts as converged.
pub const CONVERGENCE_FITNESS: f64 = 0.9;
/// Parents are drawn from this many of the fittest chromosomes.
pub const PARENT_POOL: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    Initializing,
    Evaluating,
    Archiving,
    Evolving,
    Terminated,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u32,
    pub population_size: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub archive_size: usize,
}

pub struct SbstEngine<G: TestGenerator = JavaTestGenerator> {
    config: SbstConfig,
    seed: u64,
    generator: G,
    fitness: FitnessCalculator,
    ids: IdGenerator,
    population: Vec<Chromosome>,
    archive: Vec<TestCase>,
    archived_ids: HashSet<String>,
    generation: u32,
    phase: EnginePhase,
    history: Vec<GenerationStats>,
    stop_reason: Option<StopReason>,
}

impl SbstEngine<JavaTestGenerator> {
    /// Java seeds; branch targets registered from every method body the
    /// metadata carries.
    pub fn new(class: ClassInfo, config: SbstConfig) -> Result<Self, EngineError> {
        let targets = branch_targets(&class);
        Self::with_generator(JavaTestGenerator::new(class), config, targets)
    }
}

impl<G: TestGenerator> SbstEngine<G> {
    pub fn with_generator(
        generator: G,
        config: SbstConfig,
        targets: Vec<BranchTarget>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let seed = resolve_seed(config.seed);
        Ok(Self {
            config,
            seed,
            generator,
            fitness: FitnessCalculator::new(targets),
            ids: IdGenerator::new(),
            population: Vec::new(),
            archive: Vec::new(),
            archived_ids: HashSet::new(),
            generation: 0,
            phase: EnginePhase::Initializing,
            history: Vec::new(),
            stop_reason: None,
        })
    }

    pub fn config(&self) -> &SbstConfig {
        &self.config
    }

    /// The seed actually used (drawn from entropy when none was configured).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    pub fn archive(&self) -> &[TestCase] {
        &self.archive
    }

    /// Completed generations.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn fitness_calculator(&self) -> &FitnessCalculator {
        &self.fitness
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Run the search to completion and return the archive.
    pub fn evolve(&mut self) -> Vec<TestCase> {
        self.reset();
        let class_name = self.generator.class_info().class_name.clone();
        tracing::info!(
            class = %class_name,
            seed = self.seed,
            population_size = self.config.population_size,
            max_generations = self.config.max_generations,
            strategy = ?self.config.strategy,
            "evolution started"
        );

        let budget = Budget::new(self.config.max_generations, self.config.timeout_seconds);
        self.initialize_population();

        let reason = if self.population.is_empty() {
            StopReason::Empty
        } else {
            loop {
                if let Some(reason) = budget.check(self.generation) {
                    if reason == StopReason::Timeout {
                        tracing::warn!(
                            generation = self.generation,
                            elapsed_secs = budget.elapsed_secs(),
                            "search timed out, keeping partial archive"
                        );
                    }
                    break reason;
                }

                let mut rng = stage_rng(self.seed, u64::from(self.generation));

                self.phase = EnginePhase::Evaluating;
                self.evaluate_population();

                self.phase = EnginePhase::Archiving;
                self.update_archive();
                self.record_stats();
                self.generation += 1;

                if self.termination_condition() {
                    self.phase = EnginePhase::Terminated;
                    break StopReason::Converged;
                }

                self.phase = EnginePhase::Evolving;
                self.evolve_population(&mut rng);
            }
        };

        self.stop_reason = Some(reason);
        self.phase = EnginePhase::Done;
        tracing::info!(
            class = %class_name,
            generations = self.generation,
            archive = self.archive.len(),
            reason = ?reason,
            "evolution finished"
        );
        self.archive.clone()
    }

    /// Archive sorted by fitness descending, top `n`. Ties keep archive order.
    pub fn get_best_tests(&self, n: usize) -> Vec<TestCase> {
        let mut sorted = self.archive.clone();
        sorted.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        sorted.truncate(n);
        sorted
    }

    fn reset(&mut self) {
        self.ids = IdGenerator::new();
        self.population.clear();
        self.archive.clear();
        self.archived_ids.clear();
        self.history.clear();
        self.generation = 0;
        self.stop_reason = None;
        self.phase = EnginePhase::Initializing;
    }

    fn initialize_population(&mut self) {
        let class_name = self.generator.class_info().class_name.clone();
        let seeds = self.generator.generate(&class_name, ALL_METHODS, &self.ids);
        self.population = seeds.into_iter().map(Chromosome::new).collect();

        if self.population.is_empty() {
            return;
        }

        let mut rng = stage_rng(self.seed, INIT_STAGE);
        while self.population.len() < self.config.population_size {
            let parent = &self.population[rng.gen_range(0..self.population.len())];
            let mutant = self.generator.mutate(&parent.test_case, &mut rng, &self.ids);
            let chromosome = bounded(mutant, parent, self.config.max_test_length, &self.ids);
            self.population.push(chromosome);
        }
    }

    fn evaluate_population(&mut self) {
        let fitness = &self.fitness;
        self.population.par_iter_mut().for_each(|chromosome| {
            let test = &mut chromosome.test_case;
            test.coverage = fitness.calculate_branch_coverage(test);
            let score = fitness.fitness(test);
            test.set_fitness(score);
        });
    }

    fn update_archive(&mut self) {
        sort_by_fitness(&mut self.population);
        for (rank, chromosome) in self.population.iter_mut().enumerate() {
            chromosome.rank = rank;
            let test = &chromosome.test_case;
            if test.fitness > ARCHIVE_THRESHOLD && self.archived_ids.insert(test.id.clone()) {
                self.fitness.record_coverage(test);
                self.archive.push(test.clone());
            }
        }
    }

    fn termination_condition(&self) -> bool {
        if self.archive.len() < CONVERGENCE_ARCHIVE_SIZE {
            return false;
        }
        let mean = self.archive.iter().map(|t| t.fitness).sum::<f64>() / self.archive.len() as f64;
        mean > CONVERGENCE_FITNESS
    }

    fn evolve_population<R: Rng>(&mut self, rng: &mut R) {
        sort_by_fitness(&mut self.population);

        let size = self.config.population_size;
        let population = &self.population;
        let ids = &self.ids;
        let generator = &self.generator;
        let max_lines = self.config.max_test_length;

        let mut next: Vec<Chromosome> = population
            .iter()
            .take(self.config.elite_size)
            .map(|elite| {
                let mut carried = elite.clone();
                carried.age += 1;
                carried
            })
            .collect();

        let pool = population.len().min(PARENT_POOL);
        let crossover = self.config.strategy.uses_crossover() && pool >= 2;
        // Without crossover, mutation must fire every pass or the loop stalls.
        let must_mutate = !crossover && self.config.mutation_rate <= 0.0;

        while next.len() < size {
            if crossover && rng.gen_bool(self.config.crossover_rate) {
                let picks = rand::seq::index::sample(rng, pool, 2);
                let (first, second) = (&population[picks.index(0)], &population[picks.index(1)]);
                let (child1, child2) =
                    generator.crossover(&first.test_case, &second.test_case, rng, ids);
                next.push(bounded(child1, first, max_lines, ids));
                if next.len() < size {
                    next.push(bounded(child2, second, max_lines, ids));
                }
            }

            if must_mutate || rng.gen_bool(self.config.mutation_rate) {
                let parent = &population[rng.gen_range(0..population.len())];
                let mutant = generator.mutate(&parent.test_case, rng, ids);
                next.push(bounded(mutant, parent, max_lines, ids));
            }
        }

        next.truncate(size);
        self.population = next;
    }

    fn record_stats(&mut self) {
        let count = self.population.len();
        let best = self
            .population
            .iter()
            .map(|c| c.test_case.fitness)
            .fold(0.0, f64::max);
        let mean = if count == 0 {
            0.0
        } else {
            self.population.iter().map(|c| c.test_case.fitness).sum::<f64>() / count as f64
        };

        tracing::debug!(
            generation = self.generation,
            best_fitness = best,
            mean_fitness = mean,
            archive = self.archive.len(),
            "generation evaluated"
        );

        self.history.push(GenerationStats {
            generation: self.generation,
            population_size: count,
            best_fitness: best,
            mean_fitness: mean,
            archive_size: self.archive.len(),
        });
    }
}

/// A child over the length limit is replaced by a copy of its parent.
fn bounded(child: TestCase, parent: &Chromosome, max_lines: usize, ids: &IdGenerator) -> Chromosome {
    if line_count(&child) > max_lines {
        let mut copy = parent.copy(ids);
        copy.age = 0;
        copy
    } else {
        Chromosome::new(child)
    }
}

/// Stable sort, fittest first.
fn sort_by_fitness(population: &mut [Chromosome]) {
    population.sort_by(|a, b| b.test_case.fitness.total_cmp(&a.test_case.fitness));
}

/// Branch targets for every method whose body is known.
pub fn branch_targets(class: &ClassInfo) -> Vec<BranchTarget> {
    let executor = SymbolicExecutor::new();
    class
        .methods
        .iter()
        .filter_map(|m| m.body.as_deref().map(|body| (m, body)))
        .flat_map(|(m, body)| executor.branch_targets(&class.class_name, &m.name, body))
        .collect()
}
