//! The evolution loop: generate, evaluate, select, reproduce, record.

use std::collections::HashMap;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::EvolutionError;
use crate::evolution::generator::{Generator, GeneratorConfig};
use crate::evolution::origin::{Origin, ReproductionType};
use crate::evolution::reproduction::{Reproduction, ReproductionConfig};
use crate::evolution::selection::best_indices;
use crate::evolution::stats::Stats;
use crate::experiment::Experiment;
use crate::network::{Network, NetworkId};

#[derive(Debug, Clone, PartialEq)]
pub struct FrameworkConfig {
    /// Networks per generation.
    pub population_size: usize,
    /// Epochs to run.
    pub num_generations: usize,
    /// Fittest individuals carried over unchanged each epoch.
    pub num_best: usize,
    /// Fraction of the population replaced by fresh random networks each
    /// epoch, for diversity.
    pub random_factor: f64,
    /// Stop early once the best fitness reaches this value.
    pub fitness_target: Option<f64>,
    /// Seed for the run's random generator and the experiment. A fixed
    /// seed makes the whole run reproducible.
    pub seed: Option<u64>,
    /// Write the stats to this file after every epoch, so a crashed run
    /// can be resumed.
    pub snapshot_path: Option<PathBuf>,
    /// Skip re-evaluating individuals whose fitness is already known.
    pub cache_enabled: bool,
    /// Prefill the cache from the stats a resumed run starts from.
    pub cache_warm_up: bool,
    pub generator: GeneratorConfig,
    pub reproduction: ReproductionConfig,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            population_size: 500,
            num_generations: 50,
            num_best: 2,
            random_factor: 0.1,
            fitness_target: None,
            seed: None,
            snapshot_path: None,
            cache_enabled: true,
            cache_warm_up: true,
            generator: GeneratorConfig::default(),
            reproduction: ReproductionConfig::default(),
        }
    }
}

/// Runs the evolutionary optimization of an experiment's fitness function.
///
/// All randomness flows from one seeded generator, so two frameworks with
/// the same seed and configuration produce identical runs.
pub struct Framework<E: Experiment> {
    experiment: E,
    config: FrameworkConfig,
    generator: Generator,
    reproduction: Reproduction,
    fitness_cache: HashMap<NetworkId, f64>,
    rng: StdRng,
}

impl<E: Experiment> Framework<E> {
    pub fn new(mut experiment: E, config: FrameworkConfig) -> Self {
        assert!(config.population_size > 0, "population_size must be positive");
        assert!(config.num_generations > 0, "num_generations must be positive");
        assert!(
            config.num_best < config.population_size,
            "num_best must leave room for offspring"
        );
        assert!(
            (0.0..=1.0).contains(&config.random_factor),
            "random_factor must be a fraction"
        );

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        experiment.set_seed(config.seed);

        let generator = Generator::from_experiment(&experiment, config.generator.clone());
        let reproduction = Reproduction::new(config.reproduction.clone());
        Self {
            experiment,
            config,
            generator,
            reproduction,
            fitness_cache: HashMap::new(),
            rng,
        }
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    pub fn experiment(&self) -> &E {
        &self.experiment
    }

    /// Run the evolution until `num_generations` epochs exist or the
    /// fitness target is reached. Pass the stats of an earlier run to
    /// resume it; already recorded epochs are kept and counted.
    pub fn evolution(&mut self, stats: Option<Stats>) -> Result<Stats, EvolutionError> {
        let mut stats = match stats {
            Some(stats) => {
                if self.config.cache_enabled && self.config.cache_warm_up {
                    self.warm_cache(&stats);
                }
                stats
            }
            None => Stats::new(),
        };
        let epochs = self.config.num_generations;
        let start_epoch = stats.latest_epoch().map(|e| e + 1).unwrap_or(0);

        let mut state = stats
            .latest_population_fitness()
            .map(|(population, scores)| (population.to_vec(), scores.to_vec()));

        if let Some(path) = &self.config.snapshot_path {
            log::info!("saving stats after each epoch to {}", path.display());
        }

        for epoch in start_epoch..epochs {
            stats.start_epoch();

            let (population, operations) = match state {
                None => {
                    let population = self
                        .generator
                        .generate_networks(self.config.population_size, &mut self.rng);
                    let operations = population
                        .iter()
                        .map(|_| Origin::new(ReproductionType::Random, vec![]))
                        .collect();
                    (population, operations)
                }
                Some((population, scores)) => self.do_epoch(&population, &scores)?,
            };

            let fitness_scores = self.evaluate(&population)?;
            stats.add_epoch(population.clone(), fitness_scores.clone(), operations)?;
            if let Some(info) = stats.epoch_information(epoch, epochs) {
                log::info!("{info}");
            }

            if let Some(path) = &self.config.snapshot_path {
                if let Err(error) = stats.to_file(path) {
                    log::warn!("failed to snapshot stats to {}: {error}", path.display());
                }
            }

            let best_fitness = fitness_scores
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            state = Some((population, fitness_scores));

            if let Some(target) = self.config.fitness_target {
                if best_fitness >= target {
                    log::info!("fitness target {target} reached after epoch {}", epoch + 1);
                    break;
                }
            }
        }

        Ok(stats)
    }

    /// Build the next generation: the `num_best` fittest carried over
    /// unchanged, bred offspring, then fresh random networks. The three
    /// groups keep that order in the returned population.
    fn do_epoch(
        &mut self,
        population: &[Network],
        fitness_scores: &[f64],
    ) -> Result<(Vec<Network>, Vec<Origin>), EvolutionError> {
        let random_count = self.random_count();
        let reproduce_count = self.reproduction_amount();

        let mut networks: Vec<Network> = Vec::with_capacity(self.config.population_size);
        let mut operations: Vec<Origin> = Vec::with_capacity(self.config.population_size);

        for index in best_indices(fitness_scores, self.config.num_best) {
            // A plain clone keeps the network id, so the carried-over
            // individual hits the fitness cache again.
            networks.push(population[index].clone());
            operations.push(Origin::new(ReproductionType::Same, vec![index]));
        }

        let (reproduced, reproduced_origins) = self.reproduction.create_networks(
            population,
            fitness_scores,
            reproduce_count,
            &mut self.rng,
        )?;
        networks.extend(reproduced);
        operations.extend(reproduced_origins);

        for network in self.generator.generate_networks(random_count, &mut self.rng) {
            networks.push(network);
            operations.push(Origin::new(ReproductionType::Random, vec![]));
        }

        Ok((networks, operations))
    }

    /// Fitness per network, in population order. With caching enabled only
    /// networks without a cached score reach the experiment, in one batch.
    fn evaluate(&mut self, population: &[Network]) -> Result<Vec<f64>, EvolutionError> {
        if !self.config.cache_enabled {
            return self
                .experiment
                .fitness(population)
                .map_err(EvolutionError::Fitness);
        }

        let non_cached: Vec<Network> = population
            .iter()
            .filter(|n| !self.fitness_cache.contains_key(&n.id()))
            .cloned()
            .collect();
        if !non_cached.is_empty() {
            let scores = self
                .experiment
                .fitness(&non_cached)
                .map_err(EvolutionError::Fitness)?;
            for (network, fitness) in non_cached.iter().zip(scores) {
                self.fitness_cache.insert(network.id(), fitness);
            }
        }
        Ok(population
            .iter()
            .map(|n| self.fitness_cache[&n.id()])
            .collect())
    }

    /// Random networks injected per epoch, capped so the carried-over best
    /// still fit.
    fn random_count(&self) -> usize {
        let count = (self.config.population_size as f64 * self.config.random_factor).round()
            as usize;
        count.min(self.config.population_size - self.config.num_best)
    }

    fn reproduction_amount(&self) -> usize {
        self.config
            .population_size
            .saturating_sub(self.config.num_best)
            .saturating_sub(self.random_count())
    }

    fn warm_cache(&mut self, stats: &Stats) {
        for epoch in 0..stats.epoch_count() {
            let Some(data) = stats.epoch(epoch) else { continue };
            for (network, fitness) in data.population.iter().zip(&data.fitness_scores) {
                self.fitness_cache.insert(network.id(), *fitness);
            }
        }
    }
}
