//! Produces the next generation's offspring from a scored population.

use rand::Rng;

use crate::error::EvolutionError;
use crate::evolution::crossover::crossover;
use crate::evolution::merge::merge_two_networks;
use crate::evolution::mutator::{Mutator, MutatorConfig};
use crate::evolution::origin::{Origin, ReproductionType};
use crate::evolution::selection::tournament_selection_index;
use crate::network::Network;

/// Relative likelihood of each reproduction operator. Normalized by the
/// total, the weights do not need to sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct ReproductionRates {
    pub mutation: f64,
    pub crossover: f64,
    pub merge: f64,
}

impl Default for ReproductionRates {
    fn default() -> Self {
        Self {
            mutation: 0.85,
            crossover: 0.10,
            merge: 0.05,
        }
    }
}

impl ReproductionRates {
    fn sample(&self, rng: &mut impl Rng) -> ReproductionType {
        let choices = [
            (ReproductionType::Crossover, self.crossover),
            (ReproductionType::Merge, self.merge),
            (ReproductionType::Mutation, self.mutation),
        ];
        *crate::parameter::pick_weighted(&choices, rng)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReproductionConfig {
    pub reproduction_rates: ReproductionRates,
    /// Tournament parameters used for every parent selection.
    pub tournament_size: usize,
    pub tournament_probability: f64,
    pub mutator: MutatorConfig,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            reproduction_rates: ReproductionRates::default(),
            tournament_size: 10,
            tournament_probability: 1.0,
            mutator: MutatorConfig::default(),
        }
    }
}

/// Breeds offspring by repeatedly drawing an operator and tournament-selected
/// parents until enough children exist.
#[derive(Debug, Clone)]
pub struct Reproduction {
    config: ReproductionConfig,
    mutator: Mutator,
}

impl Reproduction {
    pub fn new(config: ReproductionConfig) -> Self {
        let mutator = Mutator::new(config.mutator.clone());
        Self { config, mutator }
    }

    pub fn config(&self) -> &ReproductionConfig {
        &self.config
    }

    pub fn mutator(&self) -> &Mutator {
        &self.mutator
    }

    /// Create exactly `amount` offspring from the scored population, also
    /// returning each child's origin (operator plus parent indices into
    /// `population`). Crossover yields two children per application;
    /// overshoot is truncated so both lists hold `amount` entries.
    pub fn create_networks(
        &self,
        population: &[Network],
        fitness_scores: &[f64],
        amount: usize,
        rng: &mut impl Rng,
    ) -> Result<(Vec<Network>, Vec<Origin>), EvolutionError> {
        if population.len() != fitness_scores.len() {
            return Err(EvolutionError::LengthMismatch);
        }
        assert!(!population.is_empty(), "cannot reproduce an empty population");

        let mut offspring: Vec<Network> = Vec::with_capacity(amount);
        let mut origins: Vec<Origin> = Vec::with_capacity(amount);

        while offspring.len() < amount {
            let kind = self.config.reproduction_rates.sample(rng);
            let first = tournament_selection_index(
                fitness_scores,
                self.config.tournament_size,
                self.config.tournament_probability,
                rng,
            );
            match kind {
                ReproductionType::Mutation => {
                    offspring.push(self.mutator.apply_mutations(&population[first], rng));
                    origins.push(Origin::new(ReproductionType::Mutation, vec![first]));
                }
                ReproductionType::Crossover => {
                    let Some(second) = self.select_excluding(fitness_scores, first, rng) else {
                        continue;
                    };
                    let (child1, child2) =
                        crossover(&population[first], &population[second], rng)?;
                    offspring.push(child1);
                    origins.push(Origin::new(ReproductionType::Crossover, vec![first, second]));
                    offspring.push(child2);
                    origins.push(Origin::new(ReproductionType::Crossover, vec![first, second]));
                }
                ReproductionType::Merge => {
                    let Some(second) = self.select_excluding(fitness_scores, first, rng) else {
                        continue;
                    };
                    let child =
                        merge_two_networks(&population[first], &population[second], rng)?;
                    offspring.push(child);
                    origins.push(Origin::new(ReproductionType::Merge, vec![first, second]));
                }
                ReproductionType::Random | ReproductionType::Same => {
                    unreachable!("rates only sample breeding operators")
                }
            }
        }

        offspring.truncate(amount);
        origins.truncate(amount);
        Ok((offspring, origins))
    }

    /// Tournament over the population with one index masked out, so the two
    /// parents of a crossover or merge are always distinct individuals.
    /// `None` when the population has no other member.
    fn select_excluding(
        &self,
        fitness_scores: &[f64],
        excluded: usize,
        rng: &mut impl Rng,
    ) -> Option<usize> {
        let candidates: Vec<usize> =
            (0..fitness_scores.len()).filter(|i| *i != excluded).collect();
        if candidates.is_empty() {
            return None;
        }
        let scores: Vec<f64> = candidates.iter().map(|i| fitness_scores[*i]).collect();
        let winner = tournament_selection_index(
            &scores,
            self.config.tournament_size,
            self.config.tournament_probability,
            rng,
        );
        Some(candidates[winner])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Neuron;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn population(size: usize, seed: u64) -> Vec<Network> {
        let base = Network::new(vec![Neuron::new(0)], vec![Neuron::new(1)], vec![]).unwrap();
        let mutator = Mutator::new(MutatorConfig::default());
        let mut rng = StdRng::seed_from_u64(seed);
        (0..size)
            .map(|_| mutator.apply_mutations(&base, &mut rng))
            .collect()
    }

    #[test]
    fn produces_exactly_the_requested_amount() {
        let reproduction = Reproduction::new(ReproductionConfig::default());
        let population = population(6, 31);
        let scores = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut rng = StdRng::seed_from_u64(32);
        for amount in [0, 1, 5, 13] {
            let (offspring, origins) = reproduction
                .create_networks(&population, &scores, amount, &mut rng)
                .unwrap();
            assert_eq!(offspring.len(), amount);
            assert_eq!(origins.len(), amount);
        }
    }

    #[test]
    fn origins_reference_valid_parents() {
        let reproduction = Reproduction::new(ReproductionConfig::default());
        let population = population(4, 33);
        let scores = vec![1.0, 2.0, 3.0, 4.0];
        let mut rng = StdRng::seed_from_u64(34);
        let (_, origins) = reproduction
            .create_networks(&population, &scores, 20, &mut rng)
            .unwrap();
        for origin in &origins {
            match origin.reproduction_type {
                ReproductionType::Mutation => assert_eq!(origin.associated_networks.len(), 1),
                ReproductionType::Crossover | ReproductionType::Merge => {
                    assert_eq!(origin.associated_networks.len(), 2);
                    assert_ne!(origin.associated_networks[0], origin.associated_networks[1]);
                }
                other => panic!("unexpected origin {other:?}"),
            }
            for index in &origin.associated_networks {
                assert!(*index < population.len());
            }
        }
    }

    #[test]
    fn two_parent_operators_skip_on_singleton_populations() {
        let mut config = ReproductionConfig::default();
        config.reproduction_rates = ReproductionRates {
            mutation: 0.5,
            crossover: 0.25,
            merge: 0.25,
        };
        let reproduction = Reproduction::new(config);
        let population = population(1, 35);
        let scores = vec![1.0];
        let mut rng = StdRng::seed_from_u64(36);
        let (offspring, origins) = reproduction
            .create_networks(&population, &scores, 8, &mut rng)
            .unwrap();
        assert_eq!(offspring.len(), 8);
        assert!(origins
            .iter()
            .all(|o| o.reproduction_type == ReproductionType::Mutation));
    }

    #[test]
    fn mismatched_scores_are_rejected() {
        let reproduction = Reproduction::new(ReproductionConfig::default());
        let population = population(3, 37);
        let scores = vec![1.0, 2.0];
        let mut rng = StdRng::seed_from_u64(38);
        assert!(reproduction
            .create_networks(&population, &scores, 2, &mut rng)
            .is_err());
    }
}
