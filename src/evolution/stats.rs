//! Per-epoch records of a run: populations, fitness scores, provenance and
//! timing, plus the JSON snapshot format used to pause and resume runs.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::EvolutionError;
use crate::evolution::origin::{Origin, ReproductionType};
use crate::evolution::selection::best_indices;
use crate::network::{Network, NetworkDocument};

/// One evaluated generation.
#[derive(Debug, Clone)]
pub struct EpochStats {
    /// Wall-clock seconds from `start_epoch` to `add_epoch`.
    pub took: f64,
    pub population: Vec<Network>,
    pub fitness_scores: Vec<f64>,
    pub operations: Vec<Origin>,
}

/// Full history of a run. Appended to once per epoch; a run can be resumed
/// from the latest epoch of a loaded instance.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    data: Vec<EpochStats>,
    last_epoch_start: Option<Instant>,
}

/// A network's full ancestry: its own origin plus the recursively resolved
/// lineage of each parent in the previous epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct Lineage {
    pub origin: Origin,
    pub parents: Vec<Lineage>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the timer whose elapsed time becomes the next epoch's `took`.
    pub fn start_epoch(&mut self) {
        self.last_epoch_start = Some(Instant::now());
    }

    /// Record one evaluated generation. All three lists describe the same
    /// individuals and must have the same length.
    pub fn add_epoch(
        &mut self,
        population: Vec<Network>,
        fitness_scores: Vec<f64>,
        operations: Vec<Origin>,
    ) -> Result<(), EvolutionError> {
        if population.len() != fitness_scores.len() || operations.len() != population.len() {
            return Err(EvolutionError::LengthMismatch);
        }
        let took = self
            .last_epoch_start
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.data.push(EpochStats {
            took,
            population,
            fitness_scores,
            operations,
        });
        Ok(())
    }

    pub fn epoch(&self, epoch: usize) -> Option<&EpochStats> {
        self.data.get(epoch)
    }

    /// Index of the newest epoch, `None` before the first `add_epoch`.
    pub fn latest_epoch(&self) -> Option<usize> {
        self.data.len().checked_sub(1)
    }

    pub fn epoch_count(&self) -> usize {
        self.data.len()
    }

    pub fn latest_population_fitness(&self) -> Option<(&[Network], &[f64])> {
        self.data
            .last()
            .map(|e| (e.population.as_slice(), e.fitness_scores.as_slice()))
    }

    /// The fittest individual of one epoch (the latest when `epoch` is
    /// `None`). Ties resolve to the earliest index.
    pub fn best_network(&self, epoch: Option<usize>) -> Option<&Network> {
        let epoch = self.data.get(epoch.or_else(|| self.latest_epoch())?)?;
        let index = *best_indices(&epoch.fitness_scores, 1).first()?;
        epoch.population.get(index)
    }

    /// The fittest individual across all epochs, with its fitness. Ties
    /// resolve to the earliest occurrence.
    pub fn best_network_alltime(&self) -> Option<(&Network, f64)> {
        let mut found: Option<(&Network, f64)> = None;
        for epoch in &self.data {
            for (network, fitness) in epoch.population.iter().zip(&epoch.fitness_scores) {
                if found.map_or(true, |(_, best)| *fitness > best) {
                    found = Some((network, *fitness));
                }
            }
        }
        found
    }

    pub fn total_time_took(&self) -> f64 {
        self.data.iter().map(|e| e.took).sum()
    }

    /// One-line progress report for an epoch, formatted for the run log.
    pub fn epoch_information(&self, epoch: usize, epochs: usize) -> Option<String> {
        let data = self.epoch(epoch)?;
        let best = data
            .fitness_scores
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let average =
            data.fitness_scores.iter().sum::<f64>() / data.fitness_scores.len().max(1) as f64;
        let width = epochs.to_string().len();
        Some(format!(
            "Epoch {:>width$}/{} - Best fitness: {:.4} - Average fitness: {:.4} - Took {:.4}s",
            epoch + 1,
            epochs,
            best,
            average,
            data.took,
        ))
    }

    /// Whether two runs went through identical populations, compared by
    /// graph distance per individual. Timing and scores are ignored.
    pub fn same_populations(&self, other: &Stats) -> bool {
        if self.latest_epoch() != other.latest_epoch() {
            return false;
        }
        for (mine, theirs) in self.data.iter().zip(&other.data) {
            if mine.population.len() != theirs.population.len() {
                return false;
            }
            for (a, b) in mine.population.iter().zip(&theirs.population) {
                if a.distance(b) != 0.0 {
                    return false;
                }
            }
        }
        true
    }

    /// Resolve the ancestry tree of the individual at `index` in `epoch`
    /// (the latest when `None`), following parent indices one epoch back
    /// per level until origins without parents are reached.
    pub fn origin_history(&self, index: usize, epoch: Option<usize>) -> Option<Lineage> {
        let epoch = epoch.or_else(|| self.latest_epoch())?;
        let origin = self.epoch(epoch)?.operations.get(index)?.clone();
        let parents = origin
            .associated_networks
            .iter()
            .filter_map(|parent| {
                let previous = epoch.checked_sub(1)?;
                self.origin_history(*parent, Some(previous))
            })
            .collect();
        Some(Lineage { origin, parents })
    }

    /// How often each operator occurs in the full ancestry of one
    /// individual.
    pub fn origin_distribution(
        &self,
        index: usize,
        epoch: Option<usize>,
    ) -> Option<BTreeMap<ReproductionType, usize>> {
        let lineage = self.origin_history(index, epoch)?;
        let mut counts = BTreeMap::new();
        let mut pending = vec![&lineage];
        while let Some(node) = pending.pop() {
            *counts.entry(node.origin.reproduction_type).or_insert(0) += 1;
            pending.extend(&node.parents);
        }
        Some(counts)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), EvolutionError> {
        serde_json::to_writer(writer, &StatsDocument::from(self))?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, EvolutionError> {
        let document: StatsDocument = serde_json::from_reader(reader)?;
        Stats::try_from(&document)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvolutionError> {
        self.to_writer(BufWriter::new(File::create(path)?))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EvolutionError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct EpochDocument {
    took: f64,
    population: Vec<NetworkDocument>,
    fitness_scores: Vec<f64>,
    operations: Vec<Origin>,
}

/// Snapshot form of [`Stats`]. The epoch timer is transient and not part of
/// the document.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsDocument {
    data: Vec<EpochDocument>,
}

impl From<&Stats> for StatsDocument {
    fn from(stats: &Stats) -> Self {
        Self {
            data: stats
                .data
                .iter()
                .map(|epoch| EpochDocument {
                    took: epoch.took,
                    population: epoch.population.iter().map(Network::to_document).collect(),
                    fitness_scores: epoch.fitness_scores.clone(),
                    operations: epoch.operations.clone(),
                })
                .collect(),
        }
    }
}

impl TryFrom<&StatsDocument> for Stats {
    type Error = EvolutionError;

    fn try_from(document: &StatsDocument) -> Result<Self, Self::Error> {
        let data = document
            .data
            .iter()
            .map(|epoch| {
                Ok(EpochStats {
                    took: epoch.took,
                    population: epoch
                        .population
                        .iter()
                        .map(Network::from_document)
                        .collect::<Result<_, _>>()?,
                    fitness_scores: epoch.fitness_scores.clone(),
                    operations: epoch.operations.clone(),
                })
            })
            .collect::<Result<_, EvolutionError>>()?;
        Ok(Stats {
            data,
            last_epoch_start: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Neuron;

    fn single_network() -> Network {
        Network::new(vec![Neuron::new(0)], vec![Neuron::new(1)], vec![]).unwrap()
    }

    fn recorded_stats() -> Stats {
        let mut stats = Stats::new();
        stats
            .add_epoch(
                vec![single_network(), single_network()],
                vec![1.0, 2.0],
                vec![
                    Origin::new(ReproductionType::Random, vec![]),
                    Origin::new(ReproductionType::Random, vec![]),
                ],
            )
            .unwrap();
        stats
            .add_epoch(
                vec![single_network(), single_network()],
                vec![4.0, 3.0],
                vec![
                    Origin::new(ReproductionType::Same, vec![1]),
                    Origin::new(ReproductionType::Crossover, vec![0, 1]),
                ],
            )
            .unwrap();
        stats
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let mut stats = Stats::new();
        let result = stats.add_epoch(
            vec![single_network()],
            vec![1.0, 2.0],
            vec![Origin::new(ReproductionType::Random, vec![])],
        );
        assert!(matches!(result, Err(EvolutionError::LengthMismatch)));
        assert_eq!(stats.epoch_count(), 0);
    }

    #[test]
    fn best_network_picks_the_top_score() {
        let stats = recorded_stats();
        let latest = stats.epoch(1).unwrap();
        let best = stats.best_network(None).unwrap();
        assert_eq!(best.id(), latest.population[0].id());

        let (_, alltime_fitness) = stats.best_network_alltime().unwrap();
        assert_eq!(alltime_fitness, 4.0);
    }

    #[test]
    fn epoch_information_formats_scores() {
        let stats = recorded_stats();
        let line = stats.epoch_information(1, 50).unwrap();
        assert!(line.starts_with("Epoch  2/50"));
        assert!(line.contains("Best fitness: 4.0000"));
        assert!(line.contains("Average fitness: 3.5000"));
    }

    #[test]
    fn lineage_resolves_across_epochs() {
        let stats = recorded_stats();
        let lineage = stats.origin_history(1, None).unwrap();
        assert_eq!(lineage.origin.reproduction_type, ReproductionType::Crossover);
        assert_eq!(lineage.parents.len(), 2);
        assert!(lineage
            .parents
            .iter()
            .all(|p| p.origin.reproduction_type == ReproductionType::Random));

        let distribution = stats.origin_distribution(1, None).unwrap();
        assert_eq!(distribution[&ReproductionType::Crossover], 1);
        assert_eq!(distribution[&ReproductionType::Random], 2);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let stats = recorded_stats();
        let mut buffer = Vec::new();
        stats.to_writer(&mut buffer).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains(r#"["Same",[1]]"#));
        assert!(text.contains(r#"["crossover",[0,1]]"#));

        let loaded = Stats::from_reader(buffer.as_slice()).unwrap();
        assert_eq!(loaded.epoch_count(), 2);
        assert!(loaded.same_populations(&stats));
        assert_eq!(
            loaded.epoch(1).unwrap().fitness_scores,
            stats.epoch(1).unwrap().fitness_scores
        );
    }

    #[test]
    fn same_populations_detects_divergence() {
        let stats = recorded_stats();
        let mut other = recorded_stats();
        assert!(stats.same_populations(&other));

        let mut divergent = single_network();
        divergent.add_neuron(Neuron::new(9));
        divergent.add_synapse(crate::network::Synapse::new(0, 9));
        divergent.add_synapse(crate::network::Synapse::new(9, 1));
        other
            .add_epoch(
                vec![divergent],
                vec![1.0],
                vec![Origin::new(ReproductionType::Random, vec![])],
            )
            .unwrap();
        assert!(!stats.same_populations(&other));
    }
}
