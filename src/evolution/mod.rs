//! Evolutionary optimization of spiking network graphs.

pub mod crossover;
pub mod framework;
pub mod generator;
pub mod merge;
pub mod mutator;
pub mod origin;
pub mod reproduction;
pub mod selection;
pub mod stats;

pub use crossover::crossover;
pub use framework::{Framework, FrameworkConfig};
pub use generator::{Generator, GeneratorConfig};
pub use merge::merge_two_networks;
pub use mutator::{MutationKind, MutationRates, Mutator, MutatorConfig};
pub use origin::{Origin, ReproductionType};
pub use reproduction::{Reproduction, ReproductionConfig, ReproductionRates};
pub use selection::{best, best_indices, tournament_selection, tournament_selection_index};
pub use stats::{EpochStats, Lineage, Stats};
