//! Neuroevolution of spiking network graphs.
//!
//! Networks are directed graphs of neurons and synapses with free-form
//! parameter bags. The [`evolution::Framework`] breeds populations of them
//! against an [`experiment::Experiment`]'s fitness function using mutation,
//! crossover and merge operators, with tournament selection and elitism.
//! Runs are reproducible from a seed and can be snapshotted to JSON and
//! resumed.

pub mod error;
pub mod evolution;
pub mod experiment;
pub mod network;
pub mod parameter;

pub use error::EvolutionError;
pub use evolution::{Framework, FrameworkConfig, Stats};
pub use experiment::{CountingExperiment, Experiment, ExperimentError};
pub use network::{Network, Neuron, Synapse};
pub use parameter::{ParamValue, ParameterSpec, Parameters};
