//! Contract between the evolutionary core and the external world.
//!
//! An experiment wraps a simulator plus encoder/decoder and reduces decoded
//! outputs to a scalar fitness per network. The core only needs the input
//! and output neuron counts (from the encoder/decoder) and the fitness
//! function itself; everything behind those is opaque.

use crate::network::Network;

/// Boxed error from experiment code; the framework wraps it in
/// [`crate::EvolutionError::Fitness`] and aborts the run.
pub type ExperimentError = Box<dyn std::error::Error + Send + Sync>;

pub trait Experiment {
    /// How many input neurons a generated network needs (the encoder's
    /// neuron count).
    fn input_neurons(&self) -> usize;

    /// How many output neurons a generated network needs (the decoder's
    /// neuron count).
    fn output_neurons(&self) -> usize;

    fn single_fitness(&mut self, network: &Network) -> Result<f64, ExperimentError>;

    /// Fitness for a batch of networks, in input order. The default maps
    /// [`Experiment::single_fitness`] over the batch; experiments with a
    /// batched simulator override this.
    fn fitness(&mut self, networks: &[Network]) -> Result<Vec<f64>, ExperimentError> {
        networks
            .iter()
            .map(|network| self.single_fitness(network))
            .collect()
    }

    /// Forwarded by the framework so simulator randomness replays with the
    /// run seed.
    fn set_seed(&mut self, _seed: Option<u64>) {}
}

/// Simulator-free experiment: fitness is the hidden neuron count plus the
/// synapse count. Useful for exercising the evolution loop in tests.
#[derive(Debug, Clone)]
pub struct CountingExperiment {
    pub inputs: usize,
    pub outputs: usize,
}

impl CountingExperiment {
    pub fn new(inputs: usize, outputs: usize) -> Self {
        Self { inputs, outputs }
    }
}

impl Experiment for CountingExperiment {
    fn input_neurons(&self) -> usize {
        self.inputs
    }

    fn output_neurons(&self) -> usize {
        self.outputs
    }

    fn single_fitness(&mut self, network: &Network) -> Result<f64, ExperimentError> {
        Ok((network.hidden_count() + network.synapse_count()) as f64)
    }
}
