//! Creates random, valid starter networks.

use rand::Rng;

use crate::evolution::mutator::{Mutator, MutatorConfig};
use crate::experiment::Experiment;
use crate::network::{Network, Neuron};
use crate::parameter::{validate_specs, ParameterSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Number of hidden neurons a fresh network starts with.
    pub hidden_neurons: ParameterSpec,
    /// Number of extra random synapses a fresh network starts with.
    pub synapses: ParameterSpec,
    pub mutator: MutatorConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            hidden_neurons: ParameterSpec::RandomInt { min: 0, max: 2 },
            synapses: ParameterSpec::RandomInt { min: 0, max: 2 },
            mutator: MutatorConfig::default(),
        }
    }
}

/// Builds networks with a fixed interface: input uids `0..number_inputs`
/// and output uids `number_inputs..number_inputs + number_outputs`.
#[derive(Debug, Clone)]
pub struct Generator {
    number_inputs: u32,
    number_outputs: u32,
    config: GeneratorConfig,
    mutator: Mutator,
}

impl Generator {
    pub fn new(number_inputs: u32, number_outputs: u32, config: GeneratorConfig) -> Self {
        assert!(number_inputs > 0, "networks need at least one input neuron");
        assert!(number_outputs > 0, "networks need at least one output neuron");
        let mut specs = crate::parameter::ParameterSpecs::new();
        specs.insert("hidden_neurons".into(), config.hidden_neurons.clone());
        specs.insert("synapses".into(), config.synapses.clone());
        validate_specs("generator", &specs);

        let mutator = Mutator::new(config.mutator.clone());
        Self {
            number_inputs,
            number_outputs,
            config,
            mutator,
        }
    }

    /// Interface sizes come from the experiment the networks will be
    /// evaluated against.
    pub fn from_experiment<E: Experiment>(experiment: &E, config: GeneratorConfig) -> Self {
        Self::new(
            experiment.input_neurons() as u32,
            experiment.output_neurons() as u32,
            config,
        )
    }

    /// A network with only input and output neurons, each carrying freshly
    /// drawn parameters, and no synapses.
    pub fn create_empty_network(&self, rng: &mut impl Rng) -> Network {
        let inputs: Vec<Neuron> = (0..self.number_inputs)
            .map(|uid| self.mutator.create_random_neuron(uid, rng))
            .collect();
        let outputs: Vec<Neuron> = (self.number_inputs..self.number_inputs + self.number_outputs)
            .map(|uid| self.mutator.create_random_neuron(uid, rng))
            .collect();
        Network::new(inputs, outputs, vec![])
            .unwrap_or_else(|_| unreachable!("interface uids are distinct by construction"))
    }

    /// An empty network grown by a sampled number of hidden neurons and
    /// extra synapses.
    pub fn generate_network(&self, rng: &mut impl Rng) -> Network {
        let mut network = self.create_empty_network(rng);
        let hidden = self.config.hidden_neurons.sample(rng).as_int().unwrap_or(0);
        for _ in 0..hidden.max(0) {
            self.mutator.add_hidden_neuron(&mut network, rng);
        }
        let synapses = self.config.synapses.sample(rng).as_int().unwrap_or(0);
        for _ in 0..synapses.max(0) {
            self.mutator.add_random_synapse(&mut network, rng);
        }
        network
    }

    pub fn generate_networks(&self, amount: usize, rng: &mut impl Rng) -> Vec<Network> {
        (0..amount).map(|_| self.generate_network(rng)).collect()
    }
}
