//! Atomic structural and parametric mutations on a network.

use rand::Rng;

use crate::network::{Network, Neuron, Synapse};
use crate::parameter::{
    init_parameter_values, mutable_parameters, pick_weighted, validate_specs, ParamValue,
    ParameterSpec, ParameterSpecs,
};

/// The six atomic mutation operations.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MutationKind {
    AddNode,
    DeleteNode,
    AddEdge,
    DeleteEdge,
    NodeParam,
    EdgeParam,
}

/// Relative likelihood of each mutation kind. The weights are normalized by
/// their total, they do not need to sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRates {
    pub add_node: f64,
    pub delete_node: f64,
    pub add_edge: f64,
    pub delete_edge: f64,
    pub node_param: f64,
    pub edge_param: f64,
}

impl Default for MutationRates {
    fn default() -> Self {
        Self {
            add_node: 0.08,
            delete_node: 0.08,
            add_edge: 0.15,
            delete_edge: 0.15,
            node_param: 0.27,
            edge_param: 0.27,
        }
    }
}

impl MutationRates {
    pub fn sample(&self, rng: &mut impl Rng) -> MutationKind {
        let choices = [
            (MutationKind::AddEdge, self.add_edge),
            (MutationKind::AddNode, self.add_node),
            (MutationKind::DeleteEdge, self.delete_edge),
            (MutationKind::DeleteNode, self.delete_node),
            (MutationKind::EdgeParam, self.edge_param),
            (MutationKind::NodeParam, self.node_param),
        ];
        *pick_weighted(&choices, rng)
    }

    fn validate(&self) {
        let weights = [
            self.add_node,
            self.delete_node,
            self.add_edge,
            self.delete_edge,
            self.node_param,
            self.edge_param,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            log::warn!("mutation rates contain negative weights: {self:?}");
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutatorConfig {
    pub mutation_rates: MutationRates,
    /// How many atomic mutations one `apply_mutations` call performs.
    pub number_of_mutations: ParameterSpec,
    pub neuron_parameters: ParameterSpecs,
    pub synapse_parameters: ParameterSpecs,
}

impl Default for MutatorConfig {
    fn default() -> Self {
        let mut neuron_parameters = ParameterSpecs::new();
        neuron_parameters.insert(
            "threshold".into(),
            ParameterSpec::RandomInt { min: 0, max: 127 },
        );
        neuron_parameters.insert(
            "leak".into(),
            ParameterSpec::RandomChoice {
                values: [1, 5, 10, 20, 40].map(ParamValue::Int).to_vec(),
            },
        );

        let mut synapse_parameters = ParameterSpecs::new();
        synapse_parameters.insert(
            "weight".into(),
            ParameterSpec::RandomInt { min: 0, max: 127 },
        );
        synapse_parameters.insert("delay".into(), ParameterSpec::RandomInt { min: 0, max: 15 });
        synapse_parameters.insert("exciting".into(), ParameterSpec::RandomBool);

        Self {
            mutation_rates: MutationRates::default(),
            number_of_mutations: ParameterSpec::Fixed {
                value: ParamValue::Int(7),
            },
            neuron_parameters,
            synapse_parameters,
        }
    }
}

/// Applies mutations as configured. All randomness comes from the caller's
/// generator, so a fixed seed replays identical mutations.
#[derive(Debug, Clone)]
pub struct Mutator {
    config: MutatorConfig,
}

impl Mutator {
    /// Configuration validation is advisory: problems are logged and the
    /// configuration is used anyway.
    pub fn new(config: MutatorConfig) -> Self {
        config.mutation_rates.validate();
        if !config.number_of_mutations.is_valid() {
            log::warn!(
                "invalid number_of_mutations spec: {:?}",
                config.number_of_mutations
            );
        }
        validate_specs("neuron_parameters", &config.neuron_parameters);
        validate_specs("synapse_parameters", &config.synapse_parameters);
        Self { config }
    }

    pub fn config(&self) -> &MutatorConfig {
        &self.config
    }

    /// Clone the network (as a fresh individual) and apply the configured
    /// number of randomly drawn mutations to the clone. The original is
    /// never touched.
    pub fn apply_mutations(&self, network: &Network, rng: &mut impl Rng) -> Network {
        let mut mutated = network.clone_as_new();
        let count = self
            .config
            .number_of_mutations
            .sample(rng)
            .as_int()
            .unwrap_or(0)
            .max(0) as usize;
        for _ in 0..count {
            let kind = self.config.mutation_rates.sample(rng);
            self.mutate_network(&mut mutated, kind, rng);
        }
        mutated
    }

    /// Perform a single mutation in place. Kinds whose precondition does
    /// not hold (no hidden neurons, no synapses) are silent no-ops.
    pub fn mutate_network(&self, network: &mut Network, kind: MutationKind, rng: &mut impl Rng) {
        match kind {
            MutationKind::AddNode => self.add_hidden_neuron(network, rng),
            MutationKind::DeleteNode => {
                let hidden: Vec<u32> = network.sorted_hidden().iter().map(|n| n.uid).collect();
                if hidden.is_empty() {
                    return;
                }
                let uid = hidden[rng.gen_range(0..hidden.len())];
                network.remove_neuron_uid(uid);
                // Deleting one node may orphan others.
                network.strip();
            }
            MutationKind::AddEdge => self.add_random_synapse(network, rng),
            MutationKind::DeleteEdge => {
                let keys: Vec<(u32, u32)> =
                    network.sorted_synapses().iter().map(|s| s.key()).collect();
                if keys.is_empty() {
                    return;
                }
                let (from, to) = keys[rng.gen_range(0..keys.len())];
                network.remove_synapse(&Synapse::new(from, to));
                network.strip();
            }
            MutationKind::NodeParam => {
                let uids = network.all_neuron_uids();
                let uid = uids[rng.gen_range(0..uids.len())];
                let mutable = mutable_parameters(&self.config.neuron_parameters);
                if mutable.is_empty() {
                    return;
                }
                let (key, spec) = mutable[rng.gen_range(0..mutable.len())];
                let value = spec.sample(rng);
                network.set_neuron_parameter(uid, key, value);
            }
            MutationKind::EdgeParam => {
                let keys: Vec<(u32, u32)> =
                    network.sorted_synapses().iter().map(|s| s.key()).collect();
                if keys.is_empty() {
                    return;
                }
                let (from, to) = keys[rng.gen_range(0..keys.len())];
                let mutable = mutable_parameters(&self.config.synapse_parameters);
                if mutable.is_empty() {
                    return;
                }
                let (key, spec) = mutable[rng.gen_range(0..mutable.len())];
                let value = spec.sample(rng);
                network.set_synapse_parameter(from, to, key, value);
            }
        }
    }

    /// Add a hidden neuron with a free uid, wired in from a reachable
    /// neuron and out to a neuron that influences the output, so the new
    /// node sits on a potential input-to-output path.
    pub fn add_hidden_neuron(&self, network: &mut Network, rng: &mut impl Rng) {
        let parameters = init_parameter_values(&self.config.neuron_parameters, rng);
        let neuron = Neuron::with_random_uid(&network.all_neuron_uids(), parameters, rng);
        let new_uid = neuron.uid;
        network.add_neuron(neuron);

        let reachable: Vec<u32> = network.reachable_neurons().into_iter().collect();
        let pre_synaptic = reachable[rng.gen_range(0..reachable.len())];
        let incoming = Synapse::with_parameters(
            pre_synaptic,
            new_uid,
            init_parameter_values(&self.config.synapse_parameters, rng),
        );
        network.add_synapse(incoming);

        let influence: Vec<u32> = network.influence_output_neurons().into_iter().collect();
        let post_synaptic = influence[rng.gen_range(0..influence.len())];
        let outgoing = Synapse::with_parameters(
            new_uid,
            post_synaptic,
            init_parameter_values(&self.config.synapse_parameters, rng),
        );
        network.add_synapse(outgoing);
    }

    /// Add a synapse from a reachable neuron to an influential one. When
    /// that pair is already connected the add is a silent no-op.
    pub fn add_random_synapse(&self, network: &mut Network, rng: &mut impl Rng) {
        let reachable: Vec<u32> = network.reachable_neurons().into_iter().collect();
        let pre_synaptic = reachable[rng.gen_range(0..reachable.len())];

        let influence: Vec<u32> = network.influence_output_neurons().into_iter().collect();
        let post_synaptic = influence[rng.gen_range(0..influence.len())];

        let synapse = Synapse::with_parameters(
            pre_synaptic,
            post_synaptic,
            init_parameter_values(&self.config.synapse_parameters, rng),
        );
        network.add_synapse(synapse);
    }

    /// A neuron with the given uid and freshly drawn parameters, used by
    /// the generator for input and output neurons.
    pub fn create_random_neuron(&self, uid: u32, rng: &mut impl Rng) -> Neuron {
        Neuron::with_parameters(uid, init_parameter_values(&self.config.neuron_parameters, rng))
    }
}
