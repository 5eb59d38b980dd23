//! The network aggregate: a directed graph of neurons and synapses
//! representing one evolvable individual.

pub mod document;
pub mod graph;
pub mod neuron;
pub mod synapse;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::EvolutionError;
use crate::parameter::ParamValue;
use graph::DiGraph;
pub use document::NetworkDocument;
pub use neuron::{Neuron, MAX_UID};
pub use synapse::Synapse;

static NETWORK_ID_NEXT: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one individual. It stands in for object
/// identity: the framework's fitness cache keys on it, so a plain `clone`
/// keeps the id (a storage copy of the same individual) while every genetic
/// operator that produces a new individual allocates a fresh one.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct NetworkId(u64);

impl NetworkId {
    pub fn new_unique() -> NetworkId {
        NetworkId(NETWORK_ID_NEXT.fetch_add(1, Ordering::SeqCst))
    }
}

/// Role of a neuron within its network.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeuronType {
    Input,
    Output,
    Hidden,
}

impl fmt::Display for NeuronType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeuronType::Input => write!(f, "input"),
            NeuronType::Output => write!(f, "output"),
            NeuronType::Hidden => write!(f, "hidden"),
        }
    }
}

/// A spiking network graph. Input and output neurons are fixed at creation
/// and kept sorted by uid; hidden neurons and synapses change under the
/// genetic operators. At most one synapse exists per ordered neuron pair,
/// and no uid appears twice across the three roles.
#[derive(Debug, Clone)]
pub struct Network {
    id: NetworkId,
    input_neurons: Vec<Neuron>,
    output_neurons: Vec<Neuron>,
    hidden_neurons: BTreeMap<u32, Neuron>,
    synapses: BTreeMap<(u32, u32), Synapse>,
}

impl Network {
    /// Build a network from neurons per role. Fails when any uid occurs
    /// more than once across the roles.
    pub fn new(
        input_neurons: Vec<Neuron>,
        output_neurons: Vec<Neuron>,
        hidden_neurons: Vec<Neuron>,
    ) -> Result<Self, EvolutionError> {
        let mut input_neurons = input_neurons;
        let mut output_neurons = output_neurons;
        input_neurons.sort_by_key(|n| n.uid);
        output_neurons.sort_by_key(|n| n.uid);

        let mut seen = BTreeSet::new();
        for neuron in input_neurons
            .iter()
            .chain(output_neurons.iter())
            .chain(hidden_neurons.iter())
        {
            if !seen.insert(neuron.uid) {
                return Err(EvolutionError::DuplicateUid(neuron.uid));
            }
        }

        Ok(Self {
            id: NetworkId::new_unique(),
            input_neurons,
            output_neurons,
            hidden_neurons: hidden_neurons.into_iter().map(|n| (n.uid, n)).collect(),
            synapses: BTreeMap::new(),
        })
    }

    pub fn id(&self) -> NetworkId {
        self.id
    }

    pub fn input_neurons(&self) -> &[Neuron] {
        &self.input_neurons
    }

    pub fn output_neurons(&self) -> &[Neuron] {
        &self.output_neurons
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden_neurons.len()
    }

    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }

    /// Hidden neurons in ascending uid order.
    pub fn sorted_hidden(&self) -> Vec<&Neuron> {
        self.hidden_neurons.values().collect()
    }

    /// All synapses ordered by their `(connect_from, connect_to)` pair.
    pub fn sorted_synapses(&self) -> Vec<&Synapse> {
        self.synapses.values().collect()
    }

    /// All neurons of every role in ascending uid order.
    pub fn all_neurons(&self) -> Vec<&Neuron> {
        let mut neurons: Vec<&Neuron> = self
            .input_neurons
            .iter()
            .chain(self.output_neurons.iter())
            .chain(self.hidden_neurons.values())
            .collect();
        neurons.sort_by_key(|n| n.uid);
        neurons
    }

    pub fn all_neuron_uids(&self) -> Vec<u32> {
        self.all_neurons().iter().map(|n| n.uid).collect()
    }

    pub fn find_neuron_by_uid(&self, uid: u32) -> Option<&Neuron> {
        self.input_neurons
            .iter()
            .chain(self.output_neurons.iter())
            .find(|n| n.uid == uid)
            .or_else(|| self.hidden_neurons.get(&uid))
    }

    pub fn find_hidden_neuron_by_uid(&self, uid: u32) -> Option<&Neuron> {
        self.hidden_neurons.get(&uid)
    }

    pub fn find_synapse_by_uids(&self, connect_from: u32, connect_to: u32) -> Option<&Synapse> {
        self.synapses.get(&(connect_from, connect_to))
    }

    pub fn neuron_type_of(&self, uid: u32) -> Option<NeuronType> {
        if self.input_neurons.iter().any(|n| n.uid == uid) {
            Some(NeuronType::Input)
        } else if self.output_neurons.iter().any(|n| n.uid == uid) {
            Some(NeuronType::Output)
        } else if self.hidden_neurons.contains_key(&uid) {
            Some(NeuronType::Hidden)
        } else {
            None
        }
    }

    /// Add a hidden neuron. Returns false without mutating when the uid is
    /// already taken by any role.
    pub fn add_neuron(&mut self, neuron: Neuron) -> bool {
        if self.find_neuron_by_uid(neuron.uid).is_some() {
            return false;
        }
        self.hidden_neurons.insert(neuron.uid, neuron);
        true
    }

    /// Remove a hidden neuron and every synapse touching it. Returns false
    /// when the uid is not a hidden neuron.
    pub fn remove_neuron_uid(&mut self, uid: u32) -> bool {
        if self.hidden_neurons.remove(&uid).is_none() {
            return false;
        }
        self.synapses
            .retain(|&(from, to), _| from != uid && to != uid);
        true
    }

    pub fn remove_neuron(&mut self, neuron: &Neuron) -> bool {
        self.remove_neuron_uid(neuron.uid)
    }

    /// Add a synapse. Returns false without mutating when either endpoint
    /// uid is absent or a synapse for the same ordered pair already exists.
    pub fn add_synapse(&mut self, synapse: Synapse) -> bool {
        if self.synapses.contains_key(&synapse.key()) {
            return false;
        }
        if self.find_neuron_by_uid(synapse.connect_from).is_none()
            || self.find_neuron_by_uid(synapse.connect_to).is_none()
        {
            return false;
        }
        self.synapses.insert(synapse.key(), synapse);
        true
    }

    /// Remove the synapse with the same endpoint pair. Returns false when
    /// no such synapse exists.
    pub fn remove_synapse(&mut self, synapse: &Synapse) -> bool {
        self.synapses.remove(&synapse.key()).is_some()
    }

    /// Overwrite one parameter of the neuron with the given uid (any role).
    pub fn set_neuron_parameter(&mut self, uid: u32, key: &str, value: ParamValue) -> bool {
        let neuron = self
            .input_neurons
            .iter_mut()
            .chain(self.output_neurons.iter_mut())
            .find(|n| n.uid == uid)
            .or_else(|| self.hidden_neurons.get_mut(&uid));
        match neuron {
            Some(neuron) => {
                neuron.parameters.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Overwrite one parameter of the synapse with the given endpoint pair.
    pub fn set_synapse_parameter(
        &mut self,
        connect_from: u32,
        connect_to: u32,
        key: &str,
        value: ParamValue,
    ) -> bool {
        match self.synapses.get_mut(&(connect_from, connect_to)) {
            Some(synapse) => {
                synapse.parameters.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Uids reachable from the input neurons via directed synapse traversal,
    /// input uids included.
    pub fn reachable_neurons(&self) -> BTreeSet<u32> {
        let starts: Vec<u32> = self.input_neurons.iter().map(|n| n.uid).collect();
        self.topology().descendants(&starts)
    }

    /// Uids that can reach at least one output neuron, computed on the
    /// reverse graph. Output uids included.
    pub fn influence_output_neurons(&self) -> BTreeSet<u32> {
        let starts: Vec<u32> = self.output_neurons.iter().map(|n| n.uid).collect();
        self.topology().reversed().descendants(&starts)
    }

    /// Whether a spike from any input can reach any output at all. If not,
    /// simulating the network is pointless.
    pub fn can_reach_output(&self) -> bool {
        let reachable = self.reachable_neurons();
        self.output_neurons.iter().any(|n| reachable.contains(&n.uid))
    }

    /// Remove every hidden neuron that is unreachable from the inputs or
    /// cannot influence any output, along with its synapses. Input and
    /// output neurons are never removed. Idempotent; returns `&mut Self`
    /// for chaining.
    pub fn strip(&mut self) -> &mut Self {
        let hidden_uids: BTreeSet<u32> = self.hidden_neurons.keys().copied().collect();
        let reachable = self.reachable_neurons();
        let influence = self.influence_output_neurons();

        let to_remove: Vec<u32> = hidden_uids
            .into_iter()
            .filter(|uid| !reachable.contains(uid) || !influence.contains(uid))
            .collect();
        for uid in to_remove {
            self.remove_neuron_uid(uid);
        }
        self
    }

    /// Deep copy under a fresh [`NetworkId`]: the result is a new
    /// individual, not a storage copy.
    pub fn clone_as_new(&self) -> Network {
        let mut network = self.clone();
        network.id = NetworkId::new_unique();
        network
    }

    /// Structural fingerprint for detecting "the same" individual without
    /// exact comparison. Computed on a stripped clone; hidden uids are
    /// erased from the labels while input/output uids stay in, so renaming
    /// hidden neurons or carrying strip-removable dead nodes cannot change
    /// the digest, but any parameter or topology change does.
    pub fn fingerprint(&self) -> String {
        let mut stripped = self.clone();
        stripped.strip();
        stripped.labeled_graph(true).wl_fingerprint(3)
    }

    /// Exact graph edit distance to another network, matching nodes and
    /// edges on full attribute equality. Computed on the graphs as given;
    /// strip beforehand to compare up to dead subgraphs.
    pub fn distance(&self, other: &Network) -> f64 {
        self.labeled_graph(false).edit_distance(
            &other.labeled_graph(false),
            |a, b| a == b,
            |a, b| a == b,
        )
    }

    fn topology(&self) -> DiGraph<(), ()> {
        let mut graph = DiGraph::new();
        for neuron in self.all_neurons() {
            graph.add_node(neuron.uid, ());
        }
        for key in self.synapses.keys() {
            graph.add_edge(key.0, key.1, ());
        }
        graph
    }

    /// Labeled digraph over the network: node labels carry the role and all
    /// neuron parameters, edge labels all synapse parameters. With
    /// `with_io_uids` the uid of input/output neurons joins the label, which
    /// makes the fingerprint sensitive to their identity.
    fn labeled_graph(&self, with_io_uids: bool) -> DiGraph<String, String> {
        let mut graph = DiGraph::new();
        for neuron in self.all_neurons() {
            let role = self
                .neuron_type_of(neuron.uid)
                .unwrap_or(NeuronType::Hidden);
            let mut label = format!("neuron_type:{role}");
            if with_io_uids && role != NeuronType::Hidden {
                label.push_str(&format!("-uid:{}", neuron.uid));
            }
            for (key, value) in &neuron.parameters {
                label.push_str(&format!("-{key}:{value}"));
            }
            graph.add_node(neuron.uid, label);
        }
        for (&(from, to), synapse) in &self.synapses {
            let label = synapse
                .parameters
                .iter()
                .map(|(key, value)| format!("{key}:{value}"))
                .collect::<Vec<_>>()
                .join("-");
            graph.add_edge(from, to, label);
        }
        graph
    }
}
