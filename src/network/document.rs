//! Node-link JSON document form of a [`Network`].
//!
//! Nodes carry the neuron role plus all neuron parameters, links carry all
//! synapse parameters. Round-tripping a network through this form is
//! lossless up to edit distance zero.

use serde::{Deserialize, Serialize};

use crate::error::EvolutionError;
use crate::network::{Network, Neuron, NeuronType, Synapse};
use crate::parameter::Parameters;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: u32,
    pub neuron_type: NeuronType,
    #[serde(flatten)]
    pub parameters: Parameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkDocument {
    pub source: u32,
    pub target: u32,
    #[serde(flatten)]
    pub parameters: Parameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDocument {
    pub nodes: Vec<NodeDocument>,
    pub links: Vec<LinkDocument>,
}

impl Network {
    pub fn to_document(&self) -> NetworkDocument {
        let nodes = self
            .all_neurons()
            .into_iter()
            .map(|neuron| NodeDocument {
                id: neuron.uid,
                neuron_type: self
                    .neuron_type_of(neuron.uid)
                    .unwrap_or(NeuronType::Hidden),
                parameters: neuron.parameters.clone(),
            })
            .collect();
        let links = self
            .sorted_synapses()
            .into_iter()
            .map(|synapse| LinkDocument {
                source: synapse.connect_from,
                target: synapse.connect_to,
                parameters: synapse.parameters.clone(),
            })
            .collect();
        NetworkDocument { nodes, links }
    }

    /// Rebuild a network from its document form. Duplicate uids in the
    /// document are an invariant violation and fail construction; the
    /// resulting network carries a fresh [`crate::network::NetworkId`].
    pub fn from_document(document: &NetworkDocument) -> Result<Network, EvolutionError> {
        let mut input_neurons = Vec::new();
        let mut output_neurons = Vec::new();
        let mut hidden_neurons = Vec::new();
        for node in &document.nodes {
            let neuron = Neuron::with_parameters(node.id, node.parameters.clone());
            match node.neuron_type {
                NeuronType::Input => input_neurons.push(neuron),
                NeuronType::Output => output_neurons.push(neuron),
                NeuronType::Hidden => hidden_neurons.push(neuron),
            }
        }

        let mut network = Network::new(input_neurons, output_neurons, hidden_neurons)?;
        for link in &document.links {
            // Dangling links are dropped, matching add_synapse semantics.
            network.add_synapse(Synapse::with_parameters(
                link.source,
                link.target,
                link.parameters.clone(),
            ));
        }
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParamValue;

    fn sample_network() -> Network {
        let mut input = Neuron::new(0);
        input
            .parameters
            .insert("threshold".into(), ParamValue::Int(5));
        let mut output = Neuron::new(1);
        output
            .parameters
            .insert("threshold".into(), ParamValue::Int(10));

        let mut net = Network::new(vec![input], vec![output], vec![]).unwrap();
        net.add_neuron(Neuron::new(5));
        let mut parameters = Parameters::new();
        parameters.insert("weight".into(), ParamValue::Int(10));
        parameters.insert("delay".into(), ParamValue::Int(5));
        parameters.insert("exciting".into(), ParamValue::Bool(true));
        net.add_synapse(Synapse::with_parameters(0, 5, parameters));
        net.add_synapse(Synapse::new(5, 1));
        net
    }

    #[test]
    fn document_carries_roles_and_parameters() {
        let doc = sample_network().to_document();
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.nodes[0].id, 0);
        assert_eq!(doc.nodes[0].neuron_type, NeuronType::Input);
        assert_eq!(
            doc.nodes[0].parameters.get("threshold"),
            Some(&ParamValue::Int(5))
        );
        assert_eq!(doc.links.len(), 2);
        assert_eq!(doc.links[0].source, 0);
        assert_eq!(doc.links[0].target, 5);
        assert_eq!(
            doc.links[0].parameters.get("exciting"),
            Some(&ParamValue::Bool(true))
        );
    }

    #[test]
    fn json_round_trip_is_distance_zero() {
        let net = sample_network();
        let text = serde_json::to_string(&net.to_document()).unwrap();
        let doc: NetworkDocument = serde_json::from_str(&text).unwrap();
        let back = Network::from_document(&doc).unwrap();
        assert_eq!(net.distance(&back), 0.0);
        assert_eq!(net.fingerprint(), back.fingerprint());
    }

    #[test]
    fn duplicate_uid_in_document_fails() {
        let mut doc = sample_network().to_document();
        doc.nodes.push(NodeDocument {
            id: 0,
            neuron_type: NeuronType::Hidden,
            parameters: Parameters::new(),
        });
        assert!(Network::from_document(&doc).is_err());
    }

    #[test]
    fn parameters_flatten_into_the_node_object() {
        let doc = sample_network().to_document();
        let value = serde_json::to_value(&doc.nodes[0]).unwrap();
        assert_eq!(value["neuron_type"], "input");
        assert_eq!(value["threshold"], 5);
    }
}
