//! Two-parent combination producing a single child.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::EvolutionError;
use crate::network::{Network, Neuron, Synapse};

/// Combine two parents into one child that carries every neuron uid present
/// in either parent, picking the parameter set from a random parent when
/// both carry the uid. Synapses from both parents are pooled, shuffled and
/// added; a synapse already added from the other parent is kept as is.
///
/// The child is deliberately not stripped, so merged structure that is not
/// yet on an input-to-output path survives into the next generation.
pub fn merge_two_networks(
    net1: &Network,
    net2: &Network,
    rng: &mut impl Rng,
) -> Result<Network, EvolutionError> {
    let inputs = select_neurons_randomly_by_uid(net1.input_neurons(), net2.input_neurons(), rng);
    let outputs = select_neurons_randomly_by_uid(net1.output_neurons(), net2.output_neurons(), rng);
    let hidden = select_neurons_randomly_by_uid(&net1.sorted_hidden(), &net2.sorted_hidden(), rng);

    let mut child = Network::new(inputs, outputs, hidden)?;

    let mut pool: Vec<&Synapse> = net1.sorted_synapses();
    pool.extend(net2.sorted_synapses());
    pool.shuffle(rng);
    for synapse in pool {
        child.add_synapse(synapse.clone());
    }
    Ok(child)
}

/// One neuron per uid, drawn from a shuffled concatenation of both parents'
/// neurons so the winning parameter set is random for shared uids.
fn select_neurons_randomly_by_uid<N: std::borrow::Borrow<Neuron>>(
    first: &[N],
    second: &[N],
    rng: &mut impl Rng,
) -> Vec<Neuron> {
    let mut pool: Vec<&Neuron> = first
        .iter()
        .map(|n| n.borrow())
        .chain(second.iter().map(|n| n.borrow()))
        .collect();
    pool.shuffle(rng);

    let mut selected: Vec<Neuron> = Vec::new();
    for neuron in pool {
        if !selected.iter().any(|n| n.uid == neuron.uid) {
            selected.push(neuron.clone());
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::mutator::{Mutator, MutatorConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn parents(seed: u64) -> (Network, Network) {
        let base = Network::new(vec![Neuron::new(0)], vec![Neuron::new(1)], vec![]).unwrap();
        let mutator = Mutator::new(MutatorConfig::default());
        let mut rng = StdRng::seed_from_u64(seed);
        let a = mutator.apply_mutations(&base, &mut rng);
        let b = mutator.apply_mutations(&base, &mut rng);
        (a, b)
    }

    #[test]
    fn child_covers_both_parents_neurons() {
        let (a, b) = parents(21);
        let mut rng = StdRng::seed_from_u64(22);
        let child = merge_two_networks(&a, &b, &mut rng).unwrap();

        let child_uids = child.all_neuron_uids();
        for uid in a.all_neuron_uids().into_iter().chain(b.all_neuron_uids()) {
            assert!(child_uids.contains(&uid));
        }
    }

    #[test]
    fn child_covers_both_parents_synapse_keys() {
        let (a, b) = parents(23);
        let mut rng = StdRng::seed_from_u64(24);
        let child = merge_two_networks(&a, &b, &mut rng).unwrap();

        for parent in [&a, &b] {
            for synapse in parent.sorted_synapses() {
                assert!(child.find_synapse_by_uids(synapse.connect_from, synapse.connect_to).is_some());
            }
        }
    }

    #[test]
    fn shared_uid_takes_one_parents_parameters() {
        let mut a = Network::new(vec![Neuron::new(0)], vec![Neuron::new(1)], vec![]).unwrap();
        let mut b = Network::new(vec![Neuron::new(0)], vec![Neuron::new(1)], vec![]).unwrap();
        a.set_neuron_parameter(0, "threshold", crate::parameter::ParamValue::Int(3));
        b.set_neuron_parameter(0, "threshold", crate::parameter::ParamValue::Int(9));

        let mut rng = StdRng::seed_from_u64(25);
        let child = merge_two_networks(&a, &b, &mut rng).unwrap();
        let threshold = child
            .find_neuron_by_uid(0)
            .unwrap()
            .threshold()
            .and_then(|v| v.as_int())
            .unwrap();
        assert!(threshold == 3 || threshold == 9);
    }
}
