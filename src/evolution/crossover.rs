//! Two-parent recombination producing two children.

use rand::Rng;

use crate::error::EvolutionError;
use crate::network::{Network, Neuron, Synapse};

/// Recombine two parents into two children.
///
/// Neurons of each role are distributed one by one: the first parent's
/// neurons each go to a random child, the second parent's neurons try a
/// random child first and fall over to the other when the uid is already
/// taken there. Synapses from both parents then go to a random child, with
/// the same fallback when the child rejects them. Both children are
/// stripped before they are returned, so dangling structure from the
/// distribution never survives.
///
/// Fails when the parents disagree on input or output uids, since the
/// children inherit the parents' interface.
pub fn crossover(
    net1: &Network,
    net2: &Network,
    rng: &mut impl Rng,
) -> Result<(Network, Network), EvolutionError> {
    let input_uids: Vec<u32> = net1.input_neurons().iter().map(|n| n.uid).collect();
    let output_uids: Vec<u32> = net1.output_neurons().iter().map(|n| n.uid).collect();
    let other_inputs: Vec<u32> = net2.input_neurons().iter().map(|n| n.uid).collect();
    let other_outputs: Vec<u32> = net2.output_neurons().iter().map(|n| n.uid).collect();
    if input_uids != other_inputs || output_uids != other_outputs {
        return Err(EvolutionError::InterfaceMismatch);
    }

    let (inputs1, inputs2) = split_neurons(net1.input_neurons(), net2.input_neurons(), rng);
    let (outputs1, outputs2) = split_neurons(net1.output_neurons(), net2.output_neurons(), rng);
    let (hidden1, hidden2) = split_neurons(&net1.sorted_hidden(), &net2.sorted_hidden(), rng);

    let mut child1 = Network::new(inputs1, outputs1, hidden1)?;
    let mut child2 = Network::new(inputs2, outputs2, hidden2)?;

    let mut pool: Vec<&Synapse> = net1.sorted_synapses();
    pool.extend(net2.sorted_synapses());
    for synapse in pool {
        let (first, second) = if rng.gen::<bool>() {
            (&mut child1, &mut child2)
        } else {
            (&mut child2, &mut child1)
        };
        if !first.add_synapse(synapse.clone()) {
            second.add_synapse(synapse.clone());
        }
    }

    child1.strip();
    child2.strip();
    Ok((child1, child2))
}

/// Distribute two parents' neurons of one role over two children.
///
/// Every uid present in either parent ends up in exactly one child, with
/// the first parent's copy taking precedence over the second's when both
/// carry it.
fn split_neurons<N: std::borrow::Borrow<Neuron>>(
    first: &[N],
    second: &[N],
    rng: &mut impl Rng,
) -> (Vec<Neuron>, Vec<Neuron>) {
    let mut child1: Vec<Neuron> = Vec::new();
    let mut child2: Vec<Neuron> = Vec::new();
    for neuron in first {
        if rng.gen::<bool>() {
            child1.push(neuron.borrow().clone());
        } else {
            child2.push(neuron.borrow().clone());
        }
    }
    for neuron in second {
        let neuron = neuron.borrow();
        let (preferred, fallback) = if rng.gen::<bool>() {
            (&mut child1, &mut child2)
        } else {
            (&mut child2, &mut child1)
        };
        if preferred.iter().any(|n| n.uid == neuron.uid) {
            if !fallback.iter().any(|n| n.uid == neuron.uid) {
                fallback.push(neuron.clone());
            }
        } else {
            preferred.push(neuron.clone());
        }
    }
    (child1, child2)
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
    fn children_keep_the_parent_interface() {
        let (a, b) = parents(7);
        let mut rng = StdRng::seed_from_u64(8);
        let (c1, c2) = crossover(&a, &b, &mut rng).unwrap();
        for child in [&c1, &c2] {
            let inputs: Vec<u32> = child.input_neurons().iter().map(|n| n.uid).collect();
            let outputs: Vec<u32> = child.output_neurons().iter().map(|n| n.uid).collect();
            assert_eq!(inputs, vec![0]);
            assert_eq!(outputs, vec![1]);
        }
    }

    #[test]
    fn children_are_stripped() {
        let (a, b) = parents(11);
        let mut rng = StdRng::seed_from_u64(12);
        let (mut c1, mut c2) = crossover(&a, &b, &mut rng).unwrap();
        let before = (c1.hidden_count(), c2.hidden_count());
        c1.strip();
        c2.strip();
        assert_eq!(before, (c1.hidden_count(), c2.hidden_count()));
    }

    #[test]
    fn every_hidden_uid_comes_from_a_parent() {
        let (a, b) = parents(13);
        let mut rng = StdRng::seed_from_u64(14);
        let (c1, c2) = crossover(&a, &b, &mut rng).unwrap();
        let parent_uids: Vec<u32> = a
            .all_neuron_uids()
            .into_iter()
            .chain(b.all_neuron_uids())
            .collect();
        for child in [&c1, &c2] {
            for neuron in child.sorted_hidden() {
                assert!(parent_uids.contains(&neuron.uid));
            }
        }
    }

    #[test]
    fn mismatched_interfaces_are_rejected() {
        let a = Network::new(vec![Neuron::new(0)], vec![Neuron::new(1)], vec![]).unwrap();
        let b = Network::new(vec![Neuron::new(0), Neuron::new(2)], vec![Neuron::new(1)], vec![])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(15);
        assert!(crossover(&a, &b, &mut rng).is_err());
    }
}
