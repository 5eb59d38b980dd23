//! Self-contained directed-graph algorithms for the network aggregate:
//! reachability closures, a Weisfeiler-Lehman style structural fingerprint
//! and an exact graph edit distance. Node and edge labels are generic; the
//! fingerprint works on string labels, edit distance takes pluggable match
//! predicates.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use sha2::{Digest, Sha256};

/// A small labeled digraph over `u32` node ids with at most one edge per
/// ordered node pair. Insertion order does not matter, all iteration is
/// sorted.
#[derive(Debug, Clone)]
pub struct DiGraph<N, E> {
    nodes: BTreeMap<u32, N>,
    edges: BTreeMap<(u32, u32), E>,
}

impl<N, E> Default for DiGraph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> DiGraph<N, E> {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    pub fn add_node(&mut self, id: u32, label: N) {
        self.nodes.insert(id, label);
    }

    /// Both endpoints must already be nodes; dangling edges are a programmer
    /// error at this layer.
    pub fn add_edge(&mut self, from: u32, to: u32, label: E) {
        assert!(self.nodes.contains_key(&from) && self.nodes.contains_key(&to));
        self.edges.insert((from, to), label);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All nodes reachable from the start set via directed edges, including
    /// the start nodes themselves.
    pub fn descendants(&self, starts: &[u32]) -> BTreeSet<u32> {
        let mut successors: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for &(from, to) in self.edges.keys() {
            successors.entry(from).or_default().push(to);
        }

        let mut seen: BTreeSet<u32> = starts
            .iter()
            .copied()
            .filter(|id| self.nodes.contains_key(id))
            .collect();
        let mut queue: VecDeque<u32> = seen.iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            if let Some(nexts) = successors.get(&current) {
                for &next in nexts {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        seen
    }

    /// The same graph with every edge flipped; reachability on the reverse
    /// graph answers "which nodes can reach this set".
    pub fn reversed(&self) -> DiGraph<N, E>
    where
        N: Clone,
        E: Clone,
    {
        let mut reversed = DiGraph::new();
        for (&id, label) in &self.nodes {
            reversed.add_node(id, label.clone());
        }
        for (&(from, to), label) in &self.edges {
            reversed.add_edge(to, from, label.clone());
        }
        reversed
    }

    /// Exact graph edit distance with unit costs for node/edge insertion,
    /// deletion and mismatched substitution. `node_match` and `edge_match`
    /// decide whether a substitution is free.
    ///
    /// Branch-and-bound over all node assignments: exponential in the worst
    /// case, which is acceptable for the small networks evolution produces.
    pub fn edit_distance<FN, FE>(&self, other: &Self, node_match: FN, edge_match: FE) -> f64
    where
        FN: Fn(&N, &N) -> bool,
        FE: Fn(&E, &E) -> bool,
    {
        let left: Vec<u32> = self.nodes.keys().copied().collect();
        let right: Vec<u32> = other.nodes.keys().copied().collect();

        // Deleting everything and inserting the other graph is always valid.
        let mut best =
            left.len() + right.len() + self.edges.len() + other.edges.len();
        if best == 0 {
            return 0.0;
        }

        let mut mapping: Vec<Option<u32>> = Vec::with_capacity(left.len());
        let mut used: BTreeSet<u32> = BTreeSet::new();
        self.assign(
            other,
            &node_match,
            &edge_match,
            &left,
            &right,
            &mut mapping,
            &mut used,
            0,
            &mut best,
        );
        best as f64
    }

    #[allow(clippy::too_many_arguments)]
    fn assign<FN, FE>(
        &self,
        other: &Self,
        node_match: &FN,
        edge_match: &FE,
        left: &[u32],
        right: &[u32],
        mapping: &mut Vec<Option<u32>>,
        used: &mut BTreeSet<u32>,
        cost: usize,
        best: &mut usize,
    ) where
        FN: Fn(&N, &N) -> bool,
        FE: Fn(&E, &E) -> bool,
    {
        if cost >= *best {
            return;
        }
        let i = mapping.len();
        if i == left.len() {
            // Unmatched right-hand nodes are insertions, as is every
            // right-hand edge with an unmatched endpoint. Edges between two
            // matched nodes were already charged during assignment.
            let mut total = cost + (right.len() - used.len());
            for &(from, to) in other.edges.keys() {
                if !used.contains(&from) || !used.contains(&to) {
                    total += 1;
                }
            }
            if total < *best {
                *best = total;
            }
            return;
        }

        let u = left[i];
        // Exact-label candidates first: finding a cheap full assignment
        // early lets the bound prune the rest.
        let mut candidates: Vec<u32> = right
            .iter()
            .copied()
            .filter(|w| !used.contains(w))
            .collect();
        candidates.sort_by_key(|w| !node_match(&self.nodes[&u], &other.nodes[w]));

        for w in candidates {
            let mut step = if node_match(&self.nodes[&u], &other.nodes[&w]) {
                0
            } else {
                1
            };
            step += self.pair_edge_cost(other, edge_match, left, mapping, u, Some(w));
            mapping.push(Some(w));
            used.insert(w);
            self.assign(
                other, node_match, edge_match, left, right, mapping, used,
                cost + step,
                best,
            );
            used.remove(&w);
            mapping.pop();
        }

        // Delete u.
        let step = 1 + self.pair_edge_cost(other, edge_match, left, mapping, u, None);
        mapping.push(None);
        self.assign(
            other, node_match, edge_match, left, right, mapping, used,
            cost + step,
            best,
        );
        mapping.pop();
    }

    /// Edge cost incurred by deciding node `u` (mapped to `w` or deleted),
    /// against all previously decided nodes plus the self-loop on `u`.
    fn pair_edge_cost<FE>(
        &self,
        other: &Self,
        edge_match: &FE,
        left: &[u32],
        mapping: &[Option<u32>],
        u: u32,
        w: Option<u32>,
    ) -> usize
    where
        FE: Fn(&E, &E) -> bool,
    {
        let single = |g1: Option<&E>, g2: Option<&E>| match (g1, g2) {
            (Some(a), Some(b)) => usize::from(!edge_match(a, b)),
            (None, None) => 0,
            _ => 1,
        };

        let mut cost = match w {
            Some(w) => single(self.edges.get(&(u, u)), other.edges.get(&(w, w))),
            None => usize::from(self.edges.contains_key(&(u, u))),
        };
        for (j, decided) in mapping.iter().enumerate() {
            let v = left[j];
            match (w, decided) {
                (Some(w), Some(x)) => {
                    cost += single(self.edges.get(&(u, v)), other.edges.get(&(w, *x)));
                    cost += single(self.edges.get(&(v, u)), other.edges.get(&(*x, w)));
                }
                // One side of the pair was deleted: any left-hand edge
                // between them has to be deleted too.
                _ => {
                    cost += usize::from(self.edges.contains_key(&(u, v)));
                    cost += usize::from(self.edges.contains_key(&(v, u)));
                }
            }
        }
        cost
    }
}

impl DiGraph<String, String> {
    /// Structural fingerprint by iterative color refinement over directed
    /// neighborhoods, in the manner of the Weisfeiler-Lehman graph hash.
    /// Node ids only matter through the labels, so relabeling nodes with
    /// identical labels cannot change the digest.
    pub fn wl_fingerprint(&self, iterations: usize) -> String {
        let mut colors: BTreeMap<u32, String> = self
            .nodes
            .iter()
            .map(|(&id, label)| (id, sha_hex(label)))
            .collect();

        for _ in 0..iterations {
            let mut next = BTreeMap::new();
            for (&id, color) in &colors {
                let mut neighborhood = Vec::new();
                for (&(from, to), label) in &self.edges {
                    if from == id {
                        neighborhood.push(format!("out|{label}|{}", colors[&to]));
                    }
                    if to == id {
                        neighborhood.push(format!("in|{label}|{}", colors[&from]));
                    }
                }
                neighborhood.sort();
                next.insert(id, sha_hex(&format!("{color}|{}", neighborhood.join("|"))));
            }
            colors = next;
        }

        let mut final_colors: Vec<String> = colors.into_values().collect();
        final_colors.sort();
        sha_hex(&final_colors.join("|"))
    }
}

fn sha_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(nodes: &[(u32, &str)], edges: &[(u32, u32, &str)]) -> DiGraph<String, String> {
        let mut graph = DiGraph::new();
        for &(id, label) in nodes {
            graph.add_node(id, label.to_string());
        }
        for &(from, to, label) in edges {
            graph.add_edge(from, to, label.to_string());
        }
        graph
    }

    #[test]
    fn descendants_follow_direction() {
        let graph = labeled(
            &[(0, "a"), (1, "b"), (2, "c"), (3, "d")],
            &[(0, 1, "e"), (1, 2, "e")],
        );
        let reached = graph.descendants(&[0]);
        assert_eq!(reached, BTreeSet::from([0, 1, 2]));

        let influencing = graph.reversed().descendants(&[2]);
        assert_eq!(influencing, BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn descendants_include_isolated_starts() {
        let graph = labeled(&[(0, "a"), (1, "b")], &[]);
        assert_eq!(graph.descendants(&[0]), BTreeSet::from([0]));
    }

    #[test]
    fn edit_distance_zero_for_relabeled_ids() {
        let g1 = labeled(&[(0, "in"), (5, "h"), (1, "out")], &[(0, 5, "w"), (5, 1, "w")]);
        let g2 = labeled(
            &[(0, "in"), (9, "h"), (1, "out")],
            &[(0, 9, "w"), (9, 1, "w")],
        );
        let distance = g1.edit_distance(&g2, |a, b| a == b, |a, b| a == b);
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn edit_distance_counts_label_changes() {
        let g1 = labeled(&[(0, "a"), (1, "b")], &[(0, 1, "x")]);
        let g2 = labeled(&[(0, "a"), (1, "b")], &[(0, 1, "y")]);
        let distance = g1.edit_distance(&g2, |a, b| a == b, |a, b| a == b);
        assert_eq!(distance, 1.0);
    }

    #[test]
    fn edit_distance_counts_missing_nodes_and_edges() {
        let g1 = labeled(&[(0, "a"), (1, "b"), (2, "c")], &[(0, 1, "x"), (1, 2, "x")]);
        let g2 = labeled(&[(0, "a"), (1, "b")], &[(0, 1, "x")]);
        // One node deletion plus one edge deletion.
        let distance = g1.edit_distance(&g2, |a, b| a == b, |a, b| a == b);
        assert_eq!(distance, 2.0);
    }

    #[test]
    fn edit_distance_of_empty_graphs() {
        let g1: DiGraph<String, String> = DiGraph::new();
        let g2 = labeled(&[(0, "a")], &[]);
        assert_eq!(g1.edit_distance(&g1.clone(), |a, b| a == b, |a, b| a == b), 0.0);
        assert_eq!(g1.edit_distance(&g2, |a, b| a == b, |a, b| a == b), 1.0);
    }

    #[test]
    fn fingerprint_invariant_to_node_id_relabeling() {
        let g1 = labeled(&[(0, "in"), (5, "h"), (1, "out")], &[(0, 5, "w"), (5, 1, "w")]);
        let g2 = labeled(
            &[(0, "in"), (77, "h"), (1, "out")],
            &[(0, 77, "w"), (77, 1, "w")],
        );
        assert_eq!(g1.wl_fingerprint(3), g2.wl_fingerprint(3));
    }

    #[test]
    fn fingerprint_sensitive_to_labels_and_topology() {
        let base = labeled(&[(0, "in"), (1, "out")], &[(0, 1, "w")]);
        let other_label = labeled(&[(0, "in"), (1, "out")], &[(0, 1, "v")]);
        let other_topology = labeled(&[(0, "in"), (1, "out")], &[]);
        assert_ne!(base.wl_fingerprint(3), other_label.wl_fingerprint(3));
        assert_ne!(base.wl_fingerprint(3), other_topology.wl_fingerprint(3));
    }

    #[test]
    fn fingerprint_distinguishes_edge_direction() {
        let forward = labeled(&[(0, "a"), (1, "b")], &[(0, 1, "w")]);
        let backward = labeled(&[(0, "a"), (1, "b")], &[(1, 0, "w")]);
        assert_ne!(forward.wl_fingerprint(3), backward.wl_fingerprint(3));
    }
}
