//! Selection over a scored population: tournament selection and best-n.

use rand::seq::index;
use rand::Rng;

/// Index variant of [`tournament_selection`]: sample `k` distinct
/// individuals (clamped to the population size), rank them by fitness and
/// walk the ranking, accepting a candidate with probability `p` per step.
/// Falls back to the top-ranked candidate when no one is accepted.
pub fn tournament_selection_index(
    fitness_scores: &[f64],
    k: usize,
    p: f64,
    rng: &mut impl Rng,
) -> usize {
    assert!(
        !fitness_scores.is_empty(),
        "tournament selection needs a non-empty population"
    );
    let k = k.min(fitness_scores.len());
    let mut sampled = index::sample(rng, fitness_scores.len(), k).into_vec();
    sampled.sort_by(|&a, &b| fitness_scores[b].total_cmp(&fitness_scores[a]));

    for &candidate in &sampled {
        if rng.gen::<f64>() <= p {
            return candidate;
        }
    }
    sampled[0]
}

/// Pick one element from the population by tournament selection.
pub fn tournament_selection<'a, T>(
    population: &'a [T],
    fitness_scores: &[f64],
    k: usize,
    p: f64,
    rng: &mut impl Rng,
) -> &'a T {
    assert_eq!(population.len(), fitness_scores.len());
    &population[tournament_selection_index(fitness_scores, k, p, rng)]
}

/// Indices of the `n` highest-scored individuals, descending; ties keep
/// their original population order.
pub fn best_indices(fitness_scores: &[f64], n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..fitness_scores.len()).collect();
    // Stable sort, so equal scores stay in input order.
    indices.sort_by(|&a, &b| fitness_scores[b].total_cmp(&fitness_scores[a]));
    indices.truncate(n);
    indices
}

/// The `n` best individuals, descending by fitness.
pub fn best<'a, T>(population: &'a [T], fitness_scores: &[f64], n: usize) -> Vec<&'a T> {
    assert_eq!(population.len(), fitness_scores.len());
    best_indices(fitness_scores, n)
        .into_iter()
        .map(|i| &population[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn p_one_and_full_tournament_pick_the_best() {
        let mut rng = StdRng::seed_from_u64(11);
        let population = [1, 2, 3, 4];
        let scores = [4.0, 3.0, 2.0, 1.0];
        for _ in 0..25 {
            let winner = tournament_selection(&population, &scores, 4, 1.0, &mut rng);
            assert_eq!(*winner, 1);
        }
    }

    #[test]
    fn p_zero_falls_back_to_the_top_candidate() {
        let mut rng = StdRng::seed_from_u64(11);
        let scores = [4.0, 3.0, 2.0, 1.0];
        // With the whole population sampled, the fallback is the best index.
        assert_eq!(tournament_selection_index(&scores, 4, 0.0, &mut rng), 0);
    }

    #[test]
    fn k_is_clamped_to_population_size() {
        let mut rng = StdRng::seed_from_u64(5);
        let scores = [1.0, 5.0];
        assert_eq!(tournament_selection_index(&scores, 100, 1.0, &mut rng), 1);
    }

    #[test]
    fn best_returns_descending() {
        let population = [1, 2, 3, 4];
        let scores = [1.0, 2.0, 3.0, 4.0];
        let picked: Vec<i32> = best(&population, &scores, 4).into_iter().copied().collect();
        assert_eq!(picked, vec![4, 3, 2, 1]);
    }

    #[test]
    fn best_breaks_ties_by_original_order() {
        let scores = [2.0, 3.0, 3.0, 1.0];
        assert_eq!(best_indices(&scores, 3), vec![1, 2, 0]);
    }

    #[test]
    fn best_with_n_larger_than_population() {
        let scores = [1.0, 2.0];
        assert_eq!(best_indices(&scores, 10), vec![1, 0]);
    }
}
