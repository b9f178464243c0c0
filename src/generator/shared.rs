//! Sampling helpers shared by every problem family.

use crate::error::GeneratorError;
use crate::model::PreferenceList;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::seq::SliceRandom;
use rand::Rng;

/// Popularity weights rising linearly from 1 to `skew`, normalised to sum 1.
///
/// ```
/// use u_matching::generator::create_linear_distribution;
///
/// let d = create_linear_distribution(4, 10.0);
/// let expected = [1.0 / 22.0, 4.0 / 22.0, 7.0 / 22.0, 10.0 / 22.0];
/// for (x, y) in d.iter().zip(expected) {
///     assert!((x - y).abs() < 1e-12);
/// }
/// ```
pub fn create_linear_distribution(n: usize, skew: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let raw: Vec<f64> = (0..n)
        .map(|x| match n {
            1 => 1.0,
            _ => 1.0 + x as f64 * (skew - 1.0) / (n - 1) as f64,
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Splits `sum` over `n` entries as evenly as possible, the first entries
/// taking the remainder.
pub fn create_quotas(n: usize, sum: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let (quotient, remainder) = (sum / n, sum % n);
    (0..n)
        .map(|i| quotient + usize::from(i < remainder))
        .collect()
}

/// One indicator per entry: whether it is tied with the next one.
pub fn create_tie_indicators<R: Rng>(len: usize, probability: f64, rng: &mut R) -> Vec<bool> {
    (0..len).map(|_| rng.random_bool(probability)).collect()
}

/// Owner id (1-based) of each of `items` items spread over `owners`
/// owners, the first owners taking one extra item each.
pub fn spread_owners(items: usize, owners: usize) -> Vec<usize> {
    create_quotas(owners, items)
        .into_iter()
        .enumerate()
        .flat_map(|(k, count)| std::iter::repeat(k + 1).take(count))
        .collect()
}

/// Draws `len` distinct items without replacement, each draw proportional
/// to the remaining weights.
fn draw_weighted<R: Rng>(
    items: &[usize],
    weights: &[f64],
    len: usize,
    rng: &mut R,
) -> Result<Vec<usize>, GeneratorError> {
    let mut remaining: Vec<(usize, f64)> = items.iter().copied().zip(weights.iter().copied()).collect();
    let mut drawn = Vec::with_capacity(len);
    while drawn.len() < len && !remaining.is_empty() {
        let dist = WeightedIndex::new(remaining.iter().map(|&(_, w)| w))
            .map_err(|e| GeneratorError::Bounds(format!("invalid popularity weights: {e}")))?;
        let (item, _) = remaining.remove(dist.sample(rng));
        drawn.push(item);
    }
    Ok(drawn)
}

/// Agent preference lists over ids `1..=n2`, with raw entries.
///
/// Ids are shuffled once and then assigned the linear popularity
/// distribution, so which ids are popular is random too.
pub fn sample_agent_lists<R: Rng>(
    n1: usize,
    n2: usize,
    lengths: (usize, usize),
    skew: f64,
    rng: &mut R,
) -> Result<Vec<Vec<usize>>, GeneratorError> {
    let mut ordering: Vec<usize> = (1..=n2).collect();
    ordering.shuffle(rng);
    let distribution = create_linear_distribution(n2, skew);
    (0..n1)
        .map(|_| {
            let len = rng.random_range(lengths.0..=lengths.1);
            draw_weighted(&ordering, &distribution, len, rng)
        })
        .collect()
}

/// Lists of the `n2` ranked entities over the agents ranking them, in
/// random order.
pub fn invert_lists<R: Rng>(lists: &[Vec<usize>], n2: usize, rng: &mut R) -> Vec<Vec<usize>> {
    let mut inverted = vec![Vec::new(); n2];
    for (i, list) in lists.iter().enumerate() {
        for &entry in list {
            if let Some(target) = entry.checked_sub(1).and_then(|e| inverted.get_mut(e)) {
                target.push(i + 1);
            }
        }
    }
    for list in &mut inverted {
        list.shuffle(rng);
    }
    inverted
}

/// Attaches random ties to raw lists.
pub fn with_ties<R: Rng>(lists: &[Vec<usize>], probability: f64, rng: &mut R) -> Vec<PreferenceList> {
    lists
        .iter()
        .map(|entries| {
            let ties = create_tie_indicators(entries.len(), probability, rng);
            PreferenceList::from_tie_indicators(entries, &ties)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_linear_distribution() {
        let d = create_linear_distribution(4, 10.0);
        let expected = [0.04545455, 0.18181818, 0.31818182, 0.45454545];
        for (x, y) in d.iter().zip(expected) {
            assert!((x - y).abs() < 1e-6);
        }
        assert_eq!(create_linear_distribution(1, 5.0), vec![1.0]);
        assert!(create_linear_distribution(0, 5.0).is_empty());
        let flat = create_linear_distribution(3, 1.0);
        assert!(flat.iter().all(|w| (w - 1.0 / 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_quotas() {
        assert_eq!(create_quotas(4, 6), vec![2, 2, 1, 1]);
        assert_eq!(create_quotas(3, 0), vec![0, 0, 0]);
        assert_eq!(create_quotas(2, 8), vec![4, 4]);
        assert!(create_quotas(0, 3).is_empty());
    }

    #[test]
    fn test_spread_owners() {
        assert_eq!(spread_owners(5, 2), vec![1, 1, 1, 2, 2]);
        assert_eq!(spread_owners(2, 3), vec![1, 2]);
    }

    #[test]
    fn test_tie_indicator_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(create_tie_indicators(5, 0.0, &mut rng).iter().all(|t| !t));
        assert!(create_tie_indicators(5, 1.0, &mut rng).iter().all(|&t| t));
    }

    #[test]
    fn test_agent_lists_are_distinct_and_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let lists = sample_agent_lists(20, 6, (2, 4), 5.0, &mut rng).unwrap();
        assert_eq!(lists.len(), 20);
        for list in &lists {
            assert!((2..=4).contains(&list.len()));
            assert!(list.iter().all(|&e| (1..=6).contains(&e)));
            let mut sorted = list.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), list.len());
        }
    }

    #[test]
    fn test_full_length_lists_are_permutations() {
        let mut rng = StdRng::seed_from_u64(3);
        for mut list in sample_agent_lists(5, 4, (4, 4), 3.0, &mut rng).unwrap() {
            list.sort_unstable();
            assert_eq!(list, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_invert_lists() {
        let mut rng = StdRng::seed_from_u64(9);
        let lists = vec![vec![2, 1], vec![2], vec![3]];
        let mut inverted = invert_lists(&lists, 3, &mut rng);
        for list in &mut inverted {
            list.sort_unstable();
        }
        assert_eq!(inverted, vec![vec![1], vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_with_ties_groups_everything_at_probability_one() {
        let mut rng = StdRng::seed_from_u64(0);
        let lists = with_ties(&[vec![3, 1, 2]], 1.0, &mut rng);
        assert_eq!(lists[0].groups(), &[vec![3, 1, 2]]);
        assert_eq!(lists[0].ranks(), vec![1, 1, 1]);
    }
}
