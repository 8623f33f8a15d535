//! # Weighted Sampling
//!
//! Discrete weighted selection over a cumulative-sum table. Used for the
//! top-level category of every product and, within the chosen category, for
//! its 1–3 sub-categories.
//!
//! A table is built once per run and shared read-only by all workers; the
//! random stream always comes from the caller, so selection itself is pure.

use rand::Rng;

/// Cumulative-weight representation of a discrete distribution.
///
/// Invariants: non-empty, non-decreasing, and `total()` equals the last entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    cumulative: Vec<f64>,
}

impl WeightTable {
    /// Build a table from raw weights.
    ///
    /// Negative and non-finite weights are clamped to zero. When every weight is
    /// zero the table falls back to a uniform distribution. Returns `None` for
    /// an empty weight list.
    pub fn from_weights(weights: &[f64]) -> Option<Self> {
        if weights.is_empty() {
            return None;
        }

        let clamped: Vec<f64> = weights
            .iter()
            .map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 })
            .collect();
        let uniform = clamped.iter().all(|w| *w == 0.0);

        let mut sum = 0.0;
        let cumulative = clamped
            .iter()
            .map(|w| {
                sum += if uniform { 1.0 } else { *w };
                sum
            })
            .collect();

        Some(Self { cumulative })
    }

    /// Wrap an already-cumulative sequence. Returns `None` if it is empty or
    /// decreasing anywhere.
    pub fn from_cumulative(cumulative: Vec<f64>) -> Option<Self> {
        if cumulative.is_empty() || cumulative.windows(2).any(|w| w[1] < w[0]) {
            return None;
        }
        Some(Self { cumulative })
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.cumulative[self.cumulative.len() - 1]
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Weight of a single entry, recovered from the running sums.
    pub fn weight(&self, index: usize) -> f64 {
        if index == 0 {
            self.cumulative[0]
        } else {
            self.cumulative[index] - self.cumulative[index - 1]
        }
    }

    /// Index selected by `draw`, on the table's own scale.
    pub fn select(&self, draw: f64) -> usize {
        select(&self.cumulative, draw)
    }

    /// Draw one index using the caller's random stream.
    pub fn sample(&self, rng: &mut impl Rng) -> usize {
        let draw = rng.random::<f64>() * self.total();
        self.select(draw)
    }

    /// Draw up to `count` distinct indices.
    ///
    /// Sampling is without replacement: each pick re-normalizes over the
    /// entries not yet chosen. `count` is clamped to the table length.
    pub fn sample_distinct(&self, count: usize, rng: &mut impl Rng) -> Vec<usize> {
        let count = count.min(self.len());
        let mut remaining: Vec<(usize, f64)> = (0..self.len()).map(|i| (i, self.weight(i))).collect();
        let mut picked = Vec::with_capacity(count);

        while picked.len() < count {
            let weights: Vec<f64> = remaining.iter().map(|(_, w)| *w).collect();
            // from_weights only fails on an empty list, and remaining is never
            // empty while picked.len() < count <= len.
            let Some(local) = WeightTable::from_weights(&weights) else {
                break;
            };
            let pos = local.sample(rng);
            let (index, _) = remaining.swap_remove(pos);
            picked.push(index);
        }

        picked
    }
}

/// Return the first index whose cumulative weight is `>= draw`.
///
/// A draw beyond the last entry (floating-point drift, or a draw of exactly
/// the total) selects the last index. Never out of range for a non-empty
/// slice; an empty slice yields 0.
pub fn select(cumulative: &[f64], draw: f64) -> usize {
    cumulative
        .iter()
        .position(|c| draw <= *c)
        .unwrap_or_else(|| cumulative.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_select_matches_cumulative_boundaries() {
        let cumulative = [0.3, 0.7, 1.0];
        assert_eq!(select(&cumulative, 0.0), 0);
        assert_eq!(select(&cumulative, 0.3), 0);
        assert_eq!(select(&cumulative, 0.5), 1);
        assert_eq!(select(&cumulative, 0.95), 2);
        assert_eq!(select(&cumulative, 1.0), 2);
    }

    #[test]
    fn test_select_past_the_end_returns_last() {
        let cumulative = [0.3, 0.7, 0.9999999];
        assert_eq!(select(&cumulative, 0.99999999), 2);
        assert_eq!(select(&cumulative, 7.5), 2);
    }

    #[test]
    fn test_from_weights_builds_running_sums() {
        let table = WeightTable::from_weights(&[0.3, 0.4, 0.3]).unwrap();
        let c = table.cumulative();
        assert!((c[0] - 0.3).abs() < 1e-12);
        assert!((c[1] - 0.7).abs() < 1e-12);
        assert!((c[2] - 1.0).abs() < 1e-12);
        assert!((table.weight(1) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_from_weights_empty_is_none() {
        assert!(WeightTable::from_weights(&[]).is_none());
    }

    #[test]
    fn test_from_weights_all_zeros_uniform_fallback() {
        let table = WeightTable::from_weights(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(table.cumulative(), &[1.0, 2.0, 3.0]);

        let mut rng = StdRng::seed_from_u64(42);
        let seen: HashSet<usize> = (0..200).map(|_| table.sample(&mut rng)).collect();
        assert_eq!(seen.len(), 3, "uniform fallback should reach every index");
    }

    #[test]
    fn test_from_weights_negative_clamped() {
        let table = WeightTable::from_weights(&[-1.0, 1.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(table.sample(&mut rng), 1);
        }
    }

    #[test]
    fn test_from_cumulative_rejects_decreasing() {
        assert!(WeightTable::from_cumulative(vec![0.5, 0.4]).is_none());
        assert!(WeightTable::from_cumulative(vec![]).is_none());
        assert!(WeightTable::from_cumulative(vec![0.3, 0.3, 1.0]).is_some());
    }

    #[test]
    fn test_sample_is_deterministic_for_a_seed() {
        let table = WeightTable::from_weights(&[0.2, 0.5, 0.3]).unwrap();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        let xs: Vec<usize> = (0..50).map(|_| table.sample(&mut a)).collect();
        let ys: Vec<usize> = (0..50).map(|_| table.sample(&mut b)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_sample_skewed_distribution() {
        let table = WeightTable::from_weights(&[0.9, 0.1]).unwrap();
        let mut rng = StdRng::seed_from_u64(1234);
        let draws = 100_000;
        let first = (0..draws).filter(|_| table.sample(&mut rng) == 0).count();
        let fraction = first as f64 / draws as f64;
        assert!(
            (fraction - 0.9).abs() < 0.02,
            "expected ~0.9, got {}",
            fraction
        );
    }

    #[test]
    fn test_sample_distinct_has_no_duplicates() {
        let table = WeightTable::from_weights(&[0.5, 0.2, 0.2, 0.1]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..500 {
            let picks = table.sample_distinct(3, &mut rng);
            assert_eq!(picks.len(), 3);
            let unique: HashSet<usize> = picks.iter().copied().collect();
            assert_eq!(unique.len(), 3);
            assert!(picks.iter().all(|i| *i < 4));
        }
    }

    #[test]
    fn test_sample_distinct_clamps_to_table_length() {
        let table = WeightTable::from_weights(&[1.0, 2.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut picks = table.sample_distinct(3, &mut rng);
        picks.sort();
        assert_eq!(picks, vec![0, 1]);
    }

    #[test]
    fn test_sample_distinct_zero_weight_entries_still_fill() {
        // Once the weighted entries are used up the remainder is uniform.
        let table = WeightTable::from_weights(&[1.0, 0.0, 0.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let picks = table.sample_distinct(3, &mut rng);
        assert_eq!(picks[0], 0);
        assert_eq!(picks.len(), 3);
    }
}
