#[derive(Clone, Copy, Debug, PartialEq)]
struct Tuple {
    value: f64,
    /// Weight between this tuple's rank and the previous tuple's.
    g: f64,
    /// Rank uncertainty carried by this tuple.
    delta: f64,
}

/// Greenwald-Khanna quantile summary over weighted observations.
///
/// Keeps fewer than `max_tuples` tuples sorted by value. When the summary
/// fills up, the adjacent pair with the least combined weight is merged.
#[derive(Clone, Debug)]
pub struct GreenwaldKhannaQuantileSummary {
    tuples: Vec<Tuple>,
    max_tuples: usize,
    total_weight: f64,
}

impl GreenwaldKhannaQuantileSummary {
    pub fn new(max_tuples: usize) -> Self {
        Self {
            tuples: Vec::with_capacity(max_tuples),
            max_tuples,
            total_weight: 0.0,
        }
    }

    pub fn set_max_tuples(&mut self, max_tuples: usize) {
        self.max_tuples = max_tuples;
    }

    pub fn num_tuples(&self) -> usize {
        self.tuples.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn insert(&mut self, value: f64, weight: f64) {
        if value.is_nan() {
            return;
        }
        let index = self.index_of_tuple_greater_than(value);
        let delta = self
            .tuples
            .get(index)
            .map_or(0.0, |next| (next.g + next.delta - weight).max(0.0));
        self.tuples.insert(
            index,
            Tuple {
                value,
                g: weight,
                delta,
            },
        );
        if self.tuples.len() >= self.max_tuples && !self.delete_mergeable_tuple_most_full() {
            self.delete_tuple_most_full();
        }
        self.total_weight += weight;
    }

    /// Index of the first tuple whose value is strictly greater than `value`,
    /// or the number of tuples when there is none.
    pub fn index_of_tuple_greater_than(&self, value: f64) -> usize {
        self.tuples.partition_point(|tuple| tuple.value <= value)
    }

    /// Upper bound on the weight summarised by the tuple at `index`.
    pub fn max_weight_at(&self, index: usize) -> f64 {
        self.tuples
            .get(index)
            .map_or(0.0, |tuple| tuple.g + tuple.delta)
    }

    /// Weight of the observations at or below `cut`.
    pub fn weight_below(&self, cut: f64) -> f64 {
        self.tuples
            .iter()
            .take_while(|tuple| tuple.value <= cut)
            .map(|tuple| tuple.g)
            .sum()
    }

    /// Values of the tuples, in increasing order.
    pub fn suggested_cut_points(&self) -> Vec<f64> {
        self.tuples.iter().map(|tuple| tuple.value).collect()
    }

    fn fullness(&self, index: usize) -> f64 {
        let next = &self.tuples[index + 1];
        self.tuples[index].g + next.g + next.delta
    }

    /// Merges tuple `index` into its right neighbour.
    fn delete_tuple(&mut self, index: usize) {
        let removed = self.tuples.remove(index);
        self.tuples[index].g += removed.g;
    }

    fn delete_mergeable_tuple_most_full(&mut self) -> bool {
        let candidate = (1..self.tuples.len().saturating_sub(1))
            .filter(|&i| self.tuples[i].delta >= self.tuples[i + 1].delta)
            .min_by(|&a, &b| self.fullness(a).total_cmp(&self.fullness(b)));
        match candidate {
            Some(index) => {
                self.delete_tuple(index);
                true
            }
            None => false,
        }
    }

    /// Leaves the smallest tuple alone unless there is nothing else to merge.
    fn delete_tuple_most_full(&mut self) {
        let first = usize::from(self.tuples.len() > 2);
        let candidate = (first..self.tuples.len().saturating_sub(1))
            .min_by(|&a, &b| self.fullness(a).total_cmp(&self.fullness(b)));
        if let Some(index) = candidate {
            self.delete_tuple(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn summary(max_tuples: usize, values: &[f64]) -> GreenwaldKhannaQuantileSummary {
        let mut s = GreenwaldKhannaQuantileSummary::new(max_tuples);
        for &v in values {
            s.insert(v, 1.0);
        }
        s
    }

    #[test]
    fn test_small_stream_is_exact() {
        let s = summary(10, &[3.0, 1.0, 5.0, 2.0, 4.0]);
        assert_eq!(s.suggested_cut_points(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(approx_eq(s.weight_below(3.0), 3.0, EPS));
        assert!(approx_eq(s.weight_below(0.5), 0.0, EPS));
        assert!(approx_eq(s.weight_below(9.0), 5.0, EPS));
        assert_eq!(s.index_of_tuple_greater_than(3.0), 3);
        assert_eq!(s.index_of_tuple_greater_than(9.0), 5);
    }

    #[test]
    fn test_full_summary_merges_lightest_pair() {
        let s = summary(4, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.num_tuples(), 3);
        assert_eq!(s.suggested_cut_points(), vec![1.0, 3.0, 4.0]);
        assert!(approx_eq(s.weight_below(3.0), 3.0, EPS));
        assert!(approx_eq(s.weight_below(2.0), 1.0, EPS));
        assert!(approx_eq(s.total_weight(), 4.0, EPS));
    }

    #[test]
    fn test_tuple_count_stays_bounded() {
        let values: Vec<f64> = (0..1000).map(|i| ((i * 37) % 1000) as f64).collect();
        let s = summary(20, &values);
        assert!(s.num_tuples() < 20);
        assert!(approx_eq(s.total_weight(), 1000.0, EPS));
        assert!(approx_eq(s.weight_below(f64::INFINITY), 1000.0, EPS));
    }

    #[test]
    fn test_two_tuple_capacity_still_bounds_the_summary() {
        let s = summary(2, &[5.0, 1.0, 3.0]);
        assert_eq!(s.num_tuples(), 1);
        assert!(approx_eq(s.weight_below(f64::INFINITY), 3.0, EPS));
    }

    #[test]
    fn test_weights_and_missing_values() {
        let mut s = GreenwaldKhannaQuantileSummary::new(10);
        s.insert(f64::NAN, 1.0);
        s.insert(2.0, 0.5);
        s.insert(1.0, 1.5);
        assert_eq!(s.num_tuples(), 2);
        assert!(approx_eq(s.total_weight(), 2.0, EPS));
        assert!(approx_eq(s.weight_below(1.0), 1.5, EPS));
        assert!(approx_eq(s.max_weight_at(1), 0.5, EPS));
        assert!(approx_eq(s.max_weight_at(2), 0.0, EPS));
    }
}
