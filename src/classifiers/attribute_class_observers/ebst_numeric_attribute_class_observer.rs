use crate::classifiers::attribute_class_observers::NumericAttributeObserver;
use crate::classifiers::iadem::error::IademError;
use std::any::Any;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EbstMode {
    Classification,
    Regression,
}

/// Sufficient statistics of a regression target: `[count, sum, sum of squares]`.
const COUNT: usize = 0;
const SUM: usize = 1;
const SUM_SQ: usize = 2;

#[derive(Clone, Debug)]
struct EbstNode {
    cut_point: f64,
    left_statistics: Vec<f64>,
    right_statistics: Vec<f64>,
    left: Option<usize>,
    right: Option<usize>,
}

fn add_into(stats: &mut Vec<f64>, delta: &[f64]) {
    if stats.len() < delta.len() {
        stats.resize(delta.len(), 0.0);
    }
    for (s, d) in stats.iter_mut().zip(delta) {
        *s += d;
    }
}

impl EbstNode {
    fn new(value: f64, delta: &[f64]) -> Self {
        Self {
            cut_point: value,
            left_statistics: delta.to_vec(),
            right_statistics: Vec::new(),
            left: None,
            right: None,
        }
    }
}

fn standard_deviation(stats: &[f64]) -> f64 {
    let count = stats.get(COUNT).copied().unwrap_or(0.0);
    if count <= 0.0 {
        return 0.0;
    }
    let sum = stats.get(SUM).copied().unwrap_or(0.0);
    let sum_sq = stats.get(SUM_SQ).copied().unwrap_or(0.0);
    ((sum_sq - sum * sum / count) / count).max(0.0).sqrt()
}

/// Standard-deviation reduction of splitting `left ∪ right` into its halves.
pub fn standard_deviation_reduction(left: &[f64], right: &[f64]) -> f64 {
    let mut parent = left.to_vec();
    add_into(&mut parent, right);
    let total = parent.get(COUNT).copied().unwrap_or(0.0);
    if total <= 0.0 {
        return 0.0;
    }
    let left_count = left.get(COUNT).copied().unwrap_or(0.0);
    let right_count = right.get(COUNT).copied().unwrap_or(0.0);
    standard_deviation(&parent)
        - left_count / total * standard_deviation(left)
        - right_count / total * standard_deviation(right)
}

/// Extended binary search tree holding every distinct observed value.
///
/// In classification mode each node keeps per-class weights on both sides of
/// its value; in regression mode it keeps target count, sum and sum of
/// squares instead.
#[derive(Clone, Debug)]
pub struct EbstNumericAttributeClassObserver {
    mode: EbstMode,
    /// Node 0 is the root; children are indices into this vector.
    nodes: Vec<EbstNode>,
    class_dist: Vec<f64>,
    target_statistics: Vec<f64>,
    num_bins: usize,
}

impl Default for EbstNumericAttributeClassObserver {
    fn default() -> Self {
        Self::new(EbstMode::Classification, 10)
    }
}

impl EbstNumericAttributeClassObserver {
    pub fn new(mode: EbstMode, num_bins: usize) -> Self {
        Self {
            mode,
            nodes: Vec::new(),
            class_dist: Vec::new(),
            target_statistics: vec![0.0; 3],
            num_bins,
        }
    }

    pub fn mode(&self) -> EbstMode {
        self.mode
    }

    fn insert(&mut self, value: f64, delta: &[f64]) {
        if self.nodes.is_empty() {
            self.nodes.push(EbstNode::new(value, delta));
            return;
        }
        let new_index = self.nodes.len();
        let mut index = 0;
        loop {
            let node = &mut self.nodes[index];
            let slot = if value == node.cut_point {
                add_into(&mut node.left_statistics, delta);
                return;
            } else if value < node.cut_point {
                add_into(&mut node.left_statistics, delta);
                &mut node.left
            } else {
                add_into(&mut node.right_statistics, delta);
                &mut node.right
            };
            match *slot {
                Some(child) => index = child,
                None => {
                    *slot = Some(new_index);
                    break;
                }
            }
        }
        self.nodes.push(EbstNode::new(value, delta));
    }

    /// Every distinct observed value, in increasing order.
    fn distinct_values(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut current = (!self.nodes.is_empty()).then_some(0);
        while current.is_some() || !stack.is_empty() {
            while let Some(index) = current {
                stack.push(index);
                current = self.nodes[index].left;
            }
            if let Some(index) = stack.pop() {
                values.push(self.nodes[index].cut_point);
                current = self.nodes[index].right;
            }
        }
        values
    }

    fn statistics_left_of(&self, cut: f64) -> Vec<f64> {
        let mut acc = Vec::new();
        let mut current = (!self.nodes.is_empty()).then_some(0);
        while let Some(index) = current {
            let node = &self.nodes[index];
            if cut == node.cut_point {
                add_into(&mut acc, &node.left_statistics);
                break;
            } else if cut < node.cut_point {
                current = node.left;
            } else {
                add_into(&mut acc, &node.left_statistics);
                current = node.right;
            }
        }
        acc
    }

    /// Records a regression target observed with attribute `value`.
    pub fn observe_target(&mut self, value: f64, target: f64, weight: f64) -> Result<(), IademError> {
        if self.mode != EbstMode::Regression {
            return Err(IademError::UnsupportedOperation(
                "observe_target on a classification E-BST observer".to_string(),
            ));
        }
        if value.is_nan() {
            return Ok(());
        }
        let delta = [weight, weight * target, weight * target * target];
        add_into(&mut self.target_statistics, &delta);
        self.insert(value, &delta);
        Ok(())
    }

    /// `[count, sum, sum of squares]` of targets at or below `cut`.
    pub fn target_statistics_left_of(&self, cut: f64) -> Result<Vec<f64>, IademError> {
        if self.mode != EbstMode::Regression {
            return Err(IademError::UnsupportedOperation(
                "target statistics on a classification E-BST observer".to_string(),
            ));
        }
        let mut left = self.statistics_left_of(cut);
        left.resize(3, 0.0);
        Ok(left)
    }

    /// Drops every subtree whose nodes all fall below the split-quality
    /// threshold `last_check_ratio - 2 * last_check_e`, measured as the
    /// node's reduction relative to `last_check_sdr`.
    pub fn remove_bad_splits(
        &mut self,
        last_check_ratio: f64,
        last_check_sdr: f64,
        last_check_e: f64,
    ) -> Result<(), IademError> {
        if self.mode != EbstMode::Regression {
            return Err(IademError::UnsupportedOperation(
                "remove_bad_splits on a classification E-BST observer".to_string(),
            ));
        }
        let threshold = last_check_ratio - 2.0 * last_check_e;
        self.prune(last_check_sdr, threshold);
        Ok(())
    }

    /// A node is bad when both subtrees are bad (or absent) and its own
    /// reduction ratio is below `threshold`. Bad subtrees are removed and the
    /// surviving nodes are compacted in pre-order.
    fn prune(&mut self, last_check_sdr: f64, threshold: f64) {
        if self.nodes.is_empty() {
            return;
        }

        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            order.push(index);
            let node = &self.nodes[index];
            stack.extend(node.right);
            stack.extend(node.left);
        }

        let mut bad = vec![false; self.nodes.len()];
        for &index in order.iter().rev() {
            let node = &self.nodes[index];
            let children_bad = [node.left, node.right]
                .iter()
                .all(|child| child.is_none_or(|c| bad[c]));
            let merit = standard_deviation_reduction(&node.left_statistics, &node.right_statistics);
            bad[index] = children_bad && merit / last_check_sdr < threshold;
        }

        let mut remap = vec![None; self.nodes.len()];
        let mut kept = 0;
        for &index in &order {
            if !bad[index] {
                remap[index] = Some(kept);
                kept += 1;
            }
        }

        let mut old = std::mem::take(&mut self.nodes);
        self.nodes.reserve(kept);
        for &index in &order {
            if bad[index] {
                continue;
            }
            let mut node = std::mem::replace(&mut old[index], EbstNode::new(0.0, &[]));
            node.left = node.left.and_then(|c| remap[c]);
            node.right = node.right.and_then(|c| remap[c]);
            self.nodes.push(node);
        }
    }
}

impl NumericAttributeObserver for EbstNumericAttributeClassObserver {
    fn add_value(&mut self, value: f64, class_index: usize, weight: f64) -> Result<(), IademError> {
        if self.mode != EbstMode::Classification {
            return Err(IademError::UnsupportedOperation(
                "class observation on a regression E-BST observer".to_string(),
            ));
        }
        if value.is_nan() {
            return Ok(());
        }
        let mut delta = vec![0.0; class_index + 1];
        delta[class_index] = weight;
        add_into(&mut self.class_dist, &delta);
        self.insert(value, &delta);
        Ok(())
    }

    fn value_count(&self) -> f64 {
        self.class_dist.iter().sum()
    }

    fn class_dist(&self) -> Vec<f64> {
        self.class_dist.clone()
    }

    fn number_of_cut_points(&self) -> usize {
        self.cut_points().len()
    }

    fn cut_value(&self, index: usize) -> Option<f64> {
        self.cut_points().get(index).copied()
    }

    /// Distinct values except the largest, thinned evenly to `max_bins`.
    fn cut_points(&self) -> Vec<f64> {
        if self.mode != EbstMode::Classification {
            return Vec::new();
        }
        let mut values = self.distinct_values();
        values.pop();
        if values.len() <= self.num_bins || self.num_bins == 0 {
            return values;
        }
        let stride = values.len().div_ceil(self.num_bins);
        values.into_iter().step_by(stride).collect()
    }

    fn left_class_dist(&self, cut: f64) -> Vec<f64> {
        let mut left = self.statistics_left_of(cut);
        left.resize(self.class_dist.len(), 0.0);
        left
    }

    fn conditional_probability(&self, value: f64) -> Vec<f64> {
        let num_classes = self.class_dist.len();
        let cuts = self.cut_points();
        if cuts.is_empty() {
            return vec![0.0; num_classes];
        }

        let upper = cuts.iter().position(|&cut| value <= cut);
        let lower = match upper {
            Some(0) => None,
            Some(i) => Some(cuts[i - 1]),
            None => cuts.last().copied(),
        };
        let above = match upper {
            Some(i) => self.left_class_dist(cuts[i]),
            None => self.class_dist.clone(),
        };
        let below = lower.map_or_else(|| vec![0.0; num_classes], |cut| self.left_class_dist(cut));

        self.class_dist
            .iter()
            .enumerate()
            .map(|(class, &total)| {
                if total == 0.0 {
                    0.0
                } else {
                    (above[class] - below[class]) / total
                }
            })
            .collect()
    }

    fn equals_passes_test(&self) -> bool {
        true
    }

    fn max_bins(&self) -> usize {
        self.num_bins
    }

    fn set_max_bins(&mut self, max_bins: usize) {
        self.num_bins = max_bins;
    }

    fn clone_box(&self) -> Box<dyn NumericAttributeObserver> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn classification(values: &[(f64, usize)]) -> EbstNumericAttributeClassObserver {
        let mut obs = EbstNumericAttributeClassObserver::new(EbstMode::Classification, 10);
        for &(value, class) in values {
            obs.add_value(value, class, 1.0).unwrap();
        }
        obs
    }

    #[test]
    fn test_cut_points_are_sorted_distinct_values() {
        let obs = classification(&[(3.0, 0), (1.0, 0), (2.0, 1), (3.0, 1), (5.0, 1)]);
        assert_eq!(obs.cut_points(), vec![1.0, 2.0, 3.0]);
        assert_eq!(obs.number_of_cut_points(), 3);
    }

    #[test]
    fn test_cut_points_are_thinned_to_max_bins() {
        let values: Vec<(f64, usize)> = (0..41).map(|i| (i as f64, i % 2)).collect();
        let mut obs = classification(&values);
        obs.set_max_bins(4);
        let cuts = obs.cut_points();
        assert_eq!(cuts, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_left_class_dist_is_exact() {
        let obs = classification(&[(3.0, 0), (1.0, 0), (2.0, 1), (3.0, 1), (5.0, 1)]);
        let left = obs.left_class_dist(2.0);
        assert!(approx_eq(left[0], 1.0, EPS));
        assert!(approx_eq(left[1], 1.0, EPS));

        let left = obs.left_class_dist(3.0);
        assert!(approx_eq(left[0], 2.0, EPS));
        assert!(approx_eq(left[1], 2.0, EPS));

        let left = obs.left_class_dist(0.5);
        assert!(approx_eq(left.iter().sum::<f64>(), 0.0, EPS));
    }

    #[test]
    fn test_conditional_probability_uses_interval_of_value() {
        let obs = classification(&[(1.0, 0), (2.0, 0), (3.0, 1), (4.0, 1)]);
        let probs = obs.conditional_probability(2.5);
        assert!(approx_eq(probs[0], 0.0, EPS));
        assert!(approx_eq(probs[1], 0.5, EPS));
    }

    #[test]
    fn test_wrong_kind_of_update_is_unsupported() {
        let mut classifier_obs = EbstNumericAttributeClassObserver::default();
        assert!(matches!(
            classifier_obs.observe_target(1.0, 2.0, 1.0),
            Err(IademError::UnsupportedOperation(_))
        ));

        let mut regression_obs = EbstNumericAttributeClassObserver::new(EbstMode::Regression, 10);
        assert!(matches!(
            regression_obs.add_value(1.0, 0, 1.0),
            Err(IademError::UnsupportedOperation(_))
        ));
        assert!(regression_obs.remove_bad_splits(1.0, 1.0, 0.0).is_ok());
    }

    #[test]
    fn test_regression_statistics() {
        let mut obs = EbstNumericAttributeClassObserver::new(EbstMode::Regression, 10);
        obs.observe_target(1.0, 2.0, 1.0).unwrap();
        obs.observe_target(2.0, 4.0, 1.0).unwrap();
        obs.observe_target(3.0, 6.0, 1.0).unwrap();

        let left = obs.target_statistics_left_of(2.0).unwrap();
        assert!(approx_eq(left[COUNT], 2.0, EPS));
        assert!(approx_eq(left[SUM], 6.0, EPS));
        assert!(approx_eq(left[SUM_SQ], 20.0, EPS));
    }

    #[test]
    fn test_monotone_stream_builds_a_deep_tree() {
        let n = 30_000;
        let mut obs = EbstNumericAttributeClassObserver::new(EbstMode::Classification, 10);
        for i in 0..n {
            obs.add_value(i as f64, i % 2, 1.0).unwrap();
        }
        assert_eq!(obs.distinct_values().len(), n);

        let left = obs.left_class_dist((n - 2) as f64);
        assert!(approx_eq(left.iter().sum::<f64>(), (n - 1) as f64, EPS));
        assert_eq!(obs.number_of_cut_points(), 10);

        let copy = obs.clone();
        drop(obs);
        assert!(approx_eq(copy.value_count(), n as f64, EPS));
    }

    #[test]
    fn test_remove_bad_splits_keeps_useful_nodes() {
        let mut obs = EbstNumericAttributeClassObserver::new(EbstMode::Regression, 10);
        for (value, target) in [(2.0, 0.0), (1.0, 0.0), (3.0, 10.0)] {
            obs.observe_target(value, target, 1.0).unwrap();
        }
        obs.remove_bad_splits(0.5, 1.0, 0.0).unwrap();
        assert_eq!(obs.distinct_values(), vec![2.0]);

        let left = obs.target_statistics_left_of(2.0).unwrap();
        assert!(approx_eq(left[COUNT], 2.0, EPS));
    }

    #[test]
    fn test_standard_deviation_reduction_of_perfect_split() {
        let left = [2.0, 0.0, 0.0];
        let right = [2.0, 4.0, 8.0];
        assert!(approx_eq(standard_deviation_reduction(&left, &right), 1.0, EPS));
    }

    #[test]
    fn test_remove_bad_splits_prunes_useless_leaves() {
        let mut obs = EbstNumericAttributeClassObserver::new(EbstMode::Regression, 10);
        for (value, target) in [(2.0, 1.0), (1.0, 1.0), (3.0, 1.0)] {
            obs.observe_target(value, target, 1.0).unwrap();
        }
        obs.remove_bad_splits(0.5, 1.0, 0.0).unwrap();
        assert_eq!(obs.distinct_values(), Vec::<f64>::new());

        obs.observe_target(5.0, 9.0, 1.0).unwrap();
        assert_eq!(obs.distinct_values(), vec![5.0]);
    }
}
