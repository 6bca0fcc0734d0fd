use crate::classifiers::attribute_class_observers::NumericAttributeObserver;
use crate::classifiers::iadem::error::IademError;
use crate::core::estimators::GaussianEstimator;
use std::any::Any;

/// One normal estimator per class, with cut points spread evenly over the
/// observed range.
#[derive(Clone, Debug)]
pub struct GaussianNumericAttributeClassObserver {
    min_value_observed_per_class: Vec<f64>,
    max_value_observed_per_class: Vec<f64>,
    attribute_value_distribution_per_class: Vec<Option<GaussianEstimator>>,
    class_dist: Vec<f64>,
    value_count: f64,
    num_bins: usize,
}

impl Default for GaussianNumericAttributeClassObserver {
    fn default() -> Self {
        Self::new(10)
    }
}

impl GaussianNumericAttributeClassObserver {
    pub fn new(num_bins: usize) -> Self {
        GaussianNumericAttributeClassObserver {
            min_value_observed_per_class: Vec::new(),
            max_value_observed_per_class: Vec::new(),
            attribute_value_distribution_per_class: Vec::new(),
            class_dist: Vec::new(),
            value_count: 0.0,
            num_bins,
        }
    }

    #[inline]
    fn ensure_class(&mut self, class_val: usize) {
        if class_val >= self.attribute_value_distribution_per_class.len() {
            let new_len = class_val + 1;
            self.attribute_value_distribution_per_class
                .resize_with(new_len, || None);
            self.min_value_observed_per_class.resize(new_len, 0.0);
            self.max_value_observed_per_class.resize(new_len, 0.0);
            self.class_dist.resize(new_len, 0.0);
        }
    }

    fn split_point_suggestions(&self) -> Vec<f64> {
        let mut min_val = f64::INFINITY;
        let mut max_val = f64::NEG_INFINITY;

        for (i, est_opt) in self
            .attribute_value_distribution_per_class
            .iter()
            .enumerate()
        {
            if est_opt.is_some() {
                min_val = min_val.min(self.min_value_observed_per_class[i]);
                max_val = max_val.max(self.max_value_observed_per_class[i]);
            }
        }

        if min_val == f64::INFINITY || max_val == f64::NEG_INFINITY {
            return vec![];
        }

        let range = max_val - min_val;
        (0..self.num_bins)
            .map(|i| (range / (self.num_bins as f64 + 1.0)) * (i as f64 + 1.0) + min_val)
            .filter(|&split_value| split_value > min_val && split_value < max_val)
            .collect()
    }
}

impl NumericAttributeObserver for GaussianNumericAttributeClassObserver {
    fn add_value(&mut self, value: f64, class_index: usize, weight: f64) -> Result<(), IademError> {
        if value.is_nan() || !weight.is_finite() || weight <= 0.0 {
            return Ok(());
        }

        self.ensure_class(class_index);
        self.value_count += weight;
        self.class_dist[class_index] += weight;

        if let Some(estimator) = &mut self.attribute_value_distribution_per_class[class_index] {
            let min = &mut self.min_value_observed_per_class[class_index];
            *min = min.min(value);
            let max = &mut self.max_value_observed_per_class[class_index];
            *max = max.max(value);
            estimator.observe(value, weight);
        } else {
            let mut estimator = GaussianEstimator::new();
            estimator.observe(value, weight);
            self.attribute_value_distribution_per_class[class_index] = Some(estimator);
            self.min_value_observed_per_class[class_index] = value;
            self.max_value_observed_per_class[class_index] = value;
        }
        Ok(())
    }

    fn value_count(&self) -> f64 {
        self.value_count
    }

    fn class_dist(&self) -> Vec<f64> {
        self.class_dist.clone()
    }

    fn number_of_cut_points(&self) -> usize {
        self.split_point_suggestions().len()
    }

    fn cut_value(&self, index: usize) -> Option<f64> {
        self.split_point_suggestions().get(index).copied()
    }

    fn cut_points(&self) -> Vec<f64> {
        self.split_point_suggestions()
    }

    fn left_class_dist(&self, cut: f64) -> Vec<f64> {
        self.attribute_value_distribution_per_class
            .iter()
            .enumerate()
            .map(|(class_idx, est_opt)| match est_opt {
                None => 0.0,
                Some(_) if cut < self.min_value_observed_per_class[class_idx] => 0.0,
                Some(est) if cut >= self.max_value_observed_per_class[class_idx] => {
                    est.total_weight()
                }
                Some(est) => est.weight_split_at(cut).less_or_equal(),
            })
            .collect()
    }

    fn conditional_probability(&self, value: f64) -> Vec<f64> {
        self.attribute_value_distribution_per_class
            .iter()
            .map(|est_opt| est_opt.as_ref().map_or(0.0, |est| est.density(value)))
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

    fn observed(values: &[(f64, usize)]) -> GaussianNumericAttributeClassObserver {
        let mut obs = GaussianNumericAttributeClassObserver::new(10);
        for &(value, class) in values {
            obs.add_value(value, class, 1.0).unwrap();
        }
        obs
    }

    #[test]
    fn test_starts_empty() {
        let obs = GaussianNumericAttributeClassObserver::default();
        assert_eq!(obs.number_of_cut_points(), 0);
        assert!(obs.class_dist().is_empty());
        assert!(obs.conditional_probability(0.0).is_empty());
    }

    #[test]
    fn test_cut_points_are_equal_width_inside_range() {
        let obs = observed(&[(0.0, 0), (11.0, 1)]);
        assert_eq!(obs.number_of_cut_points(), 10);
        assert!(approx_eq(obs.cut_value(0).unwrap(), 1.0, EPS));
        assert!(approx_eq(obs.cut_value(9).unwrap(), 10.0, EPS));
        assert!(obs.cut_value(10).is_none());
    }

    #[test]
    fn test_single_value_offers_no_cut_points() {
        let obs = observed(&[(3.0, 0), (3.0, 1)]);
        assert_eq!(obs.number_of_cut_points(), 0);
    }

    #[test]
    fn test_left_class_dist_outside_class_ranges() {
        let obs = observed(&[(0.0, 0), (1.0, 0), (10.0, 1), (11.0, 1)]);
        let left = obs.left_class_dist(5.0);
        assert!(approx_eq(left[0], 2.0, EPS));
        assert!(approx_eq(left[1], 0.0, EPS));
    }

    #[test]
    fn test_left_class_dist_inside_class_range_is_partial() {
        let obs = observed(&[(0.0, 0), (1.0, 0), (2.0, 0)]);
        let left = obs.left_class_dist(1.0);
        assert!(left[0] > 0.0 && left[0] < 3.0);
    }

    #[test]
    fn test_ignores_nan_and_zero_weight() {
        let mut obs = GaussianNumericAttributeClassObserver::default();
        obs.add_value(f64::NAN, 0, 1.0).unwrap();
        obs.add_value(1.0, 0, 0.0).unwrap();
        assert!(approx_eq(obs.value_count(), 0.0, EPS));

        obs.add_value(10.0, 0, 2.0).unwrap();
        assert!(approx_eq(obs.value_count(), 2.0, EPS));
        assert!(approx_eq(obs.conditional_probability(10.0)[0], 1.0, EPS));
    }

    #[test]
    fn test_conditional_probability_peaks_at_class_mean() {
        let obs = observed(&[(-1.0, 0), (0.0, 0), (1.0, 0), (5.0, 1)]);
        let center = obs.conditional_probability(0.0);
        let far = obs.conditional_probability(2.0);
        assert!(center[0] > far[0]);
        assert!(approx_eq(center[1], 0.0, EPS));
    }

    #[test]
    fn test_class_dist_bounds_cover_every_cut() {
        let obs = observed(&[(0.0, 0), (1.0, 0), (10.0, 1), (11.0, 1)]);
        let bounds = obs.class_dist_bounds(1.0, 3);
        assert_eq!(bounds.len(), obs.number_of_cut_points());

        let [left, right] = &bounds[4];
        assert!(approx_eq(left.weight + right.weight, 4.0, 1e-9));
        assert_eq!(left.lower.len(), 3);
        assert!(approx_eq(left.upper[2], 0.0, EPS));
    }

    #[test]
    fn test_clone_box_is_independent() {
        let obs = observed(&[(0.0, 0), (4.0, 1)]);
        let mut copy = obs.clone_box();
        copy.add_value(8.0, 1, 1.0).unwrap();
        assert!(approx_eq(obs.value_count(), 2.0, EPS));
        assert!(approx_eq(copy.value_count(), 3.0, EPS));
    }
}
