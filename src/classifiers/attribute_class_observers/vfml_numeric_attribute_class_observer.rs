use crate::classifiers::attribute_class_observers::NumericAttributeObserver;
use crate::classifiers::iadem::error::IademError;
use std::any::Any;

#[derive(Clone, Debug)]
struct Bin {
    lower_bound: f64,
    upper_bound: f64,
    class_weights: Vec<f64>,
    boundary_class: usize,
    boundary_weight: f64,
}

impl Bin {
    fn new(value: f64, class_index: usize, weight: f64) -> Self {
        let mut bin = Bin {
            lower_bound: value,
            upper_bound: value,
            class_weights: Vec::new(),
            boundary_class: class_index,
            boundary_weight: weight,
        };
        bin.add_class_weight(class_index, weight);
        bin
    }

    fn add_class_weight(&mut self, class_index: usize, weight: f64) {
        if class_index >= self.class_weights.len() {
            self.class_weights.resize(class_index + 1, 0.0);
        }
        self.class_weights[class_index] += weight;
    }

    fn class_weight(&self, class_index: usize) -> f64 {
        self.class_weights.get(class_index).copied().unwrap_or(0.0)
    }

    fn total(&self) -> f64 {
        self.class_weights.iter().sum()
    }
}

enum Placement {
    Inside(usize),
    BeforeFirst,
    AfterLast,
}

/// VFML-style histogram: at most `max_bins` bins whose lower bounds are
/// observed values. New bins take their initial counts from the bin they
/// split by linear interpolation.
#[derive(Clone, Debug)]
pub struct VfmlNumericAttributeClassObserver {
    bins: Vec<Bin>,
    class_dist: Vec<f64>,
    num_bins: usize,
}

impl Default for VfmlNumericAttributeClassObserver {
    fn default() -> Self {
        Self::new(500)
    }
}

impl VfmlNumericAttributeClassObserver {
    pub fn new(num_bins: usize) -> Self {
        Self {
            bins: Vec::new(),
            class_dist: Vec::new(),
            num_bins,
        }
    }

    pub fn number_of_bins(&self) -> usize {
        self.bins.len()
    }

    fn contains(&self, index: usize, value: f64) -> bool {
        let bin = &self.bins[index];
        (value >= bin.lower_bound && value < bin.upper_bound)
            || (index == self.bins.len() - 1
                && value >= bin.lower_bound
                && value <= bin.upper_bound)
    }

    fn locate(&self, value: f64) -> Placement {
        let mut min = 0usize;
        let mut max = self.bins.len();
        while min < max {
            let i = (min + max) / 2;
            if self.contains(i, value) {
                return Placement::Inside(i);
            } else if value < self.bins[i].lower_bound {
                max = i;
            } else {
                min = i + 1;
            }
        }
        if self.bins[0].lower_bound > value {
            Placement::BeforeFirst
        } else {
            Placement::AfterLast
        }
    }

    fn observe(&mut self, value: f64, class_index: usize, weight: f64) {
        if self.bins.is_empty() {
            self.bins.push(Bin::new(value, class_index, weight));
            return;
        }

        let placement = self.locate(value);
        let index = match placement {
            Placement::Inside(i) => i,
            Placement::BeforeFirst => 0,
            Placement::AfterLast => self.bins.len() - 1,
        };

        let full = self.bins.len() >= self.num_bins;
        let bin = &mut self.bins[index];
        if bin.lower_bound == value || full {
            bin.add_class_weight(class_index, weight);
            if bin.boundary_class == class_index && bin.lower_bound == value {
                bin.boundary_weight += weight;
            }
            return;
        }

        let mut new_bin = Bin::new(value, class_index, weight);
        new_bin.upper_bound = bin.upper_bound;

        let inside = matches!(placement, Placement::Inside(_));
        let width = bin.upper_bound - bin.lower_bound;
        let percent = if inside && width != 0.0 {
            1.0 - (value - bin.lower_bound) / width
        } else {
            0.0
        };

        // boundary points stay with the old bin
        let boundary_class = bin.boundary_class;
        let boundary_weight = bin.boundary_weight;
        bin.add_class_weight(boundary_class, -boundary_weight);
        let shifted: Vec<f64> = bin
            .class_weights
            .iter()
            .map(|&w| (w * percent).clamp(0.0, w.max(0.0)))
            .collect();
        for (class, &w) in shifted.iter().enumerate() {
            new_bin.add_class_weight(class, w);
            bin.class_weights[class] -= w;
        }
        bin.add_class_weight(boundary_class, boundary_weight);

        match placement {
            Placement::AfterLast => {
                bin.upper_bound = value;
                new_bin.upper_bound = value;
                self.bins.push(new_bin);
            }
            Placement::BeforeFirst => {
                new_bin.upper_bound = bin.lower_bound;
                self.bins.insert(0, new_bin);
            }
            Placement::Inside(i) => {
                bin.upper_bound = value;
                self.bins.insert(i + 1, new_bin);
            }
        }
    }

    /// Removes one previously observed value, merging bins whose boundary
    /// weight drops to zero into their left neighbour.
    pub fn forget_attribute_class(&mut self, value: f64, class_index: usize, weight: f64) {
        if value.is_nan() || self.bins.is_empty() || self.class_dist.iter().sum::<f64>() <= 0.0 {
            return;
        }
        if let Some(total) = self.class_dist.get_mut(class_index) {
            *total -= weight;
        }

        let Placement::Inside(index) = self.locate(value) else {
            return;
        };

        let bin = &mut self.bins[index];
        bin.add_class_weight(class_index, -weight);
        if bin.class_weights[class_index] < 0.0 {
            bin.class_weights[class_index] = 0.0;
        }
        if bin.boundary_class == class_index {
            bin.boundary_weight -= weight;
        }
        if bin.boundary_weight < 0.0 {
            bin.boundary_weight = 0.0;
        }

        if bin.boundary_weight != 0.0 {
            return;
        }
        if index != 0 {
            let removed = self.bins.remove(index);
            let previous = &mut self.bins[index - 1];
            previous.upper_bound = removed.upper_bound;
            for (class, &w) in removed.class_weights.iter().enumerate() {
                previous.add_class_weight(class, w);
            }
        } else if self.bins.len() > 1 {
            let removed = self.bins.remove(0);
            let first = &mut self.bins[0];
            first.lower_bound = removed.lower_bound;
            for (class, &w) in removed.class_weights.iter().enumerate() {
                first.add_class_weight(class, w);
            }
        }
    }
}

impl NumericAttributeObserver for VfmlNumericAttributeClassObserver {
    fn add_value(&mut self, value: f64, class_index: usize, weight: f64) -> Result<(), IademError> {
        if value.is_nan() {
            return Ok(());
        }
        if class_index >= self.class_dist.len() {
            self.class_dist.resize(class_index + 1, 0.0);
        }
        self.class_dist[class_index] += weight;
        self.observe(value, class_index, weight);
        Ok(())
    }

    fn value_count(&self) -> f64 {
        self.class_dist.iter().sum()
    }

    fn class_dist(&self) -> Vec<f64> {
        self.class_dist.clone()
    }

    fn number_of_cut_points(&self) -> usize {
        self.bins.len().saturating_sub(1)
    }

    fn cut_value(&self, index: usize) -> Option<f64> {
        if index < self.number_of_cut_points() {
            Some(self.bins[index].upper_bound)
        } else {
            None
        }
    }

    fn left_class_dist(&self, cut: f64) -> Vec<f64> {
        let mut left = vec![0.0; self.class_dist.len()];
        for bin in self.bins.iter().take_while(|bin| bin.upper_bound <= cut) {
            for (class, &w) in bin.class_weights.iter().enumerate() {
                if let Some(slot) = left.get_mut(class) {
                    *slot += w;
                }
            }
        }
        left
    }

    fn conditional_probability(&self, value: f64) -> Vec<f64> {
        let num_classes = self.class_dist.len();
        if self.bins.is_empty() || num_classes == 0 {
            return vec![0.0; num_classes];
        }

        let bin_index = (0..self.number_of_cut_points())
            .filter(|&i| self.bins[i].upper_bound < value)
            .count();
        let bin = &self.bins[bin_index];

        if (0..num_classes).all(|class| bin.class_weight(class) <= 0.0) {
            return vec![1.0 / num_classes as f64; num_classes];
        }

        self.class_dist
            .iter()
            .enumerate()
            .map(|(class, &total)| {
                if total == 0.0 {
                    0.0
                } else {
                    bin.class_weight(class) / total
                }
            })
            .collect()
    }

    fn equals_passes_test(&self) -> bool {
        false
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

    fn observed(max_bins: usize, values: &[(f64, usize)]) -> VfmlNumericAttributeClassObserver {
        let mut obs = VfmlNumericAttributeClassObserver::new(max_bins);
        for &(value, class) in values {
            obs.add_value(value, class, 1.0).unwrap();
        }
        obs
    }

    #[test]
    fn test_each_distinct_value_opens_a_bin() {
        let obs = observed(10, &[(1.0, 0), (3.0, 0), (2.0, 1), (3.0, 1)]);
        assert_eq!(obs.number_of_bins(), 3);
        assert_eq!(obs.number_of_cut_points(), 2);
        assert!(approx_eq(obs.cut_value(0).unwrap(), 2.0, EPS));
        assert!(approx_eq(obs.cut_value(1).unwrap(), 3.0, EPS));
        assert!(obs.cut_value(2).is_none());
    }

    #[test]
    fn test_bin_count_is_bounded() {
        let values: Vec<(f64, usize)> = (0..50).map(|i| (i as f64, i % 2)).collect();
        let obs = observed(5, &values);
        assert_eq!(obs.number_of_bins(), 5);
        assert!(approx_eq(obs.value_count(), 50.0, EPS));
        let bin_total: f64 = obs.bins.iter().map(Bin::total).sum();
        assert!(approx_eq(bin_total, 50.0, EPS));
    }

    #[test]
    fn test_left_class_dist_keeps_cut_value_on_the_right() {
        let obs = observed(10, &[(1.0, 0), (2.0, 0), (3.0, 1), (4.0, 1)]);
        let cut = obs.cut_value(1).unwrap();
        assert!(approx_eq(cut, 3.0, EPS));

        let left = obs.left_class_dist(cut);
        assert!(approx_eq(left[0], 2.0, EPS));
        assert!(approx_eq(left[1], 0.0, EPS));
        assert!(!obs.equals_passes_test());
    }

    #[test]
    fn test_class_dist_bounds_match_cumulative_bins() {
        let obs = observed(10, &[(1.0, 0), (2.0, 0), (3.0, 1), (4.0, 1)]);
        let bounds = obs.class_dist_bounds(1.0, 2);
        assert_eq!(bounds.len(), 3);
        let [left, right] = &bounds[1];
        assert!(approx_eq(left.weight, 2.0, EPS));
        assert!(approx_eq(right.weight, 2.0, EPS));
        assert!(approx_eq(left.lower[0], 1.0, EPS));
        assert!(approx_eq(right.lower[1], 1.0, EPS));
    }

    #[test]
    fn test_conditional_probability_uses_bin_of_value() {
        let obs = observed(10, &[(1.0, 0), (2.0, 0), (3.0, 1), (4.0, 1)]);
        let probs = obs.conditional_probability(3.5);
        assert!(approx_eq(probs[0], 0.0, EPS));
        assert!(approx_eq(probs[1], 0.5, EPS));
    }

    #[test]
    fn test_missing_values_are_ignored() {
        let obs = observed(10, &[(f64::NAN, 0), (1.0, 1)]);
        assert!(approx_eq(obs.value_count(), 1.0, EPS));
        assert_eq!(obs.number_of_bins(), 1);
    }

    #[test]
    fn test_fractional_weights_never_go_negative() {
        let mut obs = VfmlNumericAttributeClassObserver::new(10);
        for (value, class) in [(1.0, 0), (10.0, 1), (1.0, 1), (1.5, 0)] {
            obs.add_value(value, class, 0.6).unwrap();
        }
        for bin in &obs.bins {
            assert!(bin.class_weights.iter().all(|&w| w >= 0.0));
        }
        let bin_total: f64 = obs.bins.iter().map(Bin::total).sum();
        assert!(approx_eq(bin_total, 2.4, EPS));

        for cut in obs.cut_points() {
            let left = obs.left_class_dist(cut);
            let dist = obs.class_dist();
            for (class, &w) in left.iter().enumerate() {
                assert!(w >= 0.0);
                assert!(w <= dist[class] + EPS);
            }
        }
    }

    #[test]
    fn test_forget_attribute_class_merges_emptied_bin() {
        let mut obs = observed(10, &[(1.0, 0), (2.0, 1), (3.0, 0)]);
        assert_eq!(obs.number_of_bins(), 3);

        obs.forget_attribute_class(2.0, 1, 1.0);
        assert_eq!(obs.number_of_bins(), 2);
        assert!(approx_eq(obs.value_count(), 2.0, EPS));
        assert!(approx_eq(obs.cut_value(0).unwrap(), 3.0, EPS));
    }
}
