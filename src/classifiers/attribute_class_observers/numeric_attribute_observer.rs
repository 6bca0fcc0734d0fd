use crate::classifiers::iadem::common_procedures::BranchBounds;
use crate::classifiers::iadem::error::IademError;
use std::any::Any;
use std::fmt::Debug;

/// Bounded-memory summary of one numeric attribute, split by class.
///
/// Cut point `i` sends values at or below it (or strictly below it, see
/// [`equals_passes_test`](Self::equals_passes_test)) to the left branch.
pub trait NumericAttributeObserver: Any + Debug + Send + Sync {
    fn add_value(&mut self, value: f64, class_index: usize, weight: f64) -> Result<(), IademError>;

    /// Weight of every non-missing value observed.
    fn value_count(&self) -> f64;

    /// Observed weight per class, indexed up to the largest class seen.
    fn class_dist(&self) -> Vec<f64>;

    fn number_of_cut_points(&self) -> usize;

    fn cut_value(&self, index: usize) -> Option<f64>;

    /// Class weights routed to the left branch by `cut`.
    fn left_class_dist(&self, cut: f64) -> Vec<f64>;

    /// Per-class likelihood of `value`; classes never seen are absent.
    fn conditional_probability(&self, value: f64) -> Vec<f64>;

    fn equals_passes_test(&self) -> bool;

    fn max_bins(&self) -> usize;

    fn set_max_bins(&mut self, max_bins: usize);

    fn clone_box(&self) -> Box<dyn NumericAttributeObserver>;

    fn as_any(&self) -> &dyn Any;

    fn cut_points(&self) -> Vec<f64> {
        (0..self.number_of_cut_points())
            .filter_map(|i| self.cut_value(i))
            .collect()
    }

    /// Left/right probability intervals for every cut point, in cut order.
    fn class_dist_bounds(&self, confidence: f64, num_classes: usize) -> Vec<[BranchBounds; 2]> {
        let total_dist = self.class_dist();
        let total: f64 = total_dist.iter().sum();

        self.cut_points()
            .into_iter()
            .map(|cut| {
                let left = self.left_class_dist(cut);
                let right: Vec<f64> = total_dist
                    .iter()
                    .enumerate()
                    .map(|(j, &t)| t - left.get(j).copied().unwrap_or(0.0))
                    .collect();
                let left_total: f64 = left.iter().sum();
                [
                    BranchBounds::from_counts(&left, left_total, confidence, num_classes),
                    BranchBounds::from_counts(&right, total - left_total, confidence, num_classes),
                ]
            })
            .collect()
    }
}

impl Clone for Box<dyn NumericAttributeObserver> {
    fn clone(&self) -> Box<dyn NumericAttributeObserver> {
        self.clone_box()
    }
}
