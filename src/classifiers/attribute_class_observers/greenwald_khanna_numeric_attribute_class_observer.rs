use crate::classifiers::attribute_class_observers::NumericAttributeObserver;
use crate::classifiers::iadem::error::IademError;
use crate::core::estimators::GreenwaldKhannaQuantileSummary;
use std::any::Any;

/// One Greenwald-Khanna quantile summary per class. Cut points are the tuple
/// values of every class summary.
#[derive(Clone, Debug)]
pub struct GreenwaldKhannaNumericAttributeClassObserver {
    attribute_value_distribution_per_class: Vec<Option<GreenwaldKhannaQuantileSummary>>,
    num_tuples: usize,
}

impl Default for GreenwaldKhannaNumericAttributeClassObserver {
    fn default() -> Self {
        Self::new(10)
    }
}

impl GreenwaldKhannaNumericAttributeClassObserver {
    pub fn new(num_tuples: usize) -> Self {
        Self {
            attribute_value_distribution_per_class: Vec::new(),
            num_tuples,
        }
    }

    fn summaries(&self) -> impl Iterator<Item = &GreenwaldKhannaQuantileSummary> {
        self.attribute_value_distribution_per_class.iter().flatten()
    }
}

impl NumericAttributeObserver for GreenwaldKhannaNumericAttributeClassObserver {
    fn add_value(&mut self, value: f64, class_index: usize, weight: f64) -> Result<(), IademError> {
        if value.is_nan() || !weight.is_finite() || weight <= 0.0 {
            return Ok(());
        }
        if class_index >= self.attribute_value_distribution_per_class.len() {
            self.attribute_value_distribution_per_class
                .resize_with(class_index + 1, || None);
        }
        let num_tuples = self.num_tuples;
        self.attribute_value_distribution_per_class[class_index]
            .get_or_insert_with(|| GreenwaldKhannaQuantileSummary::new(num_tuples))
            .insert(value, weight);
        Ok(())
    }

    fn value_count(&self) -> f64 {
        self.summaries().map(GreenwaldKhannaQuantileSummary::total_weight).sum()
    }

    fn class_dist(&self) -> Vec<f64> {
        self.attribute_value_distribution_per_class
            .iter()
            .map(|summary| summary.as_ref().map_or(0.0, |s| s.total_weight()))
            .collect()
    }

    fn number_of_cut_points(&self) -> usize {
        self.cut_points().len()
    }

    fn cut_value(&self, index: usize) -> Option<f64> {
        self.cut_points().get(index).copied()
    }

    /// Distinct tuple values of all classes in increasing order, without the
    /// largest one since it would leave the right branch empty.
    fn cut_points(&self) -> Vec<f64> {
        let mut cuts: Vec<f64> = self
            .summaries()
            .flat_map(GreenwaldKhannaQuantileSummary::suggested_cut_points)
            .collect();
        cuts.sort_by(f64::total_cmp);
        cuts.dedup();
        cuts.pop();
        cuts
    }

    fn left_class_dist(&self, cut: f64) -> Vec<f64> {
        self.attribute_value_distribution_per_class
            .iter()
            .map(|summary| summary.as_ref().map_or(0.0, |s| s.weight_below(cut)))
            .collect()
    }

    /// Share of each class's weight in the tuple interval holding `value`.
    fn conditional_probability(&self, value: f64) -> Vec<f64> {
        self.attribute_value_distribution_per_class
            .iter()
            .map(|summary| match summary {
                Some(s) if s.total_weight() > 0.0 => {
                    let index = s.index_of_tuple_greater_than(value);
                    s.max_weight_at(index) / s.total_weight()
                }
                _ => 0.0,
            })
            .collect()
    }

    fn equals_passes_test(&self) -> bool {
        true
    }

    fn max_bins(&self) -> usize {
        self.num_tuples
    }

    fn set_max_bins(&mut self, max_bins: usize) {
        self.num_tuples = max_bins;
        for summary in self.attribute_value_distribution_per_class.iter_mut().flatten() {
            summary.set_max_tuples(max_bins);
        }
    }

    fn clone_box(&self) -> Box<dyn NumericAttributeObserver> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
