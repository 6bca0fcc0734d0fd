use crate::classifiers::conditional_tests::InstanceConditionalTest;
use crate::classifiers::iadem::common_procedures::MeritBounds;

/// A candidate test, the class counts each of its branches would start
/// with, and the merit interval it was scored with.
#[derive(Clone, Debug)]
pub struct AttributeSplitSuggestion {
    pub split_test: Box<dyn InstanceConditionalTest>,
    pub resulting_class_distributions: Vec<Vec<f64>>,
    pub merit: MeritBounds,
}

impl AttributeSplitSuggestion {
    pub fn new(
        split_test: Box<dyn InstanceConditionalTest>,
        resulting_class_distributions: Vec<Vec<f64>>,
        merit: MeritBounds,
    ) -> Self {
        Self {
            split_test,
            resulting_class_distributions,
            merit,
        }
    }

    pub fn num_splits(&self) -> usize {
        self.resulting_class_distributions.len()
    }

    pub fn resulting_class_distribution_from_split(&self, split_index: usize) -> Option<&[f64]> {
        self.resulting_class_distributions
            .get(split_index)
            .map(Vec::as_slice)
    }
}
