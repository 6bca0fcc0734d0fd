use crate::classifiers::attribute_class_observers::NumericAttributeObserver;
use crate::classifiers::conditional_tests::{
    AttributeSplitSuggestion, NumericAttributeBinaryTest, observed_value,
};
use crate::classifiers::iadem::common_procedures::{MeritBounds, merit_bounds};
use crate::classifiers::iadem::error::IademError;
use crate::classifiers::iadem::nodes::{Node, SplitNode};
use crate::classifiers::iadem::split_criteria::SplitCriterion;
use crate::core::instances::Instance;

/// Numeric attribute statistics at a leaf, kept by a bounded-memory observer.
#[derive(Clone, Debug)]
pub struct NumericVirtualNode {
    attribute_index: usize,
    num_classes: usize,
    observer: Box<dyn NumericAttributeObserver>,
    observed_class_distribution: Vec<f64>,
    best_cut_point: f64,
    best_split_suggestion: Option<AttributeSplitSuggestion>,
    heuristic_measure_updated: bool,
}

impl NumericVirtualNode {
    pub fn new(
        attribute_index: usize,
        num_classes: usize,
        observer: Box<dyn NumericAttributeObserver>,
    ) -> Self {
        Self {
            attribute_index,
            num_classes,
            observer,
            observed_class_distribution: vec![0.0; num_classes],
            best_cut_point: 0.0,
            best_split_suggestion: None,
            heuristic_measure_updated: false,
        }
    }

    pub fn attribute_index(&self) -> usize {
        self.attribute_index
    }

    pub fn observer(&self) -> &dyn NumericAttributeObserver {
        self.observer.as_ref()
    }

    pub fn best_cut_point(&self) -> f64 {
        self.best_cut_point
    }

    pub fn get_best_split_suggestion(&self) -> Option<&AttributeSplitSuggestion> {
        self.best_split_suggestion.as_ref()
    }

    /// Missing values reach the class counts but not the observer.
    pub fn learn_from_instance(
        &mut self,
        instance: &dyn Instance,
        class_index: usize,
        weight: f64,
    ) -> Result<(), IademError> {
        if let Some(value) = observed_value(instance, self.attribute_index) {
            self.observer.add_value(value, class_index, weight)?;
        }
        self.observed_class_distribution[class_index] += weight;
        self.heuristic_measure_updated = false;
        Ok(())
    }

    pub fn update_heuristic_measure(
        &mut self,
        criterion: &dyn SplitCriterion,
        confidence: f64,
    ) -> Result<(), IademError> {
        if self.heuristic_measure_updated {
            return Ok(());
        }
        let cuts = self.observer.cut_points();
        if cuts.len() < 2 {
            self.best_split_suggestion = None;
            self.heuristic_measure_updated = true;
            return Ok(());
        }

        let bounds = self.observer.class_dist_bounds(confidence, self.num_classes);
        let mut best: Option<(f64, MeritBounds)> = None;
        for (&cut, branches) in cuts.iter().zip(&bounds) {
            let Some(merit) = merit_bounds(branches, criterion)? else {
                continue;
            };
            if best.is_none_or(|(_, b)| merit.better_than(&b)) {
                best = Some((cut, merit));
            }
        }

        self.best_split_suggestion = match best {
            Some((cut, merit)) => {
                self.best_cut_point = cut;
                let test = NumericAttributeBinaryTest::new(
                    self.attribute_index,
                    cut,
                    self.observer.equals_passes_test(),
                );
                Some(AttributeSplitSuggestion::new(
                    Box::new(test),
                    self.class_distributions_around(cut),
                    merit,
                ))
            }
            None => None,
        };
        self.heuristic_measure_updated = true;
        Ok(())
    }

    pub fn has_information(&self) -> bool {
        self.observer.number_of_cut_points() > 1
    }

    pub fn conditional_probability(&self, value: f64) -> Vec<f64> {
        let mut probabilities = self.observer.conditional_probability(value);
        probabilities.resize(self.num_classes, 0.0);
        probabilities
    }

    fn left_distribution(&self) -> Vec<f64> {
        let mut left = self.observer.left_class_dist(self.best_cut_point);
        left.resize(self.num_classes, 0.0);
        left
    }

    /// Left and right class counts of a split at `cut`.
    fn class_distributions_around(&self, cut: f64) -> Vec<Vec<f64>> {
        let mut left = self.observer.left_class_dist(cut);
        left.resize(self.num_classes, 0.0);
        let mut total = self.observer.class_dist();
        total.resize(self.num_classes, 0.0);
        let right: Vec<f64> = total
            .iter()
            .zip(&left)
            .map(|(&t, &l)| (t - l).max(0.0))
            .collect();
        vec![left, right]
    }

    /// Share of the observed weight on the smaller side of the best cut.
    pub fn percent(&self) -> f64 {
        let left: f64 = self.left_distribution().iter().sum();
        let left_percent = left / self.observer.value_count();
        left_percent.min(1.0 - left_percent)
    }

    pub fn new_split_node(
        &self,
        observed_class_distribution: Vec<f64>,
        mut new_leaf: impl FnMut(Vec<f64>) -> Node,
    ) -> Result<SplitNode, IademError> {
        let suggestion = self.best_split_suggestion.as_ref().ok_or_else(|| {
            IademError::internal(
                "NumericVirtualNode",
                "new_split_node",
                "no split suggestion available",
            )
        })?;

        let children: Vec<Node> = suggestion
            .resulting_class_distributions
            .iter()
            .map(|dist| new_leaf(dist.clone()))
            .collect();
        Ok(SplitNode::new(
            suggestion.split_test.clone(),
            observed_class_distribution,
            children,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::attribute_class_observers::{
        EbstMode, EbstNumericAttributeClassObserver, GaussianNumericAttributeClassObserver,
    };
    use crate::classifiers::iadem::split_criteria::{IademSplitCriterion, SplitMeasure};
    use crate::testing::MockInstance;

    const EPS: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn entropy() -> IademSplitCriterion {
        IademSplitCriterion::new(SplitMeasure::Entropy)
    }

    fn ebst_node(rows: &[(f64, usize)]) -> NumericVirtualNode {
        let observer = EbstNumericAttributeClassObserver::new(EbstMode::Classification, 10);
        let mut node = NumericVirtualNode::new(0, 2, Box::new(observer));
        for &(value, class) in rows {
            node.learn_from_instance(
                &MockInstance::new(vec![value, class as f64], 1, 1.0),
                class,
                1.0,
            )
            .unwrap();
        }
        node
    }

    fn leaf_stub(dist: Vec<f64>) -> Node {
        Node::Split(SplitNode::new(
            Box::new(NumericAttributeBinaryTest::new(0, 0.0, true)),
            dist,
            Vec::new(),
        ))
    }

    #[test]
    fn test_missing_value_only_updates_class_counts() {
        let node = ebst_node(&[(1.0, 0), (f64::NAN, 1)]);
        assert!(approx_eq(node.observer().value_count(), 1.0, EPS));
        assert!(approx_eq(node.observed_class_distribution[1], 1.0, EPS));
    }

    #[test]
    fn test_needs_two_cut_points() {
        let mut node = ebst_node(&[(1.0, 0), (2.0, 1)]);
        node.update_heuristic_measure(&entropy(), 0.5).unwrap();
        assert!(node.get_best_split_suggestion().is_none());
        assert!(!node.has_information());
    }

    #[test]
    fn test_picks_the_separating_cut() {
        let mut node = ebst_node(&[(1.0, 0), (2.0, 0), (3.0, 1), (4.0, 1)]);
        node.update_heuristic_measure(&entropy(), 1.0).unwrap();

        let suggestion = node.get_best_split_suggestion().unwrap();
        assert!(approx_eq(node.best_cut_point(), 2.0, EPS));
        assert!(approx_eq(suggestion.merit.upper, 0.0, EPS));
        let test = suggestion
            .split_test
            .as_any()
            .downcast_ref::<NumericAttributeBinaryTest>()
            .unwrap();
        assert_eq!(test, &NumericAttributeBinaryTest::new(0, 2.0, true));
        assert!(approx_eq(node.percent(), 0.5, EPS));
    }

    #[test]
    fn test_new_split_node_divides_class_counts() {
        let mut node = ebst_node(&[(1.0, 0), (2.0, 0), (3.0, 1), (4.0, 1), (5.0, 0)]);
        node.update_heuristic_measure(&entropy(), 1.0).unwrap();
        assert!(approx_eq(node.best_cut_point(), 2.0, EPS));
        let suggestion = node.get_best_split_suggestion().unwrap();
        assert_eq!(
            suggestion.resulting_class_distributions,
            vec![vec![2.0, 0.0], vec![1.0, 2.0]]
        );

        let mut dists = Vec::new();
        let split = node
            .new_split_node(vec![3.0, 2.0], |dist| {
                dists.push(dist.clone());
                leaf_stub(dist)
            })
            .unwrap();
        assert_eq!(split.num_children(), 2);
        assert_eq!(dists, vec![vec![2.0, 0.0], vec![1.0, 2.0]]);
    }

    #[test]
    fn test_conditional_probability_is_padded_to_all_classes() {
        let observer = GaussianNumericAttributeClassObserver::new(10);
        let mut node = NumericVirtualNode::new(0, 3, Box::new(observer));
        node.learn_from_instance(&MockInstance::new(vec![1.0, 0.0], 1, 1.0), 0, 1.0)
            .unwrap();
        assert_eq!(node.conditional_probability(1.0).len(), 3);
    }

    #[test]
    fn test_regression_observer_is_rejected() {
        let observer = EbstNumericAttributeClassObserver::new(EbstMode::Regression, 10);
        let mut node = NumericVirtualNode::new(0, 2, Box::new(observer));
        let result = node.learn_from_instance(&MockInstance::new(vec![1.0, 0.0], 1, 1.0), 0, 1.0);
        assert!(matches!(result, Err(IademError::UnsupportedOperation(_))));
    }
}
