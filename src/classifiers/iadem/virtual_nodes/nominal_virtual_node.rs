use crate::classifiers::conditional_tests::{
    AttributeSplitSuggestion, NominalAttributeBinaryTest, NominalAttributeMultiwayTest,
    observed_value,
};
use crate::classifiers::iadem::common_procedures::{BranchBounds, merit_bounds};
use crate::classifiers::iadem::config::SplitTests;
use crate::classifiers::iadem::error::IademError;
use crate::classifiers::iadem::nodes::{Node, SplitNode};
use crate::classifiers::iadem::split_criteria::SplitCriterion;
use crate::core::instances::Instance;

/// Per-value class counts of one nominal attribute at a leaf.
#[derive(Clone, Debug)]
pub struct NominalVirtualNode {
    attribute_index: usize,
    num_classes: usize,
    split_tests: SplitTests,
    observed_class_distribution: Vec<f64>,
    value_distribution: Vec<f64>,
    class_counts_per_value: Vec<Option<Vec<f64>>>,
    best_split_suggestion: Option<AttributeSplitSuggestion>,
    heuristic_measure_updated: bool,
}

impl NominalVirtualNode {
    pub fn new(
        attribute_index: usize,
        num_values: usize,
        num_classes: usize,
        split_tests: SplitTests,
    ) -> Self {
        Self {
            attribute_index,
            num_classes,
            split_tests,
            observed_class_distribution: vec![0.0; num_classes],
            value_distribution: vec![0.0; num_values],
            class_counts_per_value: vec![None; num_values],
            best_split_suggestion: None,
            heuristic_measure_updated: false,
        }
    }

    pub fn attribute_index(&self) -> usize {
        self.attribute_index
    }

    pub fn num_values(&self) -> usize {
        self.value_distribution.len()
    }

    pub fn get_value_distribution(&self) -> &[f64] {
        &self.value_distribution
    }

    pub fn get_class_counts(&self, value: usize) -> Option<&[f64]> {
        self.class_counts_per_value.get(value)?.as_deref()
    }

    pub fn get_best_split_suggestion(&self) -> Option<&AttributeSplitSuggestion> {
        self.best_split_suggestion.as_ref()
    }

    pub fn learn_from_instance(&mut self, instance: &dyn Instance, class_index: usize, weight: f64) {
        let Some(value) = observed_value(instance, self.attribute_index) else {
            return;
        };
        if value < 0.0 || value as usize >= self.value_distribution.len() {
            return;
        }
        let value = value as usize;

        self.value_distribution[value] += weight;
        self.observed_class_distribution[class_index] += weight;
        let num_classes = self.num_classes;
        let counts = self.class_counts_per_value[value].get_or_insert_with(|| vec![0.0; num_classes]);
        counts[class_index] += weight;
        self.heuristic_measure_updated = false;
    }

    fn observed_value_count(&self) -> usize {
        self.class_counts_per_value.iter().flatten().count()
    }

    fn counts_or_empty(&self, value: usize) -> &[f64] {
        self.get_class_counts(value).unwrap_or(&[])
    }

    fn multiway_branches(&self, confidence: f64) -> Vec<BranchBounds> {
        (0..self.num_values())
            .map(|value| {
                BranchBounds::from_counts(
                    self.counts_or_empty(value),
                    self.value_distribution[value],
                    confidence,
                    self.num_classes,
                )
            })
            .collect()
    }

    fn padded(&self, counts: &[f64]) -> Vec<f64> {
        let mut dist = vec![0.0; self.num_classes];
        for (d, &c) in dist.iter_mut().zip(counts) {
            *d = c;
        }
        dist
    }

    fn multiway_class_distributions(&self) -> Vec<Vec<f64>> {
        (0..self.num_values())
            .map(|value| self.padded(self.counts_or_empty(value)))
            .collect()
    }

    /// Counts of `value` against the counts of every other value.
    fn binary_class_distributions(&self, value: usize) -> [Vec<f64>; 2] {
        let matching = self.padded(self.counts_or_empty(value));
        let rest: Vec<f64> = self
            .observed_class_distribution
            .iter()
            .zip(&matching)
            .map(|(&total, &m)| (total - m).max(0.0))
            .collect();
        [matching, rest]
    }

    fn binary_branches(&self, value: usize, confidence: f64) -> [BranchBounds; 2] {
        let [matching, rest] = self.binary_class_distributions(value);
        let matching_weight = self.value_distribution[value];
        let total: f64 = self.observed_class_distribution.iter().sum();
        [
            BranchBounds::from_counts(&matching, matching_weight, confidence, self.num_classes),
            BranchBounds::from_counts(&rest, total - matching_weight, confidence, self.num_classes),
        ]
    }

    /// Recomputes the best test if new data arrived since the last call.
    pub fn update_heuristic_measure(
        &mut self,
        criterion: &dyn SplitCriterion,
        confidence: f64,
    ) -> Result<(), IademError> {
        if self.heuristic_measure_updated {
            return Ok(());
        }
        if self.observed_value_count() < 2 {
            self.best_split_suggestion = None;
            self.heuristic_measure_updated = true;
            return Ok(());
        }

        let mut best: Option<AttributeSplitSuggestion> = None;
        if self.split_tests.allows_multiway() {
            let branches = self.multiway_branches(confidence);
            if let Some(merit) = merit_bounds(&branches, criterion)? {
                best = Some(AttributeSplitSuggestion::new(
                    Box::new(NominalAttributeMultiwayTest::new(
                        self.attribute_index,
                        self.num_values(),
                    )),
                    self.multiway_class_distributions(),
                    merit,
                ));
            }
        }

        if self.split_tests.allows_binary() {
            for value in 0..self.num_values() {
                if self.class_counts_per_value[value].is_none() {
                    continue;
                }
                let branches = self.binary_branches(value, confidence);
                let Some(merit) = merit_bounds(&branches, criterion)? else {
                    continue;
                };
                if best.as_ref().is_none_or(|b| merit.better_than(&b.merit)) {
                    best = Some(AttributeSplitSuggestion::new(
                        Box::new(NominalAttributeBinaryTest::new(self.attribute_index, value)),
                        Vec::from(self.binary_class_distributions(value)),
                        merit,
                    ));
                }
            }
        }

        self.best_split_suggestion = best;
        self.heuristic_measure_updated = true;
        Ok(())
    }

    /// `P(value | class)` for every class, from the per-value counts.
    pub fn conditional_probability(&self, value: f64) -> Vec<f64> {
        let mut class_totals = vec![0.0; self.num_classes];
        for counts in self.class_counts_per_value.iter().flatten() {
            for (total, &count) in class_totals.iter_mut().zip(counts) {
                *total += count;
            }
        }

        let counts = if value >= 0.0 {
            self.get_class_counts(value as usize)
        } else {
            None
        };
        class_totals
            .iter()
            .enumerate()
            .map(|(class, &total)| match counts {
                Some(counts) if total != 0.0 => counts[class] / total,
                _ => 0.0,
            })
            .collect()
    }

    pub fn has_information(&self) -> bool {
        self.value_distribution.iter().any(|&w| w > 0.0)
    }

    /// Share of the weight carried by the most frequent value.
    pub fn percent(&self) -> f64 {
        let total: f64 = self.value_distribution.iter().sum();
        let max = self.value_distribution.iter().copied().fold(0.0, f64::max);
        max / total
    }

    /// Builds the split for the cached suggestion, handing each branch's
    /// resulting class counts to `new_leaf`.
    pub fn new_split_node(
        &self,
        observed_class_distribution: Vec<f64>,
        mut new_leaf: impl FnMut(Vec<f64>) -> Node,
    ) -> Result<SplitNode, IademError> {
        let suggestion = self.best_split_suggestion.as_ref().ok_or_else(|| {
            IademError::internal(
                "NominalVirtualNode",
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
