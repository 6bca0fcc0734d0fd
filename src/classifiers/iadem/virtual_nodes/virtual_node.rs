use crate::classifiers::conditional_tests::AttributeSplitSuggestion;
use crate::classifiers::iadem::error::IademError;
use crate::classifiers::iadem::nodes::{Node, SplitNode};
use crate::classifiers::iadem::split_criteria::SplitCriterion;
use crate::classifiers::iadem::virtual_nodes::{NominalVirtualNode, NumericVirtualNode};
use crate::core::instances::Instance;

/// Leaf-local statistics of one attribute, able to propose the best test on it.
#[derive(Clone, Debug)]
pub enum VirtualNode {
    Nominal(NominalVirtualNode),
    Numeric(NumericVirtualNode),
}

impl VirtualNode {
    pub fn attribute_index(&self) -> usize {
        match self {
            VirtualNode::Nominal(node) => node.attribute_index(),
            VirtualNode::Numeric(node) => node.attribute_index(),
        }
    }

    pub fn learn_from_instance(
        &mut self,
        instance: &dyn Instance,
        class_index: usize,
        weight: f64,
    ) -> Result<(), IademError> {
        match self {
            VirtualNode::Nominal(node) => {
                node.learn_from_instance(instance, class_index, weight);
                Ok(())
            }
            VirtualNode::Numeric(node) => node.learn_from_instance(instance, class_index, weight),
        }
    }

    pub fn update_heuristic_measure(
        &mut self,
        criterion: &dyn SplitCriterion,
        confidence: f64,
    ) -> Result<(), IademError> {
        match self {
            VirtualNode::Nominal(node) => node.update_heuristic_measure(criterion, confidence),
            VirtualNode::Numeric(node) => node.update_heuristic_measure(criterion, confidence),
        }
    }

    pub fn get_best_split_suggestion(&self) -> Option<&AttributeSplitSuggestion> {
        match self {
            VirtualNode::Nominal(node) => node.get_best_split_suggestion(),
            VirtualNode::Numeric(node) => node.get_best_split_suggestion(),
        }
    }

    pub fn has_information(&self) -> bool {
        match self {
            VirtualNode::Nominal(node) => node.has_information(),
            VirtualNode::Numeric(node) => node.has_information(),
        }
    }

    pub fn conditional_probability(&self, value: f64) -> Vec<f64> {
        match self {
            VirtualNode::Nominal(node) => node.conditional_probability(value),
            VirtualNode::Numeric(node) => node.conditional_probability(value),
        }
    }

    /// How lopsided the suggested split is; compared against the tree's
    /// percent-in-common threshold.
    ///
    /// Nominal attributes report the share of the most frequent value, numeric
    /// ones the share of the larger side of the cut.
    pub fn imbalance(&self) -> f64 {
        match self {
            VirtualNode::Nominal(node) => node.percent(),
            VirtualNode::Numeric(node) => 1.0 - node.percent(),
        }
    }

    pub fn new_split_node(
        &self,
        observed_class_distribution: Vec<f64>,
        new_leaf: impl FnMut(Vec<f64>) -> Node,
    ) -> Result<SplitNode, IademError> {
        match self {
            VirtualNode::Nominal(node) => node.new_split_node(observed_class_distribution, new_leaf),
            VirtualNode::Numeric(node) => node.new_split_node(observed_class_distribution, new_leaf),
        }
    }
}
