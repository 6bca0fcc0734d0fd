use crate::classifiers::iadem::error::IademError;
use crate::classifiers::iadem::iadem_tree::TreeContext;
use crate::classifiers::iadem::nodes::{LeafNode, SplitNode};
use crate::core::instances::Instance;

/// A position in the tree: a learning leaf or an internal split.
#[derive(Clone, Debug)]
pub enum Node {
    Leaf(Box<LeafNode>),
    Split(SplitNode),
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Node::Leaf(leaf) => Some(&**leaf),
            Node::Split(_) => None,
        }
    }

    pub fn as_split(&self) -> Option<&SplitNode> {
        match self {
            Node::Split(split) => Some(split),
            Node::Leaf(_) => None,
        }
    }

    pub fn get_observed_class_distribution(&self) -> &[f64] {
        match self {
            Node::Leaf(leaf) => leaf.get_observed_class_distribution(),
            Node::Split(split) => split.get_observed_class_distribution(),
        }
    }

    /// Sends the instance down to a leaf. When that leaf turns into a split,
    /// this position is overwritten in place and the number of new branches
    /// is returned.
    pub fn learn_from_instance(
        &mut self,
        instance: &dyn Instance,
        class_index: usize,
        weight: f64,
        siblings: SiblingLeaves<'_>,
        ctx: &TreeContext,
    ) -> Result<Option<usize>, IademError> {
        match self {
            Node::Leaf(leaf) => {
                let Some(split) =
                    leaf.learn_from_instance(instance, class_index, weight, siblings, ctx)?
                else {
                    return Ok(None);
                };
                let branches = split.num_children();
                *self = Node::Split(split);
                Ok(Some(branches))
            }
            Node::Split(split) => split.learn_from_instance(instance, class_index, weight, ctx),
        }
    }

    pub fn get_class_votes(
        &self,
        instance: &dyn Instance,
        siblings: SiblingLeaves<'_>,
        ctx: &TreeContext,
    ) -> Vec<f64> {
        match self {
            Node::Leaf(leaf) => leaf.get_class_votes(instance, siblings, ctx),
            Node::Split(split) => split.get_class_votes(instance, ctx),
        }
    }

    pub fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a LeafNode>) {
        match self {
            Node::Leaf(leaf) => leaves.push(&**leaf),
            Node::Split(split) => {
                for child in split.children() {
                    child.collect_leaves(leaves);
                }
            }
        }
    }

    /// Levels of splits above the deepest leaf.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Split(split) => {
                1 + split
                    .children()
                    .iter()
                    .map(Node::depth)
                    .max()
                    .unwrap_or(0)
            }
        }
    }
}

/// The leaves under every other child of a leaf's parent.
///
/// Used by a leaf that has seen nothing yet to borrow a prediction from its
/// neighbours.
#[derive(Clone, Copy, Debug)]
pub struct SiblingLeaves<'a> {
    groups: [&'a [Node]; 2],
}

impl<'a> SiblingLeaves<'a> {
    pub fn none() -> Self {
        Self { groups: [&[], &[]] }
    }

    pub fn new(before: &'a [Node], after: &'a [Node]) -> Self {
        Self {
            groups: [before, after],
        }
    }

    /// Siblings of `children[index]`.
    pub fn around(children: &'a [Node], index: usize) -> Self {
        let (before, rest) = children.split_at(index.min(children.len()));
        let after = rest.get(1..).unwrap_or(&[]);
        Self::new(before, after)
    }

    pub fn leaves(&self) -> Vec<&'a LeafNode> {
        let mut leaves = Vec::new();
        for node in self.groups.iter().flat_map(|group| group.iter()) {
            node.collect_leaves(&mut leaves);
        }
        leaves
    }

    /// Majority votes of the informed siblings, each weighted by its share of
    /// their combined weight; `None` when no sibling has seen anything.
    pub fn majority_blend(&self, num_classes: usize) -> Option<Vec<f64>> {
        let informed: Vec<&LeafNode> = self
            .leaves()
            .into_iter()
            .filter(|leaf| leaf.get_weight_seen() > 0.0)
            .collect();
        let total: f64 = informed.iter().map(|leaf| leaf.get_weight_seen()).sum();
        if total <= 0.0 {
            return None;
        }

        let mut votes = vec![0.0; num_classes];
        for leaf in informed {
            let share = leaf.get_weight_seen() / total;
            for (vote, own) in votes.iter_mut().zip(leaf.own_majority_votes()) {
                *vote += share * own;
            }
        }
        Some(votes)
    }
}
