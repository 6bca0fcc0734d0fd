use crate::classifiers::conditional_tests::InstanceConditionalTest;
use crate::classifiers::iadem::error::IademError;
use crate::classifiers::iadem::iadem_tree::TreeContext;
use crate::classifiers::iadem::nodes::{Node, SiblingLeaves};
use crate::core::instances::Instance;
use crate::utils::math::normalize_or_uniform;

/// Internal node routing instances to one of its children through a test.
#[derive(Clone, Debug)]
pub struct SplitNode {
    observed_class_distribution: Vec<f64>,
    split_test: Box<dyn InstanceConditionalTest>,
    children: Vec<Node>,
}

impl SplitNode {
    pub fn new(
        split_test: Box<dyn InstanceConditionalTest>,
        observed_class_distribution: Vec<f64>,
        children: Vec<Node>,
    ) -> Self {
        Self {
            observed_class_distribution,
            split_test,
            children,
        }
    }

    pub fn split_test(&self) -> &dyn InstanceConditionalTest {
        self.split_test.as_ref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn get_child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn get_observed_class_distribution(&self) -> &[f64] {
        &self.observed_class_distribution
    }

    fn instance_child_index(&self, instance: &dyn Instance) -> Option<usize> {
        self.split_test
            .branch_for_instance(instance)
            .filter(|&index| index < self.children.len())
    }

    /// Instances the test cannot route are dropped.
    pub fn learn_from_instance(
        &mut self,
        instance: &dyn Instance,
        class_index: usize,
        weight: f64,
        ctx: &TreeContext,
    ) -> Result<Option<usize>, IademError> {
        let Some(index) = self.instance_child_index(instance) else {
            return Ok(None);
        };
        let (before, rest) = self.children.split_at_mut(index);
        let Some((child, after)) = rest.split_first_mut() else {
            return Ok(None);
        };
        child.learn_from_instance(
            instance,
            class_index,
            weight,
            SiblingLeaves::new(&*before, &*after),
            ctx,
        )
    }

    /// Falls back to the distribution retained at split time when the
    /// instance cannot be routed.
    pub fn get_class_votes(&self, instance: &dyn Instance, ctx: &TreeContext) -> Vec<f64> {
        match self.instance_child_index(instance) {
            Some(index) => self.children[index].get_class_votes(
                instance,
                SiblingLeaves::around(&self.children, index),
                ctx,
            ),
            None => {
                let mut votes = self.observed_class_distribution.clone();
                normalize_or_uniform(&mut votes);
                votes
            }
        }
    }
}
