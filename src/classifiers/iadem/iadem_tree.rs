use crate::classifiers::Classifier;
use crate::classifiers::attribute_class_observers::NumericAttributeObserver;
use crate::classifiers::change_detectors::ChangeDetector;
use crate::classifiers::iadem::config::IademConfig;
use crate::classifiers::iadem::error::IademError;
use crate::classifiers::iadem::nodes::{LeafNode, LeafPrediction, Node, SiblingLeaves};
use crate::classifiers::iadem::split_criteria::{IademSplitCriterion, SplitCriterion};
use crate::classifiers::iadem::virtual_nodes::{NominalVirtualNode, NumericVirtualNode, VirtualNode};
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::Instance;
use log::error;
use std::sync::Arc;

/// Read-only state shared by every node while learning and predicting.
pub struct TreeContext {
    pub(crate) header: Arc<InstanceHeader>,
    pub(crate) config: IademConfig,
    pub(crate) num_classes: usize,
    pub(crate) criterion: Box<dyn SplitCriterion>,
    pub(crate) numeric_observer: Box<dyn NumericAttributeObserver>,
    pub(crate) change_detector: Box<dyn ChangeDetector>,
}

impl TreeContext {
    pub fn new(header: Arc<InstanceHeader>, config: IademConfig) -> Result<Self, IademError> {
        let criterion = Box::new(IademSplitCriterion::new(config.split_criterion));
        let numeric_observer = config.numeric_observer.build(config.max_bins);
        let change_detector = config.change_detector.build();
        Self::with_components(header, config, criterion, numeric_observer, change_detector)
    }

    pub fn with_components(
        header: Arc<InstanceHeader>,
        config: IademConfig,
        criterion: Box<dyn SplitCriterion>,
        numeric_observer: Box<dyn NumericAttributeObserver>,
        change_detector: Box<dyn ChangeDetector>,
    ) -> Result<Self, IademError> {
        config.validate()?;
        let num_classes = header.number_of_classes();
        if !header.is_nominal(header.class_index()) || num_classes == 0 {
            return Err(IademError::InvalidConfig(format!(
                "class attribute {} must be nominal with at least one label",
                header.class_index()
            )));
        }

        Ok(Self {
            header,
            config,
            num_classes,
            criterion,
            numeric_observer,
            change_detector,
        })
    }

    pub fn header(&self) -> &InstanceHeader {
        &self.header
    }

    pub fn config(&self) -> &IademConfig {
        &self.config
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// A leaf starting from `observed_class_distribution`, with fresh
    /// statistics for every non-class attribute.
    pub fn new_leaf_node(&self, mut observed_class_distribution: Vec<f64>) -> LeafNode {
        observed_class_distribution.resize(self.num_classes, 0.0);

        let class_index = self.header.class_index();
        let virtual_children = (0..self.header.number_of_attributes())
            .map(|i| {
                if i == class_index {
                    None
                } else if self.header.is_nominal(i) {
                    Some(VirtualNode::Nominal(NominalVirtualNode::new(
                        i,
                        self.header.number_of_values(i),
                        self.num_classes,
                        self.config.split_tests,
                    )))
                } else {
                    Some(VirtualNode::Numeric(NumericVirtualNode::new(
                        i,
                        self.num_classes,
                        self.numeric_observer.clone_box(),
                    )))
                }
            })
            .collect();

        let prediction =
            LeafPrediction::new(self.config.leaf_prediction, self.change_detector.as_ref());
        LeafNode::new(observed_class_distribution, virtual_children, prediction)
    }
}

/// Node and leaf counts gathered by walking the tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeMeasurements {
    pub split_nodes: usize,
    pub leaves: usize,
    pub virtual_nodes: usize,
    pub depth: usize,
}

impl TreeMeasurements {
    fn visit(&mut self, node: &Node) {
        match node {
            Node::Leaf(leaf) => {
                self.leaves += 1;
                self.virtual_nodes += leaf.num_virtual_children();
            }
            Node::Split(split) => {
                self.split_nodes += 1;
                for child in split.children() {
                    self.visit(child);
                }
            }
        }
    }
}

/// Incremental decision tree that only splits a leaf once confidence
/// intervals on the split merit tell the best attribute apart from the rest.
pub struct IademTree {
    context: TreeContext,
    root: Node,
    number_of_nodes: usize,
    number_of_leaves: usize,
    instances_processed: u64,
}

impl IademTree {
    pub fn new(header: Arc<InstanceHeader>, config: IademConfig) -> Result<Self, IademError> {
        Ok(Self::from_context(TreeContext::new(header, config)?))
    }

    /// Builds a tree around caller-supplied merit function, numeric observer
    /// and change detector prototypes.
    ///
    /// Leaves copy `numeric_observer` as is, so its own bin count applies
    /// and `config.max_bins` is not consulted.
    pub fn with_components(
        header: Arc<InstanceHeader>,
        config: IademConfig,
        criterion: Box<dyn SplitCriterion>,
        numeric_observer: Box<dyn NumericAttributeObserver>,
        change_detector: Box<dyn ChangeDetector>,
    ) -> Result<Self, IademError> {
        let context = TreeContext::with_components(
            header,
            config,
            criterion,
            numeric_observer,
            change_detector,
        )?;
        Ok(Self::from_context(context))
    }

    fn from_context(context: TreeContext) -> Self {
        let root = Node::Leaf(Box::new(context.new_leaf_node(Vec::new())));
        Self {
            context,
            root,
            number_of_nodes: 1,
            number_of_leaves: 1,
            instances_processed: 0,
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn context(&self) -> &TreeContext {
        &self.context
    }

    pub fn number_of_nodes(&self) -> usize {
        self.number_of_nodes
    }

    pub fn number_of_leaves(&self) -> usize {
        self.number_of_leaves
    }

    pub fn instances_processed(&self) -> u64 {
        self.instances_processed
    }

    fn class_of(&self, instance: &dyn Instance) -> Result<usize, IademError> {
        if instance.is_class_missing() {
            return Err(IademError::InvalidInstance(
                "class value is missing".to_string(),
            ));
        }
        let value = instance
            .class_value()
            .ok_or_else(|| IademError::InvalidInstance("class value is missing".to_string()))?;
        if value.is_nan()
            || value < 0.0
            || value.fract() != 0.0
            || value >= self.context.num_classes as f64
        {
            return Err(IademError::InvalidInstance(format!(
                "class value {value} outside 0..{}",
                self.context.num_classes
            )));
        }
        Ok(value as usize)
    }

    pub fn learn_from_instance(&mut self, instance: &dyn Instance) -> Result<(), IademError> {
        let class_index = self.class_of(instance)?;
        let weight = instance.weight();
        if !weight.is_finite() || weight < 0.0 {
            return Err(IademError::InvalidInstance(format!(
                "weight must be finite and non-negative, got {weight}"
            )));
        }

        self.instances_processed += 1;
        if weight == 0.0 {
            return Ok(());
        }

        let grown = self.root.learn_from_instance(
            instance,
            class_index,
            weight,
            SiblingLeaves::none(),
            &self.context,
        )?;
        if let Some(branches) = grown {
            let added = branches.saturating_sub(1);
            self.number_of_nodes += added;
            self.number_of_leaves += added;
        }
        Ok(())
    }

    pub fn get_class_votes(&self, instance: &dyn Instance) -> Vec<f64> {
        self.root
            .get_class_votes(instance, SiblingLeaves::none(), &self.context)
    }

    pub fn measurements(&self) -> TreeMeasurements {
        let mut measurements = TreeMeasurements {
            depth: self.root.depth(),
            ..TreeMeasurements::default()
        };
        measurements.visit(&self.root);
        measurements
    }

    pub fn model_measurements(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("tree size (nodes)", self.number_of_nodes as f64),
            ("tree size (leaves)", self.number_of_leaves as f64),
        ]
    }

    pub fn leaves(&self) -> Vec<&LeafNode> {
        let mut leaves = Vec::new();
        self.root.collect_leaves(&mut leaves);
        leaves
    }
}

impl Classifier for IademTree {
    fn get_votes_for_instance(&self, instance: &dyn Instance) -> Vec<f64> {
        self.get_class_votes(instance)
    }

    fn train_on_instance(&mut self, instance: &dyn Instance) {
        if let Err(e) = self.learn_from_instance(instance) {
            error!("IADEM tree dropped a training instance: {e}");
        }
    }
}
