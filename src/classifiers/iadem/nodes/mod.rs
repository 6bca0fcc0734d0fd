mod leaf_node;
mod leaf_prediction;
mod node;
mod split_node;

pub use leaf_node::LeafNode;
pub use leaf_prediction::LeafPrediction;
pub use node::{Node, SiblingLeaves};
pub use split_node::SplitNode;
