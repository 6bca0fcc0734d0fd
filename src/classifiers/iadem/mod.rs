pub mod common_procedures;
pub mod config;
pub mod error;
pub mod iadem_tree;
pub mod nodes;
pub mod split_criteria;
pub mod virtual_nodes;

pub use config::IademConfig;
pub use error::IademError;
pub use iadem_tree::{IademTree, TreeContext, TreeMeasurements};
