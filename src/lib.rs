pub mod classifiers;
pub mod core;
pub mod utils;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use classifiers::Classifier;
pub use classifiers::iadem::{IademConfig, IademError, IademTree};
