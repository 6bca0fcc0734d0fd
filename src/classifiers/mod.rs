pub mod attribute_class_observers;
pub mod change_detectors;
pub mod classifier;
pub mod conditional_tests;
pub mod iadem;

pub use classifier::Classifier;
