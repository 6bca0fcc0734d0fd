use crate::classifiers::iadem::error::IademError;
use std::any::Any;

/// Impurity of a class-probability vector; lower is better.
pub trait SplitCriterion: Any + Send + Sync {
    fn measure(&self, distribution: &[f64]) -> Result<f64, IademError>;
    fn clone_box(&self) -> Box<dyn SplitCriterion>;
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn SplitCriterion> {
    fn clone(&self) -> Box<dyn SplitCriterion> {
        self.clone_box()
    }
}
