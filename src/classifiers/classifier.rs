use crate::core::instances::Instance;

/// A learner that is trained and queried one instance at a time.
pub trait Classifier {
    /// One vote per class; larger means more likely.
    fn get_votes_for_instance(&self, instance: &dyn Instance) -> Vec<f64>;
    fn train_on_instance(&mut self, instance: &dyn Instance);
}
