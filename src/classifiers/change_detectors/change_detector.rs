use std::any::Any;
use std::fmt::Debug;

/// Monitors a stream of real values (typically 0/1 prediction errors).
pub trait ChangeDetector: Any + Debug + Send + Sync {
    /// Feeds one value; returns whether a change was detected by it.
    fn input(&mut self, value: f64) -> bool;
    /// Current estimate of the monitored mean.
    fn estimation(&self) -> f64;
    fn change_detected(&self) -> bool;
    fn warning_zone(&self) -> bool;
    fn reset(&mut self);
    fn clone_box(&self) -> Box<dyn ChangeDetector>;
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn ChangeDetector> {
    fn clone(&self) -> Box<dyn ChangeDetector> {
        self.clone_box()
    }
}
