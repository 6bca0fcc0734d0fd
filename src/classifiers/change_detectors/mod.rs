mod change_detector;
mod hddm_a;

pub use change_detector::ChangeDetector;
pub use hddm_a::HddmA;
