use crate::classifiers::change_detectors::ChangeDetector;
use std::any::Any;

/// Hoeffding-bound drift detection over moving averages (HDDM-A).
///
/// Compares the running mean against the smallest (and, when two-sided, the
/// largest) mean seen so far; a significant increase signals drift and the
/// statistics restart from that point.
#[derive(Clone, Debug)]
pub struct HddmA {
    drift_confidence: f64,
    warning_confidence: f64,
    two_sided: bool,

    n_min: u64,
    c_min: f64,
    total_n: u64,
    total_c: f64,
    n_max: u64,
    c_max: f64,
    n_estimation: u64,
    c_estimation: f64,

    estimation: f64,
    delay: u64,
    change_detected: bool,
    warning_zone: bool,
}

impl Default for HddmA {
    fn default() -> Self {
        Self::new(0.001, 0.005, true)
    }
}

impl HddmA {
    pub fn new(drift_confidence: f64, warning_confidence: f64, two_sided: bool) -> Self {
        Self {
            drift_confidence,
            warning_confidence,
            two_sided,
            n_min: 0,
            c_min: 0.0,
            total_n: 0,
            total_c: 0.0,
            n_max: 0,
            c_max: 0.0,
            n_estimation: 0,
            c_estimation: 0.0,
            estimation: 0.0,
            delay: 0,
            change_detected: false,
            warning_zone: false,
        }
    }

    pub fn drift_confidence(&self) -> f64 {
        self.drift_confidence
    }

    pub fn warning_confidence(&self) -> f64 {
        self.warning_confidence
    }

    pub fn two_sided(&self) -> bool {
        self.two_sided
    }

    /// Instances the current estimation is based on.
    pub fn delay(&self) -> u64 {
        self.delay
    }

    fn bound(&self, n: u64) -> f64 {
        ((1.0 / (2.0 * n as f64)) * (1.0 / self.drift_confidence).ln()).sqrt()
    }

    fn mean_increased(&self, confidence: f64) -> bool {
        if self.n_min == self.total_n {
            return false;
        }
        let total_n = self.total_n as f64;
        let n_min = self.n_min as f64;
        let m = (total_n - n_min) / n_min * (1.0 / total_n);
        let bound = (m / 2.0 * (2.0 / confidence).ln()).sqrt();
        self.total_c / total_n - self.c_min / n_min >= bound
    }

    fn mean_decreased(&self) -> bool {
        if self.n_max == self.total_n {
            return false;
        }
        let total_n = self.total_n as f64;
        let n_max = self.n_max as f64;
        let m = (total_n - n_max) / n_max * (1.0 / total_n);
        let bound = (m / 2.0 * (2.0 / self.drift_confidence).ln()).sqrt();
        self.c_max / n_max - self.total_c / total_n >= bound
    }

    fn restart_from(&mut self, n_mark: u64, c_mark: f64) {
        self.n_estimation = self.total_n - n_mark;
        self.c_estimation = self.total_c - c_mark;
        self.n_min = 0;
        self.n_max = 0;
        self.total_n = 0;
        self.c_min = 0.0;
        self.c_max = 0.0;
        self.total_c = 0.0;
    }

    fn update_estimations(&mut self) {
        if self.total_n >= self.n_estimation {
            self.c_estimation = 0.0;
            self.n_estimation = 0;
            self.estimation = if self.total_n > 0 {
                self.total_c / self.total_n as f64
            } else {
                0.0
            };
            self.delay = self.total_n;
        } else {
            self.estimation = self.c_estimation / self.n_estimation as f64;
            self.delay = self.n_estimation;
        }
    }
}

impl ChangeDetector for HddmA {
    fn input(&mut self, value: f64) -> bool {
        self.total_n += 1;
        self.total_c += value;
        if self.n_min == 0 {
            self.n_min = self.total_n;
            self.c_min = self.total_c;
        }
        if self.n_max == 0 {
            self.n_max = self.total_n;
            self.c_max = self.total_c;
        }

        let total_mean = self.total_c / self.total_n as f64;
        let total_bound = self.bound(self.total_n);

        if self.c_min / self.n_min as f64 + self.bound(self.n_min) >= total_mean + total_bound {
            self.c_min = self.total_c;
            self.n_min = self.total_n;
        }
        if self.c_max / self.n_max as f64 - self.bound(self.n_max) <= total_mean - total_bound {
            self.c_max = self.total_c;
            self.n_max = self.total_n;
        }

        if self.mean_increased(self.drift_confidence) {
            self.restart_from(self.n_min, self.c_min);
            self.change_detected = true;
            self.warning_zone = false;
        } else if self.mean_increased(self.warning_confidence) {
            self.change_detected = false;
            self.warning_zone = true;
        } else {
            self.change_detected = false;
            self.warning_zone = false;
        }

        if self.two_sided && self.mean_decreased() {
            self.restart_from(self.n_max, self.c_max);
        }

        self.update_estimations();
        self.change_detected
    }

    fn estimation(&self) -> f64 {
        self.estimation
    }

    fn change_detected(&self) -> bool {
        self.change_detected
    }

    fn warning_zone(&self) -> bool {
        self.warning_zone
    }

    fn reset(&mut self) {
        *self = Self::new(self.drift_confidence, self.warning_confidence, self.two_sided);
    }

    fn clone_box(&self) -> Box<dyn ChangeDetector> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
