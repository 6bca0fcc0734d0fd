use crate::utils::math::normal_probability;
use std::f64::consts::PI;

/// Estimated weight lying below, at and above a query value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeightSplit {
    pub less: f64,
    pub equal: f64,
    pub greater: f64,
}

impl WeightSplit {
    pub fn less_or_equal(&self) -> f64 {
        self.less + self.equal
    }
}

/// Incremental weighted normal estimator (Welford update).
#[derive(Clone, Debug, Default)]
pub struct GaussianEstimator {
    total_weight: f64,
    mean: f64,
    variance_sum: f64,
}

impl GaussianEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, value: f64, weight: f64) {
        if !value.is_finite() {
            return;
        }

        if self.total_weight > 0.0 {
            self.total_weight += weight;
            let previous_mean = self.mean;
            self.mean += weight * (value - previous_mean) / self.total_weight;
            self.variance_sum += weight * (value - previous_mean) * (value - self.mean);
        } else {
            self.mean = value;
            self.total_weight = weight;
        }
    }

    pub fn merge(&mut self, other: &GaussianEstimator) {
        if self.total_weight > 0.0 && other.total_weight > 0.0 {
            let combined = self.total_weight + other.total_weight;
            let previous_mean = self.mean;
            self.mean = self.mean * (self.total_weight / combined)
                + other.mean * (other.total_weight / combined);
            self.variance_sum += other.variance_sum
                + self.total_weight * other.total_weight / combined
                    * (other.mean - previous_mean).powi(2);
            self.total_weight = combined;
        } else if other.total_weight > 0.0 {
            *self = other.clone();
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        if self.total_weight > 1.0 {
            self.variance_sum / (self.total_weight - 1.0)
        } else {
            0.0
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn density(&self, value: f64) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        let std_dev = self.std_dev();
        if std_dev > 0.0 {
            let diff = value - self.mean;
            return (-(diff * diff) / (2.0 * std_dev * std_dev)).exp()
                / ((2.0 * PI).sqrt() * std_dev);
        }
        if value == self.mean { 1.0 } else { 0.0 }
    }

    pub fn weight_split_at(&self, value: f64) -> WeightSplit {
        let equal = self.density(value) * self.total_weight;
        let std_dev = self.std_dev();
        let less = if std_dev > 0.0 {
            normal_probability((value - self.mean) / std_dev) * self.total_weight - equal
        } else if value < self.mean {
            self.total_weight - equal
        } else {
            0.0
        };
        let greater = (self.total_weight - equal - less).max(0.0);
        WeightSplit {
            less,
            equal,
            greater,
        }
    }
}
