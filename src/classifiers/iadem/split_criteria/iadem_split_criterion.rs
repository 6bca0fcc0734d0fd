use crate::classifiers::iadem::error::IademError;
use crate::classifiers::iadem::split_criteria::SplitCriterion;
use serde::{Deserialize, Serialize};
use std::any::Any;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SplitMeasure {
    #[default]
    Entropy,
    EntropyLogVar,
    EntropyWeight,
    EntropyLogVarWeight,
    Beta1,
    Gamma1,
    Beta2,
    Gamma2,
    Beta4,
    Gamma4,
}

#[derive(Clone, Debug, Default)]
pub struct IademSplitCriterion {
    kind: SplitMeasure,
}

impl IademSplitCriterion {
    pub fn new(kind: SplitMeasure) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> SplitMeasure {
        self.kind
    }

    /// Entropy with logarithm base `distribution.len()`, so a uniform vector measures 1.
    fn entropy(distribution: &[f64], zero_is_pure: bool) -> Result<f64, IademError> {
        let len = distribution.len();
        if len <= 1 {
            return Ok(0.0);
        }

        let mut n = 0.0;
        for &value in distribution {
            if value < 0.0 {
                return Err(IademError::internal(
                    "IademSplitCriterion",
                    "measure",
                    "all values must be positive",
                ));
            }
            n += value;
        }

        if n == 0.0 {
            if zero_is_pure {
                return Ok(0.0);
            }
            return Err(IademError::internal(
                "IademSplitCriterion",
                "measure",
                "vector must be different from 0.0",
            ));
        }

        let base_ln = (len as f64).ln();
        let sum: f64 = distribution
            .iter()
            .filter(|&&a| a > 0.0)
            .map(|&a| a * a.ln() / base_ln)
            .sum();
        Ok(-((1.0 / n) * (sum - n * n.ln() / base_ln)))
    }

    fn max_and_square_sum(distribution: &[f64]) -> (f64, f64) {
        distribution.iter().fold((0.0_f64, 0.0), |(max, sum), &p| {
            (max.max(p), sum + p * p)
        })
    }
}

impl SplitCriterion for IademSplitCriterion {
    fn measure(&self, distribution: &[f64]) -> Result<f64, IademError> {
        let (max, square_sum) = Self::max_and_square_sum(distribution);
        let (base, scale) = match self.kind {
            SplitMeasure::Entropy | SplitMeasure::EntropyLogVar => {
                (Self::entropy(distribution, false)?, None)
            }
            SplitMeasure::EntropyWeight | SplitMeasure::EntropyLogVarWeight => {
                (Self::entropy(distribution, true)?, None)
            }
            SplitMeasure::Beta1 => (1.0 - max, None),
            SplitMeasure::Gamma1 => (1.0 - max, Some(2.0)),
            SplitMeasure::Beta2 => (1.0 - max + max * max - square_sum, None),
            SplitMeasure::Gamma2 => (1.0 - max + max * max - square_sum, Some(4.0)),
            SplitMeasure::Beta4 => (1.0 - square_sum, None),
            SplitMeasure::Gamma4 => (1.0 - square_sum, Some(2.0)),
        };

        if base < 0.0 {
            return Err(IademError::internal(
                "IademSplitCriterion",
                "measure",
                format!("{} could not be calculated for {distribution:?}", self.kind),
            ));
        }

        Ok(match scale {
            Some(factor) => (factor * base).sqrt(),
            None => base,
        })
    }

    fn clone_box(&self) -> Box<dyn SplitCriterion> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
