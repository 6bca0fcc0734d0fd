use crate::classifiers::attribute_class_observers::{
    EbstMode, EbstNumericAttributeClassObserver, GaussianNumericAttributeClassObserver,
    GreenwaldKhannaNumericAttributeClassObserver, NumericAttributeObserver,
    VfmlNumericAttributeClassObserver,
};
use crate::classifiers::change_detectors::{ChangeDetector, HddmA};
use crate::classifiers::iadem::error::IademError;
use crate::classifiers::iadem::split_criteria::SplitMeasure;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

fn default_grace_period() -> usize {
    100
}

fn default_split_confidence() -> f64 {
    0.01
}

fn default_attribute_differentiation() -> f64 {
    0.1
}

fn default_percent_in_common() -> f64 {
    0.75
}

fn default_max_bins() -> usize {
    10
}

fn default_drift_confidence() -> f64 {
    0.001
}

fn default_warning_confidence() -> f64 {
    0.005
}

fn default_two_sided() -> bool {
    true
}

/// Which kinds of nominal tests a leaf may consider.
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
pub enum SplitTests {
    OnlyBinary,
    OnlyMultiway,
    #[default]
    BestSplit,
}

impl SplitTests {
    pub fn allows_binary(self) -> bool {
        self != SplitTests::OnlyMultiway
    }

    pub fn allows_multiway(self) -> bool {
        self != SplitTests::OnlyBinary
    }
}

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
pub enum LeafPredictionOption {
    MajorityClass,
    #[default]
    NaiveBayes,
    NaiveBayesAdaptive,
    WeightedVote,
}

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
pub enum NumericObserverOption {
    #[default]
    Gaussian,
    Vfml,
    GreenwaldKhanna,
    Ebst,
}

impl NumericObserverOption {
    pub fn build(self, max_bins: usize) -> Box<dyn NumericAttributeObserver> {
        match self {
            NumericObserverOption::Gaussian => {
                Box::new(GaussianNumericAttributeClassObserver::new(max_bins))
            }
            NumericObserverOption::Vfml => {
                Box::new(VfmlNumericAttributeClassObserver::new(max_bins))
            }
            NumericObserverOption::GreenwaldKhanna => {
                Box::new(GreenwaldKhannaNumericAttributeClassObserver::new(max_bins))
            }
            NumericObserverOption::Ebst => Box::new(EbstNumericAttributeClassObserver::new(
                EbstMode::Classification,
                max_bins,
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(tag = "type", rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ChangeDetectorOption {
    HddmA {
        #[serde(default = "default_drift_confidence")]
        drift_confidence: f64,
        #[serde(default = "default_warning_confidence")]
        warning_confidence: f64,
        #[serde(default = "default_two_sided")]
        two_sided: bool,
    },
}

impl Default for ChangeDetectorOption {
    fn default() -> Self {
        ChangeDetectorOption::HddmA {
            drift_confidence: default_drift_confidence(),
            warning_confidence: default_warning_confidence(),
            two_sided: default_two_sided(),
        }
    }
}

impl ChangeDetectorOption {
    pub fn build(self) -> Box<dyn ChangeDetector> {
        match self {
            ChangeDetectorOption::HddmA {
                drift_confidence,
                warning_confidence,
                two_sided,
            } => Box::new(HddmA::new(drift_confidence, warning_confidence, two_sided)),
        }
    }
}

/// Every tunable of an [`IademTree`](crate::classifiers::iadem::IademTree).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IademConfig {
    #[serde(default = "default_grace_period")]
    pub grace_period: usize,
    #[serde(default = "default_split_confidence")]
    pub split_confidence: f64,
    #[serde(default = "default_attribute_differentiation")]
    pub attribute_differentiation: f64,
    #[serde(default = "default_percent_in_common")]
    pub percent_in_common: f64,
    /// Real instances a leaf must see before Naive Bayes is trusted.
    pub naive_bayes_limit: usize,
    #[serde(default = "default_max_bins")]
    pub max_bins: usize,
    pub split_tests: SplitTests,
    pub leaf_prediction: LeafPredictionOption,
    pub split_criterion: SplitMeasure,
    pub numeric_observer: NumericObserverOption,
    pub change_detector: ChangeDetectorOption,
}

impl Default for IademConfig {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
            split_confidence: default_split_confidence(),
            attribute_differentiation: default_attribute_differentiation(),
            percent_in_common: default_percent_in_common(),
            naive_bayes_limit: 0,
            max_bins: default_max_bins(),
            split_tests: SplitTests::default(),
            leaf_prediction: LeafPredictionOption::default(),
            split_criterion: SplitMeasure::default(),
            numeric_observer: NumericObserverOption::default(),
            change_detector: ChangeDetectorOption::default(),
        }
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<(), IademError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(IademError::InvalidConfig(format!(
            "{name} must lie in [0, 1], got {value}"
        )))
    }
}

impl IademConfig {
    pub fn validate(&self) -> Result<(), IademError> {
        if !(self.split_confidence > 0.0 && self.split_confidence <= 1.0) {
            return Err(IademError::InvalidConfig(format!(
                "split_confidence must lie in (0, 1], got {}",
                self.split_confidence
            )));
        }
        check_unit_interval("attribute_differentiation", self.attribute_differentiation)?;
        check_unit_interval("percent_in_common", self.percent_in_common)?;
        if self.grace_period == 0 {
            return Err(IademError::InvalidConfig(
                "grace_period must be positive".to_string(),
            ));
        }
        if self.max_bins < 2 {
            return Err(IademError::InvalidConfig(format!(
                "max_bins must be at least 2, got {}",
                self.max_bins
            )));
        }

        let ChangeDetectorOption::HddmA {
            drift_confidence,
            warning_confidence,
            ..
        } = self.change_detector;
        for (name, value) in [
            ("drift_confidence", drift_confidence),
            ("warning_confidence", warning_confidence),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(IademError::InvalidConfig(format!(
                    "{name} must lie in (0, 1), got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: IademConfig =
            serde_json::from_str(raw).context("failed to parse IADEM configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("invalid configuration in {}", path.display()))
    }
}
