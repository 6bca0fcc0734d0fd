use crate::classifiers::change_detectors::ChangeDetector;
use crate::classifiers::iadem::config::LeafPredictionOption;

/// Prediction strategy of a leaf together with the state it needs.
#[derive(Clone, Debug)]
pub enum LeafPrediction {
    MajorityClass,
    NaiveBayes,
    /// Predicts with whichever of majority class and Naive Bayes has made
    /// fewer mistakes so far; ties go to Naive Bayes.
    NaiveBayesAdaptive { mc_errors: f64, nb_errors: f64 },
    /// Blends both predictions weighted by one minus their estimated error.
    WeightedVote {
        mc_error_estimator: Box<dyn ChangeDetector>,
        nb_error_estimator: Box<dyn ChangeDetector>,
    },
}

impl LeafPrediction {
    pub fn new(option: LeafPredictionOption, estimator: &dyn ChangeDetector) -> Self {
        match option {
            LeafPredictionOption::MajorityClass => LeafPrediction::MajorityClass,
            LeafPredictionOption::NaiveBayes => LeafPrediction::NaiveBayes,
            LeafPredictionOption::NaiveBayesAdaptive => LeafPrediction::NaiveBayesAdaptive {
                mc_errors: 0.0,
                nb_errors: 0.0,
            },
            LeafPredictionOption::WeightedVote => LeafPrediction::WeightedVote {
                mc_error_estimator: estimator.clone_box(),
                nb_error_estimator: estimator.clone_box(),
            },
        }
    }

    pub fn option(&self) -> LeafPredictionOption {
        match self {
            LeafPrediction::MajorityClass => LeafPredictionOption::MajorityClass,
            LeafPrediction::NaiveBayes => LeafPredictionOption::NaiveBayes,
            LeafPrediction::NaiveBayesAdaptive { .. } => LeafPredictionOption::NaiveBayesAdaptive,
            LeafPrediction::WeightedVote { .. } => LeafPredictionOption::WeightedVote,
        }
    }

    /// Whether learning must score both strategies before updating counts.
    pub fn tracks_errors(&self) -> bool {
        matches!(
            self,
            LeafPrediction::NaiveBayesAdaptive { .. } | LeafPrediction::WeightedVote { .. }
        )
    }

    pub fn record_errors(&mut self, mc_error: f64, nb_error: f64) {
        match self {
            LeafPrediction::NaiveBayesAdaptive {
                mc_errors,
                nb_errors,
            } => {
                *mc_errors += mc_error;
                *nb_errors += nb_error;
            }
            LeafPrediction::WeightedVote {
                mc_error_estimator,
                nb_error_estimator,
            } => {
                mc_error_estimator.input(mc_error);
                nb_error_estimator.input(nb_error);
            }
            LeafPrediction::MajorityClass | LeafPrediction::NaiveBayes => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::change_detectors::HddmA;
    use strum::IntoEnumIterator;

    #[test]
    fn test_option_roundtrip() {
        let detector = HddmA::default();
        for option in LeafPredictionOption::iter() {
            assert_eq!(LeafPrediction::new(option, &detector).option(), option);
        }
    }

    #[test]
    fn test_adaptive_counts_mistakes() {
        let mut prediction =
            LeafPrediction::new(LeafPredictionOption::NaiveBayesAdaptive, &HddmA::default());
        prediction.record_errors(1.0, 0.0);
        prediction.record_errors(1.0, 1.0);
        match prediction {
            LeafPrediction::NaiveBayesAdaptive {
                mc_errors,
                nb_errors,
            } => {
                assert_eq!(mc_errors, 2.0);
                assert_eq!(nb_errors, 1.0);
            }
            other => panic!("unexpected strategy {other:?}"),
        }
    }

    #[test]
    fn test_weighted_vote_estimators_are_independent() {
        let mut prediction =
            LeafPrediction::new(LeafPredictionOption::WeightedVote, &HddmA::default());
        prediction.record_errors(1.0, 0.0);
        let LeafPrediction::WeightedVote {
            mc_error_estimator,
            nb_error_estimator,
        } = &prediction
        else {
            panic!("expected weighted vote");
        };
        assert_eq!(mc_error_estimator.estimation(), 1.0);
        assert_eq!(nb_error_estimator.estimation(), 0.0);
        assert!(prediction.tracks_errors());
        assert!(!LeafPrediction::MajorityClass.tracks_errors());
    }
}
