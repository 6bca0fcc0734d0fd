use crate::classifiers::conditional_tests::observed_value;
use crate::classifiers::iadem::common_procedures::{MeritBounds, percent_in_common};
use crate::classifiers::iadem::error::IademError;
use crate::classifiers::iadem::iadem_tree::TreeContext;
use crate::classifiers::iadem::nodes::{LeafPrediction, Node, SiblingLeaves, SplitNode};
use crate::classifiers::iadem::virtual_nodes::VirtualNode;
use crate::core::instances::Instance;
use crate::utils::math::{max_index, normalize_or_uniform};
use log::{debug, trace};

/// A learning leaf: class counts, one virtual node per attribute and the
/// prediction strategy chosen for the tree.
#[derive(Clone, Debug)]
pub struct LeafNode {
    observed_class_distribution: Vec<f64>,
    weight_seen: f64,
    real_weight_seen: f64,
    instances_since_last_split_attempt: f64,
    split_enabled: bool,
    virtual_children: Vec<Option<VirtualNode>>,
    prediction: LeafPrediction,
}

impl LeafNode {
    /// `observed_class_distribution` may carry counts inherited from a parent
    /// split; they count as seen weight but not as real instances.
    pub fn new(
        observed_class_distribution: Vec<f64>,
        virtual_children: Vec<Option<VirtualNode>>,
        prediction: LeafPrediction,
    ) -> Self {
        let weight_seen = observed_class_distribution.iter().sum();
        Self {
            observed_class_distribution,
            weight_seen,
            real_weight_seen: 0.0,
            instances_since_last_split_attempt: 0.0,
            split_enabled: true,
            virtual_children,
            prediction,
        }
    }

    pub fn get_observed_class_distribution(&self) -> &[f64] {
        &self.observed_class_distribution
    }

    pub fn get_weight_seen(&self) -> f64 {
        self.weight_seen
    }

    pub fn get_real_weight_seen(&self) -> f64 {
        self.real_weight_seen
    }

    pub fn instances_since_last_split_attempt(&self) -> f64 {
        self.instances_since_last_split_attempt
    }

    pub fn is_split_enabled(&self) -> bool {
        self.split_enabled
    }

    pub fn set_split_enabled(&mut self, enabled: bool) {
        self.split_enabled = enabled;
    }

    pub fn prediction(&self) -> &LeafPrediction {
        &self.prediction
    }

    pub fn virtual_child(&self, attribute_index: usize) -> Option<&VirtualNode> {
        self.virtual_children.get(attribute_index)?.as_ref()
    }

    pub fn num_virtual_children(&self) -> usize {
        self.virtual_children.iter().flatten().count()
    }

    pub fn num_non_zero_entries(vec: &[f64]) -> usize {
        vec.iter().filter(|&&x| x != 0.0).count()
    }

    pub fn observed_class_distribution_is_pure(&self) -> bool {
        Self::num_non_zero_entries(&self.observed_class_distribution) < 2
    }

    /// Normalised class counts of this leaf alone.
    pub fn own_majority_votes(&self) -> Vec<f64> {
        let mut votes = self.observed_class_distribution.clone();
        normalize_or_uniform(&mut votes);
        votes
    }

    fn majority_votes(&self, siblings: SiblingLeaves<'_>, num_classes: usize) -> Vec<f64> {
        let mut votes = if self.weight_seen > 0.0 {
            self.observed_class_distribution.clone()
        } else {
            siblings
                .majority_blend(num_classes)
                .unwrap_or_else(|| vec![0.0; num_classes])
        };
        normalize_or_uniform(&mut votes);
        votes
    }

    /// Multiplies `prior` by the class likelihood of every observed attribute
    /// value whose virtual node has enough information.
    fn naive_bayes_votes(&self, instance: &dyn Instance, prior: Vec<f64>) -> Vec<f64> {
        let mut votes = prior;
        for child in self.virtual_children.iter().flatten() {
            if !child.has_information() {
                continue;
            }
            let Some(value) = observed_value(instance, child.attribute_index()) else {
                continue;
            };
            let likelihood = child.conditional_probability(value);
            for (class, vote) in votes.iter_mut().enumerate() {
                *vote *= likelihood.get(class).copied().unwrap_or(0.0);
            }
        }
        normalize_or_uniform(&mut votes);
        votes
    }

    pub fn get_class_votes(
        &self,
        instance: &dyn Instance,
        siblings: SiblingLeaves<'_>,
        ctx: &TreeContext,
    ) -> Vec<f64> {
        let majority = self.majority_votes(siblings, ctx.num_classes);
        match &self.prediction {
            LeafPrediction::MajorityClass => majority,
            LeafPrediction::NaiveBayes => {
                if self.weight_seen == 0.0
                    || self.real_weight_seen < ctx.config.naive_bayes_limit as f64
                {
                    majority
                } else {
                    self.naive_bayes_votes(instance, majority)
                }
            }
            LeafPrediction::NaiveBayesAdaptive {
                mc_errors,
                nb_errors,
            } => {
                if nb_errors > mc_errors {
                    majority
                } else {
                    self.naive_bayes_votes(instance, majority)
                }
            }
            LeafPrediction::WeightedVote {
                mc_error_estimator,
                nb_error_estimator,
            } => {
                let naive_bayes = self.naive_bayes_votes(instance, majority.clone());
                let mc_weight = 1.0 - mc_error_estimator.estimation();
                let nb_weight = 1.0 - nb_error_estimator.estimation();
                majority
                    .iter()
                    .zip(&naive_bayes)
                    .map(|(mc, nb)| mc * mc_weight + nb * nb_weight)
                    .collect()
            }
        }
    }

    /// Updates the statistics with one instance and, once the grace period has
    /// elapsed, tries to split. The split node that should replace this leaf
    /// is returned.
    pub fn learn_from_instance(
        &mut self,
        instance: &dyn Instance,
        class_index: usize,
        weight: f64,
        siblings: SiblingLeaves<'_>,
        ctx: &TreeContext,
    ) -> Result<Option<SplitNode>, IademError> {
        if self.prediction.tracks_errors() {
            let majority = self.majority_votes(siblings, ctx.num_classes);
            let naive_bayes = self.naive_bayes_votes(instance, majority.clone());
            self.prediction.record_errors(
                prediction_error(&majority, class_index),
                prediction_error(&naive_bayes, class_index),
            );
        }

        self.observed_class_distribution[class_index] += weight;
        self.weight_seen += weight;
        self.real_weight_seen += weight;
        self.instances_since_last_split_attempt += weight;

        for child in self.virtual_children.iter_mut().flatten() {
            child.learn_from_instance(instance, class_index, weight)?;
        }

        if self.split_enabled
            && self.instances_since_last_split_attempt >= ctx.config.grace_period as f64
            && !self.observed_class_distribution_is_pure()
        {
            let split = self.attempt_to_split(ctx)?;
            self.instances_since_last_split_attempt = 0.0;
            return Ok(split);
        }
        Ok(None)
    }

    pub fn attempt_to_split(&mut self, ctx: &TreeContext) -> Result<Option<SplitNode>, IademError> {
        let Some(index) = self.best_split_suggestion(ctx)? else {
            return Ok(None);
        };
        let Some(winner) = self.virtual_children[index].as_ref() else {
            return Ok(None);
        };

        let split = winner.new_split_node(self.observed_class_distribution.clone(), |dist| {
            Node::Leaf(Box::new(ctx.new_leaf_node(dist)))
        })?;
        if let Some(suggestion) = winner.get_best_split_suggestion() {
            debug!(
                "splitting leaf on attribute {} into {} branches, merit [{:.6}, {:.6}]",
                winner.attribute_index(),
                split.num_children(),
                suggestion.merit.lower,
                suggestion.merit.upper
            );
        }
        Ok(Some(split))
    }

    /// Index of the virtual child whose suggestion is clearly better than the
    /// rest, if any.
    pub fn best_split_suggestion(&mut self, ctx: &TreeContext) -> Result<Option<usize>, IademError> {
        let confidence = ctx.config.split_confidence;
        let differentiation = ctx.config.attribute_differentiation;

        let mut best: Option<(usize, MeritBounds)> = None;
        let mut second: Option<(usize, MeritBounds)> = None;
        let mut worst: Option<(usize, MeritBounds)> = None;
        for (i, slot) in self.virtual_children.iter_mut().enumerate() {
            let Some(child) = slot else {
                continue;
            };
            child.update_heuristic_measure(ctx.criterion.as_ref(), confidence)?;
            let Some(merit) = child.get_best_split_suggestion().map(|s| s.merit) else {
                continue;
            };

            match best {
                Some((_, current)) if !merit.better_than(&current) => {
                    if second.is_none_or(|(_, s)| merit.better_than(&s)) {
                        second = Some((i, merit));
                    }
                }
                _ => {
                    second = best;
                    best = Some((i, merit));
                }
            }
            if worst.is_none_or(|(_, w)| merit.worse_than(&w)) {
                worst = Some((i, merit));
            }
        }

        let Some((best_index, best_merit)) = best else {
            return Ok(None);
        };

        if let (Some(_), Some((worst_index, worst_merit))) = (second, worst) {
            let best_in_worst = percent_in_common(&best_merit, &worst_merit);
            let worst_in_best = percent_in_common(&worst_merit, &best_merit);
            let similar =
                best_in_worst >= 1.0 - differentiation && worst_in_best >= 1.0 - differentiation;
            let similar_and_tight = similar && best_merit.width() <= differentiation;
            let different = best_in_worst <= differentiation || worst_in_best <= differentiation;
            if !(similar_and_tight || different) {
                trace!(
                    "split declined: attribute {} and attribute {} overlap ({:.4}, {:.4})",
                    best_index, worst_index, best_in_worst, worst_in_best
                );
                return Ok(None);
            }
        }

        let Some(winner) = self.virtual_children[best_index].as_ref() else {
            return Ok(None);
        };
        let imbalance = winner.imbalance();
        if imbalance > ctx.config.percent_in_common {
            trace!(
                "split declined: attribute {best_index} too unbalanced ({imbalance:.4})"
            );
            return Ok(None);
        }
        Ok(Some(best_index))
    }
}

/// 0/1 loss of predicting the most voted class.
fn prediction_error(votes: &[f64], class_index: usize) -> f64 {
    if max_index(votes) == Some(class_index) {
        0.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::iadem::config::{IademConfig, LeafPredictionOption};
    use crate::testing::{MockInstance, header_from_columns, nominal, numeric};

    const EPS: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn nominal_context(config: IademConfig) -> TreeContext {
        let header = header_from_columns(
            vec![
                nominal("class", &["c0", "c1"]),
                nominal("a", &["x", "y"]),
                nominal("b", &["x", "y"]),
            ],
            0,
        );
        TreeContext::new(header, config).unwrap()
    }

    fn row(class: usize, a: usize, b: usize) -> MockInstance {
        MockInstance::new(vec![class as f64, a as f64, b as f64], 0, 1.0)
    }

    fn learn(leaf: &mut LeafNode, ctx: &TreeContext, instance: &MockInstance) -> Option<SplitNode> {
        let class = instance.values[0] as usize;
        leaf.learn_from_instance(instance, class, 1.0, SiblingLeaves::none(), ctx)
            .unwrap()
    }

    #[test]
    fn test_new_leaf_has_one_virtual_child_per_attribute() {
        let ctx = nominal_context(IademConfig::default());
        let leaf = ctx.new_leaf_node(vec![0.0, 0.0]);
        assert_eq!(leaf.num_virtual_children(), 2);
        assert!(leaf.virtual_child(0).is_none());
        assert!(matches!(leaf.virtual_child(1), Some(VirtualNode::Nominal(_))));
    }

    #[test]
    fn test_inherited_counts_are_not_real_weight() {
        let ctx = nominal_context(IademConfig::default());
        let leaf = ctx.new_leaf_node(vec![2.0, 1.0]);
        assert!(approx_eq(leaf.get_weight_seen(), 3.0, EPS));
        assert!(approx_eq(leaf.get_real_weight_seen(), 0.0, EPS));
    }

    #[test]
    fn test_pure_leaf_never_attempts_a_split() {
        let config = IademConfig {
            grace_period: 1,
            ..IademConfig::default()
        };
        let ctx = nominal_context(config);
        let mut leaf = ctx.new_leaf_node(vec![0.0, 0.0]);
        for i in 0..50 {
            assert!(learn(&mut leaf, &ctx, &row(0, i % 2, (i / 2) % 2)).is_none());
        }
        assert!(approx_eq(leaf.instances_since_last_split_attempt(), 50.0, EPS));
    }

    #[test]
    fn test_grace_period_gates_split_attempts() {
        let ctx = nominal_context(IademConfig::default());
        let mut leaf = ctx.new_leaf_node(vec![0.0, 0.0]);
        for i in 0..99 {
            learn(&mut leaf, &ctx, &row(i % 2, 0, 0));
        }
        assert!(approx_eq(leaf.instances_since_last_split_attempt(), 99.0, EPS));

        let split = learn(&mut leaf, &ctx, &row(1, 0, 0));
        assert!(split.is_none());
        assert!(approx_eq(leaf.instances_since_last_split_attempt(), 0.0, EPS));
    }

    #[test]
    fn test_disabled_leaf_keeps_counting() {
        let config = IademConfig {
            grace_period: 1,
            ..IademConfig::default()
        };
        let ctx = nominal_context(config);
        let mut leaf = ctx.new_leaf_node(vec![0.0, 0.0]);
        leaf.set_split_enabled(false);
        assert!(learn(&mut leaf, &ctx, &row(0, 0, 0)).is_none());
        assert!(learn(&mut leaf, &ctx, &row(1, 1, 0)).is_none());
        assert!(approx_eq(leaf.instances_since_last_split_attempt(), 2.0, EPS));
    }

    #[test]
    fn test_separating_attribute_wins() {
        let config = IademConfig {
            grace_period: 1,
            split_confidence: 1.0,
            leaf_prediction: LeafPredictionOption::MajorityClass,
            ..IademConfig::default()
        };
        let ctx = nominal_context(config);
        let mut leaf = ctx.new_leaf_node(vec![0.0, 0.0]);
        assert!(learn(&mut leaf, &ctx, &row(0, 0, 0)).is_none());
        assert!(learn(&mut leaf, &ctx, &row(0, 0, 1)).is_none());

        let split = learn(&mut leaf, &ctx, &row(1, 1, 0)).unwrap();
        assert_eq!(split.split_test().get_atts_test_depends_on(), vec![1]);
        assert_eq!(split.num_children(), 2);
        assert_eq!(split.get_observed_class_distribution(), &[2.0, 1.0]);
        assert_eq!(split.children()[0].get_observed_class_distribution(), &[2.0, 0.0]);
        assert_eq!(split.children()[1].get_observed_class_distribution(), &[0.0, 1.0]);
    }

    #[test]
    fn test_overlapping_candidates_decline() {
        let config = IademConfig {
            grace_period: 1000,
            leaf_prediction: LeafPredictionOption::MajorityClass,
            ..IademConfig::default()
        };
        let ctx = nominal_context(config);
        let mut leaf = ctx.new_leaf_node(vec![0.0, 0.0]);
        for i in 0..8 {
            learn(&mut leaf, &ctx, &row(i % 2, (i / 2) % 2, (i / 4) % 2));
        }
        assert_eq!(leaf.best_split_suggestion(&ctx).unwrap(), None);
    }

    #[test]
    fn test_majority_votes_normalise_counts() {
        let ctx = nominal_context(IademConfig {
            leaf_prediction: LeafPredictionOption::MajorityClass,
            ..IademConfig::default()
        });
        let leaf = ctx.new_leaf_node(vec![3.0, 1.0]);
        let votes = leaf.get_class_votes(&row(0, 0, 0), SiblingLeaves::none(), &ctx);
        assert!(approx_eq(votes[0], 0.75, EPS));
        assert!(approx_eq(votes[1], 0.25, EPS));
    }

    #[test]
    fn test_empty_leaf_without_siblings_is_uniform() {
        let ctx = nominal_context(IademConfig::default());
        let leaf = ctx.new_leaf_node(vec![0.0, 0.0]);
        let votes = leaf.get_class_votes(&row(0, 0, 0), SiblingLeaves::none(), &ctx);
        assert_eq!(votes, vec![0.5, 0.5]);
    }

    #[test]
    fn test_naive_bayes_uses_attribute_likelihoods() {
        let ctx = nominal_context(IademConfig::default());
        let mut leaf = ctx.new_leaf_node(vec![0.0, 0.0]);
        learn(&mut leaf, &ctx, &row(0, 0, 0));
        learn(&mut leaf, &ctx, &row(0, 0, 1));
        learn(&mut leaf, &ctx, &row(1, 1, 0));
        learn(&mut leaf, &ctx, &row(1, 0, 1));

        // P(a=y | c0) = 0, so the query is certainly c1.
        let votes = leaf.get_class_votes(&row(0, 1, 0), SiblingLeaves::none(), &ctx);
        assert!(approx_eq(votes[0], 0.0, EPS));
        assert!(approx_eq(votes[1], 1.0, EPS));
    }

    #[test]
    fn test_naive_bayes_limit_falls_back_to_majority() {
        let ctx = nominal_context(IademConfig {
            naive_bayes_limit: 10,
            ..IademConfig::default()
        });
        let mut leaf = ctx.new_leaf_node(vec![0.0, 0.0]);
        learn(&mut leaf, &ctx, &row(0, 0, 0));
        learn(&mut leaf, &ctx, &row(1, 1, 0));
        let votes = leaf.get_class_votes(&row(0, 1, 0), SiblingLeaves::none(), &ctx);
        assert_eq!(votes, vec![0.5, 0.5]);
    }

    #[test]
    fn test_adaptive_counts_mistakes_before_learning() {
        let ctx = nominal_context(IademConfig {
            leaf_prediction: LeafPredictionOption::NaiveBayesAdaptive,
            ..IademConfig::default()
        });
        let mut leaf = ctx.new_leaf_node(vec![0.0, 0.0]);
        learn(&mut leaf, &ctx, &row(1, 0, 0));
        learn(&mut leaf, &ctx, &row(0, 1, 0));

        let LeafPrediction::NaiveBayesAdaptive {
            mc_errors,
            nb_errors,
        } = leaf.prediction()
        else {
            panic!("expected adaptive prediction");
        };
        // Both miss the first instance from a uniform vote. On the second the
        // unseen value `a=y` zeroes every likelihood, so Naive Bayes falls
        // back to uniform and picks class 0.
        assert!(approx_eq(*mc_errors, 2.0, EPS));
        assert!(approx_eq(*nb_errors, 1.0, EPS));
    }

    #[test]
    fn test_weighted_vote_blends_both_strategies() {
        let ctx = nominal_context(IademConfig {
            leaf_prediction: LeafPredictionOption::WeightedVote,
            ..IademConfig::default()
        });
        let leaf = ctx.new_leaf_node(vec![1.0, 3.0]);
        // Fresh estimators report zero error, so both votes count fully and
        // Naive Bayes has no informed attribute to sharpen the prior.
        let votes = leaf.get_class_votes(&row(0, 0, 0), SiblingLeaves::none(), &ctx);
        assert!(approx_eq(votes[0], 0.5, EPS));
        assert!(approx_eq(votes[1], 1.5, EPS));
    }

    #[test]
    fn test_numeric_missing_value_still_updates_class_counts() {
        let header = header_from_columns(vec![numeric("x"), nominal("class", &["c0", "c1"])], 1);
        let ctx = TreeContext::new(header, IademConfig::default()).unwrap();
        let mut leaf = ctx.new_leaf_node(vec![0.0, 0.0]);
        leaf.learn_from_instance(
            &MockInstance::new(vec![1.5, 0.0], 1, 1.0),
            0,
            1.0,
            SiblingLeaves::none(),
            &ctx,
        )
        .unwrap();
        leaf.learn_from_instance(
            &MockInstance::new(vec![f64::NAN, 1.0], 1, 1.0),
            1,
            1.0,
            SiblingLeaves::none(),
            &ctx,
        )
        .unwrap();

        assert_eq!(leaf.get_observed_class_distribution(), &[1.0, 1.0]);
        let Some(VirtualNode::Numeric(child)) = leaf.virtual_child(0) else {
            panic!("expected a numeric virtual node");
        };
        assert!(approx_eq(child.observer().value_count(), 1.0, EPS));
    }
}
