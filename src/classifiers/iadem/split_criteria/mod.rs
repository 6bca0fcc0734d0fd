mod iadem_split_criterion;
mod split_criterion;

pub use iadem_split_criterion::{IademSplitCriterion, SplitMeasure};
pub use split_criterion::SplitCriterion;
