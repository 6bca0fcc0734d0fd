use crate::classifiers::iadem::error::IademError;
use crate::classifiers::iadem::split_criteria::SplitCriterion;

/// Negative probability mass smaller than this is treated as rounding noise.
pub const ERROR_MARGIN: f64 = 1e-9;

/// Per-class probability interval of one branch of a candidate test.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchBounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub weight: f64,
}

impl BranchBounds {
    /// A branch nothing has reached yet: every class may take any probability.
    pub fn unknown(num_classes: usize) -> Self {
        Self {
            lower: vec![0.0; num_classes],
            upper: vec![1.0; num_classes],
            weight: 0.0,
        }
    }

    /// Intervals around the empirical frequencies `counts[j] / total`.
    ///
    /// Classes past the end of `counts` were never observed by the source and
    /// get the degenerate interval `[0, 0]`.
    pub fn from_counts(counts: &[f64], total: f64, confidence: f64, num_classes: usize) -> Self {
        if total <= 0.0 {
            return Self::unknown(num_classes);
        }

        let error = hoeffding_bound(confidence, total);
        let mut lower = vec![0.0; num_classes];
        let mut upper = vec![0.0; num_classes];
        for (j, &count) in counts.iter().enumerate().take(num_classes) {
            let estimate = count / total;
            lower[j] = (estimate - error).max(0.0);
            upper[j] = (estimate + error).min(1.0);
        }

        Self {
            lower,
            upper,
            weight: total,
        }
    }
}

/// Merit interval of a candidate test; both ends follow "lower is better".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeritBounds {
    pub upper: f64,
    pub lower: f64,
}

impl MeritBounds {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Strictly better: lower upper bound, ties broken by lower lower bound.
    pub fn better_than(&self, other: &MeritBounds) -> bool {
        self.upper < other.upper || (self.upper == other.upper && self.lower < other.lower)
    }

    /// Strictly worse: higher upper bound, ties broken by higher lower bound.
    pub fn worse_than(&self, other: &MeritBounds) -> bool {
        self.upper > other.upper || (self.upper == other.upper && self.lower > other.lower)
    }
}

/// Hoeffding deviation `sqrt(ln(1/confidence) / (2n))`; unbounded for `n <= 0`.
pub fn hoeffding_bound(confidence: f64, n: f64) -> f64 {
    if n <= 0.0 {
        return f64::INFINITY;
    }
    ((1.0 / confidence).ln() / (2.0 * n)).sqrt()
}

fn clamp_drift(
    value: f64,
    component: &'static str,
    operation: &'static str,
) -> Result<f64, IademError> {
    if value >= 0.0 {
        Ok(value)
    } else if value.abs() < ERROR_MARGIN {
        Ok(0.0)
    } else {
        Err(IademError::internal(
            component,
            operation,
            format!("probability mass drifted to {value}"),
        ))
    }
}

/// Probability mass left once every class takes its lower bound.
pub fn available_probability(lower: &[f64]) -> Result<f64, IademError> {
    clamp_drift(
        1.0 - lower.iter().sum::<f64>(),
        "common_procedures",
        "available_probability",
    )
}

/// Water level `L` such that raising every class to `clamp(L, lower, upper)`
/// spends exactly `available` probability mass.
pub fn compute_level(lower: &[f64], upper: &[f64], available: f64) -> f64 {
    let mut breakpoints: Vec<f64> = Vec::with_capacity(2 + lower.len() + upper.len());
    breakpoints.push(0.0);
    breakpoints.push(1.0);
    breakpoints.extend_from_slice(lower);
    breakpoints.extend_from_slice(upper);
    breakpoints.sort_by(f64::total_cmp);
    breakpoints.dedup();

    let mut remaining = available;
    for segment in breakpoints.windows(2) {
        let (from, to) = (segment[0], segment[1]);
        let active = lower
            .iter()
            .zip(upper)
            .filter(|&(&lo, &up)| lo <= from && up >= to)
            .count();
        if active == 0 {
            continue;
        }
        let capacity = active as f64 * (to - from);
        if remaining <= capacity {
            return from + remaining / active as f64;
        }
        remaining -= capacity;
    }
    1.0
}

/// The most even class vector inside the branch intervals.
pub fn most_impure_vector(bounds: &BranchBounds, available: f64) -> Vec<f64> {
    let level = compute_level(&bounds.lower, &bounds.upper, available);
    bounds
        .lower
        .iter()
        .zip(&bounds.upper)
        .map(|(&lo, &up)| up.min(level.max(lo)))
        .collect()
}

/// The most concentrated class vector inside the branch intervals, built by
/// handing the free mass greedily to whichever class can absorb the most.
pub fn purest_vector(bounds: &BranchBounds, available: f64) -> Result<Vec<f64>, IademError> {
    let num_classes = bounds.lower.len();
    let mut unused: Vec<usize> = (0..num_classes).collect();
    let mut remaining = available;
    let mut vector = Vec::with_capacity(num_classes);

    while !unused.is_empty() {
        remaining = clamp_drift(remaining, "common_procedures", "purest_vector")?;

        let mut chosen = 0;
        let mut chosen_value = f64::NEG_INFINITY;
        for (position, &class) in unused.iter().enumerate() {
            let reachable = bounds.upper[class].min(bounds.lower[class] + remaining);
            if reachable > chosen_value {
                chosen = position;
                chosen_value = reachable;
            }
        }

        let class = unused.remove(chosen);
        remaining -= chosen_value - bounds.lower[class];
        vector.push(chosen_value);
    }

    Ok(vector)
}

/// Weighted merit interval over the branches of one test, or `None` when no
/// branch carries weight.
pub fn merit_bounds(
    branches: &[BranchBounds],
    criterion: &dyn SplitCriterion,
) -> Result<Option<MeritBounds>, IademError> {
    let mut weighted_upper = 0.0;
    let mut weighted_lower = 0.0;
    let mut total = 0.0;

    for branch in branches {
        let available = available_probability(&branch.lower)?;
        let upper = criterion.measure(&most_impure_vector(branch, available))?;
        let lower = criterion.measure(&purest_vector(branch, available)?)?;
        weighted_upper += upper * branch.weight;
        weighted_lower += lower * branch.weight;
        total += branch.weight;
    }

    if total <= 0.0 {
        return Ok(None);
    }
    Ok(Some(MeritBounds {
        upper: weighted_upper / total,
        lower: weighted_lower / total,
    }))
}

/// Share of interval `a` that lies inside interval `b`.
///
/// A zero-width `a` overlapping `b` yields NaN, which fails every threshold
/// comparison the caller makes.
pub fn percent_in_common(a: &MeritBounds, b: &MeritBounds) -> f64 {
    if a.lower >= b.upper || a.upper <= b.lower {
        return 0.0;
    }

    let margin = a.upper - a.lower;
    let outside_above = if a.upper > b.upper { a.upper - b.upper } else { 0.0 };
    let outside_below = if a.lower < b.lower { b.lower - a.lower } else { 0.0 };
    (margin - (outside_above + outside_below)) / margin
}
