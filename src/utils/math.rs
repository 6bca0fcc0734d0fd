use std::f64::consts::SQRT_2;

/// Standard normal cumulative distribution function.
pub fn normal_probability(z: f64) -> f64 {
    0.5 * (1.0 + libm::erf(z / SQRT_2))
}

/// Index of the first maximum, `None` for an empty slice.
pub fn max_index(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, best_value)) if v <= best_value => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Scales `values` so they sum to one, or makes them uniform when the sum is zero.
pub fn normalize_or_uniform(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if values.is_empty() {
        return;
    }
    if total == 0.0 {
        let uniform = 1.0 / values.len() as f64;
        values.iter_mut().for_each(|v| *v = uniform);
    } else {
        values.iter_mut().for_each(|v| *v /= total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn test_normal_probability_known_points() {
        assert!(approx_eq(normal_probability(0.0), 0.5, EPS));
        assert!(approx_eq(normal_probability(1.0), 0.841_344_746_068_543, 1e-9));
        assert!(approx_eq(normal_probability(-1.0), 0.158_655_253_931_457, 1e-9));
    }

    #[test]
    fn test_max_index_prefers_first_on_ties() {
        assert_eq!(max_index(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(max_index(&[]), None);
        assert_eq!(max_index(&[0.0, 0.0]), Some(0));
    }

    #[test]
    fn test_normalize_or_uniform() {
        let mut votes = vec![1.0, 3.0];
        normalize_or_uniform(&mut votes);
        assert!(approx_eq(votes[0], 0.25, EPS));
        assert!(approx_eq(votes[1], 0.75, EPS));

        let mut empty = vec![0.0, 0.0, 0.0, 0.0];
        normalize_or_uniform(&mut empty);
        assert!(empty.iter().all(|&v| approx_eq(v, 0.25, EPS)));
    }
}
