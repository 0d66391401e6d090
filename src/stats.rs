//! Small numeric helpers shared by the estimator.

/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Computes the unbiased sample variance (n - 1 denominator).
///
/// Returns `None` when fewer than two values are given, since the estimator
/// is undefined there.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();

    Some(ss / (values.len() - 1) as f64)
}

/// Standard error of a sample mean given its variance and sample size.
pub fn standard_error(variance: f64, n: usize) -> f64 {
    (variance / n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_empty_is_none() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_normal_values() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5);
        assert_relative_eq!(mean(&[-0.5, -0.3]).unwrap(), -0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_variance_needs_two_values() {
        assert_eq!(sample_variance(&[]), None);
        assert_eq!(sample_variance(&[3.0]), None);
    }

    #[test]
    fn test_sample_variance_uses_n_minus_one() {
        // deviations from 5: -3, -1, 1, 3 => ss = 20, / 3
        let v = sample_variance(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert_relative_eq!(v, 20.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_variance_constant_series_is_zero() {
        assert_eq!(sample_variance(&[1.5, 1.5, 1.5]), Some(0.0));
    }

    #[test]
    fn test_standard_error() {
        assert_relative_eq!(standard_error(4.0, 4), 1.0);
        assert_relative_eq!(standard_error(0.02, 2), 0.1, epsilon = 1e-12);
    }
}
