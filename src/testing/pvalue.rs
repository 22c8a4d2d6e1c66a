//! P-value calculation from test statistics

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Two-sided p-value from a standard normal statistic
pub fn normal_pvalue(z: f64) -> f64 {
    if !z.is_finite() {
        return f64::NAN;
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => (2.0 * normal.cdf(-z.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value from a t statistic with `df` degrees of freedom
pub fn t_pvalue(stat: f64, df: f64) -> f64 {
    if !stat.is_finite() || !df.is_finite() || df <= 0.0 {
        return f64::NAN;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => (2.0 * t_dist.cdf(-stat.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_pvalue_symmetric() {
        let p1 = normal_pvalue(2.0);
        let p2 = normal_pvalue(-2.0);
        assert!((p1 - p2).abs() < 1e-12);
        assert!((normal_pvalue(1.959963984540054) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_pvalue_zero_statistic() {
        assert!((normal_pvalue(0.0) - 1.0).abs() < 1e-12);
        assert!((t_pvalue(0.0, 4.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_t_pvalue_heavier_tails() {
        let p_normal = normal_pvalue(2.0);
        assert!((t_pvalue(2.0, 1000.0) - p_normal).abs() < 0.001);
        assert!(t_pvalue(2.0, 3.0) > p_normal);
    }

    #[test]
    fn test_non_finite_inputs() {
        assert!(t_pvalue(f64::NAN, 3.0).is_nan());
        assert!(t_pvalue(1.0, 0.0).is_nan());
        assert!(normal_pvalue(f64::INFINITY).is_nan());
    }
}
