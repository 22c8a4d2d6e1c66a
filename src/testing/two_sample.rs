//! Two-group tests applied per feature

use serde::{Deserialize, Serialize};

use super::pvalue::{normal_pvalue, t_pvalue};
use crate::error::{OmicsError, Result};
use crate::stats;

/// Statistical test used by the comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    /// Welch's t-test (unequal variances)
    #[default]
    Welch,
    /// Student's t-test (pooled variance)
    Student,
    /// Wilcoxon rank-sum (Mann-Whitney U), normal approximation
    Wilcoxon,
}

impl TestMethod {
    /// Parse a method name
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "welch" => Ok(TestMethod::Welch),
            "student" | "t" => Ok(TestMethod::Student),
            "wilcoxon" | "mann_whitney" => Ok(TestMethod::Wilcoxon),
            other => Err(OmicsError::InvalidInput {
                reason: format!("Unknown test '{}'. Use: welch, student, wilcoxon", other),
            }),
        }
    }

    /// Run the test on two groups of observed (non-missing) values
    pub fn run(self, x: &[f64], y: &[f64]) -> TestOutcome {
        match self {
            TestMethod::Welch => welch_t_test(x, y),
            TestMethod::Student => student_t_test(x, y),
            TestMethod::Wilcoxon => mann_whitney_u(x, y),
        }
    }
}

/// Statistic and two-sided p-value of one test; NaN when undefined
#[derive(Debug, Clone, Copy)]
pub struct TestOutcome {
    pub statistic: f64,
    pub pvalue: f64,
}

impl TestOutcome {
    fn undefined() -> Self {
        Self {
            statistic: f64::NAN,
            pvalue: f64::NAN,
        }
    }
}

/// Welch's t-test; undefined with fewer than two values per group or zero variance
pub fn welch_t_test(x: &[f64], y: &[f64]) -> TestOutcome {
    if x.len() < 2 || y.len() < 2 {
        return TestOutcome::undefined();
    }
    let (nx, ny) = (x.len() as f64, y.len() as f64);
    let vx = stats::variance(x) / nx;
    let vy = stats::variance(y) / ny;
    let se2 = vx + vy;
    if !(se2 > 0.0) {
        return TestOutcome::undefined();
    }
    let t = (stats::mean(x) - stats::mean(y)) / se2.sqrt();
    let df = se2 * se2 / (vx * vx / (nx - 1.0) + vy * vy / (ny - 1.0));
    TestOutcome {
        statistic: t,
        pvalue: t_pvalue(t, df),
    }
}

/// Student's t-test with pooled variance
pub fn student_t_test(x: &[f64], y: &[f64]) -> TestOutcome {
    if x.len() < 2 || y.len() < 2 {
        return TestOutcome::undefined();
    }
    let (nx, ny) = (x.len() as f64, y.len() as f64);
    let df = nx + ny - 2.0;
    let pooled = ((nx - 1.0) * stats::variance(x) + (ny - 1.0) * stats::variance(y)) / df;
    let se2 = pooled * (1.0 / nx + 1.0 / ny);
    if !(se2 > 0.0) {
        return TestOutcome::undefined();
    }
    let t = (stats::mean(x) - stats::mean(y)) / se2.sqrt();
    TestOutcome {
        statistic: t,
        pvalue: t_pvalue(t, df),
    }
}

/// Mann-Whitney U test with tie and continuity correction
///
/// The statistic reported is U for the first group.
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> TestOutcome {
    if x.len() < 2 || y.len() < 2 {
        return TestOutcome::undefined();
    }
    let (nx, ny) = (x.len() as f64, y.len() as f64);
    let combined: Vec<f64> = x.iter().chain(y.iter()).copied().collect();
    let ranks = stats::average_ranks(&combined);
    let rank_sum_x: f64 = ranks[..x.len()].iter().sum();
    let u = rank_sum_x - nx * (nx + 1.0) / 2.0;

    let n = nx + ny;
    let tie_term: f64 = stats::tie_sizes(&combined)
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let sigma2 = nx * ny / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if !(sigma2 > 0.0) {
        return TestOutcome::undefined();
    }

    let diff = u - nx * ny / 2.0;
    let corrected = diff - 0.5 * diff.signum();
    let z = if diff.abs() < 0.5 { 0.0 } else { corrected / sigma2.sqrt() };
    TestOutcome {
        statistic: u,
        pvalue: normal_pvalue(z),
    }
}
