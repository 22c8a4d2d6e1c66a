//! P-value adjustment methods for multiple testing correction
//!
//! Missing p-values (NaN) are left missing and do not count towards the
//! number of tests.

use serde::{Deserialize, Serialize};

use crate::stats::nan_last_cmp;

/// Multiple testing correction applied within one family of tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    /// Benjamini-Hochberg false discovery rate
    #[default]
    BenjaminiHochberg,
    /// Bonferroni family-wise error rate
    Bonferroni,
}

impl Correction {
    /// Adjust a family of p-values
    pub fn adjust(self, pvalues: &[f64]) -> Vec<f64> {
        match self {
            Correction::BenjaminiHochberg => benjamini_hochberg(pvalues),
            Correction::Bonferroni => bonferroni(pvalues),
        }
    }
}

/// Apply Benjamini-Hochberg FDR correction to p-values
///
/// Adjusted values are monotone in the raw p-values, never smaller than the
/// raw p-value, and capped at 1.
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len();
    if n == 0 {
        return vec![];
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| nan_last_cmp(pvalues[a], pvalues[b]));

    let m = pvalues.iter().filter(|p| !p.is_nan()).count();
    let mut padj = vec![f64::NAN; n];
    if m == 0 {
        return padj;
    }

    // Walk from the largest p-value down, carrying the running minimum
    let mut running_min = 1.0_f64;
    for (rank0, &i) in order[..m].iter().enumerate().rev() {
        let rank = rank0 + 1;
        let adj = (pvalues[i] * m as f64 / rank as f64).min(1.0);
        running_min = running_min.min(adj);
        padj[i] = running_min;
    }

    padj
}

/// Apply Bonferroni correction to p-values
pub fn bonferroni(pvalues: &[f64]) -> Vec<f64> {
    let m = pvalues.iter().filter(|p| !p.is_nan()).count();
    pvalues
        .iter()
        .map(|&p| if p.is_nan() { f64::NAN } else { (p * m as f64).min(1.0) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bh_never_below_raw() {
        let pvalues = vec![0.01, 0.04, 0.03, 0.02, 0.5, 0.001];
        let padj = benjamini_hochberg(&pvalues);
        for (p, adj) in pvalues.iter().zip(padj.iter()) {
            assert!(*adj >= *p);
            assert!(*adj <= 1.0);
        }
    }

    #[test]
    fn test_bh_monotone_in_raw_pvalues() {
        let pvalues = vec![0.2, 0.001, 0.04, 0.039, 0.9, 0.01, 0.011];
        let padj = benjamini_hochberg(&pvalues);
        for i in 0..pvalues.len() {
            for j in 0..pvalues.len() {
                if pvalues[i] <= pvalues[j] {
                    assert!(padj[i] <= padj[j]);
                }
            }
        }
    }

    #[test]
    fn test_bh_known_values() {
        let padj = benjamini_hochberg(&[0.01, 0.02, 0.03, 0.04]);
        for adj in padj {
            assert!((adj - 0.04).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bh_with_nan() {
        let pvalues = vec![0.01, f64::NAN, 0.03, 0.02];
        let padj = benjamini_hochberg(&pvalues);
        assert!((padj[0] - 0.03).abs() < 1e-12);
        assert!(padj[1].is_nan());
        assert!((padj[2] - 0.03).abs() < 1e-12);
        assert!(padj[3].is_finite());
        assert!(benjamini_hochberg(&[f64::NAN, f64::NAN]).iter().all(|p| p.is_nan()));
    }

    #[test]
    fn test_bonferroni() {
        let padj = Correction::Bonferroni.adjust(&[0.01, 0.5, f64::NAN]);
        assert!((padj[0] - 0.02).abs() < 1e-12);
        assert_eq!(padj[1], 1.0);
        assert!(padj[2].is_nan());
    }
}
