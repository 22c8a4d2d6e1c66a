//! Per-group correlation of fold changes between two modalities

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::align::AlignedPair;
use crate::enrichment::GeneSetCatalog;
use crate::error::{OmicsError, Result};
use crate::stats;
use crate::testing::{benjamini_hochberg, t_pvalue};

/// Minimum number of pairs for a defined coefficient
pub const MIN_PAIRS: usize = 3;

/// Scope label of records computed over all features of a contrast
pub const ALL_FEATURES: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    /// Pearson on average ranks
    Spearman,
}

impl CorrelationMethod {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            other => Err(OmicsError::InvalidInput {
                reason: format!("Unknown correlation method '{}'. Use: pearson, spearman", other),
            }),
        }
    }

    /// Coefficient of two paired series; NaN if either is constant
    pub fn coefficient(self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            CorrelationMethod::Pearson => pearson(x, y),
            CorrelationMethod::Spearman => {
                pearson(&stats::average_ranks(x), &stats::average_ranks(y))
            }
        }
    }
}

/// Qualitative strength of a coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
    Undefined,
}

/// Absolute-value cut points for [`CorrelationStrength`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrengthThresholds {
    pub strong: f64,
    pub moderate: f64,
}

impl Default for StrengthThresholds {
    fn default() -> Self {
        Self {
            strong: 0.7,
            moderate: 0.4,
        }
    }
}

impl StrengthThresholds {
    pub fn classify(&self, r: f64) -> CorrelationStrength {
        if !r.is_finite() {
            return CorrelationStrength::Undefined;
        }
        let a = r.abs();
        if a >= self.strong {
            CorrelationStrength::Strong
        } else if a >= self.moderate {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0 < self.moderate && self.moderate <= self.strong && self.strong <= 1.0) {
            return Err(OmicsError::InvalidInput {
                reason: format!(
                    "Strength thresholds must satisfy 0 < moderate <= strong <= 1, got {} and {}",
                    self.moderate, self.strong
                ),
            });
        }
        Ok(())
    }
}

/// Correlation of left vs right fold changes within one grouping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    pub contrast: String,
    /// `all`, or the gene set the pairs were restricted to
    pub scope: String,
    pub method: CorrelationMethod,
    pub n: usize,
    #[serde(with = "crate::io::na_float")]
    pub coefficient: f64,
    #[serde(with = "crate::io::na_float")]
    pub pvalue: f64,
    #[serde(with = "crate::io::na_float")]
    pub padj: f64,
    pub strength: CorrelationStrength,
}

/// One record per contrast over all aligned pairs, BH across contrasts
pub fn correlate_by_contrast(
    pairs: &[AlignedPair],
    method: CorrelationMethod,
    thresholds: &StrengthThresholds,
) -> Result<Vec<CorrelationRecord>> {
    thresholds.validate()?;
    let mut records: Vec<CorrelationRecord> = group_by_contrast(pairs)
        .into_iter()
        .map(|(contrast, group)| correlate(contrast, ALL_FEATURES, &group, method, thresholds))
        .collect();
    adjust(&mut records);
    log::info!("Correlated {} contrasts ({:?})", records.len(), method);
    Ok(records)
}

/// One record per contrast and gene set, BH across all of them
///
/// Gene sets with no aligned member in a contrast produce no record.
pub fn correlate_by_gene_set(
    pairs: &[AlignedPair],
    catalog: &GeneSetCatalog,
    method: CorrelationMethod,
    thresholds: &StrengthThresholds,
) -> Result<Vec<CorrelationRecord>> {
    thresholds.validate()?;
    let mut records = Vec::new();
    for (contrast, group) in group_by_contrast(pairs) {
        for set in catalog.sets() {
            let members: Vec<&AlignedPair> = group
                .iter()
                .copied()
                .filter(|p| set.genes.iter().any(|g| g == &p.feature_id))
                .collect();
            if members.is_empty() {
                continue;
            }
            records.push(correlate(contrast, &set.name, &members, method, thresholds));
        }
    }
    adjust(&mut records);
    log::info!(
        "Correlated {} contrast x gene set groupings ({:?})",
        records.len(),
        method
    );
    Ok(records)
}

/// Pearson correlation; NaN for mismatched lengths, fewer than two values or zero variance
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let mx = stats::mean(x);
    let my = stats::mean(y);
    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mx;
        let dy = yi - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    let denom = (vx * vy).sqrt();
    if !(denom > 0.0) {
        return f64::NAN;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Two-sided p-value of a coefficient from `t = r * sqrt((n - 2) / (1 - r^2))`
pub fn correlation_pvalue(r: f64, n: usize) -> f64 {
    if !r.is_finite() || n < MIN_PAIRS {
        return f64::NAN;
    }
    let one_minus = 1.0 - r * r;
    if one_minus <= 0.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    t_pvalue(r * (df / one_minus).sqrt(), df)
}

fn group_by_contrast(pairs: &[AlignedPair]) -> BTreeMap<&str, Vec<&AlignedPair>> {
    let mut groups: BTreeMap<&str, Vec<&AlignedPair>> = BTreeMap::new();
    for pair in pairs {
        groups.entry(pair.contrast.as_str()).or_default().push(pair);
    }
    groups
}

fn correlate(
    contrast: &str,
    scope: &str,
    pairs: &[&AlignedPair],
    method: CorrelationMethod,
    thresholds: &StrengthThresholds,
) -> CorrelationRecord {
    let n = pairs.len();
    let coefficient = if n < MIN_PAIRS {
        log::debug!("{} / {}: only {} pairs, correlation undefined", contrast, scope, n);
        f64::NAN
    } else {
        let x: Vec<f64> = pairs.iter().map(|p| p.left_lfc).collect();
        let y: Vec<f64> = pairs.iter().map(|p| p.right_lfc).collect();
        method.coefficient(&x, &y)
    };
    CorrelationRecord {
        contrast: contrast.to_string(),
        scope: scope.to_string(),
        method,
        n,
        coefficient,
        pvalue: correlation_pvalue(coefficient, n),
        padj: f64::NAN,
        strength: thresholds.classify(coefficient),
    }
}

fn adjust(records: &mut [CorrelationRecord]) {
    let pvalues: Vec<f64> = records.iter().map(|r| r.pvalue).collect();
    for (record, q) in records.iter_mut().zip(benjamini_hochberg(&pvalues)) {
        record.padj = q;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{GeneSet, GeneSetSource};
    use crate::integration::Concordance;
    use approx::assert_relative_eq;

    fn pair(contrast: &str, id: &str, left: f64, right: f64) -> AlignedPair {
        AlignedPair {
            contrast: contrast.to_string(),
            feature_id: id.to_string(),
            left_lfc: left,
            right_lfc: right,
            left_padj: 0.01,
            right_padj: 0.01,
            concordance: Concordance::Unchanged,
        }
    }

    #[test]
    fn test_pearson_known_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        assert_relative_eq!(pearson(&x, &y), 0.7745966692414834, epsilon = 1e-12);
        assert!(pearson(&x, &[1.0; 5]).is_nan());
    }

    #[test]
    fn test_spearman_monotone_is_one() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 8.0, 27.0, 64.0];
        assert_relative_eq!(
            CorrelationMethod::Spearman.coefficient(&x, &y),
            1.0,
            epsilon = 1e-12
        );
        assert!(CorrelationMethod::Pearson.coefficient(&x, &y) < 1.0);
    }

    #[test]
    fn test_strength_bins() {
        let t = StrengthThresholds::default();
        assert_eq!(t.classify(0.85), CorrelationStrength::Strong);
        assert_eq!(t.classify(-0.7), CorrelationStrength::Strong);
        assert_eq!(t.classify(0.5), CorrelationStrength::Moderate);
        assert_eq!(t.classify(0.1), CorrelationStrength::Weak);
        assert_eq!(t.classify(f64::NAN), CorrelationStrength::Undefined);
    }

    #[test]
    fn test_by_contrast_groups_and_small_groups() {
        let pairs = vec![
            pair("a", "g1", 1.0, 1.1),
            pair("a", "g2", 2.0, 2.2),
            pair("a", "g3", 3.0, 2.9),
            pair("a", "g4", 4.0, 4.3),
            pair("b", "g1", 1.0, -1.0),
            pair("b", "g2", 2.0, -2.0),
        ];
        let records =
            correlate_by_contrast(&pairs, CorrelationMethod::Pearson, &StrengthThresholds::default())
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].contrast, "a");
        assert_eq!(records[0].scope, ALL_FEATURES);
        assert_eq!(records[0].strength, CorrelationStrength::Strong);
        assert!(records[0].pvalue < 0.05);
        assert!(records[0].padj >= records[0].pvalue);
        assert_eq!(records[1].n, 2);
        assert!(records[1].coefficient.is_nan());
        assert_eq!(records[1].strength, CorrelationStrength::Undefined);
    }

    #[test]
    fn test_by_gene_set() {
        let pairs = vec![
            pair("a", "TP53", 1.0, 0.9),
            pair("a", "MDM2", 2.0, 2.1),
            pair("a", "CDKN1A", 3.0, 3.2),
            pair("a", "MYC", 1.0, -1.0),
        ];
        let catalog = GeneSetCatalog::new(
            vec![
                GeneSet::new("P53", ["TP53", "MDM2", "CDKN1A"]),
                GeneSet::new("MYC", ["MYC"]),
                GeneSet::new("NONE", ["EGFR"]),
            ],
            GeneSetSource::EmbeddedDefault,
        )
        .unwrap();
        let records = correlate_by_gene_set(
            &pairs,
            &catalog,
            CorrelationMethod::Spearman,
            &StrengthThresholds::default(),
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].scope, "P53");
        assert_relative_eq!(records[0].coefficient, 1.0, epsilon = 1e-12);
        assert_eq!(records[0].pvalue, 0.0);
        assert_eq!(records[1].strength, CorrelationStrength::Undefined);
    }

    #[test]
    fn test_invalid_thresholds() {
        let bad = StrengthThresholds {
            strong: 0.3,
            moderate: 0.5,
        };
        assert!(correlate_by_contrast(&[], CorrelationMethod::Pearson, &bad).is_err());
    }
}
