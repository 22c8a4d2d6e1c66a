//! Differential comparison results

use serde::{Deserialize, Serialize};

use crate::stats::nan_last_cmp;

/// A resolved two-group comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contrast {
    /// Metadata column the groups come from (e.g. "subtype")
    pub variable: String,
    /// Numerator group (e.g. "Basal")
    pub numerator: String,
    /// Denominator group (e.g. "LumA", or "rest" for one-vs-rest)
    pub denominator: String,
}

impl Contrast {
    pub fn new(variable: &str, numerator: &str, denominator: &str) -> Self {
        Self {
            variable: variable.to_string(),
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
        }
    }

    /// Label stored on every record, e.g. `subtype:Basal_vs_LumA`
    pub fn label(&self) -> String {
        format!("{}:{}_vs_{}", self.variable, self.numerator, self.denominator)
    }
}

impl std::fmt::Display for Contrast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which comparisons to run on a sample partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContrastSpec {
    /// One numerator group against one denominator group
    Pair { numerator: String, denominator: String },
    /// Every ordered pair of levels (level_i vs level_j for i < j)
    AllPairs,
    /// Every level against all remaining samples
    OneVsRest,
}

impl ContrastSpec {
    /// Create a pairwise contrast
    pub fn pair(numerator: &str, denominator: &str) -> Self {
        ContrastSpec::Pair {
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
        }
    }
}

/// Per-feature differential result
///
/// Statistic and p-values are NaN when the test was undefined for the feature
/// (too few observations, zero variance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialRecord {
    pub feature_id: String,
    pub contrast: String,
    pub numerator: String,
    pub denominator: String,
    #[serde(with = "super::na_float")]
    pub mean_numerator: f64,
    #[serde(with = "super::na_float")]
    pub mean_denominator: f64,
    pub n_numerator: usize,
    pub n_denominator: usize,
    #[serde(with = "super::na_float")]
    pub log_fold_change: f64,
    #[serde(with = "super::na_float")]
    pub statistic: f64,
    #[serde(with = "super::na_float")]
    pub pvalue: f64,
    #[serde(with = "super::na_float")]
    pub padj: f64,
    pub significant: bool,
}

impl DifferentialRecord {
    /// Whether the record has a usable test result
    pub fn is_tested(&self) -> bool {
        !self.pvalue.is_nan()
    }
}

/// All records of one contrast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContrastResults {
    pub contrast: Contrast,
    pub records: Vec<DifferentialRecord>,
    pub alpha: f64,
    pub min_lfc: f64,
}

impl ContrastResults {
    /// Number of features in the comparison
    pub fn n_features(&self) -> usize {
        self.records.len()
    }

    /// Significant records
    pub fn significant(&self) -> Vec<&DifferentialRecord> {
        self.records.iter().filter(|r| r.significant).collect()
    }

    /// Significant records with positive fold change
    pub fn upregulated(&self) -> Vec<&DifferentialRecord> {
        self.records
            .iter()
            .filter(|r| r.significant && r.log_fold_change > 0.0)
            .collect()
    }

    /// Significant records with negative fold change
    pub fn downregulated(&self) -> Vec<&DifferentialRecord> {
        self.records
            .iter()
            .filter(|r| r.significant && r.log_fold_change < 0.0)
            .collect()
    }

    /// Tested records ordered by adjusted p-value, then raw p-value
    pub fn ranked(&self) -> Vec<&DifferentialRecord> {
        let mut ranked: Vec<&DifferentialRecord> =
            self.records.iter().filter(|r| r.is_tested()).collect();
        ranked.sort_by(|a, b| {
            nan_last_cmp(a.padj, b.padj)
                .then_with(|| nan_last_cmp(a.pvalue, b.pvalue))
                .then_with(|| a.feature_id.cmp(&b.feature_id))
        });
        ranked
    }

    /// Points for a volcano plot (log fold change vs -log10 padj)
    pub fn volcano_points(&self) -> Vec<VolcanoPoint> {
        self.records
            .iter()
            .filter(|r| r.is_tested() && r.log_fold_change.is_finite())
            .map(|r| VolcanoPoint {
                feature_id: r.feature_id.clone(),
                contrast: r.contrast.clone(),
                log_fold_change: r.log_fold_change,
                neg_log10_padj: (-r.padj.max(1e-300).log10()).min(300.0),
                significant: r.significant,
            })
            .collect()
    }

    /// Summary statistics
    pub fn summary(&self) -> ResultsSummary {
        ResultsSummary {
            contrast: self.contrast.label(),
            total_features: self.n_features(),
            features_tested: self.records.iter().filter(|r| r.is_tested()).count(),
            significant: self.significant().len(),
            upregulated: self.upregulated().len(),
            downregulated: self.downregulated().len(),
            alpha: self.alpha,
        }
    }
}

/// A contrast that could not be run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedContrast {
    pub contrast: String,
    pub reason: String,
}

/// Output of the comparator over all requested contrasts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub results: Vec<ContrastResults>,
    pub skipped: Vec<SkippedContrast>,
}

impl ComparisonReport {
    /// All records of all contrasts, concatenated
    pub fn records(&self) -> Vec<&DifferentialRecord> {
        self.results.iter().flat_map(|r| r.records.iter()).collect()
    }

    /// Results of one contrast by label
    pub fn contrast(&self, label: &str) -> Option<&ContrastResults> {
        self.results.iter().find(|r| r.contrast.label() == label)
    }
}

/// A point for a volcano plot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolcanoPoint {
    pub feature_id: String,
    pub contrast: String,
    pub log_fold_change: f64,
    /// -log10(adjusted p-value), clamped to 300
    pub neg_log10_padj: f64,
    pub significant: bool,
}

/// Summary of one contrast
#[derive(Debug, Clone)]
pub struct ResultsSummary {
    pub contrast: String,
    pub total_features: usize,
    pub features_tested: usize,
    pub significant: usize,
    pub upregulated: usize,
    pub downregulated: usize,
    pub alpha: f64,
}

impl std::fmt::Display for ResultsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Contrast {}", self.contrast)?;
        writeln!(f, "  Total features: {}", self.total_features)?;
        writeln!(f, "  Features tested: {}", self.features_tested)?;
        writeln!(f, "  Significant (padj < {}): {}", self.alpha, self.significant)?;
        writeln!(f, "    Up: {}", self.upregulated)?;
        writeln!(f, "    Down: {}", self.downregulated)?;
        Ok(())
    }
}
