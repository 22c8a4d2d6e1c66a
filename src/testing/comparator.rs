//! Per-feature two-group comparisons over one sample partition

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::fdr::Correction;
use super::two_sample::TestMethod;
use crate::data::{FeatureMatrix, SamplePartition};
use crate::error::{OmicsError, Result};
use crate::io::{
    ComparisonReport, Contrast, ContrastResults, ContrastSpec, DifferentialRecord,
    SkippedContrast,
};
use crate::stats;

/// Minimum group size for a contrast to be run
pub const MIN_GROUP_SIZE: usize = 2;

/// Parameters of a comparison run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorParams {
    pub method: TestMethod,
    /// Significance threshold on adjusted p-values
    pub alpha: f64,
    /// Minimum absolute log fold change for a feature to be called significant
    pub min_lfc: f64,
    pub correction: Correction,
}

impl Default for ComparatorParams {
    fn default() -> Self {
        Self {
            method: TestMethod::Welch,
            alpha: 0.05,
            min_lfc: 0.0,
            correction: Correction::BenjaminiHochberg,
        }
    }
}

/// A contrast with the sample indices of its two sides
#[derive(Debug, Clone)]
pub struct ResolvedContrast {
    pub contrast: Contrast,
    pub numerator: Vec<usize>,
    pub denominator: Vec<usize>,
}

/// Expand contrast specifications into concrete contrasts over `partition`
///
/// Duplicate contrasts produced by overlapping specifications are kept once.
pub fn resolve_contrasts(
    partition: &SamplePartition,
    specs: &[ContrastSpec],
) -> Result<Vec<ResolvedContrast>> {
    let variable = partition.variable();
    let levels = partition.levels();
    let mut resolved: Vec<ResolvedContrast> = Vec::new();

    let lookup = |level: &str| -> Result<Vec<usize>> {
        partition
            .samples(level)
            .map(|s| s.to_vec())
            .ok_or_else(|| OmicsError::InvalidContrast {
                reason: format!(
                    "Level '{}' not found in '{}'. Available: {:?}",
                    level, variable, levels
                ),
            })
    };

    for spec in specs {
        let batch: Vec<ResolvedContrast> = match spec {
            ContrastSpec::Pair {
                numerator,
                denominator,
            } => {
                if numerator == denominator {
                    return Err(OmicsError::InvalidContrast {
                        reason: format!("Numerator and denominator are both '{}'", numerator),
                    });
                }
                vec![ResolvedContrast {
                    contrast: Contrast::new(variable, numerator, denominator),
                    numerator: lookup(numerator)?,
                    denominator: lookup(denominator)?,
                }]
            }
            ContrastSpec::AllPairs => {
                let mut pairs = Vec::new();
                for (i, num) in levels.iter().enumerate() {
                    for den in levels.iter().skip(i + 1) {
                        pairs.push(ResolvedContrast {
                            contrast: Contrast::new(variable, num, den),
                            numerator: lookup(*num)?,
                            denominator: lookup(*den)?,
                        });
                    }
                }
                pairs
            }
            ContrastSpec::OneVsRest => levels
                .iter()
                .map(|level| {
                    Ok(ResolvedContrast {
                        contrast: Contrast::new(variable, level, "rest"),
                        numerator: lookup(*level)?,
                        denominator: partition.samples_except(level),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        };

        for rc in batch {
            if !resolved.iter().any(|r| r.contrast == rc.contrast) {
                resolved.push(rc);
            }
        }
    }

    if resolved.is_empty() {
        return Err(OmicsError::InvalidContrast {
            reason: format!(
                "No contrasts could be formed from '{}' with levels {:?}",
                variable, levels
            ),
        });
    }

    Ok(resolved)
}

/// Run every requested contrast over a normalized matrix
///
/// `partition` must have been built from metadata aligned to `matrix`.
/// Contrasts with a group below two samples are reported in
/// [`ComparisonReport::skipped`] and the remaining contrasts still run.
pub fn compare(
    matrix: &FeatureMatrix,
    partition: &SamplePartition,
    specs: &[ContrastSpec],
    params: &ComparatorParams,
) -> Result<ComparisonReport> {
    if partition.n_samples() != matrix.n_samples() {
        return Err(OmicsError::DimensionMismatch {
            expected: format!("{} samples in partition", matrix.n_samples()),
            got: partition.n_samples().to_string(),
        });
    }
    if !(params.alpha > 0.0 && params.alpha < 1.0) {
        return Err(OmicsError::InvalidInput {
            reason: format!("alpha must be in (0, 1), got {}", params.alpha),
        });
    }
    if !(params.min_lfc >= 0.0) {
        return Err(OmicsError::InvalidInput {
            reason: format!("min_lfc must be non-negative, got {}", params.min_lfc),
        });
    }

    let contrasts = resolve_contrasts(partition, specs)?;
    let mut report = ComparisonReport::default();

    for rc in contrasts {
        let label = rc.contrast.label();
        if rc.numerator.len() < MIN_GROUP_SIZE || rc.denominator.len() < MIN_GROUP_SIZE {
            let reason = format!(
                "group sizes {} ({}) and {} ({}) below minimum of {}",
                rc.contrast.numerator,
                rc.numerator.len(),
                rc.contrast.denominator,
                rc.denominator.len(),
                MIN_GROUP_SIZE
            );
            log::warn!("Skipping contrast {}: {}", label, reason);
            report.skipped.push(SkippedContrast {
                contrast: label,
                reason,
            });
            continue;
        }

        log::info!(
            "Testing {} ({} vs {} samples, {} features, {:?})",
            label,
            rc.numerator.len(),
            rc.denominator.len(),
            matrix.n_features(),
            params.method
        );
        let results = compare_contrast(matrix, &rc, params);
        let summary = results.summary();
        log::info!(
            "{}: {} significant ({} up, {} down) of {} tested",
            label,
            summary.significant,
            summary.upregulated,
            summary.downregulated,
            summary.features_tested
        );
        report.results.push(results);
    }

    Ok(report)
}

/// Test every feature of one resolved contrast
pub fn compare_contrast(
    matrix: &FeatureMatrix,
    rc: &ResolvedContrast,
    params: &ComparatorParams,
) -> ContrastResults {
    let label = rc.contrast.label();
    let values = matrix.values();

    let mut records: Vec<DifferentialRecord> = (0..matrix.n_features())
        .into_par_iter()
        .map(|i| {
            let row = values.row(i);
            let x = stats::observed(rc.numerator.iter().map(|&j| &row[j]));
            let y = stats::observed(rc.denominator.iter().map(|&j| &row[j]));
            let outcome = params.method.run(&x, &y);
            let mean_numerator = stats::mean(&x);
            let mean_denominator = stats::mean(&y);

            DifferentialRecord {
                feature_id: matrix.feature_ids()[i].clone(),
                contrast: label.clone(),
                numerator: rc.contrast.numerator.clone(),
                denominator: rc.contrast.denominator.clone(),
                mean_numerator,
                mean_denominator,
                n_numerator: x.len(),
                n_denominator: y.len(),
                log_fold_change: mean_numerator - mean_denominator,
                statistic: outcome.statistic,
                pvalue: outcome.pvalue,
                padj: f64::NAN,
                significant: false,
            }
        })
        .collect();

    let pvalues: Vec<f64> = records.iter().map(|r| r.pvalue).collect();
    let padj = params.correction.adjust(&pvalues);
    for (record, q) in records.iter_mut().zip(padj) {
        record.padj = q;
        record.significant = q < params.alpha && record.log_fold_change.abs() >= params.min_lfc;
    }

    ContrastResults {
        contrast: rc.contrast.clone(),
        records,
        alpha: params.alpha,
        min_lfc: params.min_lfc,
    }
}
