//! Log-scale normalizations
//!
//! Provides plain log2, log counts-per-million, median-of-ratios log and
//! log2 with per-sample median centering. Missing values stay missing.

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::size_factors::{median_of_ratios, normalize_by_size_factors};
use crate::data::FeatureMatrix;
use crate::error::{OmicsError, Result};
use crate::stats;

/// Normalization applied before differential testing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// Values are already on a log scale
    None,
    /// log2(x + pseudocount), for intensities
    Log2 { pseudocount: f64 },
    /// log2(counts-per-million + pseudocount), for library-size differences
    LogCpm { pseudocount: f64 },
    /// log2(counts / median-of-ratios size factor + pseudocount)
    LogMedianRatio { pseudocount: f64 },
    /// log2(x + pseudocount) with each sample's median subtracted
    Log2MedianCentered { pseudocount: f64 },
}

impl Default for NormalizationMethod {
    fn default() -> Self {
        NormalizationMethod::LogCpm { pseudocount: 1.0 }
    }
}

impl NormalizationMethod {
    /// Parse a method name, using `pseudocount` where the method takes one
    pub fn from_name(name: &str, pseudocount: f64) -> Result<Self> {
        match name {
            "none" => Ok(NormalizationMethod::None),
            "log2" => Ok(NormalizationMethod::Log2 { pseudocount }),
            "logcpm" | "log_cpm" => Ok(NormalizationMethod::LogCpm { pseudocount }),
            "ratio" | "log_median_ratio" => Ok(NormalizationMethod::LogMedianRatio { pseudocount }),
            "median_centered" | "log2_median_centered" => {
                Ok(NormalizationMethod::Log2MedianCentered { pseudocount })
            }
            other => Err(OmicsError::InvalidInput {
                reason: format!(
                    "Unknown normalization '{}'. Use: none, log2, logcpm, ratio, median_centered",
                    other
                ),
            }),
        }
    }
}

/// Normalize a matrix with the given method, returning a new matrix
pub fn normalize(matrix: &FeatureMatrix, method: NormalizationMethod) -> Result<FeatureMatrix> {
    let values = matrix.values();
    let normalized = match method {
        NormalizationMethod::None => return Ok(matrix.clone()),
        NormalizationMethod::Log2 { pseudocount } => log2_transform(values, pseudocount)?,
        NormalizationMethod::LogCpm { pseudocount } => log_cpm(values, pseudocount)?,
        NormalizationMethod::LogMedianRatio { pseudocount } => {
            let size_factors = median_of_ratios(values)?;
            log::debug!("Size factors: {:?}", size_factors);
            let scaled = normalize_by_size_factors(values, &size_factors)?;
            log2_transform(scaled.view(), pseudocount)?
        }
        NormalizationMethod::Log2MedianCentered { pseudocount } => {
            let logged = log2_transform(values, pseudocount)?;
            median_center(logged.view())
        }
    };
    log::info!("Applied {:?} normalization", method);
    matrix.with_values(normalized)
}

fn check_non_negative(values: ArrayView2<f64>) -> Result<()> {
    if values.iter().any(|&x| x < 0.0) {
        return Err(OmicsError::InvalidInput {
            reason: "Log normalization requires non-negative values".to_string(),
        });
    }
    Ok(())
}

/// log2(x + pseudocount)
pub fn log2_transform(values: ArrayView2<f64>, pseudocount: f64) -> Result<Array2<f64>> {
    check_non_negative(values)?;
    if pseudocount <= 0.0 && values.iter().any(|&x| x == 0.0) {
        return Err(OmicsError::InvalidInput {
            reason: "Zero values require a positive pseudocount".to_string(),
        });
    }
    Ok(values.mapv(|x| (x + pseudocount).log2()))
}

/// log2(counts-per-million + pseudocount)
///
/// Library sizes are the sums of the non-missing values of each sample.
pub fn log_cpm(values: ArrayView2<f64>, pseudocount: f64) -> Result<Array2<f64>> {
    check_non_negative(values)?;
    let mut result = values.to_owned();
    for (j, mut col) in result.axis_iter_mut(Axis(1)).enumerate() {
        let lib_size: f64 = col.iter().filter(|x| !x.is_nan()).sum();
        if lib_size <= 0.0 {
            return Err(OmicsError::InvalidInput {
                reason: format!("Sample {} has zero total measurement", j),
            });
        }
        col.mapv_inplace(|x| (x * 1e6 / lib_size + pseudocount).log2());
    }
    Ok(result)
}

/// Subtract each sample's median of non-missing values
pub fn median_center(values: ArrayView2<f64>) -> Array2<f64> {
    let mut result = values.to_owned();
    for mut col in result.axis_iter_mut(Axis(1)) {
        let med = stats::median(&col.to_vec());
        if med.is_finite() {
            col.mapv_inplace(|x| x - med);
        }
    }
    result
}
