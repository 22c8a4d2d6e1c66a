//! Size factor estimation using the median of ratios method

use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{OmicsError, Result};
use crate::stats;

/// Median-of-ratios size factors, one per sample
///
/// Reference features are those observed and positive in every sample; each
/// sample's factor is the median ratio of its values to the features'
/// geometric means.
pub fn median_of_ratios(values: ArrayView2<f64>) -> Result<Vec<f64>> {
    let (n_features, n_samples) = values.dim();

    if n_features == 0 || n_samples == 0 {
        return Err(OmicsError::EmptyData {
            reason: "Feature matrix is empty".to_string(),
        });
    }

    // Geometric mean of each fully positive feature
    let mut reference: Vec<(usize, f64)> = Vec::new();
    for (i, row) in values.axis_iter(Axis(0)).enumerate() {
        if row.iter().all(|&x| x > 0.0) {
            let log_sum: f64 = row.iter().map(|&x| x.ln()).sum();
            reference.push((i, (log_sum / n_samples as f64).exp()));
        }
    }

    if reference.is_empty() {
        return Err(OmicsError::InvalidInput {
            reason: "No features with positive values in every sample; \
                     median-of-ratios normalization is not applicable"
                .to_string(),
        });
    }

    let mut size_factors = Vec::with_capacity(n_samples);
    for j in 0..n_samples {
        let ratios: Vec<f64> = reference
            .iter()
            .map(|&(i, geo_mean)| values[[i, j]] / geo_mean)
            .collect();
        size_factors.push(stats::median(&ratios));
    }

    if size_factors.iter().any(|&x| x <= 0.0 || !x.is_finite()) {
        return Err(OmicsError::InvalidInput {
            reason: "Invalid size factors computed".to_string(),
        });
    }

    Ok(size_factors)
}

/// Divide each sample column by its size factor
pub fn normalize_by_size_factors(values: ArrayView2<f64>, size_factors: &[f64]) -> Result<Array2<f64>> {
    if size_factors.len() != values.ncols() {
        return Err(OmicsError::DimensionMismatch {
            expected: format!("{} size factors", values.ncols()),
            got: format!("{} size factors", size_factors.len()),
        });
    }
    let mut result = values.to_owned();
    for (mut col, &sf) in result.axis_iter_mut(Axis(1)).zip(size_factors.iter()) {
        col.mapv_inplace(|x| x / sf);
    }
    Ok(result)
}
