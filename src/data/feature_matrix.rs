//! Feature measurement matrix for omics data

use std::collections::{HashMap, HashSet};

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{OmicsError, Result};

/// A feature measurement matrix (genes or proteins x samples)
///
/// Values are counts or intensities. Missing observations are stored as NaN
/// and are excluded per test rather than dropping the whole feature.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    /// Measurement data (features x samples)
    values: Array2<f64>,
    /// Feature identifiers (may contain duplicates until deduplicated)
    feature_ids: Vec<String>,
    /// Sample identifiers (unique)
    sample_ids: Vec<String>,
}

impl FeatureMatrix {
    /// Create a new feature matrix from raw data
    pub fn new(
        values: Array2<f64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (n_features, n_samples) = values.dim();

        if feature_ids.len() != n_features {
            return Err(OmicsError::DimensionMismatch {
                expected: format!("{} feature IDs", n_features),
                got: format!("{} feature IDs", feature_ids.len()),
            });
        }

        if sample_ids.len() != n_samples {
            return Err(OmicsError::DimensionMismatch {
                expected: format!("{} sample IDs", n_samples),
                got: format!("{} sample IDs", sample_ids.len()),
            });
        }

        if values.iter().any(|x| x.is_infinite()) {
            return Err(OmicsError::InvalidMatrix {
                reason: "Measurements must be finite or missing (NA)".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for id in &sample_ids {
            if !seen.insert(id.as_str()) {
                return Err(OmicsError::InvalidMatrix {
                    reason: format!("Duplicate sample ID '{}' in matrix columns", id),
                });
            }
        }

        Ok(Self {
            values,
            feature_ids,
            sample_ids,
        })
    }

    /// Get the number of features
    pub fn n_features(&self) -> usize {
        self.values.nrows()
    }

    /// Get the number of samples
    pub fn n_samples(&self) -> usize {
        self.values.ncols()
    }

    /// Get the values as a view
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Get feature IDs
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Get sample IDs
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get values for a specific feature
    pub fn feature_values(&self, feature_idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(feature_idx)
    }

    /// Get values for a specific sample
    pub fn sample_values(&self, sample_idx: usize) -> ArrayView1<'_, f64> {
        self.values.column(sample_idx)
    }

    /// Get feature index by ID (first occurrence)
    pub fn feature_index(&self, feature_id: &str) -> Option<usize> {
        self.feature_ids.iter().position(|id| id == feature_id)
    }

    /// Get sample index by ID
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_ids.iter().position(|id| id == sample_id)
    }

    /// Whether any feature identifier occurs more than once
    pub fn has_duplicate_features(&self) -> bool {
        let mut seen = HashSet::new();
        self.feature_ids.iter().any(|id| !seen.insert(id.as_str()))
    }

    /// Fraction of missing cells in the matrix
    pub fn missing_fraction(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let missing = self.values.iter().filter(|x| x.is_nan()).count();
        missing as f64 / self.values.len() as f64
    }

    /// Collapse duplicated feature rows into one row per identifier.
    ///
    /// Each cell is the mean of the non-missing values of the duplicate rows
    /// (NaN if every duplicate is missing in that sample). Rows keep the order
    /// of first occurrence.
    pub fn deduplicate_features(&self) -> Result<Self> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, id) in self.feature_ids.iter().enumerate() {
            let rows = groups.entry(id.as_str()).or_insert_with(|| {
                order.push(id.clone());
                Vec::new()
            });
            rows.push(i);
        }

        if order.len() == self.n_features() {
            return Ok(self.clone());
        }

        let n_samples = self.n_samples();
        let mut collapsed = Array2::from_elem((order.len(), n_samples), f64::NAN);
        let mut n_merged = 0usize;

        for (new_i, id) in order.iter().enumerate() {
            let rows = &groups[id.as_str()];
            if rows.len() > 1 {
                n_merged += rows.len() - 1;
            }
            for j in 0..n_samples {
                let (sum, n) = rows
                    .iter()
                    .map(|&r| self.values[[r, j]])
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                if n > 0 {
                    collapsed[[new_i, j]] = sum / n as f64;
                }
            }
        }

        log::info!(
            "Averaged {} duplicate feature rows ({} -> {} features)",
            n_merged,
            self.n_features(),
            order.len()
        );

        Self::new(collapsed, order, self.sample_ids.clone())
    }

    /// Keep features detected (`value > min_value`) in at least `min_samples` samples
    pub fn filter_low_detection(&self, min_value: f64, min_samples: usize) -> Result<Self> {
        let keep: Vec<usize> = (0..self.n_features())
            .filter(|&i| {
                let detected = self
                    .values
                    .row(i)
                    .iter()
                    .filter(|&&x| !x.is_nan() && x > min_value)
                    .count();
                detected >= min_samples
            })
            .collect();

        if keep.is_empty() {
            return Err(OmicsError::EmptyData {
                reason: format!(
                    "No features detected above {} in at least {} samples",
                    min_value, min_samples
                ),
            });
        }

        log::info!(
            "Detection filter kept {} of {} features (value > {}, >= {} samples)",
            keep.len(),
            self.n_features(),
            min_value,
            min_samples
        );

        self.subset_features(&keep)
    }

    /// Subset to specific samples
    pub fn subset_samples(&self, sample_indices: &[usize]) -> Result<Self> {
        let new_values = self.values.select(Axis(1), sample_indices);
        let new_sample_ids: Vec<String> = sample_indices
            .iter()
            .map(|&i| self.sample_ids[i].clone())
            .collect();

        Self::new(new_values, self.feature_ids.clone(), new_sample_ids)
    }

    /// Subset to specific features
    pub fn subset_features(&self, feature_indices: &[usize]) -> Result<Self> {
        let new_values = self.values.select(Axis(0), feature_indices);
        let new_feature_ids: Vec<String> = feature_indices
            .iter()
            .map(|&i| self.feature_ids[i].clone())
            .collect();

        Self::new(new_values, new_feature_ids, self.sample_ids.clone())
    }

    /// Replace the values, keeping identifiers
    pub fn with_values(&self, values: Array2<f64>) -> Result<Self> {
        Self::new(values, self.feature_ids.clone(), self.sample_ids.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn test_feature_matrix_creation() {
        let values = array![[10.0, 20.0, 30.0], [5.0, f64::NAN, 25.0]];
        let matrix = FeatureMatrix::new(values, ids("g", 2), ids("s", 3)).unwrap();
        assert_eq!(matrix.n_features(), 2);
        assert_eq!(matrix.n_samples(), 3);
        assert!((matrix.missing_fraction() - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_infinite_values_rejected() {
        let values = array![[10.0, f64::INFINITY], [5.0, 15.0]];
        assert!(FeatureMatrix::new(values, ids("g", 2), ids("s", 2)).is_err());
    }

    #[test]
    fn test_duplicate_samples_rejected() {
        let values = array![[1.0, 2.0]];
        let samples = vec!["s1".to_string(), "s1".to_string()];
        assert!(FeatureMatrix::new(values, ids("g", 1), samples).is_err());
    }

    #[test]
    fn test_deduplicate_averages_rows() {
        let values = array![
            [10.0, 20.0, 30.0],
            [5.0, 5.0, 5.0],
            [20.0, 40.0, f64::NAN],
            [30.0, 60.0, f64::NAN],
        ];
        let features = vec![
            "TP53".to_string(),
            "MYC".to_string(),
            "TP53".to_string(),
            "TP53".to_string(),
        ];
        let matrix = FeatureMatrix::new(values, features, ids("s", 3)).unwrap();
        assert!(matrix.has_duplicate_features());

        let dedup = matrix.deduplicate_features().unwrap();
        assert_eq!(dedup.feature_ids(), &["TP53".to_string(), "MYC".to_string()]);
        assert!(!dedup.has_duplicate_features());

        let tp53 = dedup.feature_values(0);
        assert!((tp53[0] - 20.0).abs() < 1e-12);
        assert!((tp53[1] - 40.0).abs() < 1e-12);
        // only one non-missing duplicate in the last sample
        assert!((tp53[2] - 30.0).abs() < 1e-12);
        assert_eq!(dedup.feature_values(1)[0], 5.0);
    }

    #[test]
    fn test_deduplicate_all_missing_stays_missing() {
        let values = array![[f64::NAN, 1.0], [f64::NAN, 3.0]];
        let features = vec!["A".to_string(), "A".to_string()];
        let dedup = FeatureMatrix::new(values, features, ids("s", 2))
            .unwrap()
            .deduplicate_features()
            .unwrap();
        assert_eq!(dedup.n_features(), 1);
        assert!(dedup.feature_values(0)[0].is_nan());
        assert_eq!(dedup.feature_values(0)[1], 2.0);
    }

    #[test]
    fn test_filter_low_detection() {
        let values = array![
            [0.0, 0.0, 1.0, 0.0],
            [10.0, 12.0, 11.0, 9.0],
            [f64::NAN, 5.0, 6.0, f64::NAN],
        ];
        let matrix = FeatureMatrix::new(values, ids("g", 3), ids("s", 4)).unwrap();
        let filtered = matrix.filter_low_detection(0.0, 2).unwrap();
        assert_eq!(filtered.feature_ids(), &["g2".to_string(), "g3".to_string()]);

        assert!(matrix.filter_low_detection(100.0, 1).is_err());
    }
}
