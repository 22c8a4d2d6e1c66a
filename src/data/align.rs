//! Align a feature matrix with its sample metadata
//!
//! The analysis sample set is the explicit intersection of the matrix columns
//! and the metadata rows. Samples present on only one side are dropped with a
//! warning rather than failing the run.

use super::{FeatureMatrix, SampleMetadata};
use crate::error::{OmicsError, Result};

/// A feature matrix and metadata restricted to the same samples, in the same order
#[derive(Debug, Clone)]
pub struct AlignedDataset {
    matrix: FeatureMatrix,
    metadata: SampleMetadata,
}

impl AlignedDataset {
    /// The aligned feature matrix
    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    /// The aligned sample metadata
    pub fn metadata(&self) -> &SampleMetadata {
        &self.metadata
    }

    /// Number of aligned samples
    pub fn n_samples(&self) -> usize {
        self.matrix.n_samples()
    }

    /// Replace the matrix (e.g. after filtering or normalization), keeping the samples
    pub fn with_matrix(&self, matrix: FeatureMatrix) -> Result<Self> {
        if matrix.sample_ids() != self.matrix.sample_ids() {
            return Err(OmicsError::DimensionMismatch {
                expected: format!("samples {:?}", self.matrix.sample_ids()),
                got: format!("samples {:?}", matrix.sample_ids()),
            });
        }
        Ok(Self {
            matrix,
            metadata: self.metadata.clone(),
        })
    }

    /// Keep only samples whose metadata `column` equals `value`
    pub fn restrict(&self, column: &str, value: &str) -> Result<Self> {
        let metadata = self.metadata.filter(column, value)?;
        align_samples(&self.matrix, &metadata)
    }

    /// Split back into parts
    pub fn into_parts(self) -> (FeatureMatrix, SampleMetadata) {
        (self.matrix, self.metadata)
    }
}

/// Intersect matrix columns with metadata rows, ordered as the matrix columns
pub fn align_samples(matrix: &FeatureMatrix, metadata: &SampleMetadata) -> Result<AlignedDataset> {
    let mut matrix_idx = Vec::new();
    let mut meta_idx = Vec::new();
    let mut missing_in_meta: Vec<&str> = Vec::new();

    for (j, id) in matrix.sample_ids().iter().enumerate() {
        match metadata.sample_index(id) {
            Some(m) => {
                matrix_idx.push(j);
                meta_idx.push(m);
            }
            None => missing_in_meta.push(id.as_str()),
        }
    }

    let missing_in_matrix: Vec<&str> = metadata
        .sample_ids()
        .iter()
        .filter(|id| matrix.sample_index(id).is_none())
        .map(|s| s.as_str())
        .collect();

    if !missing_in_meta.is_empty() {
        log::warn!(
            "{} sample(s) in matrix but not metadata, dropped: {:?}",
            missing_in_meta.len(),
            missing_in_meta
        );
    }
    if !missing_in_matrix.is_empty() {
        log::warn!(
            "{} sample(s) in metadata but not matrix, dropped: {:?}",
            missing_in_matrix.len(),
            missing_in_matrix
        );
    }

    if matrix_idx.is_empty() {
        return Err(OmicsError::InvalidMetadata {
            reason: "No sample IDs shared between feature matrix and metadata".to_string(),
        });
    }

    let matrix = if matrix_idx.len() == matrix.n_samples() {
        matrix.clone()
    } else {
        matrix.subset_samples(&matrix_idx)?
    };
    let metadata = metadata.subset(&meta_idx)?;

    log::info!("Aligned {} samples between matrix and metadata", matrix_idx.len());

    Ok(AlignedDataset { matrix, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn inputs() -> (FeatureMatrix, SampleMetadata) {
        let matrix = FeatureMatrix::new(
            array![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]],
            strings(&["g1", "g2"]),
            strings(&["s1", "s2", "s3", "s4"]),
        )
        .unwrap();
        let mut meta = SampleMetadata::new(strings(&["s4", "s2", "s9", "s1"])).unwrap();
        meta.add_column("arm", strings(&["drug", "placebo", "drug", "placebo"]))
            .unwrap();
        (matrix, meta)
    }

    #[test]
    fn test_alignment_is_intersection_in_matrix_order() {
        let (matrix, meta) = inputs();
        let aligned = align_samples(&matrix, &meta).unwrap();
        assert_eq!(aligned.matrix().sample_ids(), &strings(&["s1", "s2", "s4"])[..]);
        assert_eq!(aligned.metadata().sample_ids(), aligned.matrix().sample_ids());
        assert_eq!(aligned.metadata().get_value("arm", 2).unwrap(), "drug");
        assert_eq!(aligned.matrix().feature_values(1)[2], 8.0);
    }

    #[test]
    fn test_alignment_is_idempotent() {
        let (matrix, meta) = inputs();
        let once = align_samples(&matrix, &meta).unwrap();
        let twice = align_samples(once.matrix(), once.metadata()).unwrap();
        assert_eq!(once.matrix().sample_ids(), twice.matrix().sample_ids());
        assert_eq!(once.metadata().sample_ids(), twice.metadata().sample_ids());
        assert_eq!(once.matrix().values(), twice.matrix().values());
    }

    #[test]
    fn test_disjoint_samples_error() {
        let (matrix, _) = inputs();
        let meta = SampleMetadata::new(strings(&["x1", "x2"])).unwrap();
        assert!(align_samples(&matrix, &meta).is_err());
    }

    #[test]
    fn test_restrict_by_column() {
        let (matrix, meta) = inputs();
        let aligned = align_samples(&matrix, &meta).unwrap();
        let drug = aligned.restrict("arm", "drug").unwrap();
        assert_eq!(drug.matrix().sample_ids(), &strings(&["s4"])[..]);
    }
}
