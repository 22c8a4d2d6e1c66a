//! Sample metadata (disease subtype, treatment arm, timepoint, ...)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{OmicsError, Result};

/// Sample metadata containing categorical annotations
///
/// One row per sample; every column holds one value per sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleMetadata {
    /// Sample identifiers
    sample_ids: Vec<String>,
    /// Categorical columns (column name -> values for each sample)
    columns: BTreeMap<String, Vec<String>>,
}

impl SampleMetadata {
    /// Create new sample metadata; sample identifiers must be unique
    pub fn new(sample_ids: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::new();
        for id in &sample_ids {
            if !seen.insert(id.as_str()) {
                return Err(OmicsError::InvalidMetadata {
                    reason: format!("Duplicate sample ID '{}'", id),
                });
            }
        }
        Ok(Self {
            sample_ids,
            columns: BTreeMap::new(),
        })
    }

    /// Add a categorical column
    pub fn add_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.sample_ids.len() {
            return Err(OmicsError::DimensionMismatch {
                expected: format!("{} values", self.sample_ids.len()),
                got: format!("{} values", values.len()),
            });
        }
        self.columns.insert(name.to_string(), values);
        Ok(())
    }

    /// Check if a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Fail fast when any of `required` is absent
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        if required.iter().all(|c| self.has_column(c)) {
            return Ok(());
        }
        let available: Vec<String> = self.columns.keys().cloned().collect();
        Err(OmicsError::schema_mismatch("sample metadata", required, &available))
    }

    /// Get the value of a column for a specific sample
    pub fn get_value(&self, column: &str, sample_idx: usize) -> Result<&str> {
        self.columns
            .get(column)
            .and_then(|v| v.get(sample_idx))
            .map(|s| s.as_str())
            .ok_or_else(|| OmicsError::InvalidInput {
                reason: format!(
                    "column '{}' or sample index {} not found",
                    column, sample_idx
                ),
            })
    }

    /// Get sample IDs
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get number of samples
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Get sample index by ID
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_ids.iter().position(|id| id == sample_id)
    }

    /// Get values for a specific column
    pub fn column(&self, name: &str) -> Option<&Vec<String>> {
        self.columns.get(name)
    }

    /// Get all column names (sorted)
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|s| s.as_str()).collect()
    }

    /// Get unique levels for a column (sorted)
    pub fn levels(&self, column: &str) -> Result<Vec<String>> {
        self.require_columns(&[column])?;
        let mut unique: Vec<String> = self.columns[column].to_vec();
        unique.sort();
        unique.dedup();
        Ok(unique)
    }

    /// Get sample indices for a specific column level
    pub fn samples_with_level(&self, column: &str, level: &str) -> Vec<usize> {
        self.columns
            .get(column)
            .map(|values| {
                values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.as_str() == level)
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Keep only the samples whose `column` equals `value`
    pub fn filter(&self, column: &str, value: &str) -> Result<Self> {
        self.require_columns(&[column])?;
        let keep = self.samples_with_level(column, value);
        if keep.is_empty() {
            return Err(OmicsError::EmptyData {
                reason: format!("No samples with {} = '{}'", column, value),
            });
        }
        self.subset(&keep)
    }

    /// Subset metadata to specific samples
    pub fn subset(&self, sample_indices: &[usize]) -> Result<Self> {
        let new_ids: Vec<String> = sample_indices
            .iter()
            .map(|&i| self.sample_ids[i].clone())
            .collect();

        let mut new_meta = SampleMetadata::new(new_ids)?;

        for (name, values) in &self.columns {
            let new_values: Vec<String> = sample_indices
                .iter()
                .map(|&i| values[i].clone())
                .collect();
            new_meta.add_column(name, new_values)?;
        }

        Ok(new_meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> SampleMetadata {
        let mut meta = SampleMetadata::new(vec![
            "s1".to_string(),
            "s2".to_string(),
            "s3".to_string(),
            "s4".to_string(),
        ])
        .unwrap();
        meta.add_column(
            "subtype",
            vec![
                "luminal".to_string(),
                "basal".to_string(),
                "luminal".to_string(),
                "basal".to_string(),
            ],
        )
        .unwrap();
        meta.add_column(
            "timepoint",
            vec![
                "T0".to_string(),
                "T0".to_string(),
                "T1".to_string(),
                "T1".to_string(),
            ],
        )
        .unwrap();
        meta
    }

    #[test]
    fn test_levels_and_samples() {
        let meta = example();
        assert_eq!(meta.levels("subtype").unwrap(), vec!["basal", "luminal"]);
        assert_eq!(meta.samples_with_level("subtype", "luminal"), vec![0, 2]);
    }

    #[test]
    fn test_require_columns_schema_mismatch() {
        let meta = example();
        assert!(meta.require_columns(&["subtype", "timepoint"]).is_ok());
        let err = meta.require_columns(&["treatment"]).unwrap_err();
        assert!(matches!(err, OmicsError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_filter_by_value() {
        let meta = example();
        let t1 = meta.filter("timepoint", "T1").unwrap();
        assert_eq!(t1.sample_ids(), &["s3".to_string(), "s4".to_string()]);
        assert_eq!(t1.get_value("subtype", 0).unwrap(), "luminal");
        assert!(meta.filter("timepoint", "T9").is_err());
    }

    #[test]
    fn test_duplicate_sample_ids_rejected() {
        assert!(SampleMetadata::new(vec!["a".to_string(), "a".to_string()]).is_err());
    }
}
