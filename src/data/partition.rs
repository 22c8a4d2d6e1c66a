//! Partition samples into named groups from one metadata column

use std::collections::BTreeMap;

use super::SampleMetadata;
use crate::error::Result;
use crate::io::na_float::is_missing_marker;

/// Samples grouped by the levels of one metadata column (e.g. subtype)
#[derive(Debug, Clone)]
pub struct SamplePartition {
    variable: String,
    /// level -> sample indices (sorted by level)
    groups: BTreeMap<String, Vec<usize>>,
    /// Samples without a value for `variable`
    unassigned: Vec<usize>,
    n_samples: usize,
}

impl SamplePartition {
    /// Group the samples of `metadata` by `variable`
    ///
    /// Samples whose value is empty or a missing marker (`NA`, `NaN`, ...)
    /// belong to no group and are left out of every contrast.
    pub fn from_metadata(metadata: &SampleMetadata, variable: &str) -> Result<Self> {
        metadata.require_columns(&[variable])?;
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut unassigned = Vec::new();
        for i in 0..metadata.n_samples() {
            let level = metadata.get_value(variable, i)?.trim();
            if is_missing_marker(level) {
                unassigned.push(i);
                continue;
            }
            groups.entry(level.to_string()).or_default().push(i);
        }
        if !unassigned.is_empty() {
            let ids: Vec<&str> = unassigned
                .iter()
                .map(|&i| metadata.sample_ids()[i].as_str())
                .collect();
            log::warn!(
                "{} samples have no value for '{}' and are excluded from contrasts: {:?}",
                ids.len(),
                variable,
                ids
            );
        }
        Ok(Self {
            variable: variable.to_string(),
            groups,
            unassigned,
            n_samples: metadata.n_samples(),
        })
    }

    /// Metadata column the partition was built from
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Group levels, sorted
    pub fn levels(&self) -> Vec<&str> {
        self.groups.keys().map(|s| s.as_str()).collect()
    }

    /// Sample indices of one level
    pub fn samples(&self, level: &str) -> Option<&[usize]> {
        self.groups.get(level).map(|v| v.as_slice())
    }

    /// Sample indices of every level except `level`
    pub fn samples_except(&self, level: &str) -> Vec<usize> {
        let mut rest: Vec<usize> = self
            .groups
            .iter()
            .filter(|(l, _)| l.as_str() != level)
            .flat_map(|(_, idx)| idx.iter().copied())
            .collect();
        rest.sort_unstable();
        rest
    }

    /// Number of samples per level
    pub fn group_sizes(&self) -> Vec<(&str, usize)> {
        self.groups
            .iter()
            .map(|(l, idx)| (l.as_str(), idx.len()))
            .collect()
    }

    /// Samples left out because their group value is missing
    pub fn unassigned(&self) -> &[usize] {
        &self.unassigned
    }

    /// Number of samples the indices refer to, grouped or not
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_groups() {
        let mut meta = SampleMetadata::new(
            ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect(),
        )
        .unwrap();
        meta.add_column(
            "subtype",
            ["LumA", "Basal", "LumA", "Her2", "Basal"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();

        let partition = SamplePartition::from_metadata(&meta, "subtype").unwrap();
        assert_eq!(partition.levels(), vec!["Basal", "Her2", "LumA"]);
        assert_eq!(partition.samples("Basal").unwrap(), &[1, 4]);
        assert_eq!(partition.samples_except("Basal"), vec![0, 2, 3]);
        assert!(partition.samples("Normal").is_none());
        assert!(SamplePartition::from_metadata(&meta, "arm").is_err());
    }

    #[test]
    fn test_missing_group_values_left_out() {
        let mut meta =
            SampleMetadata::new((0..7).map(|i| format!("s{}", i)).collect()).unwrap();
        meta.add_column(
            "subtype",
            ["A", "A", "B", "B", "NA", "NA", ""]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();

        let partition = SamplePartition::from_metadata(&meta, "subtype").unwrap();
        assert_eq!(partition.levels(), vec!["A", "B"]);
        assert_eq!(partition.unassigned(), &[4, 5, 6]);
        assert_eq!(partition.samples_except("A"), vec![2, 3]);
        assert_eq!(partition.n_samples(), 7);
    }
}
