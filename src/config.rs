//! Run configuration, loadable from JSON and overridden by command-line flags

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::enrichment::EnrichmentParams;
use crate::error::{OmicsError, Result};
use crate::integration::{CorrelationMethod, StrengthThresholds};
use crate::io::ContrastSpec;
use crate::normalization::NormalizationMethod;
use crate::testing::ComparatorParams;

/// Low-detection filter settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionFilter {
    /// A value strictly above this counts as detected; unset means 0 for
    /// raw counts or intensities and any observed value for `none`
    pub min_value: Option<f64>,
    /// Minimum number of samples a feature must be detected in
    pub min_samples: usize,
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self {
            min_value: None,
            min_samples: 1,
        }
    }
}

impl DetectionFilter {
    /// Detection threshold for input that is about to get `normalization`
    ///
    /// The filter runs on the input scale, so values already on a log scale
    /// (`none`) may be negative and still detected.
    pub fn threshold(&self, normalization: NormalizationMethod) -> f64 {
        match (self.min_value, normalization) {
            (Some(v), _) => v,
            (None, NormalizationMethod::None) => f64::NEG_INFINITY,
            (None, _) => 0.0,
        }
    }
}

/// Optional restriction of the analysis to samples with one metadata value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSubset {
    pub column: String,
    pub value: String,
}

/// All settings of one analysis run; every field has a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Metadata column that defines the groups
    pub group_column: String,
    pub contrasts: Vec<ContrastSpec>,
    pub subset: Option<SampleSubset>,
    pub filter: DetectionFilter,
    pub normalization: NormalizationMethod,
    pub comparator: ComparatorParams,
    pub enrichment: EnrichmentParams,
    /// Gene set file; missing or absent means the embedded catalog
    pub gene_sets: Option<PathBuf>,
    pub correlation: CorrelationMethod,
    pub strength: StrengthThresholds,
    pub output_dir: PathBuf,
    pub prefix: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            group_column: "group".to_string(),
            contrasts: vec![ContrastSpec::AllPairs],
            subset: None,
            filter: DetectionFilter::default(),
            normalization: NormalizationMethod::default(),
            comparator: ComparatorParams::default(),
            enrichment: EnrichmentParams::default(),
            gene_sets: None,
            correlation: CorrelationMethod::default(),
            strength: StrengthThresholds::default(),
            output_dir: PathBuf::from("."),
            prefix: "omics".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Read a configuration file; absent fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        crate::io::ensure_exists(path)?;
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Detection threshold for this run's normalization
    pub fn detection_threshold(&self) -> f64 {
        self.filter.threshold(self.normalization)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.group_column.is_empty() {
            return Err(OmicsError::InvalidInput {
                reason: "group_column must not be empty".to_string(),
            });
        }
        if self.contrasts.is_empty() {
            return Err(OmicsError::InvalidContrast {
                reason: "At least one contrast is required".to_string(),
            });
        }
        if !(self.comparator.alpha > 0.0 && self.comparator.alpha < 1.0) {
            return Err(OmicsError::InvalidInput {
                reason: format!("alpha must be in (0, 1), got {}", self.comparator.alpha),
            });
        }
        if self.prefix.is_empty() || self.prefix.contains(std::path::MAIN_SEPARATOR) {
            return Err(OmicsError::InvalidInput {
                reason: format!("Invalid output prefix '{}'", self.prefix),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestMethod;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "group_column": "subtype",
                "contrasts": [{{"kind": "pair", "numerator": "Basal", "denominator": "LumA"}}],
                "comparator": {{"method": "wilcoxon", "alpha": 0.1}},
                "normalization": {{"method": "log2", "pseudocount": 0.5}}
            }}"#
        )
        .unwrap();

        let config = AnalysisConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.group_column, "subtype");
        assert_eq!(config.contrasts, vec![ContrastSpec::pair("Basal", "LumA")]);
        assert_eq!(config.comparator.method, TestMethod::Wilcoxon);
        assert_eq!(config.comparator.alpha, 0.1);
        assert_eq!(config.comparator.min_lfc, 0.0);
        assert_eq!(
            config.normalization,
            NormalizationMethod::Log2 { pseudocount: 0.5 }
        );
        assert_eq!(config.enrichment.min_overlap, 5);
        assert_eq!(config.prefix, "omics");
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"comparator": {{"alpha": 1.5}}}}"#).unwrap();
        assert!(AnalysisConfig::from_json_file(file.path()).is_err());
    }

    #[test]
    fn test_detection_threshold_follows_input_scale() {
        let filter = DetectionFilter::default();
        assert_eq!(filter.threshold(NormalizationMethod::default()), 0.0);
        assert_eq!(
            filter.threshold(NormalizationMethod::None),
            f64::NEG_INFINITY
        );
        let explicit = DetectionFilter {
            min_value: Some(-2.0),
            min_samples: 1,
        };
        assert_eq!(explicit.threshold(NormalizationMethod::None), -2.0);
    }

    #[test]
    fn test_missing_config_names_path() {
        assert!(matches!(
            AnalysisConfig::from_json_file("/nonexistent/config.json"),
            Err(OmicsError::MissingInput { .. })
        ));
    }
}
