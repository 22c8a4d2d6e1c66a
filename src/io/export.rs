//! Output file naming and per-stage table writers

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use super::csv::write_table;
use super::results::{ComparisonReport, SkippedContrast};
use crate::enrichment::EnrichmentRecord;
use crate::error::{OmicsError, Result};
use crate::integration::{AlignedPair, CorrelationRecord};

/// Builds output paths of the form `<dir>/<prefix>_<stage>_<YYYYMMDD>.csv`
#[derive(Debug, Clone)]
pub struct OutputNaming {
    pub dir: PathBuf,
    pub prefix: String,
    pub run_date: NaiveDate,
}

impl OutputNaming {
    /// Naming stamped with today's local date
    pub fn today<P: AsRef<Path>>(dir: P, prefix: &str) -> Self {
        Self::with_date(dir, prefix, Local::now().date_naive())
    }

    pub fn with_date<P: AsRef<Path>>(dir: P, prefix: &str, run_date: NaiveDate) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.to_string(),
            run_date,
        }
    }

    /// Path for one stage's table
    pub fn path(&self, stage: &str) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}.csv",
            self.prefix,
            stage,
            self.run_date.format("%Y%m%d")
        ))
    }

    /// Create the output directory if needed
    pub fn ensure_dir(&self) -> Result<()> {
        if self.dir.exists() && !self.dir.is_dir() {
            return Err(OmicsError::InvalidInput {
                reason: format!("Output path {} is not a directory", self.dir.display()),
            });
        }
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }
}

/// Write every contrast's records into one table
pub fn write_differential_table<P: AsRef<Path>>(path: P, report: &ComparisonReport) -> Result<usize> {
    write_table(path, report.records())
}

/// Write the contrasts that could not be run, with their reasons
pub fn write_skipped<P: AsRef<Path>>(path: P, skipped: &[SkippedContrast]) -> Result<usize> {
    write_table(path, skipped)
}

/// Write volcano coordinates for every tested record of every contrast
pub fn write_volcano<P: AsRef<Path>>(path: P, report: &ComparisonReport) -> Result<usize> {
    let points: Vec<_> = report
        .results
        .iter()
        .flat_map(|r| r.volcano_points())
        .collect();
    write_table(path, &points)
}

pub fn write_enrichment_table<P: AsRef<Path>>(path: P, records: &[EnrichmentRecord]) -> Result<usize> {
    write_table(path, records)
}

pub fn write_correlation_table<P: AsRef<Path>>(
    path: P,
    records: &[CorrelationRecord],
) -> Result<usize> {
    write_table(path, records)
}

pub fn write_aligned_pairs<P: AsRef<Path>>(path: P, pairs: &[AlignedPair]) -> Result<usize> {
    write_table(path, pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::results::{Contrast, ContrastResults, DifferentialRecord};
    use tempfile::TempDir;

    #[test]
    fn test_output_name_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let naming = OutputNaming::with_date("/out", "brca", date);
        assert_eq!(
            naming.path("differential"),
            PathBuf::from("/out/brca_differential_20240307.csv")
        );
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let tmp = TempDir::new().unwrap();
        let naming = OutputNaming::today(tmp.path().join("a/b"), "run");
        naming.ensure_dir().unwrap();
        assert!(tmp.path().join("a/b").is_dir());
    }

    #[test]
    fn test_write_report_tables() {
        let tmp = TempDir::new().unwrap();
        let naming = OutputNaming::today(tmp.path(), "test");
        let report = ComparisonReport {
            results: vec![ContrastResults {
                contrast: Contrast::new("arm", "drug", "placebo"),
                records: vec![DifferentialRecord {
                    feature_id: "MYC".to_string(),
                    contrast: "arm:drug_vs_placebo".to_string(),
                    numerator: "drug".to_string(),
                    denominator: "placebo".to_string(),
                    mean_numerator: 8.0,
                    mean_denominator: 6.0,
                    n_numerator: 3,
                    n_denominator: 3,
                    log_fold_change: 2.0,
                    statistic: 7.1,
                    pvalue: 0.002,
                    padj: 0.004,
                    significant: true,
                }],
                alpha: 0.05,
                min_lfc: 0.0,
            }],
            skipped: vec![SkippedContrast {
                contrast: "arm:drug_vs_rest".to_string(),
                reason: "group 'drug' has 1 sample".to_string(),
            }],
        };

        assert_eq!(write_differential_table(naming.path("differential"), &report).unwrap(), 1);
        assert_eq!(write_volcano(naming.path("volcano"), &report).unwrap(), 1);
        assert_eq!(write_skipped(naming.path("skipped"), &report.skipped).unwrap(), 1);

        let skipped = std::fs::read_to_string(naming.path("skipped")).unwrap();
        assert!(skipped.starts_with("contrast,reason"));
        assert!(skipped.contains("arm:drug_vs_rest"));
    }
}
