//! omics_compare: group comparisons for cancer omics tables
//!
//! Turns a feature x sample measurement table and its sample metadata into
//! differential results per contrast, gene set over-representation of the
//! up- and down-regulated features, and cross-modality correlation of two
//! differential tables.
//!
//! # Example
//!
//! ```ignore
//! use omics_compare::prelude::*;
//!
//! let matrix = read_feature_matrix("rna.tsv")?;
//! let metadata = read_metadata("samples.tsv")?;
//!
//! let mut config = AnalysisConfig::default();
//! config.group_column = "subtype".to_string();
//!
//! let output = run_comparison(&matrix, &metadata, &config)?;
//! for results in &output.report.results {
//!     println!("{}", results.summary());
//! }
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod enrichment;
pub mod error;
pub mod integration;
pub mod io;
pub mod normalization;
pub mod stats;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AnalysisConfig, DetectionFilter, SampleSubset};
    pub use crate::data::{align_samples, AlignedDataset, FeatureMatrix, SampleMetadata, SamplePartition};
    pub use crate::enrichment::{
        enrich_contrast, resolve_catalog, Direction, EnrichmentParams, EnrichmentRecord,
        GeneSetCatalog, GeneSetSource,
    };
    pub use crate::error::{OmicsError, Result};
    pub use crate::integration::{
        align_tables, correlate_by_contrast, correlate_by_gene_set, AlignedPair,
        CorrelationMethod, CorrelationRecord, CorrelationStrength, StrengthThresholds,
    };
    pub use crate::io::{
        read_differential_table, read_feature_matrix, read_metadata, ComparisonReport, Contrast,
        ContrastResults, ContrastSpec, DifferentialRecord, OutputNaming, SkippedContrast,
    };
    pub use crate::normalization::{normalize, NormalizationMethod};
    pub use crate::testing::{compare, ComparatorParams, Correction, TestMethod};
    pub use crate::{prepare_dataset, run_comparison, run_integration};
}

use prelude::*;

/// Everything produced by one comparison run
#[derive(Debug, Clone)]
pub struct ComparisonOutput {
    /// Deduplicated, filtered and normalized data the tests ran on
    pub dataset: AlignedDataset,
    pub report: ComparisonReport,
    pub enrichment: Vec<EnrichmentRecord>,
    pub gene_set_source: GeneSetSource,
}

/// Everything produced by one integration run
#[derive(Debug, Clone)]
pub struct IntegrationOutput {
    pub pairs: Vec<AlignedPair>,
    pub by_contrast: Vec<CorrelationRecord>,
    pub by_gene_set: Vec<CorrelationRecord>,
}

/// Align, optionally restrict, deduplicate, filter and normalize
pub fn prepare_dataset(
    matrix: &FeatureMatrix,
    metadata: &SampleMetadata,
    config: &AnalysisConfig,
) -> Result<AlignedDataset> {
    metadata.require_columns(&[config.group_column.as_str()])?;

    let mut dataset = align_samples(matrix, metadata)?;
    if let Some(subset) = &config.subset {
        dataset = dataset.restrict(&subset.column, &subset.value)?;
        log::info!(
            "Restricted to {} samples with {} = {}",
            dataset.n_samples(),
            subset.column,
            subset.value
        );
    }

    // Duplicates are averaged before detection is counted
    let deduplicated = dataset.matrix().deduplicate_features()?;
    let filtered =
        deduplicated.filter_low_detection(config.detection_threshold(), config.filter.min_samples)?;
    let normalized = normalize(&filtered, config.normalization)?;
    log::info!(
        "Prepared {} features x {} samples ({:?})",
        normalized.n_features(),
        normalized.n_samples(),
        config.normalization
    );

    dataset.with_matrix(normalized)
}

/// Run the comparison pipeline: prepare, compare every contrast, enrich
pub fn run_comparison(
    matrix: &FeatureMatrix,
    metadata: &SampleMetadata,
    config: &AnalysisConfig,
) -> Result<ComparisonOutput> {
    config.validate()?;
    let dataset = prepare_dataset(matrix, metadata, config)?;
    let partition = SamplePartition::from_metadata(dataset.metadata(), &config.group_column)?;
    log::info!(
        "Groups in '{}': {:?}",
        partition.variable(),
        partition.group_sizes()
    );

    let report = compare(
        dataset.matrix(),
        &partition,
        &config.contrasts,
        &config.comparator,
    )?;

    let catalog = resolve_catalog(config.gene_sets.as_deref())?;
    let universe = dataset.matrix().feature_ids().to_vec();
    let mut enrichment = Vec::new();
    for results in &report.results {
        enrichment.extend(enrich_contrast(
            results,
            &universe,
            &catalog,
            &config.enrichment,
        )?);
    }

    Ok(ComparisonOutput {
        dataset,
        report,
        enrichment,
        gene_set_source: catalog.source().clone(),
    })
}

/// Align two differential tables and correlate their fold changes
pub fn run_integration(
    left: &[DifferentialRecord],
    right: &[DifferentialRecord],
    config: &AnalysisConfig,
) -> Result<IntegrationOutput> {
    let pairs = align_tables(left, right);
    if pairs.is_empty() {
        log::warn!("No features shared between the two differential tables");
    }
    let by_contrast = correlate_by_contrast(&pairs, config.correlation, &config.strength)?;
    let catalog = resolve_catalog(config.gene_sets.as_deref())?;
    let by_gene_set =
        correlate_by_gene_set(&pairs, &catalog, config.correlation, &config.strength)?;

    Ok(IntegrationOutput {
        pairs,
        by_contrast,
        by_gene_set,
    })
}
