//! Cross-modality integration of differential results

mod align;
mod correlation;

pub use align::{align_tables, AlignedPair, Concordance};
pub use correlation::{
    correlate_by_contrast, correlate_by_gene_set, correlation_pvalue, pearson,
    CorrelationMethod, CorrelationRecord, CorrelationStrength, StrengthThresholds, ALL_FEATURES,
    MIN_PAIRS,
};
