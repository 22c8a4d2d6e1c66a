//! Input/output for matrices, metadata and result tables

mod csv;
mod export;
pub mod na_float;
mod results;

pub(crate) use self::csv::open_reader;
pub use self::csv::{
    ensure_exists, read_differential_table, read_feature_matrix, read_metadata, write_matrix,
    write_table, DIFFERENTIAL_COLUMNS,
};
pub use export::{
    write_aligned_pairs, write_correlation_table, write_differential_table,
    write_enrichment_table, write_skipped, write_volcano, OutputNaming,
};
pub use results::{
    ComparisonReport, Contrast, ContrastResults, ContrastSpec, DifferentialRecord,
    ResultsSummary, SkippedContrast, VolcanoPoint,
};
