//! Normalization of feature measurements prior to testing

mod log_transform;
mod size_factors;

pub use log_transform::{log2_transform, log_cpm, median_center, normalize, NormalizationMethod};
pub use size_factors::{median_of_ratios, normalize_by_size_factors};
