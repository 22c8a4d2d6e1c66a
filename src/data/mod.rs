//! Data structures for omics comparisons

mod align;
mod feature_matrix;
mod metadata;
mod partition;

pub use align::{align_samples, AlignedDataset};
pub use feature_matrix::FeatureMatrix;
pub use metadata::SampleMetadata;
pub use partition::SamplePartition;
