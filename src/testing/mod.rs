//! Statistical testing for differential abundance between sample groups

mod comparator;
mod fdr;
mod pvalue;
mod two_sample;

pub use comparator::{
    compare, compare_contrast, resolve_contrasts, ComparatorParams, ResolvedContrast,
    MIN_GROUP_SIZE,
};
pub use fdr::{benjamini_hochberg, bonferroni, Correction};
pub use pvalue::{normal_pvalue, t_pvalue};
pub use two_sample::{mann_whitney_u, student_t_test, welch_t_test, TestMethod, TestOutcome};
