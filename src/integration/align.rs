//! Join two differential tables on contrast and feature

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::io::DifferentialRecord;

/// Agreement of the two modalities for one feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concordance {
    BothUp,
    BothDown,
    Opposite,
    /// Neither side significant, or a zero fold change on a significant pair
    Unchanged,
}

impl Concordance {
    /// Classify a pair; directions only count when at least one side is significant
    pub fn classify(left: &DifferentialRecord, right: &DifferentialRecord) -> Self {
        if !left.significant && !right.significant {
            return Concordance::Unchanged;
        }
        let (l, r) = (left.log_fold_change, right.log_fold_change);
        if l > 0.0 && r > 0.0 {
            Concordance::BothUp
        } else if l < 0.0 && r < 0.0 {
            Concordance::BothDown
        } else if l * r < 0.0 {
            Concordance::Opposite
        } else {
            Concordance::Unchanged
        }
    }
}

/// One feature measured in both modalities for the same contrast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPair {
    pub contrast: String,
    pub feature_id: String,
    pub left_lfc: f64,
    pub right_lfc: f64,
    #[serde(with = "crate::io::na_float")]
    pub left_padj: f64,
    #[serde(with = "crate::io::na_float")]
    pub right_padj: f64,
    pub concordance: Concordance,
}

/// Join `left` and `right` on `(contrast, feature_id)`
///
/// Only pairs with a finite fold change on both sides are kept. Output
/// follows the order of `left`; a key repeated in `right` uses its first row.
pub fn align_tables(left: &[DifferentialRecord], right: &[DifferentialRecord]) -> Vec<AlignedPair> {
    let mut index: HashMap<(&str, &str), &DifferentialRecord> = HashMap::with_capacity(right.len());
    for record in right {
        index
            .entry((record.contrast.as_str(), record.feature_id.as_str()))
            .or_insert(record);
    }

    let mut unmatched = 0usize;
    let pairs: Vec<AlignedPair> = left
        .iter()
        .filter_map(|l| {
            let Some(r) = index.get(&(l.contrast.as_str(), l.feature_id.as_str())) else {
                unmatched += 1;
                return None;
            };
            if !l.log_fold_change.is_finite() || !r.log_fold_change.is_finite() {
                return None;
            }
            Some(AlignedPair {
                contrast: l.contrast.clone(),
                feature_id: l.feature_id.clone(),
                left_lfc: l.log_fold_change,
                right_lfc: r.log_fold_change,
                left_padj: l.padj,
                right_padj: r.padj,
                concordance: Concordance::classify(l, r),
            })
        })
        .collect();

    log::info!(
        "Aligned {} feature pairs ({} of {} left records had no partner)",
        pairs.len(),
        unmatched,
        left.len()
    );
    pairs
}
