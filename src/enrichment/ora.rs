//! Over-representation analysis with the hypergeometric test
//!
//! For each gene set and each direction (up, down) the upper tail
//! `P(X >= k)` is computed for `X ~ Hypergeometric(N, K, n)` where `N` is the
//! universe size, `K` the set size within the universe, `n` the list size
//! within the universe and `k` the overlap. Adjusted p-values are
//! Benjamini-Hochberg across the sets tested for one list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use statrs::function::factorial::ln_binomial;

use super::catalog::GeneSetCatalog;
use crate::error::{OmicsError, Result};
use crate::io::{ContrastResults, DifferentialRecord};
use crate::stats::nan_last_cmp;
use crate::testing::benjamini_hochberg;

/// Which differential list a record was computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Set size limits applied before testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentParams {
    /// Minimum number of set members present in the universe
    pub min_overlap: usize,
    /// Maximum number of set members present in the universe
    pub max_set_size: Option<usize>,
}

impl Default for EnrichmentParams {
    fn default() -> Self {
        Self {
            min_overlap: 5,
            max_set_size: None,
        }
    }
}

/// One gene set tested against one list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub contrast: String,
    pub direction: Direction,
    pub gene_set: String,
    /// K: set members in the universe
    pub set_size: usize,
    /// n: list members in the universe
    pub list_size: usize,
    /// N
    pub universe_size: usize,
    /// k
    pub overlap: usize,
    pub expected: f64,
    #[serde(with = "crate::io::na_float")]
    pub fold_enrichment: f64,
    #[serde(with = "crate::io::na_float")]
    pub pvalue: f64,
    #[serde(with = "crate::io::na_float")]
    pub padj: f64,
    #[serde(with = "feature_list")]
    pub overlapping_features: Vec<String>,
}

/// Test both directional lists against every set of the catalog
///
/// Lists and sets are restricted to the universe first. Empty lists give no
/// records. Adjusted p-values are computed within each direction; the
/// combined records are ranked by adjusted p-value, then p-value, then set
/// name, then direction (up first).
pub fn enrich_lists(
    contrast: &str,
    up: &[String],
    down: &[String],
    universe: &[String],
    catalog: &GeneSetCatalog,
    params: &EnrichmentParams,
) -> Result<Vec<EnrichmentRecord>> {
    if up.is_empty() && down.is_empty() {
        log::info!("{}: no differential features, skipping enrichment", contrast);
        return Ok(Vec::new());
    }
    let universe: HashSet<&str> = universe.iter().map(|s| s.as_str()).collect();
    if universe.is_empty() {
        return Err(OmicsError::InvalidInput {
            reason: "Enrichment universe is empty".to_string(),
        });
    }

    // Restrict sets to the universe once for both directions
    let mut excluded = 0usize;
    let mut sets: Vec<(&str, Vec<&str>)> = Vec::new();
    for set in catalog.sets() {
        let members: Vec<&str> = set
            .genes
            .iter()
            .map(|g| g.as_str())
            .filter(|g| universe.contains(g))
            .collect();
        let too_small = members.len() < params.min_overlap.max(1);
        let too_large = params.max_set_size.map_or(false, |max| members.len() > max);
        if too_small || too_large {
            log::debug!(
                "Excluding gene set {} ({} of {} members in universe)",
                set.name,
                members.len(),
                set.len()
            );
            excluded += 1;
            continue;
        }
        sets.push((set.name.as_str(), members));
    }
    if excluded > 0 {
        log::debug!(
            "{} of {} gene sets excluded by size limits",
            excluded,
            catalog.len()
        );
    }

    let mut records = enrich_direction(contrast, Direction::Up, up, &universe, &sets);
    records.extend(enrich_direction(contrast, Direction::Down, down, &universe, &sets));
    records.sort_by(rank_order);
    Ok(records)
}

/// Enrichment of the significant up and down features of one contrast
///
/// `universe` is normally every feature that entered the comparison.
pub fn enrich_contrast(
    results: &ContrastResults,
    universe: &[String],
    catalog: &GeneSetCatalog,
    params: &EnrichmentParams,
) -> Result<Vec<EnrichmentRecord>> {
    let up: Vec<String> = results
        .upregulated()
        .iter()
        .map(|r| r.feature_id.clone())
        .collect();
    let down: Vec<String> = results
        .downregulated()
        .iter()
        .map(|r| r.feature_id.clone())
        .collect();
    let label = results.contrast.label();
    log::info!(
        "Enrichment for {}: {} up, {} down, {} gene sets",
        label,
        up.len(),
        down.len(),
        catalog.len()
    );
    enrich_lists(&label, &up, &down, universe, catalog, params)
}

/// Enrichment for every contrast of a differential table read back from disk
///
/// Each contrast uses its own records as the universe and its significant
/// records, split by fold change sign, as the lists.
pub fn enrich_records(
    records: &[DifferentialRecord],
    catalog: &GeneSetCatalog,
    params: &EnrichmentParams,
) -> Result<Vec<EnrichmentRecord>> {
    let mut contrasts: Vec<&str> = Vec::new();
    for record in records {
        if !contrasts.contains(&record.contrast.as_str()) {
            contrasts.push(record.contrast.as_str());
        }
    }

    let mut out = Vec::new();
    for contrast in contrasts {
        let rows: Vec<&DifferentialRecord> =
            records.iter().filter(|r| r.contrast == contrast).collect();
        let universe: Vec<String> = rows.iter().map(|r| r.feature_id.clone()).collect();
        let pick = |up: bool| -> Vec<String> {
            rows.iter()
                .filter(|r| r.significant && r.log_fold_change != 0.0)
                .filter(|r| (r.log_fold_change > 0.0) == up)
                .map(|r| r.feature_id.clone())
                .collect()
        };
        let (up, down) = (pick(true), pick(false));
        log::info!(
            "Enrichment for {}: {} up, {} down, {} gene sets",
            contrast,
            up.len(),
            down.len(),
            catalog.len()
        );
        out.extend(enrich_lists(contrast, &up, &down, &universe, catalog, params)?);
    }
    Ok(out)
}

fn enrich_direction(
    contrast: &str,
    direction: Direction,
    list: &[String],
    universe: &HashSet<&str>,
    sets: &[(&str, Vec<&str>)],
) -> Vec<EnrichmentRecord> {
    let list: HashSet<&str> = list
        .iter()
        .map(|s| s.as_str())
        .filter(|s| universe.contains(s))
        .collect();
    if list.is_empty() || sets.is_empty() {
        return Vec::new();
    }

    let big_n = universe.len();
    let n = list.len();

    let mut records: Vec<EnrichmentRecord> = sets
        .iter()
        .map(|(name, members)| {
            let big_k = members.len();
            let overlapping: Vec<String> = members
                .iter()
                .filter(|g| list.contains(*g))
                .map(|g| g.to_string())
                .collect();
            let k = overlapping.len();
            let expected = n as f64 * big_k as f64 / big_n as f64;
            let fold_enrichment = if expected > 0.0 {
                k as f64 / expected
            } else {
                f64::NAN
            };
            EnrichmentRecord {
                contrast: contrast.to_string(),
                direction,
                gene_set: name.to_string(),
                set_size: big_k,
                list_size: n,
                universe_size: big_n,
                overlap: k,
                expected,
                fold_enrichment,
                pvalue: hypergeometric_upper_tail(k, n, big_k, big_n),
                padj: f64::NAN,
                overlapping_features: overlapping,
            }
        })
        .collect();

    let pvalues: Vec<f64> = records.iter().map(|r| r.pvalue).collect();
    for (record, q) in records.iter_mut().zip(benjamini_hochberg(&pvalues)) {
        record.padj = q;
    }

    records
}

fn rank_order(a: &EnrichmentRecord, b: &EnrichmentRecord) -> std::cmp::Ordering {
    nan_last_cmp(a.padj, b.padj)
        .then_with(|| nan_last_cmp(a.pvalue, b.pvalue))
        .then_with(|| a.gene_set.cmp(&b.gene_set))
        .then_with(|| a.direction.cmp(&b.direction))
}

/// `P(X >= k)` for `X ~ Hypergeometric(N = big_n, K = big_k, n)`, summed in log space
pub fn hypergeometric_upper_tail(k: usize, n: usize, big_k: usize, big_n: usize) -> f64 {
    if k == 0 {
        return 1.0;
    }
    let max_i = n.min(big_k);
    if k > max_i {
        return 0.0;
    }

    let log_denom = ln_binomial(big_n as u64, n as u64);
    let sum: f64 = (k..=max_i)
        .filter(|&i| n - i <= big_n - big_k)
        .map(|i| {
            (ln_binomial(big_k as u64, i as u64)
                + ln_binomial((big_n - big_k) as u64, (n - i) as u64)
                - log_denom)
                .exp()
        })
        .sum();
    sum.min(1.0)
}

/// Feature lists stored as one `;`-joined cell
mod feature_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(features: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&features.join(";"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let joined = String::deserialize(deserializer)?;
        Ok(joined
            .split(';')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{GeneSet, GeneSetSource};
    use approx::assert_relative_eq;

    fn genes(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("G{}", i)).collect()
    }

    fn catalog() -> GeneSetCatalog {
        let mut partial = genes(5..8);
        partial.extend(genes(60..67));
        GeneSetCatalog::new(
            vec![
                GeneSet::new("PARTIAL", partial),
                GeneSet::new("CONTAINED", genes(0..10)),
                GeneSet::new("UNRELATED", genes(50..60)),
                GeneSet::new("TINY", genes(0..3)),
            ],
            GeneSetSource::EmbeddedDefault,
        )
        .unwrap()
    }

    #[test]
    fn test_contained_set_ranks_first() {
        let universe = genes(0..100);
        let up = genes(0..15);
        let records = enrich_lists(
            "c",
            &up,
            &[],
            &universe,
            &catalog(),
            &EnrichmentParams::default(),
        )
        .unwrap();

        assert_eq!(records.len(), 3, "TINY is below min_overlap");
        assert_eq!(records[0].gene_set, "CONTAINED");
        assert_eq!(records[0].overlap, 10);
        assert!(records.iter().skip(1).all(|r| r.pvalue > records[0].pvalue));
        assert!(records.iter().all(|r| r.direction == Direction::Up));
        assert_relative_eq!(records[0].expected, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_lists_give_no_records() {
        let records = enrich_lists(
            "c",
            &[],
            &[],
            &genes(0..100),
            &catalog(),
            &EnrichmentParams::default(),
        )
        .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_lists_restricted_to_universe() {
        let universe = genes(0..20);
        let mut up = genes(0..5);
        up.push("NOT_IN_UNIVERSE".to_string());
        let params = EnrichmentParams {
            min_overlap: 1,
            max_set_size: None,
        };
        let records = enrich_lists("c", &up, &[], &universe, &catalog(), &params).unwrap();
        assert!(records.iter().all(|r| r.list_size == 5 && r.universe_size == 20));
        let contained = records.iter().find(|r| r.gene_set == "CONTAINED").unwrap();
        assert_eq!(contained.set_size, 10);
    }

    #[test]
    fn test_max_set_size_excludes() {
        let params = EnrichmentParams {
            min_overlap: 1,
            max_set_size: Some(3),
        };
        let records =
            enrich_lists("c", &genes(0..5), &[], &genes(0..100), &catalog(), &params).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.gene_set.as_str()).collect();
        assert_eq!(names, vec!["TINY"]);
    }

    #[test]
    fn test_enrich_records_per_contrast() {
        let record = |contrast: &str, id: String, lfc: f64, significant: bool| DifferentialRecord {
            feature_id: id,
            contrast: contrast.to_string(),
            numerator: "a".to_string(),
            denominator: "b".to_string(),
            mean_numerator: f64::NAN,
            mean_denominator: f64::NAN,
            n_numerator: 3,
            n_denominator: 3,
            log_fold_change: lfc,
            statistic: f64::NAN,
            pvalue: 0.01,
            padj: 0.01,
            significant,
        };
        let mut records: Vec<DifferentialRecord> = genes(0..100)
            .into_iter()
            .enumerate()
            .map(|(i, g)| record("x:a_vs_b", g, 1.0, i < 15))
            .collect();
        records.extend(genes(0..100).into_iter().map(|g| record("x:a_vs_c", g, -1.0, false)));

        let out = enrich_records(&records, &catalog(), &EnrichmentParams::default()).unwrap();
        assert!(out.iter().all(|r| r.contrast == "x:a_vs_b"));
        assert_eq!(out[0].gene_set, "CONTAINED");
        assert_eq!(out[0].direction, Direction::Up);
    }

    #[test]
    fn test_hypergeometric_known_values() {
        // phyper(1, 5, 5, 2, lower.tail = FALSE) = P(X >= 2) = C(5,2)/C(10,2) = 10/45
        assert_relative_eq!(hypergeometric_upper_tail(2, 2, 5, 10), 10.0 / 45.0, epsilon = 1e-10);
        assert_eq!(hypergeometric_upper_tail(0, 3, 5, 10), 1.0);
        assert_eq!(hypergeometric_upper_tail(4, 3, 5, 10), 0.0);
    }

    #[test]
    fn test_both_directions_adjusted_separately() {
        let universe = genes(0..100);
        let up = genes(0..15);
        let down = genes(50..62);
        let records = enrich_lists(
            "c",
            &up,
            &down,
            &universe,
            &catalog(),
            &EnrichmentParams::default(),
        )
        .unwrap();
        let down_records: Vec<&EnrichmentRecord> =
            records.iter().filter(|r| r.direction == Direction::Down).collect();
        assert_eq!(down_records.len(), 3);
        assert_eq!(down_records[0].gene_set, "UNRELATED");
        assert!(records.iter().all(|r| r.padj >= r.pvalue));
    }

    #[test]
    fn test_combined_directions_ranked_by_padj() {
        let catalog = GeneSetCatalog::new(
            vec![
                GeneSet::new("UP_WEAK", genes(0..10)),
                GeneSet::new("DOWN_STRONG", genes(20..40)),
            ],
            GeneSetSource::EmbeddedDefault,
        )
        .unwrap();
        let universe = genes(0..200);
        // weak up signal, strong down signal
        let mut up = genes(0..3);
        up.extend(genes(100..110));
        let down = genes(20..40);

        let records =
            enrich_lists("c", &up, &down, &universe, &catalog, &EnrichmentParams::default())
                .unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].gene_set, "DOWN_STRONG");
        assert_eq!(records[0].direction, Direction::Down);
        assert!(records.windows(2).all(|w| w[0].padj <= w[1].padj));
    }

    #[test]
    fn test_missing_pvalues_written_as_na() {
        let record = EnrichmentRecord {
            contrast: "c".to_string(),
            direction: Direction::Up,
            gene_set: "S".to_string(),
            set_size: 5,
            list_size: 0,
            universe_size: 10,
            overlap: 0,
            expected: 0.0,
            fold_enrichment: f64::NAN,
            pvalue: f64::NAN,
            padj: f64::NAN,
            overlapping_features: Vec::new(),
        };
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&record).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.ends_with(",NA,NA,NA,"), "{}", row);
    }
}
