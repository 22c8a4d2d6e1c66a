//! Gene set catalogs: loading from GMT, JSON or long tables, with an embedded fallback

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{OmicsError, Result};
use crate::io::open_reader;

/// Columns a long-format gene set table must carry
pub const LONG_TABLE_COLUMNS: [&str; 2] = ["gene_set", "feature_id"];

/// A named gene program or pathway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneSet {
    pub name: String,
    /// Member identifiers, unique, in first-seen order
    pub genes: Vec<String>,
}

impl GeneSet {
    pub fn new<I, S>(name: &str, genes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let genes = genes
            .into_iter()
            .map(Into::into)
            .filter(|g: &String| !g.is_empty() && seen.insert(g.clone()))
            .collect();
        Self {
            name: name.to_string(),
            genes,
        }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

/// Where a catalog came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneSetSource {
    /// A user-provided file
    ProvidedArtifact(PathBuf),
    /// The catalog compiled into the binary
    EmbeddedDefault,
}

impl std::fmt::Display for GeneSetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneSetSource::ProvidedArtifact(path) => write!(f, "provided file {}", path.display()),
            GeneSetSource::EmbeddedDefault => write!(f, "embedded default catalog"),
        }
    }
}

/// An immutable collection of gene sets
#[derive(Debug, Clone)]
pub struct GeneSetCatalog {
    sets: Vec<GeneSet>,
    source: GeneSetSource,
}

impl GeneSetCatalog {
    /// Build a catalog; set names must be unique and at least one set must be non-empty
    pub fn new(sets: Vec<GeneSet>, source: GeneSetSource) -> Result<Self> {
        let mut names = HashSet::new();
        for set in &sets {
            if !names.insert(set.name.as_str()) {
                return Err(OmicsError::InvalidGeneSets {
                    reason: format!("Duplicate gene set name '{}'", set.name),
                });
            }
        }
        let sets: Vec<GeneSet> = sets.into_iter().filter(|s| !s.is_empty()).collect();
        if sets.is_empty() {
            return Err(OmicsError::InvalidGeneSets {
                reason: format!("No non-empty gene sets in {}", source),
            });
        }
        Ok(Self { sets, source })
    }

    pub fn sets(&self) -> &[GeneSet] {
        &self.sets
    }

    pub fn source(&self) -> &GeneSetSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Look up a set by name
    pub fn get(&self, name: &str) -> Option<&GeneSet> {
        self.sets.iter().find(|s| s.name == name)
    }

    /// Load a catalog, choosing the format from the file extension
    ///
    /// `.gmt` and `.json` are read as such; anything else is read as a
    /// delimited long table with `gene_set` and `feature_id` columns.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        crate::io::ensure_exists(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let sets = match extension.as_deref() {
            Some("gmt") => parse_gmt(&fs::read_to_string(path)?)?,
            Some("json") => parse_json(&fs::read_to_string(path)?)?,
            _ => read_long_table(path)?,
        };
        Self::new(sets, GeneSetSource::ProvidedArtifact(path.to_path_buf()))
    }

    /// The catalog compiled into the binary
    pub fn embedded() -> Self {
        let sets = EMBEDDED_SETS
            .iter()
            .map(|(name, genes)| GeneSet::new(name, genes.iter().copied()))
            .collect();
        Self {
            sets,
            source: GeneSetSource::EmbeddedDefault,
        }
    }
}

/// Select the catalog for a run
///
/// A provided file that exists is loaded (and must parse). A provided file
/// that is missing falls back to the embedded catalog with a warning.
pub fn resolve_catalog(path: Option<&Path>) -> Result<GeneSetCatalog> {
    let catalog = match path {
        Some(p) if p.is_file() => GeneSetCatalog::from_path(p)?,
        Some(p) => {
            log::warn!(
                "Gene set file {} not found, falling back to the embedded catalog",
                p.display()
            );
            GeneSetCatalog::embedded()
        }
        None => GeneSetCatalog::embedded(),
    };
    log::info!(
        "Using {} gene sets from {}",
        catalog.len(),
        catalog.source()
    );
    Ok(catalog)
}

/// Parse GMT text: `name<TAB>description<TAB>gene...` per line
pub fn parse_gmt(text: &str) -> Result<Vec<GeneSet>> {
    let mut sets = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(OmicsError::InvalidGeneSets {
                reason: format!(
                    "GMT line {} has {} fields, expected name, description and genes",
                    line_no + 1,
                    fields.len()
                ),
            });
        }
        sets.push(GeneSet::new(
            fields[0].trim(),
            fields[2..].iter().map(|g| g.trim()),
        ));
    }
    Ok(sets)
}

/// Parse a JSON object mapping set names to gene lists
pub fn parse_json(text: &str) -> Result<Vec<GeneSet>> {
    let map: BTreeMap<String, Vec<String>> = serde_json::from_str(text)?;
    Ok(map
        .into_iter()
        .map(|(name, genes)| GeneSet::new(&name, genes))
        .collect())
}

fn read_long_table(path: &Path) -> Result<Vec<GeneSet>> {
    let mut reader = open_reader(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
    let position = |name: &str| header.iter().position(|h| h == name);
    let (set_col, gene_col) = match (position("gene_set"), position("feature_id")) {
        (Some(s), Some(g)) => (s, g),
        _ => {
            return Err(OmicsError::schema_mismatch(
                &format!("gene set table {}", path.display()),
                &LONG_TABLE_COLUMNS,
                &header,
            ))
        }
    };

    // Preserve first-seen set order
    let mut order: Vec<String> = Vec::new();
    let mut members: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in reader.records() {
        let record = record?;
        let (Some(set), Some(gene)) = (record.get(set_col), record.get(gene_col)) else {
            continue;
        };
        if set.is_empty() || gene.is_empty() {
            continue;
        }
        if !members.contains_key(set) {
            order.push(set.to_string());
        }
        members.entry(set.to_string()).or_default().push(gene.to_string());
    }

    Ok(order
        .into_iter()
        .map(|name| {
            let genes = members.remove(&name).unwrap_or_default();
            GeneSet::new(&name, genes)
        })
        .collect())
}

/// Cancer gene programs shipped with the crate
const EMBEDDED_SETS: &[(&str, &[&str])] = &[
    (
        "G2M_CHECKPOINT",
        &[
            "CCNB1", "CCNB2", "CDK1", "PLK1", "AURKA", "AURKB", "BUB1", "CDC20", "CCNA2", "TOP2A",
            "MKI67", "KIF11", "CENPF", "BIRC5", "CDKN3", "TTK", "NUSAP1", "PRC1",
        ],
    ),
    (
        "E2F_TARGETS",
        &[
            "E2F1", "MCM2", "MCM3", "MCM4", "MCM5", "MCM6", "MCM7", "PCNA", "RRM2", "TYMS", "CDC6",
            "CDT1", "CHEK1", "RFC4", "POLE", "FEN1", "MYBL2",
        ],
    ),
    (
        "P53_PATHWAY",
        &[
            "TP53", "CDKN1A", "MDM2", "BAX", "BBC3", "PMAIP1", "GADD45A", "SESN1", "SESN2",
            "TP53I3", "FAS", "RRM2B", "ZMAT3", "DDB2", "XPC", "TNFRSF10B",
        ],
    ),
    (
        "MYC_TARGETS",
        &[
            "MYC", "NPM1", "NCL", "LDHA", "ODC1", "CDK4", "HSPD1", "NME1", "PA2G4", "SRM",
            "EIF4A1", "APEX1", "NOP56", "RPL3", "PTMA", "CCT5",
        ],
    ),
    (
        "EPITHELIAL_MESENCHYMAL_TRANSITION",
        &[
            "VIM", "CDH2", "FN1", "SNAI2", "TWIST1", "ZEB1", "ZEB2", "COL1A1", "COL1A2", "COL3A1",
            "SPARC", "MMP2", "TGFBI", "ACTA2", "TAGLN", "SERPINE1", "POSTN",
        ],
    ),
    (
        "ESTROGEN_RESPONSE",
        &[
            "ESR1", "PGR", "GATA3", "FOXA1", "TFF1", "XBP1", "GREB1", "MYB", "KRT18", "KRT8", "AR",
            "CA12", "SLC39A6", "AGR2", "BCL2",
        ],
    ),
    (
        "HYPOXIA",
        &[
            "HIF1A", "VEGFA", "SLC2A1", "PGK1", "LDHA", "ENO1", "CA9", "ADM", "BNIP3", "NDRG1",
            "P4HA1", "ANKRD37", "EGLN3", "PDK1", "ALDOA", "ERO1A",
        ],
    ),
    (
        "INTERFERON_GAMMA_RESPONSE",
        &[
            "STAT1", "IRF1", "CXCL9", "CXCL10", "CXCL11", "IDO1", "GBP1", "GBP4", "HLA-DRA",
            "CIITA", "PSMB9", "TAP1", "CD274", "SOCS1", "IFIT3",
        ],
    ),
    (
        "DNA_REPAIR",
        &[
            "BRCA1", "BRCA2", "RAD51", "ATM", "ATR", "PARP1", "XRCC1", "XRCC5", "XRCC6", "MSH2",
            "MSH6", "MLH1", "ERCC1", "ERCC2", "POLD1", "LIG1",
        ],
    ),
    (
        "PI3K_AKT_MTOR_SIGNALING",
        &[
            "PIK3CA", "PIK3R1", "AKT1", "AKT2", "MTOR", "PTEN", "RPS6KB1", "EIF4EBP1", "TSC1",
            "TSC2", "RHEB", "PDK1", "GSK3B", "FOXO3", "IRS1",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_embedded_catalog() {
        let catalog = GeneSetCatalog::embedded();
        assert_eq!(catalog.source(), &GeneSetSource::EmbeddedDefault);
        assert_eq!(catalog.len(), EMBEDDED_SETS.len());
        assert!(catalog.get("P53_PATHWAY").unwrap().genes.contains(&"TP53".to_string()));
    }

    #[test]
    fn test_parse_gmt() {
        let text = "SET_A\tna\tTP53\tMDM2\tTP53\nSET_B\thttp://x\tMYC\n";
        let sets = parse_gmt(text).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].genes, vec!["TP53".to_string(), "MDM2".to_string()]);
        assert!(parse_gmt("ONLY_NAME\n").is_err());
    }

    #[test]
    fn test_parse_json() {
        let sets = parse_json(r#"{"B": ["MYC"], "A": ["TP53", "MDM2"]}"#).unwrap();
        assert_eq!(sets[0].name, "A");
        assert_eq!(sets[0].len(), 2);
    }

    #[test]
    fn test_long_table_file() {
        let mut file = Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "gene_set\tfeature_id").unwrap();
        writeln!(file, "SET_B\tMYC").unwrap();
        writeln!(file, "SET_A\tTP53").unwrap();
        writeln!(file, "SET_B\tNPM1").unwrap();
        let catalog = GeneSetCatalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.sets()[0].name, "SET_B");
        assert_eq!(catalog.get("SET_B").unwrap().len(), 2);
        assert!(matches!(catalog.source(), GeneSetSource::ProvidedArtifact(_)));
    }

    #[test]
    fn test_long_table_schema_checked() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "pathway,gene").unwrap();
        writeln!(file, "SET_A,TP53").unwrap();
        assert!(matches!(
            GeneSetCatalog::from_path(file.path()),
            Err(OmicsError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_artifact_falls_back() {
        let catalog = resolve_catalog(Some(Path::new("/nonexistent/sets.gmt"))).unwrap();
        assert_eq!(catalog.source(), &GeneSetSource::EmbeddedDefault);
    }

    #[test]
    fn test_present_artifact_is_used() {
        let mut file = Builder::new().suffix(".gmt").tempfile().unwrap();
        writeln!(file, "CUSTOM\tdesc\tTP53\tMYC").unwrap();
        let catalog = resolve_catalog(Some(file.path())).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.sets()[0].name, "CUSTOM");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let sets = vec![GeneSet::new("A", ["TP53"]), GeneSet::new("A", ["MYC"])];
        assert!(GeneSetCatalog::new(sets, GeneSetSource::EmbeddedDefault).is_err());
    }
}
