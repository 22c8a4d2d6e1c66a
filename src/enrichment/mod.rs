//! Gene set catalogs and over-representation analysis

mod catalog;
mod ora;

pub use catalog::{
    parse_gmt, parse_json, resolve_catalog, GeneSet, GeneSetCatalog, GeneSetSource,
    LONG_TABLE_COLUMNS,
};
pub use ora::{
    enrich_contrast, enrich_lists, enrich_records, hypergeometric_upper_tail, Direction,
    EnrichmentParams, EnrichmentRecord,
};
