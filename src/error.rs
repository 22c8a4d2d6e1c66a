//! Error types for omics_compare

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for omics comparison operations
#[derive(Error, Debug)]
pub enum OmicsError {
    #[error("Input file not found: expected {path}")]
    MissingInput { path: PathBuf },

    #[error("Schema mismatch in {table}: missing column(s) {missing:?}; available: {available:?}")]
    SchemaMismatch {
        table: String,
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Invalid feature matrix: {reason}")]
    InvalidMatrix { reason: String },

    #[error("Invalid metadata: {reason}")]
    InvalidMetadata { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("Invalid contrast specification: {reason}")]
    InvalidContrast { reason: String },

    #[error("Invalid gene set catalog: {reason}")]
    InvalidGeneSets { reason: String },

    #[error("Empty data: {reason}")]
    EmptyData { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl OmicsError {
    /// Build a schema mismatch error for `table` from the required and present columns
    pub fn schema_mismatch(table: &str, required: &[&str], available: &[String]) -> Self {
        let missing = required
            .iter()
            .filter(|r| !available.iter().any(|a| a == *r))
            .map(|r| r.to_string())
            .collect();
        OmicsError::SchemaMismatch {
            table: table.to_string(),
            missing,
            available: available.to_vec(),
        }
    }
}

/// Result type alias for omics comparison operations
pub type Result<T> = std::result::Result<T, OmicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_lists_missing_columns() {
        let available = vec!["sample".to_string(), "subtype".to_string()];
        let err = OmicsError::schema_mismatch("metadata", &["subtype", "timepoint"], &available);
        match err {
            OmicsError::SchemaMismatch { missing, .. } => {
                assert_eq!(missing, vec!["timepoint".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_input_message_names_path() {
        let err = OmicsError::MissingInput {
            path: PathBuf::from("data/counts.csv"),
        };
        assert!(err.to_string().contains("data/counts.csv"));
    }
}
