//! Delimited-file reading and writing for matrices, metadata and result tables

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ndarray::Array2;
use serde::Serialize;

use super::na_float::parse_cell;
use super::results::DifferentialRecord;
use crate::data::{FeatureMatrix, SampleMetadata};
use crate::error::{OmicsError, Result};

/// Columns every differential result table must carry
pub const DIFFERENTIAL_COLUMNS: [&str; 13] = [
    "feature_id",
    "contrast",
    "numerator",
    "denominator",
    "mean_numerator",
    "mean_denominator",
    "n_numerator",
    "n_denominator",
    "log_fold_change",
    "statistic",
    "pvalue",
    "padj",
    "significant",
];

/// Fail with the expected path when an input file is absent
pub fn ensure_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(OmicsError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Tab if the header line contains one, comma otherwise
fn detect_delimiter(path: &Path) -> Result<u8> {
    let mut first_line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut first_line)?;
    if first_line.trim().is_empty() {
        return Err(OmicsError::EmptyData {
            reason: format!("{} is empty", path.display()),
        });
    }
    Ok(if first_line.contains('\t') { b'\t' } else { b',' })
}

pub(crate) fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    ensure_exists(path)?;
    let delimiter = detect_delimiter(path)?;
    let reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    Ok(reader)
}

/// Read a feature x sample matrix
///
/// Expected format: first column is feature IDs, first row is sample IDs.
/// `NA`, `NaN` and empty cells are read as missing.
pub fn read_feature_matrix<P: AsRef<Path>>(path: P) -> Result<FeatureMatrix> {
    let path = path.as_ref();
    let mut reader = open_reader(path)?;

    let header = reader.headers()?.clone();
    if header.len() < 2 {
        return Err(OmicsError::InvalidMatrix {
            reason: "Header needs a feature column and at least one sample".to_string(),
        });
    }
    let sample_ids: Vec<String> = header.iter().skip(1).map(|s| s.to_string()).collect();
    let n_samples = sample_ids.len();

    let mut feature_ids: Vec<String> = Vec::new();
    let mut data: Vec<f64> = Vec::new();

    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        if record.len() != n_samples + 1 {
            return Err(OmicsError::InvalidMatrix {
                reason: format!(
                    "Row {} has {} columns, expected {}",
                    row_idx + 2,
                    record.len(),
                    n_samples + 1
                ),
            });
        }
        feature_ids.push(record[0].to_string());
        for (j, cell) in record.iter().skip(1).enumerate() {
            let value = parse_cell(cell).ok_or_else(|| OmicsError::InvalidMatrix {
                reason: format!(
                    "Invalid value '{}' for feature '{}' in sample '{}'",
                    cell, &record[0], sample_ids[j]
                ),
            })?;
            data.push(value);
        }
    }

    if feature_ids.is_empty() {
        return Err(OmicsError::EmptyData {
            reason: format!("No features found in {}", path.display()),
        });
    }

    let values = Array2::from_shape_vec((feature_ids.len(), n_samples), data).map_err(|e| {
        OmicsError::InvalidMatrix {
            reason: e.to_string(),
        }
    })?;

    FeatureMatrix::new(values, feature_ids, sample_ids)
}

/// Read sample metadata
///
/// Expected format: first column is sample IDs, remaining columns are
/// categorical annotations.
pub fn read_metadata<P: AsRef<Path>>(path: P) -> Result<SampleMetadata> {
    let path = path.as_ref();
    let mut reader = open_reader(path)?;

    let header = reader.headers()?.clone();
    let column_names: Vec<String> = header.iter().skip(1).map(|s| s.to_string()).collect();

    let mut sample_ids: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<String>> = vec![Vec::new(); column_names.len()];

    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        if record.len() != column_names.len() + 1 {
            return Err(OmicsError::InvalidMetadata {
                reason: format!(
                    "Row {} has {} columns, expected {}",
                    row_idx + 2,
                    record.len(),
                    column_names.len() + 1
                ),
            });
        }
        sample_ids.push(record[0].to_string());
        for (values, cell) in columns.iter_mut().zip(record.iter().skip(1)) {
            values.push(cell.to_string());
        }
    }

    if sample_ids.is_empty() {
        return Err(OmicsError::EmptyData {
            reason: format!("No samples found in {}", path.display()),
        });
    }

    let mut metadata = SampleMetadata::new(sample_ids)?;
    for (name, values) in column_names.iter().zip(columns) {
        metadata.add_column(name, values)?;
    }

    Ok(metadata)
}

/// Read a differential result table written by [`write_table`]
pub fn read_differential_table<P: AsRef<Path>>(path: P) -> Result<Vec<DifferentialRecord>> {
    let path = path.as_ref();
    let mut reader = open_reader(path)?;

    let header: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
    if DIFFERENTIAL_COLUMNS
        .iter()
        .any(|c| !header.iter().any(|h| h == c))
    {
        return Err(OmicsError::schema_mismatch(
            &format!("differential table {}", path.display()),
            &DIFFERENTIAL_COLUMNS,
            &header,
        ));
    }

    let records: Vec<DifferentialRecord> = reader
        .deserialize()
        .collect::<std::result::Result<_, csv::Error>>()?;
    log::info!("Read {} differential records from {}", records.len(), path.display());
    Ok(records)
}

/// Write serializable rows as a comma-separated table with a header
pub fn write_table<'a, P, T, I>(path: P, rows: I) -> Result<usize>
where
    P: AsRef<Path>,
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    let mut n = 0;
    for row in rows {
        writer.serialize(row)?;
        n += 1;
    }
    writer.flush()?;
    log::info!("Wrote {} rows to {}", n, path.as_ref().display());
    Ok(n)
}

/// Write a feature x sample matrix, missing values as `NA`
pub fn write_matrix<P: AsRef<Path>>(path: P, matrix: &FeatureMatrix) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;

    let mut header = vec!["feature_id".to_string()];
    header.extend(matrix.sample_ids().iter().cloned());
    writer.write_record(&header)?;

    for (i, feature_id) in matrix.feature_ids().iter().enumerate() {
        let mut row = Vec::with_capacity(matrix.n_samples() + 1);
        row.push(feature_id.clone());
        row.extend(matrix.feature_values(i).iter().map(|&v| {
            if v.is_nan() {
                "NA".to_string()
            } else {
                format!("{:.6}", v)
            }
        }));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    log::info!(
        "Wrote {} x {} matrix to {}",
        matrix.n_features(),
        matrix.n_samples(),
        path.as_ref().display()
    );
    Ok(())
}
