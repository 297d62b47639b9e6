//! One-shot deduplication of the company-name input list.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::config::DedupeConfig;
use crate::input::{read_column, InputError};
use crate::store::WriterError;

#[derive(Debug, thiserror::Error)]
pub enum DedupeError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Writer(#[from] WriterError),
}

/// Counts from one deduplication pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DedupeReport {
    /// Non-blank values read.
    pub total: usize,
    /// Values written to the deduplicated list.
    pub unique: usize,
    /// Distinct values that appeared more than once.
    pub duplicates: usize,
}

/// Split values into first occurrences and repeated values, both in
/// first-seen order. Values are compared exactly.
pub fn split_duplicates(values: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut repeated = HashSet::new();
    let mut unique = Vec::new();
    let mut duplicates = Vec::new();

    for value in values {
        if seen.contains(&value) {
            if repeated.insert(value.clone()) {
                duplicates.push(value);
            }
        } else {
            seen.insert(value.clone());
            unique.push(value);
        }
    }

    (unique, duplicates)
}

fn write_column(path: &Path, column: &str, values: &[String]) -> Result<(), WriterError> {
    let to_err = |e: csv::Error| WriterError::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| WriterError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
    writer.write_record([column]).map_err(to_err)?;
    for value in values {
        writer.write_record([value]).map_err(to_err)?;
    }
    writer.flush().map_err(|e| WriterError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read `config.column` from the input and write the unique and duplicate
/// lists.
pub fn run_dedupe(config: &DedupeConfig) -> Result<DedupeReport, DedupeError> {
    let values = read_column(&config.input, &config.column)?;
    let total = values.len();
    let (unique, duplicates) = split_duplicates(values);

    write_column(&config.output, &config.column, &unique)?;
    info!("Deduplicated list written to {}", config.output.display());

    write_column(&config.duplicates_output, &config.column, &duplicates)?;
    info!("Duplicates list written to {}", config.duplicates_output.display());

    Ok(DedupeReport {
        total,
        unique: unique.len(),
        duplicates: duplicates.len(),
    })
}
