//! CSV input readers.
//!
//! Every reader trims fields and drops blank ones, so downstream code sees
//! `None` instead of empty strings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use thiserror::Error;
use tracing::info;

use super::types::Query;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to open input {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse input {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Input {path} has no column named {column:?}")]
    MissingColumn { path: PathBuf, column: String },
}

/// A row of a previously written brand map or keyword map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRow {
    pub asin: String,
    /// Brand or keyword the product was found under.
    pub origin: Option<String>,
    pub link: Option<String>,
}

struct Table {
    path: PathBuf,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    fn open(path: &Path) -> Result<Self, InputError> {
        let file = std::fs::File::open(path).map_err(|e| InputError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let csv_err = |e| InputError::Csv {
            path: path.to_path_buf(),
            source: e,
        };
        let headers = reader.headers().map_err(csv_err)?.clone();
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(csv_err)?;

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize, InputError> {
        self.column(name).ok_or_else(|| InputError::MissingColumn {
            path: self.path.clone(),
            column: name.to_string(),
        })
    }

    fn field(row: &StringRecord, index: Option<usize>) -> Option<String> {
        index
            .and_then(|i| row.get(i))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Read the non-blank values of one column, in file order.
pub fn read_column(path: &Path, column: &str) -> Result<Vec<String>, InputError> {
    let table = Table::open(path)?;
    let index = table.require(column)?;

    Ok(table
        .rows
        .iter()
        .filter_map(|row| Table::field(row, Some(index)))
        .collect())
}

/// Read a brand map or keyword map. Rows without an ASIN are dropped.
pub fn read_map_rows(path: &Path, origin_column: &str) -> Result<Vec<MapRow>, InputError> {
    let table = Table::open(path)?;
    let asin = table.require("asin")?;
    let origin = table.require(origin_column)?;
    let link = table.column("link");

    Ok(table
        .rows
        .iter()
        .filter_map(|row| {
            Some(MapRow {
                asin: Table::field(row, Some(asin))?,
                origin: Table::field(row, Some(origin)),
                link: Table::field(row, link),
            })
        })
        .collect())
}

/// Company names to search for.
pub fn brand_queries(path: &Path, column: &str) -> Result<Vec<Query>, InputError> {
    let queries: Vec<Query> = read_column(path, column)?
        .into_iter()
        .map(Query::brand)
        .collect();
    info!("Loaded {} brand(s) from {}", queries.len(), path.display());
    Ok(queries)
}

/// Keywords to search for.
pub fn keyword_queries(path: &Path, column: &str) -> Result<Vec<Query>, InputError> {
    let queries: Vec<Query> = read_column(path, column)?
        .into_iter()
        .map(Query::keyword)
        .collect();
    info!("Loaded {} keyword(s) from {}", queries.len(), path.display());
    Ok(queries)
}

/// Distinct raw brand names that only produced a sentinel row, in first-seen
/// order.
pub fn invalid_brand_queries(path: &Path, brand_column: &str) -> Result<Vec<Query>, InputError> {
    let mut seen = HashSet::new();
    let queries: Vec<Query> = read_map_rows(path, brand_column)?
        .into_iter()
        .filter(|row| Query::brand(row.asin.as_str()).is_sentinel())
        .filter_map(|row| row.origin)
        .filter(|brand| seen.insert(brand.clone()))
        .map(Query::brand)
        .collect();
    info!(
        "Found {} brand(s) without a valid product in {}",
        queries.len(),
        path.display()
    );
    Ok(queries)
}

/// Product pages to scrape, from brand map rows that have a link.
pub fn detail_queries(path: &Path, brand_column: &str) -> Result<Vec<Query>, InputError> {
    let queries: Vec<Query> = read_map_rows(path, brand_column)?
        .into_iter()
        .filter(|row| row.link.is_some())
        .map(|row| Query::asin_lookup(row.asin, row.link, row.origin))
        .collect();
    info!("Loaded {} ASIN(s) from {}", queries.len(), path.display());
    Ok(queries)
}

/// ASINs whose brand name should be looked up, from the keyword map.
pub fn brand_name_queries(path: &Path, keyword_column: &str) -> Result<Vec<Query>, InputError> {
    let queries: Vec<Query> = read_map_rows(path, keyword_column)?
        .into_iter()
        .map(|row| Query::asin_lookup(row.asin, None, row.origin))
        .collect();
    info!("Loaded {} ASIN(s) from {}", queries.len(), path.display());
    Ok(queries)
}
