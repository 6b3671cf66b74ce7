//! CSV price-series loader.
//!
//! Reads per-ticker daily close files shaped like Bloomberg exports: a `Dates`
//! column and a `PX_LAST` close column. The ticker symbol is derived from the
//! file name (a trailing `-bloomberg` marker is stripped), rows are sorted
//! ascending by date, and the result is validated into a [`PriceSeries`]
//! before anything downstream sees it. The loader performs no normalization
//! or price adjustment.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::core::PriceSeries;

const DATE_COLUMN: &str = "Dates";
const PRICE_COLUMN: &str = "PX_LAST";

/// Errors surfaced while reading price files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// File could not be opened or read.
    Io(String),
    /// CSV structure problem (ragged rows, encoding).
    Csv(String),
    /// A required header is absent.
    MissingColumn { file: String, column: String },
    /// A cell failed to parse as a date or price.
    InvalidRow {
        file: String,
        line: u64,
        message: String,
    },
    /// Parsed rows do not form a valid price series.
    InvalidSeries { file: String, message: String },
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "i/o error: {msg}"),
            Self::Csv(msg) => write!(f, "csv error: {msg}"),
            Self::MissingColumn { file, column } => {
                write!(f, "{file}: missing required column {column}")
            }
            Self::InvalidRow {
                file,
                line,
                message,
            } => write!(f, "{file}:{line}: {message}"),
            Self::InvalidSeries { file, message } => write!(f, "{file}: {message}"),
        }
    }
}

impl std::error::Error for DataError {}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            Self::Io(err.to_string())
        } else {
            Self::Csv(err.to_string())
        }
    }
}

/// Loads one price series per file, keyed by the filename-derived ticker.
///
/// # Examples
/// ```rust,no_run
/// use openvar::data::load_price_series;
///
/// let series = load_price_series(&["data/AAPL-bloomberg.csv"]).unwrap();
/// assert!(series.contains_key("AAPL"));
/// ```
pub fn load_price_series<P: AsRef<Path>>(
    paths: &[P],
) -> Result<BTreeMap<String, PriceSeries>, DataError> {
    let mut series = BTreeMap::new();
    for path in paths {
        let path = path.as_ref();
        let ticker = ticker_from_path(path);
        let loaded = load_one(path)?;
        info!(
            ticker = %ticker,
            rows = loaded.len(),
            file = %path.display(),
            "loaded price series"
        );
        series.insert(ticker, loaded);
    }
    Ok(series)
}

fn load_one(path: &Path) -> Result<PriceSeries, DataError> {
    let file = path.display().to_string();
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let date_idx = column_index(&headers, DATE_COLUMN).ok_or_else(|| DataError::MissingColumn {
        file: file.clone(),
        column: DATE_COLUMN.to_string(),
    })?;
    let price_idx =
        column_index(&headers, PRICE_COLUMN).ok_or_else(|| DataError::MissingColumn {
            file: file.clone(),
            column: PRICE_COLUMN.to_string(),
        })?;

    let mut rows: Vec<(NaiveDate, f64)> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let date = parse_date(&record[date_idx]).ok_or_else(|| DataError::InvalidRow {
            file: file.clone(),
            line,
            message: format!("unparseable date {:?}", &record[date_idx]),
        })?;
        let price: f64 = record[price_idx]
            .trim()
            .parse()
            .map_err(|_| DataError::InvalidRow {
                file: file.clone(),
                line,
                message: format!("unparseable price {:?}", &record[price_idx]),
            })?;
        rows.push((date, price));
    }
    debug!(file = %file, rows = rows.len(), "parsed csv records");

    rows.sort_by_key(|(date, _)| *date);
    PriceSeries::from_pairs(rows).map_err(|err| DataError::InvalidSeries {
        file,
        message: err.to_string(),
    })
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

/// Ticker symbol from the file stem, with a `-bloomberg` export marker removed.
fn ticker_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.strip_suffix("-bloomberg").unwrap_or(&stem).to_string()
}
