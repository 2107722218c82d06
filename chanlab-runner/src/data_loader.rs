//! CSV ingestion for price rows and fundamentals snapshots.
//!
//! Upstream data problems are the one hard-failure class in the system:
//! unreadable files or malformed rows abort the run with a descriptive
//! error instead of producing a partial result.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use chanlab_core::data::{DataError, Dataset};
use chanlab_core::domain::{FundamentalSnapshot, PriceRow};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed row in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("dataset rejected: {0}")]
    Data(#[from] DataError),
}

/// CSV row shape for prices: `ticker,date,close,adjusted_close`.
/// `adjusted_close` may be blank; normalization falls back to `close`.
#[derive(Debug, Deserialize)]
struct PriceCsvRow {
    ticker: String,
    date: chrono::NaiveDate,
    close: f64,
    adjusted_close: Option<f64>,
}

/// CSV row shape for fundamentals: `ticker,earnings_yield,book_to_market`,
/// either factor may be blank.
#[derive(Debug, Deserialize)]
struct FundamentalsCsvRow {
    ticker: String,
    earnings_yield: Option<f64>,
    book_to_market: Option<f64>,
}

pub fn load_prices(path: &Path) -> Result<Vec<PriceRow>, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| wrap_csv(path, e))?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<PriceCsvRow>() {
        let row = record.map_err(|e| wrap_csv(path, e))?;
        rows.push(PriceRow {
            adjusted_close: row.adjusted_close.unwrap_or(row.close),
            ticker: row.ticker,
            date: row.date,
            close: row.close,
        });
    }
    Ok(rows)
}

pub fn load_fundamentals(path: &Path) -> Result<Vec<FundamentalSnapshot>, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| wrap_csv(path, e))?;
    let mut snapshots = Vec::new();
    for record in reader.deserialize::<FundamentalsCsvRow>() {
        let row = record.map_err(|e| wrap_csv(path, e))?;
        snapshots.push(FundamentalSnapshot {
            ticker: row.ticker,
            earnings_yield: row.earnings_yield,
            book_to_market: row.book_to_market,
        });
    }
    Ok(snapshots)
}

/// Load both files and assemble the normalized dataset.
pub fn load_dataset(prices: &Path, fundamentals: &Path) -> Result<Dataset, LoadError> {
    let rows = load_prices(prices)?;
    let snapshots = load_fundamentals(fundamentals)?;
    Ok(Dataset::from_rows(rows, snapshots)?)
}

fn wrap_csv(path: &Path, source: csv::Error) -> LoadError {
    let path = path.display().to_string();
    if source.is_io_error() {
        match source.into_kind() {
            csv::ErrorKind::Io(io) => LoadError::Io { path, source: io },
            _ => unreachable!("is_io_error guarantees an Io kind"),
        }
    } else {
        LoadError::Csv { path, source }
    }
}
