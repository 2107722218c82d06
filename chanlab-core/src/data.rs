//! Normalized in-memory dataset: union date axis, per-ticker date-keyed
//! series, fundamentals, and a content hash for result traceability.
//!
//! All normalization happens exactly once here. Loosely-typed or unusable
//! price fields never reach the per-step hot path: rows with no usable
//! (finite, positive) price are dropped at construction and reported as
//! quality warnings.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::domain::{FundamentalSnapshot, PriceRow};

/// The one condition that aborts a run outright: unusable upstream data.
/// Everything softer (gaps, short windows, missing fundamentals) degrades to
/// silent per-ticker exclusion instead.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no usable price rows in dataset")]
    Empty,
    #[error("duplicate price row for {ticker} on {date}")]
    DuplicateRow { ticker: String, date: NaiveDate },
}

/// One ticker's trading history, sorted ascending by date.
#[derive(Debug, Clone, Default)]
pub struct TickerSeries {
    dates: Vec<NaiveDate>,
    closes: Vec<f64>,
    index_by_date: HashMap<NaiveDate, usize>,
}

impl TickerSeries {
    /// Position of `date` in this ticker's own history, `None` on a gap.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.index_by_date.get(&date).copied()
    }

    /// Normalized close on `date`, `None` on a gap.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.position(date).map(|i| self.closes[i])
    }

    /// Trailing window of up to `window_size` closes ending at `date`
    /// (inclusive). `None` when the ticker did not trade that day.
    ///
    /// The window is measured in the ticker's own trading days, so per-ticker
    /// gaps shorten look-back instead of fabricating prices.
    pub fn trailing_window(&self, date: NaiveDate, window_size: usize) -> Option<&[f64]> {
        let end = self.position(date)?;
        let start = (end + 1).saturating_sub(window_size);
        Some(&self.closes[start..=end])
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// The static input to a backtest run: read-only once built, safely shared
/// across concurrent optimizer candidates without synchronization.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Union of all tickers' trading dates, strictly ascending.
    dates: Vec<NaiveDate>,
    series: HashMap<String, TickerSeries>,
    fundamentals: HashMap<String, FundamentalSnapshot>,
    tickers: Vec<String>,
    content_hash: String,
    /// Rows dropped during normalization, for operator visibility.
    quality_warnings: Vec<String>,
}

impl Dataset {
    /// Build a dataset from upstream rows and fundamentals snapshots.
    ///
    /// Rows are expected deduplicated and sorted per ticker; out-of-order
    /// input is tolerated by sorting here, duplicates are a hard error.
    pub fn from_rows(
        rows: Vec<PriceRow>,
        fundamentals: Vec<FundamentalSnapshot>,
    ) -> Result<Self, DataError> {
        let mut per_ticker: HashMap<String, Vec<(NaiveDate, f64)>> = HashMap::new();
        let mut quality_warnings = Vec::new();

        for row in &rows {
            let Some(close) = row.effective_close() else {
                quality_warnings.push(format!(
                    "dropped unusable price for {} on {}: close={}, adjusted={}",
                    row.ticker, row.date, row.close, row.adjusted_close
                ));
                continue;
            };
            per_ticker
                .entry(row.ticker.clone())
                .or_default()
                .push((row.date, close));
        }

        if per_ticker.is_empty() {
            return Err(DataError::Empty);
        }

        let mut tickers: Vec<String> = per_ticker.keys().cloned().collect();
        tickers.sort_unstable();

        // Hash in canonical (ticker, date) order so the hash identifies the
        // data, not its arrival order.
        let mut hasher = blake3::Hasher::new();
        let mut dates: Vec<NaiveDate> = Vec::new();
        let mut series = HashMap::with_capacity(per_ticker.len());
        for ticker in &tickers {
            let mut points = per_ticker.remove(ticker).unwrap_or_default();
            points.sort_by_key(|(date, _)| *date);
            let mut ts = TickerSeries {
                dates: Vec::with_capacity(points.len()),
                closes: Vec::with_capacity(points.len()),
                index_by_date: HashMap::with_capacity(points.len()),
            };
            for (date, close) in points {
                if ts.index_by_date.insert(date, ts.dates.len()).is_some() {
                    return Err(DataError::DuplicateRow {
                        ticker: ticker.clone(),
                        date,
                    });
                }
                hasher.update(ticker.as_bytes());
                hasher.update(&date.num_days_from_ce().to_le_bytes());
                hasher.update(&close.to_le_bytes());
                ts.dates.push(date);
                ts.closes.push(close);
                dates.push(date);
            }
            series.insert(ticker.clone(), ts);
        }

        dates.sort_unstable();
        dates.dedup();

        let fundamentals: HashMap<String, FundamentalSnapshot> = fundamentals
            .into_iter()
            .map(|snap| (snap.ticker.clone(), snap))
            .collect();

        Ok(Self {
            dates,
            series,
            fundamentals,
            tickers,
            content_hash: hasher.finalize().to_hex().to_string(),
            quality_warnings,
        })
    }

    /// The shared date axis the simulator walks, strictly ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// All tickers with at least one usable price row, sorted for
    /// deterministic iteration order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn series(&self, ticker: &str) -> Option<&TickerSeries> {
        self.series.get(ticker)
    }

    pub fn fundamentals(&self, ticker: &str) -> Option<&FundamentalSnapshot> {
        self.fundamentals.get(ticker)
    }

    /// blake3 hash of all usable (ticker, date, close) triples in canonical
    /// (ticker, date) order, recorded in reports so results are traceable to
    /// their inputs regardless of row arrival order.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn quality_warnings(&self) -> &[String] {
        &self.quality_warnings
    }

    /// Calendar span of the date axis in fractional years. At least one day.
    pub fn years_spanned(&self) -> f64 {
        match (self.dates.first(), self.dates.last()) {
            (Some(first), Some(last)) => {
                let days = (*last - *first).num_days().max(1) as f64;
                days / 365.25
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(ticker: &str, d: NaiveDate, close: f64) -> PriceRow {
        PriceRow {
            ticker: ticker.into(),
            date: d,
            close,
            adjusted_close: close,
        }
    }

    fn snapshot(ticker: &str) -> FundamentalSnapshot {
        FundamentalSnapshot {
            ticker: ticker.into(),
            earnings_yield: Some(0.06),
            book_to_market: Some(0.9),
        }
    }

    #[test]
    fn builds_union_date_axis() {
        let rows = vec![
            row("AAA", date(2024, 1, 2), 10.0),
            row("AAA", date(2024, 1, 3), 11.0),
            row("BBB", date(2024, 1, 3), 20.0),
            row("BBB", date(2024, 1, 4), 21.0),
        ];
        let ds = Dataset::from_rows(rows, vec![snapshot("AAA")]).unwrap();
        assert_eq!(
            ds.dates(),
            &[date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)]
        );
        assert_eq!(ds.tickers(), &["AAA".to_string(), "BBB".to_string()]);
    }

    #[test]
    fn tolerates_per_ticker_gaps() {
        let rows = vec![
            row("AAA", date(2024, 1, 2), 10.0),
            row("AAA", date(2024, 1, 5), 12.0),
        ];
        let ds = Dataset::from_rows(rows, vec![]).unwrap();
        let ts = ds.series("AAA").unwrap();
        assert_eq!(ts.close_on(date(2024, 1, 5)), Some(12.0));
        assert_eq!(ts.close_on(date(2024, 1, 3)), None);
        // Gap shortens the window; no price is fabricated
        assert_eq!(ts.trailing_window(date(2024, 1, 5), 10), Some(&[10.0, 12.0][..]));
        assert_eq!(ts.trailing_window(date(2024, 1, 3), 10), None);
    }

    #[test]
    fn trailing_window_is_bounded_by_window_size() {
        let rows: Vec<PriceRow> = (0..10)
            .map(|i| row("AAA", date(2024, 1, 1) + chrono::Days::new(i), 10.0 + i as f64))
            .collect();
        let ds = Dataset::from_rows(rows, vec![]).unwrap();
        let ts = ds.series("AAA").unwrap();
        let win = ts.trailing_window(date(2024, 1, 10), 3).unwrap();
        assert_eq!(win, &[16.0, 17.0, 18.0]);
    }

    #[test]
    fn sorts_out_of_order_rows() {
        let rows = vec![
            row("AAA", date(2024, 1, 5), 12.0),
            row("AAA", date(2024, 1, 2), 10.0),
        ];
        let ds = Dataset::from_rows(rows, vec![]).unwrap();
        let ts = ds.series("AAA").unwrap();
        assert_eq!(ts.trailing_window(date(2024, 1, 5), 2), Some(&[10.0, 12.0][..]));
    }

    #[test]
    fn duplicate_rows_are_a_hard_error() {
        let rows = vec![
            row("AAA", date(2024, 1, 2), 10.0),
            row("AAA", date(2024, 1, 2), 10.5),
        ];
        assert!(matches!(
            Dataset::from_rows(rows, vec![]),
            Err(DataError::DuplicateRow { .. })
        ));
    }

    #[test]
    fn unusable_rows_are_dropped_with_warnings() {
        let rows = vec![
            row("AAA", date(2024, 1, 2), 10.0),
            row("AAA", date(2024, 1, 3), f64::NAN),
            row("AAA", date(2024, 1, 4), -5.0),
        ];
        let ds = Dataset::from_rows(rows, vec![]).unwrap();
        assert_eq!(ds.series("AAA").unwrap().len(), 1);
        assert_eq!(ds.quality_warnings().len(), 2);
    }

    #[test]
    fn all_unusable_rows_is_empty() {
        let rows = vec![row("AAA", date(2024, 1, 2), f64::NAN)];
        assert!(matches!(Dataset::from_rows(rows, vec![]), Err(DataError::Empty)));
        assert!(matches!(Dataset::from_rows(vec![], vec![]), Err(DataError::Empty)));
    }

    #[test]
    fn content_hash_is_stable_and_input_sensitive() {
        let rows = vec![row("AAA", date(2024, 1, 2), 10.0)];
        let a = Dataset::from_rows(rows.clone(), vec![]).unwrap();
        let b = Dataset::from_rows(rows, vec![]).unwrap();
        assert_eq!(a.content_hash(), b.content_hash());

        let c = Dataset::from_rows(vec![row("AAA", date(2024, 1, 2), 10.5)], vec![]).unwrap();
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn content_hash_ignores_row_arrival_order() {
        let ordered = vec![
            row("AAA", date(2024, 1, 2), 10.0),
            row("AAA", date(2024, 1, 3), 11.0),
            row("BBB", date(2024, 1, 2), 20.0),
        ];
        let shuffled = vec![
            row("BBB", date(2024, 1, 2), 20.0),
            row("AAA", date(2024, 1, 3), 11.0),
            row("AAA", date(2024, 1, 2), 10.0),
        ];
        let a = Dataset::from_rows(ordered, vec![]).unwrap();
        let b = Dataset::from_rows(shuffled, vec![]).unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn years_spanned_from_axis_extent() {
        let rows = vec![
            row("AAA", date(2020, 1, 1), 10.0),
            row("AAA", date(2021, 1, 1), 12.0),
        ];
        let ds = Dataset::from_rows(rows, vec![]).unwrap();
        assert!((ds.years_spanned() - 366.0 / 365.25).abs() < 1e-9);
    }

    #[test]
    fn fundamentals_lookup() {
        let rows = vec![row("AAA", date(2024, 1, 2), 10.0)];
        let ds = Dataset::from_rows(rows, vec![snapshot("AAA")]).unwrap();
        assert!(ds.fundamentals("AAA").is_some());
        assert!(ds.fundamentals("BBB").is_none());
    }
}
