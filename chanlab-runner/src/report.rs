//! Serializable run artifacts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use chanlab_core::data::Dataset;
use chanlab_core::domain::{ClosedTrade, OpenPosition, StrategyParameters};
use chanlab_core::engine::RunResult;

use crate::metrics::BacktestStats;
use crate::optimizer::OptimizationCandidate;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run, self-describing enough to
/// reproduce: the parameter tuple, the dataset content hash, and the date
/// range all travel with the metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub params: StrategyParameters,
    pub stats: BacktestStats,
    pub trades: Vec<ClosedTrade>,
    /// Positions still open when the date axis ran out, surfaced rather
    /// than force-closed.
    pub open_positions: Vec<OpenPosition>,
    pub peak_open_positions: usize,
    /// True when the drawdown circuit breaker halted new entries at any
    /// point during the run.
    pub entries_halted: bool,
    pub dataset_hash: String,
    pub ticker_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub data_quality_warnings: Vec<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestReport {
    pub fn assemble(
        dataset: &Dataset,
        params: &StrategyParameters,
        result: RunResult,
    ) -> Self {
        let stats = BacktestStats::compute(
            &result.trades,
            params.max_positions,
            dataset.years_spanned(),
        );
        let mut open_positions = result.open_snapshot;
        open_positions.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Self {
            schema_version: SCHEMA_VERSION,
            params: params.clone(),
            stats,
            trades: result.trades,
            open_positions,
            peak_open_positions: result.peak_open_positions,
            entries_halted: result.entries_halted,
            dataset_hash: dataset.content_hash().to_string(),
            ticker_count: dataset.tickers().len(),
            start_date: dataset.dates().first().copied(),
            end_date: dataset.dates().last().copied(),
            data_quality_warnings: dataset.quality_warnings().to_vec(),
        }
    }
}

/// Ranked output of a parameter sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Candidates actually evaluated (invalid grid combinations excluded).
    pub evaluated: usize,
    pub failed: usize,
    /// Top candidates, descending by composite score.
    pub ranked: Vec<OptimizationCandidate>,
    pub dataset_hash: String,
    pub ticker_count: usize,
    pub data_quality_warnings: Vec<String>,
}

impl OptimizationReport {
    /// `top_n` is floored at 1 so a sweep always reports its best candidate.
    pub fn assemble(
        dataset: &Dataset,
        candidates: Vec<OptimizationCandidate>,
        top_n: usize,
    ) -> Self {
        let evaluated = candidates.len();
        let failed = candidates.iter().filter(|c| c.failed).count();
        let mut ranked = candidates;
        ranked.truncate(top_n.max(1));
        Self {
            schema_version: SCHEMA_VERSION,
            evaluated,
            failed,
            ranked,
            dataset_hash: dataset.content_hash().to_string(),
            ticker_count: dataset.tickers().len(),
            data_quality_warnings: dataset.quality_warnings().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanlab_core::domain::{FundamentalSnapshot, PriceRow};
    use chanlab_core::engine::{run_backtest, CancelToken};

    fn tiny_dataset() -> Dataset {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let rows = (0..150)
            .map(|i| {
                let close = 50.0 + 0.1 * i as f64;
                PriceRow {
                    ticker: "XYZ".into(),
                    date: start + chrono::Days::new(i as u64),
                    close,
                    adjusted_close: close,
                }
            })
            .collect();
        let fundamentals = vec![FundamentalSnapshot {
            ticker: "XYZ".into(),
            earnings_yield: Some(0.05),
            book_to_market: Some(0.9),
        }];
        Dataset::from_rows(rows, fundamentals).unwrap()
    }

    #[test]
    fn report_carries_provenance() {
        let ds = tiny_dataset();
        let params = StrategyParameters {
            window_size: 110,
            ..Default::default()
        };
        let result = run_backtest(&ds, &params, &CancelToken::new()).unwrap();
        let report = BacktestReport::assemble(&ds, &params, result);

        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.dataset_hash, ds.content_hash().to_string());
        assert_eq!(report.ticker_count, 1);
        assert_eq!(report.start_date, ds.dates().first().copied());
        assert_eq!(report.end_date, ds.dates().last().copied());
    }

    #[test]
    fn report_round_trips_through_json() {
        let ds = tiny_dataset();
        let params = StrategyParameters {
            window_size: 110,
            ..Default::default()
        };
        let result = run_backtest(&ds, &params, &CancelToken::new()).unwrap();
        let report = BacktestReport::assemble(&ds, &params, result);

        let json = serde_json::to_string_pretty(&report).unwrap();
        let back: BacktestReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.dataset_hash, report.dataset_hash);
        assert_eq!(back.trades.len(), report.trades.len());
        assert_eq!(back.params, report.params);
    }

    #[test]
    fn older_json_without_schema_version_still_loads() {
        let ds = tiny_dataset();
        let params = StrategyParameters {
            window_size: 110,
            ..Default::default()
        };
        let result = run_backtest(&ds, &params, &CancelToken::new()).unwrap();
        let report = BacktestReport::assemble(&ds, &params, result);

        let mut value = serde_json::to_value(&report).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let back: BacktestReport = serde_json::from_value(value).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn optimization_report_truncates_to_top_n() {
        let ds = tiny_dataset();
        let candidates: Vec<OptimizationCandidate> = Vec::new();
        let report = OptimizationReport::assemble(&ds, candidates, 5);
        assert_eq!(report.evaluated, 0);
        assert_eq!(report.failed, 0);
        assert!(report.ranked.is_empty());
    }

    #[test]
    fn top_n_zero_still_reports_the_best_candidate() {
        let ds = tiny_dataset();
        let candidate = |score: f64| OptimizationCandidate {
            params: StrategyParameters::default(),
            stats: BacktestStats::zeroed(),
            score,
            failed: false,
        };
        let report =
            OptimizationReport::assemble(&ds, vec![candidate(2.0), candidate(1.0)], 0);
        assert_eq!(report.evaluated, 2);
        assert_eq!(report.ranked.len(), 1);
        assert_eq!(report.ranked[0].score, 2.0);
    }
}
