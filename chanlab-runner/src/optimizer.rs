//! Parameter optimizer — bounded grid sweep over strategy parameters.
//!
//! Each candidate run is a pure function of (dataset, parameters), so
//! candidates execute in parallel over the shared read-only dataset. A
//! panicking candidate is caught and recorded as failed with neutral
//! metrics; it never takes its siblings down with it.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use chanlab_core::data::Dataset;
use chanlab_core::domain::StrategyParameters;
use chanlab_core::engine::{run_backtest, CancelToken};

use crate::metrics::BacktestStats;

/// Weight of the profit-factor term is capped here so the sentinel value
/// for loss-free runs cannot dominate the objective.
pub const SCORE_PROFIT_FACTOR_CAP: f64 = 10.0;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("sweep cancelled")]
    Cancelled,
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Composite objective: risk-adjusted return with an intentional
/// over-penalty on tail risk relative to average performance.
pub fn composite_score(sharpe: f64, profit_factor: f64, worst_trade: f64) -> f64 {
    2.0 * sharpe + 0.2 * profit_factor.min(SCORE_PROFIT_FACTOR_CAP) - 3.0 * worst_trade.abs()
}

/// One row of the optimizer's ranked output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationCandidate {
    pub params: StrategyParameters,
    pub stats: BacktestStats,
    pub score: f64,
    /// True when this candidate's run errored or panicked; its metrics are
    /// neutral zeros and it ranks below every successful sibling.
    pub failed: bool,
}

impl OptimizationCandidate {
    fn failed(params: StrategyParameters) -> Self {
        Self {
            params,
            stats: BacktestStats::zeroed(),
            score: 0.0,
            failed: true,
        }
    }
}

/// Explicit value lists for each swept axis. Gate floors and other fixed
/// parameters come from the base tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub entry_threshold_sigmas: Vec<f64>,
    pub stop_sigmas: Vec<f64>,
    pub max_holding_days: Vec<usize>,
    pub window_sizes: Vec<usize>,
    pub max_positions: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            entry_threshold_sigmas: vec![1.5, 2.0, 2.5],
            stop_sigmas: vec![3.0, 4.0],
            max_holding_days: vec![20, 40],
            window_sizes: vec![120],
            max_positions: vec![10],
        }
    }
}

impl ParamGrid {
    /// Upper bound on candidate count (before invalid combinations drop out).
    pub fn size(&self) -> usize {
        self.entry_threshold_sigmas.len()
            * self.stop_sigmas.len()
            * self.max_holding_days.len()
            * self.window_sizes.len()
            * self.max_positions.len()
    }

    /// Generate the finite candidate list. Combinations that fail parameter
    /// validation (and stops at or inside the entry threshold, which could
    /// never hold a position) are skipped.
    pub fn generate(&self, base: &StrategyParameters) -> Vec<StrategyParameters> {
        let mut candidates = Vec::with_capacity(self.size());
        for &entry in &self.entry_threshold_sigmas {
            for &stop in &self.stop_sigmas {
                if stop <= entry {
                    continue;
                }
                for &holding in &self.max_holding_days {
                    for &window in &self.window_sizes {
                        for &positions in &self.max_positions {
                            let params = StrategyParameters {
                                entry_threshold_sigma: entry,
                                stop_sigma: stop,
                                max_holding_days: holding,
                                window_size: window,
                                max_positions: positions,
                                ..base.clone()
                            };
                            if params.validate().is_ok() {
                                candidates.push(params);
                            }
                        }
                    }
                }
            }
        }
        candidates
    }
}

/// Parameter sweep executor.
pub struct ParamSweep {
    /// Concurrency cap for candidate runs. `None` uses rayon's global pool.
    max_workers: Option<usize>,
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { max_workers: None }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers.max(1));
        self
    }

    /// Run every candidate against the shared dataset and return them ranked
    /// descending by score, failed candidates last.
    ///
    /// Cancellation is cooperative: pending candidates observe the token
    /// between and inside runs, and a cancelled sweep returns an error
    /// rather than a partial ranking.
    pub fn sweep(
        &self,
        dataset: &Dataset,
        candidates: Vec<StrategyParameters>,
        cancel: &CancelToken,
    ) -> Result<Vec<OptimizationCandidate>, SweepError> {
        let run_all = || {
            candidates
                .into_par_iter()
                .map(|params| run_candidate(dataset, params, cancel))
                .collect::<Vec<OptimizationCandidate>>()
        };

        let mut results = match self.max_workers {
            Some(workers) => rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()?
                .install(run_all),
            None => run_all(),
        };

        if cancel.is_cancelled() {
            return Err(SweepError::Cancelled);
        }

        results.sort_by(|a, b| {
            a.failed.cmp(&b.failed).then_with(|| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });
        Ok(results)
    }
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one candidate in isolation: an engine error or a panic yields a
/// failed candidate instead of propagating.
pub fn run_candidate(
    dataset: &Dataset,
    params: StrategyParameters,
    cancel: &CancelToken,
) -> OptimizationCandidate {
    let outcome = catch_unwind(AssertUnwindSafe(|| run_backtest(dataset, &params, cancel)));

    match outcome {
        Ok(Ok(result)) => {
            let stats =
                BacktestStats::compute(&result.trades, params.max_positions, dataset.years_spanned());
            let score = composite_score(stats.sharpe, stats.profit_factor, stats.worst_trade);
            OptimizationCandidate {
                params,
                stats,
                score,
                failed: false,
            }
        }
        // Cancelled runs also land here; sweep() re-checks the token so a
        // partial collection can never be ranked.
        Ok(Err(_)) | Err(_) => OptimizationCandidate::failed(params),
    }
}
