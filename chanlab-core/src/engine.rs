//! Position & portfolio simulator — a deterministic walk over the shared
//! date axis with a capacity-bounded open-position table.
//!
//! Ordering is load-bearing and must not change: exits are evaluated before
//! new entries within each date step, and dates are processed strictly
//! ascending. All simulation state is constructed fresh per invocation and
//! returned; nothing survives the call, so concurrent candidate runs in the
//! optimizer only share the read-only dataset.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channel::ChannelFit;
use crate::data::Dataset;
use crate::domain::{ClosedTrade, OpenPosition, ParamError, StrategyParameters};
use crate::signal::{evaluate_entry, evaluate_exit, Signal, MIN_EXIT_SAMPLES};

/// Cooperative cancellation for long walks and sweeps.
///
/// Cloning shares the flag; any clone may cancel. The engine checks it once
/// per date step, so cancellation latency is one step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] ParamError),
    #[error("dataset has an empty date axis")]
    EmptyDataset,
    #[error("run cancelled")]
    Cancelled,
}

/// The simulator's output: the full closed-trade log in exit order, the
/// single worst trade return, and the end-of-run open snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub trades: Vec<ClosedTrade>,
    /// Most negative trade return across the run; 0.0 when no trades closed.
    pub worst_trade: f64,
    /// Positions still open when the walk ended, for downstream display.
    pub open_snapshot: Vec<OpenPosition>,
    /// Highest simultaneous open-position count observed (≤ max_positions).
    pub peak_open_positions: usize,
    /// True when the drawdown circuit breaker halted further entries.
    pub entries_halted: bool,
}

/// Walk the dataset under one parameter tuple and emit closed trades.
///
/// Deterministic: the output depends only on `dataset` and `params`. The
/// cancellation token is the only external influence, and it can only stop
/// the run early (`EngineError::Cancelled`), never reorder it.
pub fn run_backtest(
    dataset: &Dataset,
    params: &StrategyParameters,
    cancel: &CancelToken,
) -> Result<RunResult, EngineError> {
    params.validate()?;
    let dates = dataset.dates();
    if dates.is_empty() {
        return Err(EngineError::EmptyDataset);
    }

    let mut positions: HashMap<String, OpenPosition> = HashMap::new();
    let mut trades: Vec<ClosedTrade> = Vec::new();
    let mut peak_open_positions = 0usize;

    // Compounded closed-trade equity for the circuit breaker, with each
    // slot risking 1/max_positions of capital.
    let slot_weight = 1.0 / params.max_positions as f64;
    let mut equity = 1.0f64;
    let mut equity_peak = 1.0f64;
    let mut entries_halted = false;

    for index in params.window_size..dates.len() {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let date = dates[index];

        // ── Exit pass ──
        // Snapshot the tickers to close first, then mutate the table, so the
        // position map is never modified mid-iteration.
        let mut to_close: Vec<ClosedTrade> = Vec::new();
        for position in positions.values() {
            let Some(series) = dataset.series(&position.ticker) else {
                continue;
            };
            // Missing price today: skip this position for this step.
            let Some(window) = series.trailing_window(date, params.window_size) else {
                continue;
            };
            if window.len() < MIN_EXIT_SAMPLES {
                continue;
            }
            let fit = ChannelFit::fit(window);
            let price = window[window.len() - 1];
            let sigma_distance = fit.sigma_distance(price);
            let days_held = position.days_held(index);

            if let Some(reason) = evaluate_exit(position.direction, sigma_distance, days_held, params)
            {
                to_close.push(ClosedTrade::from_exit(position, date, index, price, reason));
            }
        }
        // Deterministic exit order within a step.
        to_close.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        for trade in to_close {
            positions.remove(&trade.ticker);
            equity *= 1.0 + trade.return_pct * slot_weight;
            equity_peak = equity_peak.max(equity);
            trades.push(trade);
        }

        // Circuit breaker: once breached, no further entries for the run.
        if !entries_halted && equity_peak > 0.0 {
            let drawdown = equity / equity_peak - 1.0;
            if drawdown < -params.max_drawdown_halt {
                entries_halted = true;
            }
        }

        // ── Entry pass ──
        if !entries_halted && positions.len() < params.max_positions {
            let mut candidates: Vec<Signal> = Vec::new();
            for ticker in dataset.tickers() {
                if positions.contains_key(ticker) {
                    continue;
                }
                let Some(series) = dataset.series(ticker) else {
                    continue;
                };
                let Some(window) = series.trailing_window(date, params.window_size) else {
                    continue;
                };
                if let Some(signal) =
                    evaluate_entry(ticker, window, dataset.fundamentals(ticker), params)
                {
                    candidates.push(signal);
                }
            }

            // Highest conviction first; ticker breaks ties deterministically.
            candidates.sort_by(|a, b| {
                b.conviction
                    .partial_cmp(&a.conviction)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.ticker.cmp(&b.ticker))
            });

            let capacity = params.max_positions - positions.len();
            for signal in candidates.into_iter().take(capacity) {
                let series = dataset
                    .series(&signal.ticker)
                    .expect("candidate came from dataset tickers");
                let Some(entry_price) = series.close_on(date) else {
                    continue;
                };
                positions.insert(
                    signal.ticker.clone(),
                    OpenPosition {
                        ticker: signal.ticker,
                        direction: signal.direction,
                        entry_price,
                        entry_index: index,
                        entry_date: date,
                    },
                );
            }
        }

        peak_open_positions = peak_open_positions.max(positions.len());
    }

    let worst_trade = trades
        .iter()
        .map(|t| t.return_pct)
        .fold(f64::INFINITY, f64::min);
    let worst_trade = if worst_trade.is_finite() { worst_trade } else { 0.0 };

    let mut open_snapshot: Vec<OpenPosition> = positions.into_values().collect();
    open_snapshot.sort_by(|a, b| a.ticker.cmp(&b.ticker));

    Ok(RunResult {
        trades,
        worst_trade,
        open_snapshot,
        peak_open_positions,
        entries_halted,
    })
}
