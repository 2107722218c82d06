//! Performance metrics — pure functions that reduce a closed-trade log into
//! strategy statistics.
//!
//! Every metric is a pure function: trade list in, scalar out. Returns are
//! portfolio-weighted by 1/max_positions before compounding, modelling
//! fixed-fractional sizing where each capacity slot risks an equal share.

use serde::{Deserialize, Serialize};

use chanlab_core::domain::{ClosedTrade, ExitReason};

/// Sentinel profit factor when there are no losing trades but at least one
/// winner. Keeps the value finite for downstream scoring and display.
pub const PROFIT_FACTOR_SENTINEL: f64 = 99.0;

/// Trade counts grouped by exit reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitBreakdown {
    pub target: usize,
    pub stop: usize,
    pub time: usize,
}

impl ExitBreakdown {
    pub fn from_trades(trades: &[ClosedTrade]) -> Self {
        let mut breakdown = Self::default();
        for trade in trades {
            match trade.exit_reason {
                ExitReason::Target => breakdown.target += 1,
                ExitReason::Stop => breakdown.stop += 1,
                ExitReason::Time => breakdown.time += 1,
            }
        }
        breakdown
    }

    pub fn total(&self) -> usize {
        self.target + self.stop + self.time
    }
}

/// Aggregate statistics for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestStats {
    pub trade_count: usize,
    pub win_rate: f64,
    /// Compounded total return over slot-weighted trade returns, in exit
    /// order.
    pub total_return: f64,
    /// Trade-count-annualized Sharpe: mean(w) × sqrt(trades/yr) / std(w).
    /// Deliberately not a time-weighted daily-return Sharpe.
    pub sharpe: f64,
    pub profit_factor: f64,
    /// Most negative single trade return; the run's tail-risk proxy,
    /// distinct from compounded-equity max drawdown.
    pub worst_trade: f64,
    pub avg_return: f64,
    pub avg_days_held: f64,
    pub exit_breakdown: ExitBreakdown,
}

impl BacktestStats {
    /// Compute all statistics from a trade log ordered by exit date.
    pub fn compute(trades: &[ClosedTrade], max_positions: usize, years: f64) -> Self {
        Self {
            trade_count: trades.len(),
            win_rate: win_rate(trades),
            total_return: compounded_return(trades, max_positions),
            sharpe: sharpe_ratio(trades, max_positions, years),
            profit_factor: profit_factor(trades),
            worst_trade: worst_trade(trades),
            avg_return: avg_return(trades),
            avg_days_held: avg_days_held(trades),
            exit_breakdown: ExitBreakdown::from_trades(trades),
        }
    }

    /// Neutral statistics for a failed or empty candidate run.
    pub fn zeroed() -> Self {
        Self::compute(&[], 1, 1.0)
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Fraction of trades with strictly positive return.
pub fn win_rate(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Slot-weighted return of one trade: return / max_positions.
fn weighted_returns(trades: &[ClosedTrade], max_positions: usize) -> Vec<f64> {
    let weight = 1.0 / max_positions.max(1) as f64;
    trades.iter().map(|t| t.return_pct * weight).collect()
}

/// Compounded total return: Π(1 + weighted) − 1 over trades in exit order.
pub fn compounded_return(trades: &[ClosedTrade], max_positions: usize) -> f64 {
    weighted_returns(trades, max_positions)
        .iter()
        .fold(1.0, |acc, w| acc * (1.0 + w))
        - 1.0
}

/// Trade-count-annualized Sharpe ratio over slot-weighted returns.
///
/// trades_per_year = total trades / years of data spanned. Returns 0.0 with
/// fewer than 2 trades, zero variance, or a non-positive span.
pub fn sharpe_ratio(trades: &[ClosedTrade], max_positions: usize, years: f64) -> f64 {
    if trades.len() < 2 || years <= 0.0 {
        return 0.0;
    }
    let weighted = weighted_returns(trades, max_positions);
    let mean = mean_f64(&weighted);
    let std = std_dev(&weighted);
    if std < 1e-15 {
        return 0.0;
    }
    let trades_per_year = trades.len() as f64 / years;
    mean * trades_per_year.sqrt() / std
}

/// Gross profit / gross loss over raw trade returns.
///
/// No losses: the sentinel 99 when any profit exists, else 0.
pub fn profit_factor(trades: &[ClosedTrade]) -> f64 {
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.return_pct > 0.0)
        .map(|t| t.return_pct)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.return_pct < 0.0)
        .map(|t| t.return_pct.abs())
        .sum();

    if gross_loss == 0.0 {
        return if gross_profit > 0.0 {
            PROFIT_FACTOR_SENTINEL
        } else {
            0.0
        };
    }
    gross_profit / gross_loss
}

/// Most negative trade return; 0.0 for an empty log.
pub fn worst_trade(trades: &[ClosedTrade]) -> f64 {
    let min = trades
        .iter()
        .map(|t| t.return_pct)
        .fold(f64::INFINITY, f64::min);
    if min.is_finite() {
        min
    } else {
        0.0
    }
}

pub fn avg_return(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.return_pct).sum::<f64>() / trades.len() as f64
}

pub fn avg_days_held(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.days_held as f64).sum::<f64>() / trades.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
