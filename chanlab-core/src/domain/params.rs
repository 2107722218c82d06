use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Immutable input to one simulation run.
///
/// Every field participates in the external parameter contract; the defaults
/// are a conservative mean-reversion profile suitable for daily equity data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParameters {
    /// Entry fires when price sits this many residual sigmas from the fitted
    /// mid-line, on the mean-reverting side of the channel.
    pub entry_threshold_sigma: f64,
    /// Stop fires when the deviation widens beyond this many sigmas against
    /// the position.
    pub stop_sigma: f64,
    /// Time exit after this many trading days held.
    pub max_holding_days: usize,
    /// Minimum regression fit quality to trust the channel at all.
    pub min_r_squared: f64,
    /// Minimum absolute slope; flatter channels are ignored.
    pub min_slope: f64,
    /// Value gates. Missing fundamentals fields do not fire these.
    pub min_book_to_market: f64,
    pub min_earnings_yield: f64,
    /// Trailing regression window, in per-ticker trading days.
    pub window_size: usize,
    /// Capacity bound on simultaneously open positions.
    pub max_positions: usize,
    /// Drawdown circuit breaker: once compounded closed-trade equity falls
    /// this far (fractional) below its peak, no further entries are taken.
    pub max_drawdown_halt: f64,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        Self {
            entry_threshold_sigma: 2.0,
            stop_sigma: 3.5,
            max_holding_days: 30,
            min_r_squared: 0.60,
            min_slope: 0.01,
            min_book_to_market: 0.0,
            min_earnings_yield: 0.0,
            window_size: 120,
            max_positions: 10,
            max_drawdown_halt: 0.25,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("window_size must be at least 2, got {0}")]
    WindowTooShort(usize),
    #[error("max_positions must be at least 1")]
    NoCapacity,
    #[error("{field} must be positive and finite")]
    NonPositive { field: &'static str },
}

impl StrategyParameters {
    /// Reject parameter tuples no run could meaningfully execute with.
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.window_size < 2 {
            return Err(ParamError::WindowTooShort(self.window_size));
        }
        if self.max_positions == 0 {
            return Err(ParamError::NoCapacity);
        }
        for (field, value) in [
            ("entry_threshold_sigma", self.entry_threshold_sigma),
            ("stop_sigma", self.stop_sigma),
            ("max_drawdown_halt", self.max_drawdown_halt),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParamError::NonPositive { field });
            }
        }
        Ok(())
    }
}
