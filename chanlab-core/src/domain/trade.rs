//! ClosedTrade — an immutable round-trip appended to the run's trade log.

use super::position::{Direction, OpenPosition};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why a position was closed, in evaluation precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    /// Deviation closed back through the fitted mid-line.
    Target,
    /// Deviation widened beyond the stop threshold against the position.
    Stop,
    /// Maximum holding period reached without a statistical exit.
    Time,
}

/// A completed round-trip trade. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosedTrade {
    pub ticker: String,
    pub direction: Direction,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Fractional return, sign consistent with direction.
    pub return_pct: f64,
    pub days_held: usize,
    pub exit_reason: ExitReason,
}

impl ClosedTrade {
    /// Convert an open position into its closed-trade record.
    pub fn from_exit(
        position: &OpenPosition,
        exit_date: NaiveDate,
        exit_index: usize,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Self {
        Self {
            ticker: position.ticker.clone(),
            direction: position.direction,
            entry_date: position.entry_date,
            exit_date,
            entry_price: position.entry_price,
            exit_price,
            return_pct: position.return_at(exit_price),
            days_held: position.days_held(exit_index),
            exit_reason,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.return_pct > 0.0
    }
}
