use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trade direction. Entries are slope-aligned: Long into rising channels
/// below the mid-line, Short into falling channels above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

/// An open position, exclusively owned by the simulator's position table.
///
/// Created when a signal is accepted into a free capacity slot; destroyed by
/// conversion into a [`ClosedTrade`](super::ClosedTrade) on any exit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenPosition {
    pub ticker: String,
    pub direction: Direction,
    pub entry_price: f64,
    /// Index into the run's shared date axis at entry.
    pub entry_index: usize,
    pub entry_date: NaiveDate,
}

impl OpenPosition {
    /// Signed fractional return at `exit_price`, consistent with direction:
    /// Long (exit−entry)/entry, Short (entry−exit)/entry.
    pub fn return_at(&self, exit_price: f64) -> f64 {
        match self.direction {
            Direction::Long => (exit_price - self.entry_price) / self.entry_price,
            Direction::Short => (self.entry_price - exit_price) / self.entry_price,
        }
    }

    pub fn days_held(&self, current_index: usize) -> usize {
        current_index.saturating_sub(self.entry_index)
    }
}
