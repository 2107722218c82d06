use serde::{Deserialize, Serialize};

/// Latest known value factors for one ticker, held constant for a whole run.
///
/// A snapshot may be present while an individual field is not (sparse
/// upstream coverage). A missing field never fires its value gate; a missing
/// snapshot fail-closes the ticker out of entry evaluation entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FundamentalSnapshot {
    pub ticker: String,
    /// Earnings yield (E/P).
    pub earnings_yield: Option<f64>,
    /// Book-to-market (B/M).
    pub book_to_market: Option<f64>,
}

impl FundamentalSnapshot {
    /// True when `value < floor` for a present field. Missing fields pass.
    pub fn fails_floor(value: Option<f64>, floor: f64) -> bool {
        matches!(value, Some(v) if v < floor)
    }
}
