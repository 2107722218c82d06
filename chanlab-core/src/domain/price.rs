use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One price observation for one ticker on one trading day.
///
/// Rows arrive from the upstream price store ordered ascending by date per
/// ticker. Per-ticker date gaps are expected (halts, listings, illiquid
/// names) and are tolerated downstream via date-keyed lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
    /// Split/dividend-adjusted close. Preferred for all engine math when
    /// finite and positive; `close` is the fallback.
    pub adjusted_close: f64,
}

impl PriceRow {
    /// The single normalized price the engine works with.
    ///
    /// Returns `None` when neither field is a usable (finite, positive)
    /// number; such rows are dropped once at dataset construction.
    pub fn effective_close(&self) -> Option<f64> {
        if self.adjusted_close.is_finite() && self.adjusted_close > 0.0 {
            return Some(self.adjusted_close);
        }
        if self.close.is_finite() && self.close > 0.0 {
            return Some(self.close);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(close: f64, adjusted: f64) -> PriceRow {
        PriceRow {
            ticker: "ACME".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            close,
            adjusted_close: adjusted,
        }
    }

    #[test]
    fn prefers_adjusted_close() {
        assert_eq!(row(100.0, 98.5).effective_close(), Some(98.5));
    }

    #[test]
    fn falls_back_to_raw_close() {
        assert_eq!(row(100.0, f64::NAN).effective_close(), Some(100.0));
        assert_eq!(row(100.0, 0.0).effective_close(), Some(100.0));
        assert_eq!(row(100.0, -3.0).effective_close(), Some(100.0));
    }

    #[test]
    fn rejects_unusable_rows() {
        assert_eq!(row(f64::NAN, f64::NAN).effective_close(), None);
        assert_eq!(row(0.0, -1.0).effective_close(), None);
        assert_eq!(row(f64::INFINITY, 0.0).effective_close(), None);
    }
}
