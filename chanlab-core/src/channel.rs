//! Channel fit estimator — closed-form OLS of price against time index.
//!
//! The fit defines a statistical trend line over a trailing window; the
//! residual standard deviation defines the deviation bands the signal layer
//! measures against. Degenerate inputs (short windows, flat series) resolve
//! to safe fallback values rather than errors, so a single illiquid or
//! constant-price ticker can never abort a multi-ticker run.

use serde::{Deserialize, Serialize};

/// Linear regression of a price window against its integer index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, clamped to [0, 1]. Exactly 0 for flat
    /// series (SS_tot = 0) and degenerate windows.
    pub r_squared: f64,
    /// Bessel-corrected sample standard deviation of the residuals.
    pub residual_sigma: f64,
    /// Window length the fit was computed over.
    pub n: usize,
}

impl ChannelFit {
    /// Fit a window of prices. Windows shorter than 2 produce the degenerate
    /// fallback: slope 0, intercept = first price (or 0 when empty), R² 0.
    pub fn fit(prices: &[f64]) -> Self {
        let n = prices.len();
        if n < 2 {
            return Self {
                slope: 0.0,
                intercept: prices.first().copied().unwrap_or(0.0),
                r_squared: 0.0,
                residual_sigma: 0.0,
                n,
            };
        }

        let nf = n as f64;
        let sum_x = nf * (nf - 1.0) / 2.0;
        let sum_x2 = (nf - 1.0) * nf * (2.0 * nf - 1.0) / 6.0;
        let sum_y: f64 = prices.iter().sum();
        let sum_xy: f64 = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| i as f64 * p)
            .sum();

        let denom = nf * sum_x2 - sum_x * sum_x;
        let slope = if denom != 0.0 {
            (nf * sum_xy - sum_x * sum_y) / denom
        } else {
            0.0
        };
        let intercept = (sum_y - slope * sum_x) / nf;

        let mean_y = sum_y / nf;
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for (i, &p) in prices.iter().enumerate() {
            let fitted = intercept + slope * i as f64;
            ss_res += (p - fitted) * (p - fitted);
            ss_tot += (p - mean_y) * (p - mean_y);
        }

        let r_squared = if ss_tot == 0.0 {
            0.0
        } else {
            (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
        };
        let residual_sigma = (ss_res / (nf - 1.0)).sqrt();

        Self {
            slope,
            intercept,
            r_squared,
            residual_sigma,
            n,
        }
    }

    /// Fitted value at the most recent point of the window.
    pub fn mid_line(&self) -> f64 {
        if self.n == 0 {
            return self.intercept;
        }
        self.intercept + self.slope * (self.n - 1) as f64
    }

    /// Residual sigmas between `last_price` and the fitted mid-line.
    /// Defined as 0 whenever sigma is not strictly positive.
    pub fn sigma_distance(&self, last_price: f64) -> f64 {
        if self.residual_sigma <= 0.0 {
            return 0.0;
        }
        (last_price - self.mid_line()) / self.residual_sigma
    }
}
