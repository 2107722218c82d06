//! Signal generation — converts a channel fit plus fundamentals into a
//! ranked entry candidate, and decides exits for open positions.
//!
//! Entries are slope-aligned mean reversion: buy dips inside rising
//! channels, short pops inside falling channels. Counter-trend entries are
//! disallowed by construction, and a flat channel never signals.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelFit;
use crate::domain::{Direction, ExitReason, FundamentalSnapshot, StrategyParameters};

/// Minimum valid prices in the trailing window to evaluate a new entry.
pub const MIN_ENTRY_SAMPLES: usize = 100;

/// Minimum valid prices to evaluate an exit on an already-open position.
/// Deliberately looser than entry: existing positions may be managed with
/// less look-back than opening a new one requires.
pub const MIN_EXIT_SAMPLES: usize = 50;

/// Conviction weight used in place of book-to-market when the snapshot has
/// no B/M value. Tie-break policy only; never used for gating.
pub const FALLBACK_CONVICTION_WEIGHT: f64 = 0.5;

/// An entry candidate for one ticker on one date, consumed immediately by
/// the simulator's entry pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: String,
    pub direction: Direction,
    pub sigma_distance: f64,
    /// Ranking heuristic: fit quality × deviation magnitude × value proxy.
    /// Used only to prioritize simultaneous candidates under scarce
    /// capacity, never to gate.
    pub conviction: f64,
}

/// Evaluate one ticker for a new entry over its trailing window.
///
/// Returns at most one candidate. Rejections are silent by design: an
/// insufficient window or absent fundamentals simply excludes the ticker
/// from this date's candidate set.
pub fn evaluate_entry(
    ticker: &str,
    window: &[f64],
    fundamentals: Option<&FundamentalSnapshot>,
    params: &StrategyParameters,
) -> Option<Signal> {
    if window.len() < MIN_ENTRY_SAMPLES {
        return None;
    }
    // Fail-closed: no snapshot, no candidate.
    let snapshot = fundamentals?;
    if FundamentalSnapshot::fails_floor(snapshot.earnings_yield, params.min_earnings_yield)
        || FundamentalSnapshot::fails_floor(snapshot.book_to_market, params.min_book_to_market)
    {
        return None;
    }

    let fit = ChannelFit::fit(window);
    if fit.r_squared < params.min_r_squared || fit.slope.abs() < params.min_slope {
        return None;
    }

    let last = *window.last()?;
    let sigma_distance = fit.sigma_distance(last);

    let direction = if fit.slope > 0.0 && sigma_distance < -params.entry_threshold_sigma {
        Direction::Long
    } else if fit.slope < 0.0 && sigma_distance > params.entry_threshold_sigma {
        Direction::Short
    } else {
        return None;
    };

    let value_weight = snapshot
        .book_to_market
        .unwrap_or(FALLBACK_CONVICTION_WEIGHT);
    Some(Signal {
        ticker: ticker.to_string(),
        direction,
        sigma_distance,
        conviction: fit.r_squared * sigma_distance.abs() * value_weight,
    })
}

/// Exit decision for an open position given its current sigma distance and
/// holding time. Precedence: Target, then Stop, then Time — a statistical
/// breach beats a simultaneous time breach.
pub fn evaluate_exit(
    direction: Direction,
    sigma_distance: f64,
    days_held: usize,
    params: &StrategyParameters,
) -> Option<ExitReason> {
    let target = match direction {
        Direction::Long => sigma_distance >= 0.0,
        Direction::Short => sigma_distance <= 0.0,
    };
    if target {
        return Some(ExitReason::Target);
    }

    let stopped = match direction {
        Direction::Long => sigma_distance < -params.stop_sigma,
        Direction::Short => sigma_distance > params.stop_sigma,
    };
    if stopped {
        return Some(ExitReason::Stop);
    }

    if days_held >= params.max_holding_days {
        return Some(ExitReason::Time);
    }
    None
}
