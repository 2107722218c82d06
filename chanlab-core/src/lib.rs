//! ChanLab Core — channel fit estimation, signal generation, and the
//! capacity-bounded portfolio simulator.
//!
//! This crate is the deterministic heart of the engine:
//! - Domain types (prices, fundamentals, positions, trades, parameters)
//! - OLS channel fit estimator with degenerate-input fallbacks
//! - Slope-aligned mean-reversion signal generation with quality/value gates
//! - Date-walk simulator: exits before entries, at most one position per
//!   ticker, global capacity bound, drawdown circuit breaker
//!
//! No I/O and no randomness: a run is a pure function of (dataset, params).
//! Loading, metrics, and the parameter optimizer live in `chanlab-runner`.

pub mod channel;
pub mod data;
pub mod domain;
pub mod engine;
pub mod signal;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the optimizer shares across worker
    /// threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<data::Dataset>();
        require_sync::<data::Dataset>();
        require_send::<domain::StrategyParameters>();
        require_sync::<domain::StrategyParameters>();
        require_send::<engine::RunResult>();
        require_sync::<engine::RunResult>();
        require_send::<engine::CancelToken>();
        require_sync::<engine::CancelToken>();
        require_send::<domain::ClosedTrade>();
        require_sync::<domain::ClosedTrade>();
        require_send::<signal::Signal>();
        require_sync::<signal::Signal>();
    }
}
