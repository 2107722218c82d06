//! ChanLab Runner — backtest orchestration, metrics, and parameter sweeps.
//!
//! This crate builds on `chanlab-core` to provide:
//! - CSV data loading into the normalized dataset
//! - TOML run configuration
//! - Trade-log performance metrics
//! - Grid parameter optimization with composite scoring
//! - Serializable run and sweep reports

pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod optimizer;
pub mod report;
pub mod runner;

pub use config::{ConfigError, DataConfig, RunConfig, SweepConfig};
pub use data_loader::{load_dataset, load_fundamentals, load_prices, LoadError};
pub use metrics::{BacktestStats, ExitBreakdown, PROFIT_FACTOR_SENTINEL};
pub use optimizer::{
    composite_score, OptimizationCandidate, ParamGrid, ParamSweep, SweepError,
    SCORE_PROFIT_FACTOR_CAP,
};
pub use report::{BacktestReport, OptimizationReport, SCHEMA_VERSION};
pub use runner::{run_optimization, run_single_backtest, RunError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn stats_and_reports_are_send_sync() {
        assert_send::<BacktestStats>();
        assert_sync::<BacktestStats>();
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
        assert_send::<OptimizationReport>();
        assert_sync::<OptimizationReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<SweepConfig>();
        assert_sync::<SweepConfig>();
    }

    #[test]
    fn optimizer_types_are_send_sync() {
        assert_send::<OptimizationCandidate>();
        assert_sync::<OptimizationCandidate>();
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
    }
}
