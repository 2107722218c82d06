//! High-level run orchestration: config in, report out.
//!
//! Two entry points, one per CLI command:
//! - `run_single_backtest()`: load data, walk once with the base parameters.
//! - `run_optimization()`: load data, sweep the configured grid.

use thiserror::Error;

use chanlab_core::engine::{run_backtest, CancelToken, EngineError};

use crate::config::RunConfig;
use crate::data_loader::{load_dataset, LoadError};
use crate::optimizer::{ParamSweep, SweepError};
use crate::report::{BacktestReport, OptimizationReport};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("sweep error: {0}")]
    Sweep(#[from] SweepError),
    #[error("config has no [sweep] section")]
    NoSweepSection,
    #[error("sweep grid produced no valid candidates")]
    EmptyGrid,
}

/// Load the dataset named by the config and run one backtest with its base
/// parameters.
pub fn run_single_backtest(
    config: &RunConfig,
    cancel: &CancelToken,
) -> Result<BacktestReport, RunError> {
    let dataset = load_dataset(&config.data.prices, &config.data.fundamentals)?;
    let result = run_backtest(&dataset, &config.params, cancel)?;
    Ok(BacktestReport::assemble(&dataset, &config.params, result))
}

/// Load the dataset and sweep the configured parameter grid, returning the
/// ranked report.
pub fn run_optimization(
    config: &RunConfig,
    cancel: &CancelToken,
) -> Result<OptimizationReport, RunError> {
    let sweep_config = config.sweep.as_ref().ok_or(RunError::NoSweepSection)?;
    let dataset = load_dataset(&config.data.prices, &config.data.fundamentals)?;

    let candidates = sweep_config.grid.generate(&config.params);
    if candidates.is_empty() {
        return Err(RunError::EmptyGrid);
    }

    let mut sweep = ParamSweep::new();
    if sweep_config.max_workers > 0 {
        sweep = sweep.with_max_workers(sweep_config.max_workers);
    }
    let ranked = sweep.sweep(&dataset, candidates, cancel)?;
    Ok(OptimizationReport::assemble(
        &dataset,
        ranked,
        sweep_config.top_n,
    ))
}
