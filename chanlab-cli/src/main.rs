//! ChanLab CLI — channel mean-reversion backtesting and parameter sweeps.
//!
//! Commands:
//! - `run` — execute one backtest from a TOML config file
//! - `optimize` — sweep the config's parameter grid and rank candidates

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use chanlab_core::engine::CancelToken;
use chanlab_runner::{
    run_optimization, run_single_backtest, BacktestReport, OptimizationReport, RunConfig,
};

#[derive(Parser)]
#[command(
    name = "chanlab",
    about = "ChanLab CLI — regression-channel mean-reversion backtesting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Write the full report as JSON to this path.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Sweep the config's parameter grid and rank candidates.
    Optimize {
        /// Path to a TOML config file with a [sweep] section.
        #[arg(long)]
        config: PathBuf,

        /// Override the config's top_n when printing and saving.
        #[arg(long)]
        top: Option<usize>,

        /// Write the ranked report as JSON to this path.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, out } => run_cmd(&config, out.as_deref()),
        Commands::Optimize { config, top, out } => optimize_cmd(&config, top, out.as_deref()),
    }
}

fn run_cmd(config_path: &Path, out: Option<&Path>) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let report = run_single_backtest(&config, &CancelToken::new())?;

    print_run_summary(&report);

    if let Some(path) = out {
        save_json(&report, path)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

fn optimize_cmd(config_path: &Path, top: Option<usize>, out: Option<&Path>) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    if config.sweep.is_none() {
        bail!(
            "config {} has no [sweep] section; add one to optimize",
            config_path.display()
        );
    }
    let mut report = run_optimization(&config, &CancelToken::new())?;
    if let Some(top) = top {
        report.ranked.truncate(top.max(1));
    }

    print_optimize_summary(&report);

    if let Some(path) = out {
        save_json(&report, path)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

fn save_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn print_run_summary(report: &BacktestReport) {
    println!();
    println!("=== Backtest Result ===");
    match (report.start_date, report.end_date) {
        (Some(start), Some(end)) => println!("Period:         {start} to {end}"),
        _ => println!("Period:         (empty date axis)"),
    }
    println!("Tickers:        {}", report.ticker_count);
    println!("Dataset hash:   {}", report.dataset_hash);
    println!("Trades:         {}", report.stats.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", report.stats.total_return * 100.0);
    println!("Sharpe:         {:.3}", report.stats.sharpe);
    println!("Win Rate:       {:.1}%", report.stats.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", report.stats.profit_factor);
    println!("Worst Trade:    {:.2}%", report.stats.worst_trade * 100.0);
    println!("Avg Days Held:  {:.1}", report.stats.avg_days_held);
    println!(
        "Exits:          {} target / {} stop / {} time",
        report.stats.exit_breakdown.target,
        report.stats.exit_breakdown.stop,
        report.stats.exit_breakdown.time
    );
    println!("Peak Positions: {}", report.peak_open_positions);
    if !report.open_positions.is_empty() {
        println!("Still Open:     {}", report.open_positions.len());
    }
    if report.entries_halted {
        println!();
        println!("WARNING: drawdown circuit breaker halted entries during this run");
    }
    for warn in &report.data_quality_warnings {
        println!("WARNING: {warn}");
    }
    println!();
}

fn print_optimize_summary(report: &OptimizationReport) {
    println!();
    println!("=== Parameter Sweep ===");
    println!("Tickers:        {}", report.ticker_count);
    println!("Dataset hash:   {}", report.dataset_hash);
    println!(
        "Candidates:     {} evaluated, {} failed",
        report.evaluated, report.failed
    );
    for warn in &report.data_quality_warnings {
        println!("WARNING: {warn}");
    }
    println!();
    println!(
        "{:<5} {:>8} {:>8} {:>7} {:>8} {:>7} {:>6} {:>6} {:>5} {:>7}",
        "Rank", "Score", "Sharpe", "PF", "Worst%", "Trades", "Entry", "Stop", "Hold", "Window"
    );
    println!("{}", "-".repeat(76));
    for (rank, candidate) in report.ranked.iter().enumerate() {
        if candidate.failed {
            println!("{:<5} (failed run)", rank + 1);
            continue;
        }
        println!(
            "{:<5} {:>8.3} {:>8.3} {:>7.2} {:>8.2} {:>7} {:>6.2} {:>6.2} {:>5} {:>7}",
            rank + 1,
            candidate.score,
            candidate.stats.sharpe,
            candidate.stats.profit_factor,
            candidate.stats.worst_trade * 100.0,
            candidate.stats.trade_count,
            candidate.params.entry_threshold_sigma,
            candidate.params.stop_sigma,
            candidate.params.max_holding_days,
            candidate.params.window_size,
        );
    }
    println!();
}
