//! CLI definition and dispatch.

use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_result_adapter::{run_name, FileResultSink};
use crate::domain::combination::TradingCosts;
use crate::domain::config_validation::{
    read_date_range, read_double, read_double_list, read_int_list, read_list,
    read_sell_condition, read_strategies, read_workers, validate_sweep_config,
};
use crate::domain::error::SweepError;
use crate::domain::market_data::validate_row_count;
use crate::domain::sweep::SweepConfig;
use crate::orchestrator::Orchestrator;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "sweeptrader", about = "Parameter-sweep backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every parameter combination
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        /// Worker threads (overrides [sweep] workers)
        #[arg(short, long)]
        workers: Option<usize>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a sweep configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data file and row volume for asset(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        asset: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Sweep {
            config,
            workers,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_sweep(&config, workers)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, asset } => run_info(&config, asset.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SweepError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Validates `config` and resolves it into an immutable [`SweepConfig`].
pub fn build_sweep_config(config: &dyn ConfigPort) -> Result<SweepConfig, SweepError> {
    validate_sweep_config(config)?;

    Ok(SweepConfig {
        assets: read_list(config, "simulation", "assets")?,
        strategies: read_strategies(config)?,
        ema_periods: read_int_list(config, "parameters", "ema_values")?,
        reinvest_percentages: read_double_list(config, "parameters", "reinvest_percentages")?,
        min_returns: read_double_list(config, "parameters", "min_returns")?,
        percent_drops: read_double_list(config, "parameters", "percent_drops")?,
        balance_tripwires: read_double_list(config, "parameters", "balance_tripwires")?,
        sell_condition: read_sell_condition(config)?,
        costs: TradingCosts {
            investment: read_double(config, "simulation", "invest_amt", 0.0)?,
            tax_rate: read_double(config, "simulation", "tax_rate", 0.0)?,
            fee_rate: read_double(config, "simulation", "fees", 0.0)?,
        },
        date_range: read_date_range(config)?,
        workers: read_workers(config)?,
    })
}

/// A validated `[files]` path.
fn files_path(config: &dyn ConfigPort, key: &str) -> PathBuf {
    PathBuf::from(config.get_string("files", key).unwrap_or_default().trim())
}

fn load_sweep(config_path: &Path) -> Result<(FileConfigAdapter, SweepConfig), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    match build_sweep_config(&adapter) {
        Ok(sweep) => Ok((adapter, sweep)),
        Err(e) => {
            eprintln!("error: {e}");
            Err((&e).into())
        }
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

fn run_sweep(config_path: &Path, workers: Option<usize>) -> ExitCode {
    let (adapter, mut sweep) = match load_sweep(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    if let Some(n) = workers {
        sweep.workers = n;
    }

    let output_dir = files_path(&adapter, "output_dir");
    let data = CsvAdapter::new(files_path(&adapter, "data_dir"));
    let sink = FileResultSink::new(
        output_dir.clone(),
        files_path(&adapter, "log_dir"),
        run_name(Local::now()),
        sweep.date_range,
    );

    let total = sweep.combination_count();
    eprintln!(
        "Sweeping {} combinations over {} asset(s), {}",
        total,
        sweep.assets.len(),
        sweep.date_range
    );

    let mut orchestrator = Orchestrator::new(sweep, &data, &sink);
    if adapter.get_bool("sweep", "progress", true) {
        orchestrator = orchestrator.with_progress(progress_bar(total));
    }

    let started = Instant::now();
    match orchestrator.run() {
        Ok(summary) => {
            eprintln!("\n=== Sweep Summary ===");
            eprintln!("  Combinations: {}", summary.total);
            eprintln!("  Completed:    {}", summary.completed);
            eprintln!("  Skipped:      {}", summary.skipped);
            eprintln!("  Elapsed:      {:.1}s", started.elapsed().as_secs_f64());
            eprintln!("  Results in:   {}", output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn run_dry_run(config_path: &Path) -> ExitCode {
    let (_adapter, sweep) = match load_sweep(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");

    let strategies: Vec<&str> = sweep.strategies.iter().map(|s| s.name()).collect();
    eprintln!("\nSweep domains:");
    eprintln!("  Assets:               {}", sweep.assets.join(" "));
    eprintln!("  Strategies:           {}", strategies.join(" "));
    eprintln!("  EMA periods:          {:?}", sweep.ema_periods);
    eprintln!("  Reinvest percentages: {:?}", sweep.reinvest_percentages);
    eprintln!("  Min returns:          {:?}", sweep.min_returns);
    eprintln!("  Percent drops:        {:?}", sweep.percent_drops);
    eprintln!("  Balance tripwires:    {:?}", sweep.balance_tripwires);
    eprintln!("  Sell condition:       {}", sweep.sell_condition);
    eprintln!("  Date range:           {}", sweep.date_range);
    eprintln!("\nCombinations: {}", sweep.combination_count());
    eprintln!("Dry run complete. No simulations were run.");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    match load_sweep(config_path) {
        Ok((_, sweep)) => {
            eprintln!(
                "Config is valid: {} combinations",
                sweep.combination_count()
            );
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}

fn run_info(config_path: &Path, asset: Option<&str>) -> ExitCode {
    let (adapter, sweep) = match load_sweep(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let data = CsvAdapter::new(files_path(&adapter, "data_dir"));
    let assets: Vec<String> = match asset {
        Some(a) => vec![a.to_string()],
        None => sweep.assets.clone(),
    };

    eprintln!(
        "{:<10} {:>8} {:>8} {:<8} File",
        "Asset", "Rows", "Expected", "Volume"
    );
    eprintln!("{}", "-".repeat(60));
    for a in &assets {
        let path = match data.latest_file(a) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let rows = match CsvAdapter::read_rows(&path) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let volume = match validate_row_count(a, rows.len(), &sweep.date_range) {
            Ok(()) => "ok",
            Err(_) => "invalid",
        };
        eprintln!(
            "{:<10} {:>8} {:>8} {:<8} {}",
            a,
            rows.len(),
            sweep.date_range.expected_rows(),
            volume,
            path.display()
        );
    }
    ExitCode::SUCCESS
}
