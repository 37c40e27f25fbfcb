//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_report_adapter::SvgReportAdapter;
use crate::domain::config_validation::{validate_base_config, validate_optimize_config};
use crate::domain::error::SmacrossError;
use crate::domain::evaluator::{GridPoint, StrategyEvaluator};
use crate::domain::range::ParamRange;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "smacross", about = "SMA crossover strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the crossover strategy at the configured windows
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override the configured short window
        #[arg(long)]
        short: Option<usize>,
        /// Override the configured long window
        #[arg(long)]
        long: Option<usize>,
        /// Write an SVG chart of the cumulative curves
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Grid-search window pairs for the best performance
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        /// Write an SVG chart for the optimal pair
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the full grid as CSV
        #[arg(long)]
        grid_output: Option<PathBuf>,
    },
    /// Show the date range of the configured price source
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            short,
            long,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config, short, long, output.as_deref())
            }
        }
        Command::Optimize {
            config,
            output,
            grid_output,
        } => run_optimize(&config, output.as_deref(), grid_output.as_deref()),
        Command::Info { config } => run_info(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// The `[data]`/`[strategy]` fields every evaluation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestParams {
    pub csv_path: PathBuf,
    pub symbol: String,
    pub short_window: usize,
    pub long_window: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn build_backtest_params(adapter: &dyn ConfigPort) -> Result<BacktestParams, SmacrossError> {
    let csv_path = adapter.get_string("data", "csv_path").ok_or_else(|| {
        SmacrossError::ConfigMissing {
            section: "data".into(),
            key: "csv_path".into(),
        }
    })?;
    let symbol =
        adapter
            .get_string("data", "symbol")
            .ok_or_else(|| SmacrossError::ConfigMissing {
                section: "data".into(),
                key: "symbol".into(),
            })?;

    Ok(BacktestParams {
        csv_path: PathBuf::from(csv_path),
        symbol,
        short_window: read_window(adapter, "short_window")?,
        long_window: read_window(adapter, "long_window")?,
        start_date: read_date(adapter, "start_date")?,
        end_date: read_date(adapter, "end_date")?,
    })
}

fn read_window(adapter: &dyn ConfigPort, key: &str) -> Result<usize, SmacrossError> {
    let value = adapter.get_int("strategy", key, 0);
    usize::try_from(value)
        .ok()
        .filter(|&w| w > 0)
        .ok_or_else(|| SmacrossError::ConfigInvalid {
            section: "strategy".into(),
            key: key.into(),
            reason: format!("{key} must be a positive integer"),
        })
}

fn read_date(adapter: &dyn ConfigPort, key: &str) -> Result<NaiveDate, SmacrossError> {
    let value =
        adapter
            .get_string("strategy", key)
            .ok_or_else(|| SmacrossError::ConfigMissing {
                section: "strategy".into(),
                key: key.into(),
            })?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| SmacrossError::ConfigInvalid {
        section: "strategy".into(),
        key: key.into(),
        reason: "invalid date format (expected YYYY-MM-DD)".into(),
    })
}

pub fn build_param_ranges(
    adapter: &dyn ConfigPort,
) -> Result<(ParamRange, ParamRange), SmacrossError> {
    let short = read_range(adapter, "short")?;
    let long = read_range(adapter, "long")?;
    Ok((short, long))
}

fn read_range(adapter: &dyn ConfigPort, prefix: &str) -> Result<ParamRange, SmacrossError> {
    let read = |suffix: &str| -> Result<usize, SmacrossError> {
        let key = format!("{prefix}_{suffix}");
        let value = adapter.get_int("optimize", &key, 0);
        usize::try_from(value)
            .ok()
            .filter(|&v| v > 0)
            .ok_or_else(|| SmacrossError::ConfigInvalid {
                section: "optimize".into(),
                key,
                reason: "must be a positive integer".into(),
            })
    };
    ParamRange::new(read("start")?, read("stop")?, read("step")?)
}

fn run_backtest(
    config_path: &Path,
    short_override: Option<usize>,
    long_override: Option<usize>,
    output_path: Option<&Path>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate
    if let Err(e) = validate_base_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Resolve parameters (CLI overrides win)
    let mut params = match build_backtest_params(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Some(short) = short_override {
        params.short_window = short;
    }
    if let Some(long) = long_override {
        params.long_window = long;
    }

    // Stage 4: Load price series and evaluate
    let mut evaluator = match build_evaluator(&params) {
        Ok(ev) => ev,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let (performance, outperformance) = match evaluator.evaluate() {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_evaluation_summary(&evaluator, performance, outperformance);
    println!(
        "{} short={} long={} performance={:.6} outperformance={:.6}",
        evaluator.symbol(),
        evaluator.short_window(),
        evaluator.long_window(),
        performance,
        outperformance,
    );

    // Stage 5: Chart
    if let Some(output) = output_path {
        return write_report(&evaluator, output);
    }
    ExitCode::SUCCESS
}

fn run_optimize(
    config_path: &Path,
    output_path: Option<&Path>,
    grid_output_path: Option<&Path>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate
    if let Err(e) = validate_base_config(&adapter).and_then(|()| validate_optimize_config(&adapter))
    {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Resolve parameters and ranges
    let params = match build_backtest_params(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let (short_range, long_range) = match build_param_ranges(&adapter) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Load price series and sweep the grid
    let mut evaluator = match build_evaluator(&params) {
        Ok(ev) => ev,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Sweeping {} short x {} long candidates...",
        short_range.values().count(),
        long_range.values().count(),
    );
    let result = match evaluator.optimize(short_range, long_range) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let grid = evaluator.grid_results().unwrap_or_default();
    eprintln!("\n=== Optimization ===");
    eprintln!("Candidates:  {}", grid.len());
    eprintln!(
        "Best pair:   SMA({}) / SMA({})",
        result.short_window, result.long_window
    );
    eprintln!("Performance: {:.6}", result.performance);
    println!(
        "{} short={} long={} performance={:.6}",
        evaluator.symbol(),
        result.short_window,
        result.long_window,
        result.performance,
    );

    // Stage 5: Grid CSV
    if let Some(grid_path) = grid_output_path {
        if let Err(e) = write_grid_csv(grid, grid_path) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Grid written to: {}", grid_path.display());
    }

    // Stage 6: Chart for the optimal pair
    if let Some(output) = output_path {
        return write_report(&evaluator, output);
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let csv_path = match adapter.get_string("data", "csv_path") {
        Some(p) => PathBuf::from(p),
        None => {
            let e = SmacrossError::ConfigMissing {
                section: "data".into(),
                key: "csv_path".into(),
            };
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let symbol = adapter
        .get_string("data", "symbol")
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let data_port = CsvAdapter::new(csv_path);
    match data_port.get_data_range(&symbol) {
        Ok(Some((first, last, count))) => {
            println!("{}: {} rows, {} to {}", symbol, count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", symbol);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn run_dry_run(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_base_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Config validated successfully");

    let params = match build_backtest_params(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nBacktest parameters:");
    eprintln!("  source:  {}", params.csv_path.display());
    eprintln!("  symbol:  {}", params.symbol);
    eprintln!(
        "  windows: SMA({}) / SMA({})",
        params.short_window, params.long_window
    );
    eprintln!("  range:   {} to {}", params.start_date, params.end_date);

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn build_evaluator(params: &BacktestParams) -> Result<StrategyEvaluator, SmacrossError> {
    let data_port = CsvAdapter::new(params.csv_path.clone());
    eprintln!(
        "Loading {} closes, {} to {}",
        params.symbol, params.start_date, params.end_date
    );
    StrategyEvaluator::from_port(
        &data_port,
        &params.symbol,
        params.short_window,
        params.long_window,
        params.start_date,
        params.end_date,
    )
}

fn print_evaluation_summary(evaluator: &StrategyEvaluator, performance: f64, outperformance: f64) {
    eprintln!("\n=== Results ===");
    eprintln!("Strategy:       {}", evaluator.describe());
    eprintln!("Performance:    {performance:.6}");
    eprintln!("Buy-and-hold:   {:.6}", performance - outperformance);
    eprintln!("Outperformance: {outperformance:+.6}");
}

/// Render the last evaluation to `output`. A no-op warning, not an error,
/// when nothing has been evaluated yet.
pub fn write_report(evaluator: &StrategyEvaluator, output: &Path) -> ExitCode {
    let Some(evaluation) = evaluator.last_evaluation() else {
        eprintln!("warning: no evaluation yet, run a backtest first");
        return ExitCode::SUCCESS;
    };

    let report = SvgReportAdapter::new();
    match report.write(evaluation, &evaluator.describe(), output) {
        Ok(()) => {
            eprintln!("Chart written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn write_grid_csv(grid: &[GridPoint], path: &Path) -> Result<(), SmacrossError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| SmacrossError::Report {
        reason: format!("failed to open {}: {}", path.display(), e),
    })?;

    write_grid_records(&mut writer, grid).map_err(|e| SmacrossError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    })
}

fn write_grid_records<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    grid: &[GridPoint],
) -> Result<(), csv::Error> {
    writer.write_record(["short_window", "long_window", "performance"])?;
    for point in grid {
        writer.write_record([
            point.short_window.to_string(),
            point.long_window.to_string(),
            format!("{:.6}", point.performance),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
