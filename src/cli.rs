//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::{split_symbols, FileConfigAdapter};
use crate::domain::config::StrategyConfig;
use crate::domain::config_validation::{validate_data_config, validate_strategy_config};
use crate::domain::error::RenkoError;
use crate::domain::metrics::MetricDisplay;
use crate::domain::pipeline::{
    load_bars, run_batch, BatchReport, InstrumentOutcome, InstrumentPipeline,
};
use crate::domain::renko::assign_bar_num;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "renkotrader", about = "Intraday Renko/OBV strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest every configured symbol and print the KPI table
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding [data] symbols
        #[arg(long)]
        symbols: Option<String>,
        /// Write the KPI table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file and show the effective parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the Renko bricks built for one symbol
    Bricks {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbols,
            output,
        } => run_backtest(&config, symbols.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Bricks { config, symbol } => run_bricks(&config, &symbol),
    }
}

fn fail(err: RenkoError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RenkoError> {
    tracing::info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, RenkoError> {
    validate_strategy_config(adapter)?;
    Ok(StrategyConfig::from_port(adapter))
}

pub fn resolve_symbols(symbols_override: Option<&str>, adapter: &FileConfigAdapter) -> Vec<String> {
    match symbols_override {
        Some(s) => split_symbols(s),
        None => adapter.get_list("data", "symbols"),
    }
}

/// `*` stands for every instrument the data source holds.
pub fn expand_symbols(
    symbols: Vec<String>,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, RenkoError> {
    if symbols.iter().any(|s| s == "*") {
        return data_port.list_symbols();
    }
    Ok(symbols)
}

fn data_directory(adapter: &dyn ConfigPort) -> Result<PathBuf, RenkoError> {
    adapter
        .get_string("data", "directory")
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| RenkoError::ConfigMissing {
            section: "data".into(),
            key: "directory".into(),
        })
}

fn run_backtest(config_path: &Path, symbols_override: Option<&str>, output: Option<&Path>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    if symbols_override.is_none() {
        if let Err(e) = validate_data_config(&adapter) {
            return fail(e);
        }
    }
    let config = match build_strategy_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let directory = match data_directory(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };

    let data_port = CsvAdapter::new(directory);
    let symbols = match expand_symbols(resolve_symbols(symbols_override, &adapter), &data_port) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    if symbols.is_empty() {
        return fail(RenkoError::ConfigMissing {
            section: "data".into(),
            key: "symbols".into(),
        });
    }

    let output = output
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("report", "output"));

    run_backtest_pipeline(
        &data_port,
        &symbols,
        &config,
        output.as_deref(),
    )
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    symbols: &[String],
    config: &StrategyConfig,
    output_path: Option<&str>,
) -> ExitCode {
    tracing::info!("running backtest for {} symbols", symbols.len());
    let report = run_batch(data_port, symbols, config);

    println!("{}", format_kpi_table(&report));

    if let Some(path) = output_path {
        if let Err(e) = CsvReportAdapter.write(&report, path) {
            return fail(e);
        }
        tracing::info!("report written to {}", path);
    }

    if report.completed() == 0 {
        eprintln!("error: no instrument produced a result");
        return ExitCode::from(5);
    }
    ExitCode::SUCCESS
}

pub fn format_kpi_table(report: &BatchReport) -> String {
    let mut lines = vec![format!(
        "{:<8} {:>10} {:>8} {:>10} {:>6}",
        "Symbol", "CAGR", "Sharpe", "Max DD", "Trades"
    )];
    for (symbol, outcome) in &report.outcomes {
        match outcome {
            InstrumentOutcome::Completed(s) => lines.push(format!(
                "{:<8} {:>10.4} {:>8.2} {:>10.4} {:>6}",
                symbol,
                MetricDisplay(s.kpi.cagr),
                MetricDisplay(s.kpi.sharpe),
                MetricDisplay(s.kpi.max_drawdown),
                s.position_changes
            )),
            InstrumentOutcome::Unavailable { reason } => {
                lines.push(format!("{:<8} unavailable ({})", symbol, reason))
            }
        }
    }
    lines.join("\n")
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    if let Err(e) = validate_data_config(&adapter) {
        return fail(e);
    }
    let config = match build_strategy_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    println!("symbols:           {}", resolve_symbols(None, &adapter).join(", "));
    println!("atr_window:        {}", config.renko.atr_window);
    println!("brick_floor:       {}", config.renko.brick_floor);
    println!("slope_window:      {}", config.signal.slope_window);
    println!("bar_num_threshold: {}", config.signal.bar_num_threshold);
    println!("slope_threshold:   {}", config.signal.slope_threshold);
    println!("bars_per_year:     {}", config.annualization.bars_per_year());
    println!("risk_free_rate:    {}", config.risk_free_rate);
    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}

fn run_bricks(config_path: &Path, symbol: &str) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let config = match build_strategy_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let directory = match data_directory(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };

    let symbol = symbol.trim().to_uppercase();
    let report = load_bars(&CsvAdapter::new(directory), &symbol)
        .and_then(|bars| InstrumentPipeline::new(symbol.clone(), config).run(&bars));
    let report = match report {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    println!("{} brick size {}", symbol, report.renko.brick_size);
    let bar_nums = assign_bar_num(&report.renko.bricks);
    for (brick, bar_num) in report.renko.bricks.iter().zip(bar_nums) {
        println!(
            "{}  {:>5} {:>10.2} -> {:<10.2} bar_num {:>3}",
            brick.timestamp,
            if brick.uptrend { "up" } else { "down" },
            brick.open,
            brick.close,
            bar_num
        );
    }
    ExitCode::SUCCESS
}
