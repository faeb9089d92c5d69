//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use log::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::{format_summary_report, CsvReportAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::summarize;
use crate::domain::backtest::{
    BacktestConfig, DEFAULT_INITIAL_CAPITAL, DEFAULT_STOP_LOSS_PCT, DEFAULT_VOLATILITY_SYMBOL,
};
use crate::domain::batch::{run_batch, BatchReport, SymbolFailure};
use crate::domain::config_validation::{parse_date, validate_backtest_config, validate_data_config};
use crate::domain::error::SigtraderError;
use crate::domain::resample::{parse_timezone, DEFAULT_TIMEZONE};
use crate::domain::strategy::{parse_variants, StrategyVariant};
use crate::domain::trade_log::collect_trade_log;
use crate::domain::universe::{parse_codes, UniverseError};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Weekly MACD/VPVMA signal backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over the configured symbols
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Output directory, overrides [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma-separated symbols, overrides [backtest] symbols
        #[arg(long)]
        symbol: Option<String>,
        /// Worker threads (0 = one per CPU)
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            symbol,
            workers,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, symbol.as_deref())
            } else {
                run_backtest(&config, output.as_deref(), symbol.as_deref(), workers)
            }
        }
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn fail(e: SigtraderError) -> ExitCode {
    eprintln!("error: {e}");
    (&e).into()
}

fn run_backtest(
    config_path: &Path,
    output_override: Option<&Path>,
    symbol_override: Option<&str>,
    workers_override: Option<usize>,
) -> ExitCode {
    info!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter).and_then(|_| validate_data_config(&adapter))
    {
        return fail(e);
    }

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let symbols = match resolve_symbols(symbol_override, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let workers = workers_override.unwrap_or_else(|| resolve_workers(&adapter));

    // validate_data_config guarantees the key is present.
    let data_path = adapter.get_string("data", "path").unwrap_or_default();
    let data_port: Arc<dyn DataPort> =
        Arc::new(CsvAdapter::new(PathBuf::from(data_path), bt_config.timezone));

    let output_dir = output_override.map(Path::to_path_buf).unwrap_or_else(|| {
        PathBuf::from(
            adapter
                .get_string("report", "output_dir")
                .unwrap_or_else(|| "output".to_string()),
        )
    });
    let reporter = CsvReportAdapter::new(
        output_dir,
        adapter.get_bool("report", "write_weekly", true),
    );

    match run_backtest_pipeline(data_port, &reporter, &symbols, &bt_config, workers) {
        Ok(report) => {
            println!(
                "{}",
                format_summary_report(
                    &summarize(&report.analyses),
                    &report.failures,
                    report.requested
                )
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Runs the batch, writes every report, and fails only when no symbol
/// completed. A symbol whose reports cannot be written is moved to the
/// failures. The summary is written even when nothing completed so the
/// failures are on disk.
pub fn run_backtest_pipeline(
    data_port: Arc<dyn DataPort>,
    reporter: &dyn ReportPort,
    symbols: &[String],
    config: &BacktestConfig,
    workers: usize,
) -> Result<BatchReport, SigtraderError> {
    let mut report = run_batch(data_port, symbols, config, workers);

    for analysis in std::mem::take(&mut report.analyses) {
        match reporter.write_symbol(&analysis) {
            Ok(_) => report.analyses.push(analysis),
            Err(error) => {
                warn!("{}: reports not written: {}", analysis.symbol, error);
                report.failures.push(SymbolFailure {
                    symbol: analysis.symbol,
                    error,
                });
            }
        }
    }
    let rows = summarize(&report.analyses);
    reporter.write_summary(&rows, &report.failures, report.requested)?;
    reporter.write_trade_log(&collect_trade_log(&report.analyses))?;

    println!("processed {} of {} symbols", report.processed(), report.requested);
    if report.processed() == 0 {
        return Err(UniverseError::AllSymbolsFailed(report.requested).into());
    }
    Ok(report)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    let start_date = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    let tz_name = adapter
        .get_string("backtest", "timezone")
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    let timezone = parse_timezone(&tz_name).ok_or_else(|| SigtraderError::ConfigInvalid {
        section: "backtest".into(),
        key: "timezone".into(),
        reason: format!("unknown timezone '{}'", tz_name),
    })?;

    let variants = match adapter.get_string("backtest", "strategies") {
        Some(list) => parse_variants(&list).map_err(|reason| SigtraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "strategies".into(),
            reason,
        })?,
        None => StrategyVariant::ALL.to_vec(),
    };

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double(
            "backtest",
            "initial_capital",
            DEFAULT_INITIAL_CAPITAL,
        ),
        stop_loss_pct: adapter.get_double("backtest", "stop_loss_pct", DEFAULT_STOP_LOSS_PCT),
        timezone,
        volatility_symbol: adapter
            .get_string("backtest", "volatility_symbol")
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| DEFAULT_VOLATILITY_SYMBOL.to_string()),
        variants,
    })
}

/// `--symbol` wins over `[backtest] symbols`; both accept a comma list.
pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, SigtraderError> {
    let raw = match symbol_override {
        Some(s) => s.to_string(),
        None => config
            .get_string("backtest", "symbols")
            .ok_or_else(|| SigtraderError::ConfigMissing {
                section: "backtest".into(),
                key: "symbols".into(),
            })?,
    };
    Ok(parse_codes(&raw)?)
}

pub fn resolve_workers(config: &dyn ConfigPort) -> usize {
    config.get_int("engine", "workers", 0).max(0) as usize
}

pub fn run_dry_run(config_path: &Path, symbol_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter).and_then(|_| validate_data_config(&adapter))
    {
        return fail(e);
    }
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let symbols = match resolve_symbols(symbol_override, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    eprintln!("Config validated successfully\n");
    println!("{}", describe_config(&bt_config, &symbols));
    eprintln!("Dry run complete: configuration is valid");
    ExitCode::SUCCESS
}

pub fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    if adapter.get_string("data", "path").is_none() {
        eprintln!("warning: [data] path is not set; backtest will refuse to run");
    }

    eprintln!("\nStrategies:");
    for variant in &bt_config.variants {
        eprintln!("  {} [{}]", variant, variant.family.default_type());
    }
    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}

pub fn describe_config(config: &BacktestConfig, symbols: &[String]) -> String {
    let variants: Vec<String> = config.variants.iter().map(|v| v.to_string()).collect();
    let mut out = String::new();
    out.push_str(&format!(
        "Period:          {} to {}\n",
        config.start_date, config.end_date
    ));
    out.push_str(&format!("Initial capital: {:.2}\n", config.initial_capital));
    out.push_str(&format!(
        "Stop loss:       {:.2}%\n",
        config.stop_loss_pct * 100.0
    ));
    out.push_str(&format!("Timezone:        {}\n", config.timezone.name()));
    out.push_str(&format!("Strategies:      {}\n", variants.join(", ")));
    if config.needs_volatility_index() {
        out.push_str(&format!("Volatility:      {}\n", config.volatility_symbol));
    }
    out.push_str(&format!(
        "Symbols ({}):    {}",
        symbols.len(),
        symbols.join(", ")
    ));
    out
}
