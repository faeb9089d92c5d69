//! CLI integration tests: INI files and CSV price data on disk, run through
//! the command dispatch.

mod common;

use clap::Parser;
use common::*;
use sigtrader::adapters::csv_report_adapter::CsvReportAdapter;
use sigtrader::adapters::file_config_adapter::FileConfigAdapter;
use sigtrader::cli::{self, Cli, Command};
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::strategy::StrategyVariant;
use sigtrader::domain::universe::UniverseError;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tempfile::TempDir;

const WEEKS: usize = 60;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn is_success(code: ExitCode) -> bool {
    format!("{code:?}") == format!("{:?}", ExitCode::SUCCESS)
}

fn same_code(a: ExitCode, b: ExitCode) -> bool {
    format!("{a:?}") == format!("{b:?}")
}

fn write_price_csv(dir: &Path, file: &str, bars: &[OhlcvBar]) {
    let mut out = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.timestamp.date_naive(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.close,
            b.volume
        ));
    }
    fs::write(dir.join(file), out).unwrap();
}

/// Price directory with XLF, EEM and the volatility index.
fn price_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_price_csv(dir.path(), "XLF.csv", &wave_bars("XLF", WEEKS));
    write_price_csv(
        dir.path(),
        "EEM.csv",
        &daily_bars("EEM", &wave_closes(WEEKS * 5, 40.0, 5.0, 60.0, -0.01)),
    );
    write_price_csv(dir.path(), "VIX.csv", &vix_bars(WEEKS));
    dir
}

fn ini(data: &Path, output: &Path, symbols: &str) -> String {
    format!(
        "[backtest]\n\
         start_date = 2021-01-01\n\
         end_date = 2023-12-31\n\
         initial_capital = 1000000\n\
         stop_loss_pct = 0.05\n\
         timezone = US/Eastern\n\
         symbols = {symbols}\n\
         volatility_symbol = ^VIX\n\
         \n\
         [data]\n\
         path = {}\n\
         \n\
         [report]\n\
         output_dir = {}\n\
         write_weekly = false\n\
         \n\
         [engine]\n\
         workers = 2\n",
        data.display(),
        output.display()
    )
}

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_reads_every_key() {
        let adapter = FileConfigAdapter::from_string(&ini(
            Path::new("prices"),
            Path::new("out"),
            "XLF",
        ))
        .unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();

        assert_eq!(config.start_date, date(2021, 1, 1));
        assert_eq!(config.end_date, date(2023, 12, 31));
        assert!((config.initial_capital - 1_000_000.0).abs() < f64::EPSILON);
        assert!((config.stop_loss_pct - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.volatility_symbol, "^VIX");
        assert_eq!(config.variants.len(), 4);
        assert_eq!(cli::resolve_workers(&adapter), 2);
    }

    #[test]
    fn missing_start_date_is_reported() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nend_date = 2023-12-31\n").unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigMissing { key, .. } if key == "start_date"));
    }

    #[test]
    fn unknown_strategy_is_reported() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\nstart_date = 2021-01-01\nend_date = 2023-12-31\nstrategies = MACD,Bollinger\n",
        )
        .unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "strategies"));
    }

    #[test]
    fn duplicate_override_symbols_are_rejected() {
        let adapter = FileConfigAdapter::from_string("[backtest]\nsymbols = XLF\n").unwrap();
        let err = cli::resolve_symbols(Some("EEM,eem"), &adapter).unwrap_err();
        assert!(matches!(
            err,
            SigtraderError::Universe(UniverseError::DuplicateCode(ref c)) if c == "EEM"
        ));
    }

    #[test]
    fn missing_config_file_is_a_parse_error() {
        let code = cli::run_validate(Path::new("/nonexistent/sigtrader.ini"));
        assert!(same_code(code, ExitCode::from(2)));
    }
}

mod argument_parsing {
    use super::*;

    #[test]
    fn backtest_flags_parse() {
        let cli = Cli::try_parse_from([
            "sigtrader",
            "backtest",
            "-c",
            "config.ini",
            "-o",
            "out",
            "--symbol",
            "XLF,EEM",
            "--workers",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Backtest {
                config,
                output,
                symbol,
                workers,
                dry_run,
            } => {
                assert_eq!(config, Path::new("config.ini"));
                assert_eq!(output.as_deref(), Some(Path::new("out")));
                assert_eq!(symbol.as_deref(), Some("XLF,EEM"));
                assert_eq!(workers, Some(3));
                assert!(!dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn validate_requires_config() {
        assert!(Cli::try_parse_from(["sigtrader", "validate"]).is_err());
    }
}

mod commands {
    use super::*;

    #[test]
    fn validate_accepts_good_config() {
        let out = TempDir::new().unwrap();
        let file = write_temp_ini(&ini(Path::new("prices"), out.path(), "XLF,EEM"));
        assert!(is_success(cli::run_validate(file.path())));
    }

    #[test]
    fn validate_rejects_bad_stop_loss() {
        let file = write_temp_ini(
            "[backtest]\nstart_date = 2021-01-01\nend_date = 2023-12-31\nsymbols = XLF\nstop_loss_pct = 1.5\n",
        );
        assert!(same_code(cli::run_validate(file.path()), ExitCode::from(2)));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let prices = price_dir();
        let out = TempDir::new().unwrap();
        let target = out.path().join("reports");
        let file = write_temp_ini(&ini(prices.path(), &target, "XLF"));

        assert!(is_success(cli::run_dry_run(file.path(), None)));
        assert!(!target.exists());
    }

    #[test]
    fn dry_run_requires_data_path() {
        let file = write_temp_ini(
            "[backtest]\nstart_date = 2021-01-01\nend_date = 2023-12-31\nsymbols = XLF\n",
        );
        assert!(same_code(
            cli::run_dry_run(file.path(), None),
            ExitCode::from(2)
        ));
    }

    #[test]
    fn backtest_writes_reports_for_each_symbol() {
        let prices = price_dir();
        let out = TempDir::new().unwrap();
        let file = write_temp_ini(&ini(prices.path(), out.path(), "XLF,EEM"));

        let cli = Cli::try_parse_from([
            "sigtrader",
            "backtest",
            "-c",
            file.path().to_str().unwrap(),
        ])
        .unwrap();
        assert!(is_success(cli::run(cli)));

        for symbol in ["XLF", "EEM"] {
            let dir = out.path().join(symbol);
            assert!(dir.join("trade_info_macd.csv").exists());
            assert!(dir.join("trade_info_vpvma_zero_cross.csv").exists());
            assert!(dir.join("strategy_comparison.txt").exists());
            assert!(!dir.join("weekly_macd.csv").exists());
        }
        let summary = fs::read_to_string(out.path().join("summary").join("summary_report.txt"))
            .unwrap();
        assert!(summary.contains("Processed 2 of 2 symbols"));
        assert!(summary.contains("Strategy Distribution:"));
        assert!(out.path().join("summary").join("all_trades_summary.csv").exists());
        assert!(out
            .path()
            .join("summary")
            .join("trade_statistics_report.txt")
            .exists());
    }

    #[test]
    fn output_and_symbol_flags_override_config() {
        let prices = price_dir();
        let configured = TempDir::new().unwrap();
        let overridden = TempDir::new().unwrap();
        let file = write_temp_ini(&ini(prices.path(), configured.path(), "XLF,EEM"));

        let cli = Cli::try_parse_from([
            "sigtrader",
            "backtest",
            "-c",
            file.path().to_str().unwrap(),
            "-o",
            overridden.path().to_str().unwrap(),
            "--symbol",
            "eem",
            "--workers",
            "1",
        ])
        .unwrap();
        assert!(is_success(cli::run(cli)));

        assert!(overridden.path().join("EEM").exists());
        assert!(!overridden.path().join("XLF").exists());
        assert!(!configured.path().join("summary").exists());
    }

    #[test]
    fn partial_failure_still_succeeds() {
        let prices = price_dir();
        let out = TempDir::new().unwrap();
        let file = write_temp_ini(&ini(prices.path(), out.path(), "XLF,NOPE"));

        let cli =
            Cli::try_parse_from(["sigtrader", "backtest", "-c", file.path().to_str().unwrap()])
                .unwrap();
        assert!(is_success(cli::run(cli)));

        let summary = fs::read_to_string(out.path().join("summary").join("summary_report.txt"))
            .unwrap();
        assert!(summary.contains("Processed 1 of 2 symbols"));
        assert!(summary.contains("NOPE"));
    }

    #[test]
    fn all_symbols_failing_is_an_error() {
        let prices = price_dir();
        let out = TempDir::new().unwrap();
        let file = write_temp_ini(&ini(prices.path(), out.path(), "NOPE,NADA"));

        let cli =
            Cli::try_parse_from(["sigtrader", "backtest", "-c", file.path().to_str().unwrap()])
                .unwrap();
        assert!(same_code(cli::run(cli), ExitCode::from(2)));
        assert!(out.path().join("summary").join("etf_summary.csv").exists());
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn pipeline_returns_batch_report() {
        let out = TempDir::new().unwrap();
        let reporter = CsvReportAdapter::new(out.path().to_path_buf(), true);
        let port = MockDataPort::new().with_bars("XLF", wave_bars("XLF", WEEKS));
        let config = sample_config(vec![StrategyVariant::MACD]);

        let report = cli::run_backtest_pipeline(
            Arc::new(port),
            &reporter,
            &["XLF".to_string()],
            &config,
            1,
        )
        .unwrap();

        assert_eq!(report.processed(), 1);
        assert!(out.path().join("XLF").join("weekly_macd.csv").exists());
        assert!(!out.path().join("XLF").join("weekly_vpvma.csv").exists());
    }

    #[test]
    fn pipeline_with_no_survivors_errors() {
        let out = TempDir::new().unwrap();
        let reporter = CsvReportAdapter::new(out.path().to_path_buf(), false);
        let port = MockDataPort::new().with_error("XLF", "offline");

        let err = cli::run_backtest_pipeline(
            Arc::new(port),
            &reporter,
            &["XLF".to_string(), "EEM".to_string()],
            &all_variants_config(),
            2,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            SigtraderError::Universe(UniverseError::AllSymbolsFailed(2))
        ));
    }
}
