//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::SigtraderError;
use crate::domain::resample::parse_timezone;
use crate::domain::strategy::parse_variants;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_initial_capital(config)?;
    validate_stop_loss(config)?;
    validate_dates(config)?;
    validate_timezone(config)?;
    validate_symbols(config)?;
    validate_volatility_symbol(config)?;
    validate_strategies(config)?;
    validate_workers(config)?;
    Ok(())
}

/// The data directory is only needed when a backtest actually fetches bars.
pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SigtraderError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if config.get_string("backtest", "initial_capital").is_none() {
        return Ok(());
    }
    let value = config.get_double("backtest", "initial_capital", 0.0);
    if value <= 0.0 {
        return Err(invalid("initial_capital", "initial_capital must be positive"));
    }
    Ok(())
}

fn validate_stop_loss(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config.get_double("backtest", "stop_loss_pct", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "stop_loss_pct",
            "stop_loss_pct must be a fraction in [0, 1)",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid("start_date", "start_date must be before end_date"));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SigtraderError> {
    match value {
        None => Err(SigtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_timezone(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("backtest", "timezone") {
        Some(tz) if parse_timezone(&tz).is_none() => Err(invalid(
            "timezone",
            format!("unknown timezone '{}'", tz.trim()),
        )),
        _ => Ok(()),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("backtest", "symbols") {
        Some(s) if !s.trim().is_empty() => {
            parse_codes(&s).map_err(|e| invalid("symbols", e.to_string()))?;
            Ok(())
        }
        _ => Err(SigtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbols".to_string(),
        }),
    }
}

fn validate_volatility_symbol(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("backtest", "volatility_symbol") {
        Some(s) if s.trim().is_empty() => Err(invalid(
            "volatility_symbol",
            "volatility_symbol must not be blank",
        )),
        _ => Ok(()),
    }
}

fn validate_strategies(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("backtest", "strategies") {
        Some(s) => parse_variants(&s).map(|_| ()).map_err(|e| invalid("strategies", e)),
        None => Ok(()),
    }
}

fn validate_workers(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config.get_int("engine", "workers", 0);
    if value < 0 {
        return Err(SigtraderError::ConfigInvalid {
            section: "engine".to_string(),
            key: "workers".to_string(),
            reason: "workers must be non-negative (0 = one per CPU)".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const BASE: &str = "[backtest]\nstart_date = 2020-01-01\nend_date = 2024-12-31\nsymbols = XLF,XLK\n";

    fn with(extra: &str) -> FileConfigAdapter {
        make_config(&format!("{BASE}{extra}"))
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
start_date = 2005-01-01
end_date = 2023-12-31
initial_capital = 1000000
stop_loss_pct = 0.05
timezone = US/Eastern
symbols = EEM,VWO,XLF
volatility_symbol = ^VIX
strategies = MACD,MACD Zero-Cross,VPVMA,VPVMA Zero-Cross

[engine]
workers = 4
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn minimal_config_passes() {
        assert!(validate_backtest_config(&with("")).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let err = validate_backtest_config(&with("initial_capital = -100\n")).unwrap_err();
        assert!(
            matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn initial_capital_zero_fails() {
        let err = validate_backtest_config(&with("initial_capital = 0\n")).unwrap_err();
        assert!(
            matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn stop_loss_out_of_range_fails() {
        for bad in ["-0.01", "1.0", "5"] {
            let err =
                validate_backtest_config(&with(&format!("stop_loss_pct = {bad}\n"))).unwrap_err();
            assert!(
                matches!(err, SigtraderError::ConfigInvalid { ref key, .. } if key == "stop_loss_pct"),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn stop_loss_zero_disables_and_passes() {
        assert!(validate_backtest_config(&with("stop_loss_pct = 0\n")).is_ok());
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config(
            "[backtest]\nstart_date = 2020/01/01\nend_date = 2024-12-31\nsymbols = XLF\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn missing_end_date_fails() {
        let config = make_config("[backtest]\nstart_date = 2020-01-01\nsymbols = XLF\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigMissing { key, .. } if key == "end_date"));
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let config = make_config(
            "[backtest]\nstart_date = 2024-12-31\nend_date = 2020-01-01\nsymbols = XLF\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn unknown_timezone_fails() {
        let err = validate_backtest_config(&with("timezone = Mars/Olympus\n")).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "timezone"));
    }

    #[test]
    fn missing_symbols_fails() {
        let config = make_config("[backtest]\nstart_date = 2020-01-01\nend_date = 2024-12-31\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigMissing { key, .. } if key == "symbols"));
    }

    #[test]
    fn duplicate_symbols_fail() {
        let config = make_config(
            "[backtest]\nstart_date = 2020-01-01\nend_date = 2024-12-31\nsymbols = XLF,xlf\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, SigtraderError::ConfigInvalid { key, reason, .. } if key == "symbols" && reason.contains("XLF"))
        );
    }

    #[test]
    fn unknown_strategy_fails() {
        let err = validate_backtest_config(&with("strategies = MACD,RSI\n")).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "strategies"));
    }

    #[test]
    fn negative_workers_fail() {
        let err = validate_backtest_config(&with("[engine]\nworkers = -2\n")).unwrap_err();
        assert!(
            matches!(err, SigtraderError::ConfigInvalid { section, key, .. } if section == "engine" && key == "workers")
        );
    }

    #[test]
    fn data_path_required() {
        let err = validate_data_config(&with("")).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigMissing { section, .. } if section == "data"));
        assert!(validate_data_config(&with("[data]\npath = prices\n")).is_ok());
    }
}
