#![allow(dead_code)]

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use sigtrader::domain::backtest::{
    BacktestConfig, DEFAULT_INITIAL_CAPITAL, DEFAULT_STOP_LOSS_PCT, DEFAULT_VOLATILITY_SYMBOL,
};
use sigtrader::domain::error::SigtraderError;
pub use sigtrader::domain::ohlcv::OhlcvBar;
use sigtrader::domain::strategy::StrategyVariant;
use sigtrader::ports::data_port::DataPort;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub panics: HashSet<String>,
    pub fetched: Mutex<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            panics: HashSet::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_panic(mut self, symbol: &str) -> Self {
        self.panics.insert(symbol.to_string());
        self
    }

    pub fn fetch_count(&self, symbol: &str) -> usize {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.as_str() == symbol)
            .count()
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError> {
        self.fetched.lock().unwrap().push(symbol.to_string());
        if self.panics.contains(symbol) {
            panic!("feed for {} exploded", symbol);
        }
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SigtraderError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One bar per weekday starting Monday 2021-01-04, stamped 15:00 UTC so the
/// New York date is the same day all year.
pub fn daily_bars(symbol: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let monday = Utc.with_ymd_and_hms(2021, 1, 4, 15, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let week = (i / 5) as i64;
            let day = (i % 5) as i64;
            OhlcvBar {
                code: symbol.to_string(),
                timestamp: monday + Duration::weeks(week) + Duration::days(day),
                open: close * 0.995,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 1_000_000 + (i as i64 % 7) * 50_000,
            }
        })
        .collect()
}

/// A trending sine wave: enough swings for crossovers in both directions.
pub fn wave_closes(days: usize, base: f64, amplitude: f64, period: f64, drift: f64) -> Vec<f64> {
    (0..days)
        .map(|i| {
            let t = i as f64;
            base + drift * t + amplitude * (2.0 * std::f64::consts::PI * t / period).sin()
        })
        .collect()
}

pub fn wave_bars(symbol: &str, weeks: usize) -> Vec<OhlcvBar> {
    daily_bars(symbol, &wave_closes(weeks * 5, 100.0, 12.0, 90.0, 0.05))
}

pub fn vix_bars(weeks: usize) -> Vec<OhlcvBar> {
    daily_bars("^VIX", &wave_closes(weeks * 5, 20.0, 6.0, 45.0, 0.0))
}

pub fn sample_config(variants: Vec<StrategyVariant>) -> BacktestConfig {
    BacktestConfig {
        start_date: date(2021, 1, 1),
        end_date: date(2023, 12, 31),
        initial_capital: DEFAULT_INITIAL_CAPITAL,
        stop_loss_pct: DEFAULT_STOP_LOSS_PCT,
        timezone: chrono_tz::US::Eastern,
        volatility_symbol: DEFAULT_VOLATILITY_SYMBOL.to_string(),
        variants,
    }
}

pub fn all_variants_config() -> BacktestConfig {
    sample_config(StrategyVariant::ALL.to_vec())
}
