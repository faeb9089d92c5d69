//! Single-strategy backtest pipeline and its configuration.
//!
//! Stages run strictly in order over one symbol's weekly table:
//! resample → indicator → positions (lagged) → stop-loss → accounting → trades → metrics.

use chrono::NaiveDate;
use chrono_tz::Tz;
use log::debug;

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{compute_indicator, IndicatorSeries};
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::{OhlcvBar, WeeklyBar};
use crate::domain::portfolio::Portfolio;
use crate::domain::position::held_positions;
use crate::domain::resample::{resample_weekly, resample_weekly_close};
use crate::domain::stop_loss::enforce_stop_loss;
use crate::domain::strategy::StrategyVariant;
use crate::domain::trade::{extract_trades, Trade};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 1_000_000.0;
pub const DEFAULT_STOP_LOSS_PCT: f64 = 0.05;
pub const DEFAULT_VOLATILITY_SYMBOL: &str = "^VIX";

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    /// Fraction of entry price; 0 disables the stop.
    pub stop_loss_pct: f64,
    pub timezone: Tz,
    pub volatility_symbol: String,
    pub variants: Vec<StrategyVariant>,
}

impl BacktestConfig {
    pub fn needs_volatility_index(&self) -> bool {
        self.variants
            .iter()
            .any(|v| v.family.needs_volatility_index())
    }
}

/// Everything one variant produced for one symbol.
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub variant: StrategyVariant,
    pub bars: Vec<WeeklyBar>,
    pub indicator: IndicatorSeries,
    pub portfolio: Portfolio,
    pub trades: Vec<Trade>,
    pub metrics: Metrics,
}

pub fn run_strategy(
    code: &str,
    daily: &[OhlcvBar],
    volatility: Option<&[OhlcvBar]>,
    variant: StrategyVariant,
    config: &BacktestConfig,
) -> Result<StrategyRun, SigtraderError> {
    let bars = resample_weekly(code, daily, config.timezone)?;

    let weekly_vix = match volatility {
        Some(vix) if variant.family.needs_volatility_index() => {
            Some(resample_weekly_close(&config.volatility_symbol, vix, config.timezone)?)
        }
        _ => None,
    };

    let indicator = compute_indicator(code, variant.family, &bars, weekly_vix.as_deref())?;
    let positions = held_positions(&bars, &indicator, variant.policy, variant.family);
    let adjusted = enforce_stop_loss(&bars, &positions, config.stop_loss_pct);
    let portfolio = Portfolio::account(&adjusted, config.initial_capital);
    let trades = extract_trades(&portfolio.weeks);
    let metrics = Metrics::compute(&portfolio, &trades);

    debug!(
        "{} {}: {} weeks, {} trades, sharpe {:.3}",
        code,
        variant,
        bars.len(),
        trades.len(),
        metrics.sharpe_ratio
    );

    Ok(StrategyRun {
        variant,
        bars,
        indicator,
        portfolio,
        trades,
        metrics,
    })
}
