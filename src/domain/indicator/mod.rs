//! Weekly indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorFamily`: which oscillator a strategy is driven by
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: The oscillator line, its signal line and their difference
//! - `IndicatorType`: Indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values

pub mod ema;
pub mod macd;
pub mod sma;
pub mod vpvma;

pub use ema::ewm;
pub use sma::rolling_mean;

use chrono::NaiveDate;
use std::fmt;

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::WeeklyBar;

/// The two oscillator families a strategy can be built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorFamily {
    /// Price momentum: EMA(12) - EMA(26) of close, signal EMA(9).
    Macd,
    /// Volatility-weighted volume-price average, signal SMA(26).
    Vpvma,
}

impl IndicatorFamily {
    pub fn default_type(self) -> IndicatorType {
        match self {
            IndicatorFamily::Macd => IndicatorType::Macd {
                fast: macd::DEFAULT_FAST,
                slow: macd::DEFAULT_SLOW,
                signal: macd::DEFAULT_SIGNAL,
            },
            IndicatorFamily::Vpvma => IndicatorType::Vpvma {
                window: vpvma::DEFAULT_WINDOW,
                signal: vpvma::DEFAULT_SIGNAL_WINDOW,
            },
        }
    }

    pub fn needs_volatility_index(self) -> bool {
        matches!(self, IndicatorFamily::Vpvma)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

impl IndicatorPoint {
    /// `(line, signal)` when both are defined.
    pub fn pair(&self) -> Option<(f64, f64)> {
        if self.valid {
            Some((self.value.line, self.value.signal))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorValue {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl IndicatorValue {
    pub fn new(line: f64, signal: f64) -> Self {
        IndicatorValue {
            line,
            signal,
            histogram: line - signal,
        }
    }

    pub fn undefined() -> Self {
        IndicatorValue {
            line: 0.0,
            signal: 0.0,
            histogram: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Vpvma {
        window: usize,
        signal: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Vpvma { window, signal } => write!(f, "VPVMA({},{})", window, signal),
        }
    }
}

/// Compute the default-parameter indicator for `family` over weekly bars.
///
/// `volatility` is the weekly volatility-index close, required by
/// [`IndicatorFamily::Vpvma`] and ignored otherwise.
pub fn compute_indicator(
    code: &str,
    family: IndicatorFamily,
    bars: &[WeeklyBar],
    volatility: Option<&[(NaiveDate, f64)]>,
) -> Result<IndicatorSeries, SigtraderError> {
    if bars.is_empty() {
        return Err(SigtraderError::insufficient(code, "no weekly bars"));
    }
    match family {
        IndicatorFamily::Macd => Ok(macd::calculate_macd_default(bars)),
        IndicatorFamily::Vpvma => {
            let vix = volatility
                .filter(|v| !v.is_empty())
                .ok_or_else(|| SigtraderError::insufficient(code, "no volatility index series"))?;
            vpvma::calculate_vpvma_default(code, bars, vix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bars(prices: &[f64]) -> Vec<WeeklyBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| WeeklyBar {
                period_end: start + chrono::Duration::weeks(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn indicator_type_display_macd() {
        assert_eq!(
            IndicatorFamily::Macd.default_type().to_string(),
            "MACD(12,26,9)"
        );
    }

    #[test]
    fn indicator_type_display_vpvma() {
        assert_eq!(
            IndicatorFamily::Vpvma.default_type().to_string(),
            "VPVMA(12,26)"
        );
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let v = IndicatorValue::new(1.5, 0.25);
        assert!((v.histogram - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn pair_is_none_when_invalid() {
        let point = IndicatorPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            valid: false,
            value: IndicatorValue::undefined(),
        };
        assert!(point.pair().is_none());
    }

    #[test]
    fn compute_rejects_empty_bars() {
        let err = compute_indicator("EEM", IndicatorFamily::Macd, &[], None).unwrap_err();
        assert!(matches!(err, SigtraderError::InsufficientData { .. }));
    }

    #[test]
    fn compute_vpvma_requires_volatility() {
        let bars = make_bars(&[100.0, 101.0]);
        let err = compute_indicator("EEM", IndicatorFamily::Vpvma, &bars, None).unwrap_err();
        assert!(matches!(err, SigtraderError::InsufficientData { .. }));

        let err = compute_indicator("EEM", IndicatorFamily::Vpvma, &bars, Some(&[])).unwrap_err();
        assert!(matches!(err, SigtraderError::InsufficientData { .. }));
    }

    #[test]
    fn compute_macd_ignores_volatility() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let series = compute_indicator("EEM", IndicatorFamily::Macd, &bars, None).unwrap();
        assert_eq!(series.values.len(), 3);
        assert_eq!(series.indicator_type, IndicatorFamily::Macd.default_type());
    }

    #[test]
    fn only_vpvma_needs_volatility_index() {
        assert!(!IndicatorFamily::Macd.needs_volatility_index());
        assert!(IndicatorFamily::Vpvma.needs_volatility_index());
    }
}
