//! VPVMA: volatility-weighted volume-price moving average.
//!
//! weight[i]  = 1 / VIX[i]                       (weekly volatility-index close)
//! flow[i]    = C[i] * V[i] * weight[i]
//! VPVMA[i]   = SMA(window) of flow / SMA(window) of V
//! Signal[i]  = SMA(signal) of VPVMA
//!
//! Default parameters: window=12, signal=26
//! Warmup: window - 1 + signal - 1 weeks. A week whose volume average is zero
//! leaves VPVMA undefined, and every signal window touching it as well.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    rolling_mean, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::WeeklyBar;

pub const DEFAULT_WINDOW: usize = 12;
pub const DEFAULT_SIGNAL_WINDOW: usize = 26;

pub fn calculate_vpvma(
    code: &str,
    bars: &[WeeklyBar],
    volatility: &[(NaiveDate, f64)],
    window: usize,
    signal_window: usize,
) -> Result<IndicatorSeries, SigtraderError> {
    let indicator_type = IndicatorType::Vpvma {
        window,
        signal: signal_window,
    };

    if bars.is_empty() || window == 0 || signal_window == 0 {
        return Ok(IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        });
    }

    let vix_by_week: HashMap<NaiveDate, f64> = volatility.iter().copied().collect();

    let mut flows = Vec::with_capacity(bars.len());
    let mut volumes = Vec::with_capacity(bars.len());
    for bar in bars {
        let vix = *vix_by_week.get(&bar.period_end).ok_or_else(|| {
            SigtraderError::integrity(
                code,
                format!("no volatility index close for week ending {}", bar.period_end),
            )
        })?;
        if vix == 0.0 || !vix.is_finite() {
            return Err(SigtraderError::integrity(
                code,
                format!(
                    "volatility index close {} for week ending {} cannot weight volume",
                    vix, bar.period_end
                ),
            ));
        }
        let weight = 1.0 / vix;
        flows.push(Some(bar.close * bar.volume as f64 * weight));
        volumes.push(Some(bar.volume as f64));
    }

    let mean_flow = rolling_mean(&flows, window);
    let mean_volume = rolling_mean(&volumes, window);

    let line: Vec<Option<f64>> = mean_flow
        .iter()
        .zip(&mean_volume)
        .map(|(flow, volume)| match (flow, volume) {
            (Some(f), Some(v)) if *v != 0.0 => Some(f / v),
            _ => None,
        })
        .collect();
    let signal = rolling_mean(&line, signal_window);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (line[i], signal[i]) {
            (Some(l), Some(s)) => IndicatorPoint {
                date: bar.period_end,
                valid: true,
                value: IndicatorValue::new(l, s),
            },
            _ => IndicatorPoint {
                date: bar.period_end,
                valid: false,
                value: IndicatorValue::undefined(),
            },
        })
        .collect();

    Ok(IndicatorSeries {
        indicator_type,
        values,
    })
}

pub fn calculate_vpvma_default(
    code: &str,
    bars: &[WeeklyBar],
    volatility: &[(NaiveDate, f64)],
) -> Result<IndicatorSeries, SigtraderError> {
    calculate_vpvma(code, bars, volatility, DEFAULT_WINDOW, DEFAULT_SIGNAL_WINDOW)
}
