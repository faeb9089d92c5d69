//! Stop-loss enforcement over the lagged weekly position series.
//!
//! A single chronological pass carrying `{held side, entry price}`:
//! - flat → non-flat: enter at the week's close; the entry week is not checked.
//! - while long: stop when (low - entry) / entry < -pct, filled at entry * (1 - pct).
//! - while short: stop when (entry - high) / entry < -pct, filled at entry * (1 + pct).
//! - a stopped week is forced flat and its close replaced by the stop price.
//! - otherwise, if the upstream side differs from the held side, the held side
//!   follows it and the entry price re-anchors to the week's close.
//!
//! The pass only reads the week it attributes an exit to; bar integrity
//! (e.g. low > close) is not validated.

use chrono::NaiveDate;
use log::debug;

use crate::domain::ohlcv::WeeklyBar;
use crate::domain::position::Side;

/// One week after stop-loss correction.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedWeek {
    pub period_end: NaiveDate,
    /// The week's close, or the stop execution price if `stopped`.
    pub close: f64,
    pub position: Side,
    pub stopped: bool,
}

#[derive(Debug, Clone, Copy)]
struct HoldState {
    held: Side,
    entry_price: f64,
}

impl HoldState {
    fn flat() -> Self {
        HoldState {
            held: Side::Flat,
            entry_price: 0.0,
        }
    }

    /// Stop execution price if this week's range breaches the threshold.
    fn stop_price(&self, bar: &WeeklyBar, stop_loss_pct: f64) -> Option<f64> {
        let entry = self.entry_price;
        match self.held {
            Side::Long => {
                let loss_pct = (bar.low - entry) / entry;
                (loss_pct < -stop_loss_pct).then(|| entry * (1.0 - stop_loss_pct))
            }
            Side::Short => {
                let loss_pct = (entry - bar.high) / entry;
                (loss_pct < -stop_loss_pct).then(|| entry * (1.0 + stop_loss_pct))
            }
            Side::Flat => None,
        }
    }
}

/// Apply the stop to `positions` (one per bar). `stop_loss_pct <= 0` disables it.
pub fn enforce_stop_loss(
    bars: &[WeeklyBar],
    positions: &[Side],
    stop_loss_pct: f64,
) -> Vec<AdjustedWeek> {
    let mut state = HoldState::flat();
    let mut out = Vec::with_capacity(bars.len());

    for (bar, &upstream) in bars.iter().zip(positions) {
        let mut week = AdjustedWeek {
            period_end: bar.period_end,
            close: bar.close,
            position: upstream,
            stopped: false,
        };

        if !upstream.is_flat() && state.held.is_flat() {
            state = HoldState {
                held: upstream,
                entry_price: bar.close,
            };
        } else if !state.held.is_flat() {
            let stop = if stop_loss_pct > 0.0 {
                state.stop_price(bar, stop_loss_pct)
            } else {
                None
            };

            if let Some(price) = stop {
                debug!(
                    "stop-loss hit week ending {}: {} entry {:.4} exits at {:.4}",
                    bar.period_end,
                    state.held.label(),
                    state.entry_price,
                    price
                );
                week.close = price;
                week.position = Side::Flat;
                week.stopped = true;
                state = HoldState::flat();
            } else if upstream != state.held {
                state = HoldState {
                    held: upstream,
                    entry_price: if upstream.is_flat() { 0.0 } else { bar.close },
                };
            }
        }

        out.push(week);
    }

    out
}
