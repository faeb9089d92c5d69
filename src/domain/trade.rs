//! Round-trip trades recovered from the position-change events of an
//! accounted series.

use chrono::NaiveDate;
use serde::Serialize;

use super::portfolio::AccountedPeriod;
use super::position::Side;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    #[serde(rename = "Entry Date")]
    pub entry_date: NaiveDate,
    #[serde(rename = "Exit Date")]
    pub exit_date: NaiveDate,
    #[serde(rename = "Position")]
    pub side: Side,
    #[serde(rename = "Entry Price")]
    pub entry_price: f64,
    #[serde(rename = "Exit Price")]
    pub exit_price: f64,
    #[serde(rename = "PnL %")]
    pub pnl_pct: f64,
    #[serde(rename = "Duration (days)")]
    pub duration_days: i64,
    #[serde(rename = "Stopped Out")]
    pub stopped_out: bool,
}

impl Trade {
    fn close(open: &OpenTrade, exit: &AccountedPeriod) -> Self {
        let pnl_pct =
            open.side.factor() * (exit.close - open.entry_price) / open.entry_price * 100.0;
        Trade {
            entry_date: open.entry_date,
            exit_date: exit.period_end,
            side: open.side,
            entry_price: open.entry_price,
            exit_price: exit.close,
            pnl_pct,
            duration_days: (exit.period_end - open.entry_date).num_days(),
            stopped_out: exit.stopped,
        }
    }

    pub fn is_win(&self) -> bool {
        self.pnl_pct > 0.0
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenTrade {
    side: Side,
    entry_price: f64,
    entry_date: NaiveDate,
}

impl OpenTrade {
    fn at(side: Side, period: &AccountedPeriod) -> Option<Self> {
        (!side.is_flat()).then_some(OpenTrade {
            side,
            entry_price: period.close,
            entry_date: period.period_end,
        })
    }
}

/// Scan the position changes in order. A flip closes the running trade and
/// opens the opposite one at the same period and price. A position still
/// open at the end produces no trade.
pub fn extract_trades(periods: &[AccountedPeriod]) -> Vec<Trade> {
    let mut trades = Vec::new();
    let mut open: Option<OpenTrade> = None;

    for period in periods.iter().filter(|p| p.position_change != 0) {
        if let Some(current) = open.take() {
            trades.push(Trade::close(&current, period));
        }
        open = OpenTrade::at(period.position, period);
    }

    trades
}
