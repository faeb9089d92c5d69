//! Daily and weekly OHLCV bar representations.

use chrono::{DateTime, NaiveDate, Utc};

/// One daily bar as delivered by the data source.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// One calendar week aggregated from daily bars, labelled by its Sunday.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyBar {
    pub period_end: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl WeeklyBar {
    /// A week with no trading: every price is the previous close, no volume.
    pub fn carried(period_end: NaiveDate, prev_close: f64) -> Self {
        WeeklyBar {
            period_end,
            open: prev_close,
            high: prev_close,
            low: prev_close,
            close: prev_close,
            volume: 0,
        }
    }
}
