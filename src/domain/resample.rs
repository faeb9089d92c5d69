//! Daily → weekly resampling in the reporting timezone.
//!
//! Weeks are calendar weeks ending Sunday and labelled by that Sunday.
//! Aggregation: open=first, high=max, low=min, close=last, volume=sum.
//! Weeks between the first and last populated week that saw no trading are
//! emitted with every price equal to the previous close and zero volume, so
//! the output has exactly one row per calendar week.

use chrono::{Datelike, Duration, NaiveDate};
use chrono_tz::Tz;

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::{OhlcvBar, WeeklyBar};

pub const DEFAULT_TIMEZONE: &str = "US/Eastern";

/// Parse an IANA timezone name such as `US/Eastern` or `Europe/London`.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

/// The Sunday that closes the calendar week containing `date`.
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let offset = 6 - date.weekday().num_days_from_monday();
    date + Duration::days(offset as i64)
}

pub fn resample_weekly(
    code: &str,
    bars: &[OhlcvBar],
    tz: Tz,
) -> Result<Vec<WeeklyBar>, SigtraderError> {
    if bars.is_empty() {
        return Err(SigtraderError::insufficient(code, "no daily bars to resample"));
    }

    let mut sorted: Vec<&OhlcvBar> = bars.iter().collect();
    sorted.sort_by_key(|b| b.timestamp);

    let mut weeks: Vec<WeeklyBar> = Vec::new();
    for bar in sorted {
        let local_date = bar.timestamp.with_timezone(&tz).date_naive();
        let period_end = week_ending(local_date);

        match weeks.last_mut() {
            Some(week) if week.period_end == period_end => {
                week.high = week.high.max(bar.high);
                week.low = week.low.min(bar.low);
                week.close = bar.close;
                week.volume += bar.volume;
            }
            _ => {
                if let Some(prev) = weeks.last() {
                    let prev_close = prev.close;
                    let mut gap = prev.period_end + Duration::days(7);
                    while gap < period_end {
                        weeks.push(WeeklyBar::carried(gap, prev_close));
                        gap += Duration::days(7);
                    }
                }
                weeks.push(WeeklyBar {
                    period_end,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    volume: bar.volume,
                });
            }
        }
    }

    Ok(weeks)
}

/// Last close per week, used for the volatility index.
pub fn resample_weekly_close(
    code: &str,
    bars: &[OhlcvBar],
    tz: Tz,
) -> Result<Vec<(NaiveDate, f64)>, SigtraderError> {
    Ok(resample_weekly(code, bars, tz)?
        .into_iter()
        .map(|w| (w.period_end, w.close))
        .collect())
}
