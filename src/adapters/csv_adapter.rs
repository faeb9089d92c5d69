//! CSV file data adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with a leading `^` dropped from
//! index symbols (`^VIX` → `VIX.csv`). Headers are matched by name, either
//! lowercase or capitalised; extra columns such as `Adj Close` are ignored.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
    timezone: Tz,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "Datetime")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
}

impl CsvAdapter {
    /// Plain dates in the files are read as midnight in `timezone`.
    pub fn new(base_path: PathBuf, timezone: Tz) -> Self {
        Self {
            base_path,
            timezone,
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        let stem = symbol.trim_start_matches('^');
        self.base_path.join(format!("{}.csv", stem))
    }

    fn parse_timestamp(&self, raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
            return Some(dt.with_timezone(&Utc));
        }
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
        let midnight = date.and_hms_opt(0, 0, 0)?;
        self.timezone
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError> {
        let path = self.csv_path(symbol);
        let mut rdr = csv::Reader::from_path(&path).map_err(|e| SigtraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| SigtraderError::DataSource {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;

            let timestamp =
                self.parse_timestamp(&row.date)
                    .ok_or_else(|| SigtraderError::DataSource {
                        reason: format!(
                            "{}: invalid date '{}' on data row {}",
                            path.display(),
                            row.date,
                            line + 1
                        ),
                    })?;

            let local_date = timestamp.with_timezone(&self.timezone).date_naive();
            if local_date < start_date || local_date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                code: symbol.to_string(),
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.unwrap_or(0.0).round() as i64,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}
