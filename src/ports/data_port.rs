//! Market-data access port.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Daily bars for a date range, inclusive on both ends.
///
/// Implementations are shared across batch workers, hence `Send + Sync`.
pub trait DataPort: Send + Sync {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError>;

    /// Daily closes of the volatility index used to weight volume.
    fn fetch_volatility_index(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError> {
        self.fetch_ohlcv(symbol, start_date, end_date)
    }
}
