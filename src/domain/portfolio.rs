//! Returns and portfolio accounting over the stop-loss-corrected weeks.

use chrono::NaiveDate;

use super::position::Side;
use super::stop_loss::AdjustedWeek;

/// One fully accounted week of the strategy table.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountedPeriod {
    pub period_end: NaiveDate,
    pub close: f64,
    pub position: Side,
    pub stopped: bool,
    /// Close-to-close change; 0 for the first week.
    pub returns: f64,
    /// position × returns.
    pub strategy_returns: f64,
    pub portfolio_value: f64,
    /// First difference of the position (-2..=2); 0 for the first week.
    pub position_change: i8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub initial_capital: f64,
    pub weeks: Vec<AccountedPeriod>,
}

impl Portfolio {
    pub fn account(adjusted: &[AdjustedWeek], initial_capital: f64) -> Self {
        let mut weeks = Vec::with_capacity(adjusted.len());
        let mut value = initial_capital;
        let mut prev: Option<&AdjustedWeek> = None;

        for week in adjusted {
            let (returns, position_change) = match prev {
                Some(p) => {
                    let r = if p.close != 0.0 {
                        week.close / p.close - 1.0
                    } else {
                        0.0
                    };
                    (r, week.position.signum() - p.position.signum())
                }
                None => (0.0, 0),
            };
            let strategy_returns = week.position.factor() * returns;
            value *= 1.0 + strategy_returns;

            weeks.push(AccountedPeriod {
                period_end: week.period_end,
                close: week.close,
                position: week.position,
                stopped: week.stopped,
                returns,
                strategy_returns,
                portfolio_value: value,
                position_change,
            });
            prev = Some(week);
        }

        Portfolio {
            initial_capital,
            weeks,
        }
    }

    pub fn final_value(&self) -> f64 {
        self.weeks
            .last()
            .map(|w| w.portfolio_value)
            .unwrap_or(self.initial_capital)
    }

    pub fn strategy_returns(&self) -> Vec<f64> {
        self.weeks.iter().map(|w| w.strategy_returns).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.weeks.first().map(|w| w.period_end)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.weeks.last().map(|w| w.period_end)
    }
}
