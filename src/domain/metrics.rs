//! Per-strategy performance metrics over an accounted weekly series.

use super::portfolio::Portfolio;
use super::trade::Trade;

const WEEKS_PER_YEAR: f64 = 52.0;
const DAYS_PER_YEAR: f64 = 365.25;
/// Below this the return series counts as constant.
const MIN_STDDEV: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Periods where the position changed.
    pub position_changes: usize,
    /// Share of position-change periods whose strategy return was positive.
    pub win_ratio: f64,
    pub total_return: f64,
    pub annual_return: f64,
    pub sharpe_ratio: f64,
    /// Deepest peak-to-trough fall as a negative fraction (0 when none).
    pub max_drawdown: f64,
    pub initial_value: f64,
    pub final_value: f64,
    pub portfolio_return: f64,
    pub trade_count: usize,
    pub stopped_trades: usize,
    pub avg_trade_pnl_pct: f64,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, trades: &[Trade]) -> Self {
        let periods = &portfolio.weeks;
        let initial_value = portfolio.initial_capital;
        let final_value = portfolio.final_value();

        let returns = portfolio.strategy_returns();
        let total_return = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0;

        let years = match (portfolio.first_date(), portfolio.last_date()) {
            (Some(first), Some(last)) => (last - first).num_days() as f64 / DAYS_PER_YEAR,
            _ => 0.0,
        };
        let annual_return = annualize(total_return, years);

        let changes: Vec<_> = periods.iter().filter(|p| p.position_change != 0).collect();
        let position_changes = changes.len();
        let win_ratio = if position_changes > 0 {
            changes.iter().filter(|p| p.strategy_returns > 0.0).count() as f64
                / position_changes as f64
        } else {
            0.0
        };

        let values: Vec<f64> = periods.iter().map(|p| p.portfolio_value).collect();

        let portfolio_return = if initial_value != 0.0 {
            (final_value - initial_value) / initial_value
        } else {
            0.0
        };

        let avg_trade_pnl_pct = if trades.is_empty() {
            0.0
        } else {
            trades.iter().map(|t| t.pnl_pct).sum::<f64>() / trades.len() as f64
        };

        Metrics {
            position_changes,
            win_ratio,
            total_return,
            annual_return,
            sharpe_ratio: compute_sharpe(&returns),
            max_drawdown: compute_drawdown(&values),
            initial_value,
            final_value,
            portfolio_return,
            trade_count: trades.len(),
            stopped_trades: trades.iter().filter(|t| t.stopped_out).count(),
            avg_trade_pnl_pct,
        }
    }
}

fn annualize(total_return: f64, years: f64) -> f64 {
    if years <= 0.0 {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(1.0 / years) - 1.0
}

/// √52 · mean / sample std. Degenerate inputs give 0.
pub(crate) fn compute_sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > MIN_STDDEV && stddev.is_finite() {
        WEEKS_PER_YEAR.sqrt() * mean / stddev
    } else {
        0.0
    }
}

/// Minimum of (value - running peak) / running peak.
pub(crate) fn compute_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &value in values {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (value - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
