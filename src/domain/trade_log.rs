//! Cross-symbol trade log.
//!
//! Collects the trades of every symbol's best strategy into one table and
//! aggregates win/PnL/duration statistics overall, per symbol and per
//! strategy. A trade with `PnL % <= 0` counts as losing.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::analysis::SymbolAnalysis;
use crate::domain::position::Side;
use crate::domain::trade::Trade;

/// One row of `all_trades_summary.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeLogEntry {
    #[serde(rename = "ETF")]
    pub symbol: String,
    #[serde(rename = "Strategy")]
    pub strategy: String,
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

impl TradeLogEntry {
    fn new(symbol: &str, strategy: &str, trade: &Trade) -> Self {
        TradeLogEntry {
            symbol: symbol.to_string(),
            strategy: strategy.to_string(),
            entry_date: trade.entry_date,
            exit_date: trade.exit_date,
            side: trade.side,
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            pnl_pct: trade.pnl_pct,
            duration_days: trade.duration_days,
            stopped_out: trade.stopped_out,
        }
    }
}

/// Best-strategy trades of each symbol, in symbol order then trade order.
pub fn collect_trade_log(analyses: &[SymbolAnalysis]) -> Vec<TradeLogEntry> {
    analyses
        .iter()
        .flat_map(|analysis| {
            let run = analysis.best_run();
            let strategy = run.variant.name();
            run.trades
                .iter()
                .map(move |trade| TradeLogEntry::new(&analysis.symbol, strategy, trade))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub total: usize,
    pub winning: usize,
    pub losing: usize,
    pub avg_pnl_pct: f64,
    pub best_pnl_pct: f64,
    pub worst_pnl_pct: f64,
    pub avg_duration_days: f64,
}

impl TradeStats {
    /// `None` for an empty set of trades.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a TradeLogEntry>) -> Option<Self> {
        let mut total = 0usize;
        let mut winning = 0usize;
        let mut pnl_sum = 0.0;
        let mut duration_sum = 0i64;
        let mut best = f64::NEG_INFINITY;
        let mut worst = f64::INFINITY;

        for entry in entries {
            total += 1;
            if entry.pnl_pct > 0.0 {
                winning += 1;
            }
            pnl_sum += entry.pnl_pct;
            duration_sum += entry.duration_days;
            best = best.max(entry.pnl_pct);
            worst = worst.min(entry.pnl_pct);
        }

        if total == 0 {
            return None;
        }
        Some(TradeStats {
            total,
            winning,
            losing: total - winning,
            avg_pnl_pct: pnl_sum / total as f64,
            best_pnl_pct: best,
            worst_pnl_pct: worst,
            avg_duration_days: duration_sum as f64 / total as f64,
        })
    }

    pub fn win_rate(&self) -> f64 {
        self.winning as f64 / self.total as f64
    }

    pub fn loss_rate(&self) -> f64 {
        self.losing as f64 / self.total as f64
    }
}

/// Statistics per distinct key, keys in order of first appearance.
pub fn grouped_stats<F>(entries: &[TradeLogEntry], key: F) -> Vec<(String, TradeStats)>
where
    F: Fn(&TradeLogEntry) -> &str,
{
    let mut keys: Vec<&str> = Vec::new();
    for entry in entries {
        let k = key(entry);
        if !keys.contains(&k) {
            keys.push(k);
        }
    }

    keys.into_iter()
        .filter_map(|k| {
            TradeStats::from_entries(entries.iter().filter(|e| key(e) == k))
                .map(|stats| (k.to_string(), stats))
        })
        .collect()
}
