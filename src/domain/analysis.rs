//! Per-symbol analysis across strategy variants and the cross-symbol summary.

use std::cmp::Ordering;

use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

use crate::domain::backtest::{run_strategy, BacktestConfig, StrategyRun};
use crate::domain::error::SigtraderError;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone)]
pub struct SymbolAnalysis {
    pub symbol: String,
    /// One run per configured variant, in configuration order.
    pub runs: Vec<StrategyRun>,
    best: usize,
}

impl SymbolAnalysis {
    /// Picks the highest Sharpe; the earlier variant wins a tie.
    pub fn new(symbol: impl Into<String>, runs: Vec<StrategyRun>) -> Option<Self> {
        let mut best: Option<usize> = None;
        for (i, run) in runs.iter().enumerate() {
            match best {
                Some(b) if runs[b].metrics.sharpe_ratio >= run.metrics.sharpe_ratio => {}
                _ => best = Some(i),
            }
        }
        best.map(|best| SymbolAnalysis {
            symbol: symbol.into(),
            runs,
            best,
        })
    }

    pub fn best_run(&self) -> &StrategyRun {
        &self.runs[self.best]
    }
}

/// Fetch the symbol once, then run every configured variant on it.
pub fn analyze_symbol(
    data_port: &dyn DataPort,
    symbol: &str,
    config: &BacktestConfig,
) -> Result<SymbolAnalysis, SigtraderError> {
    let daily = data_port.fetch_ohlcv(symbol, config.start_date, config.end_date)?;
    if daily.is_empty() {
        return Err(SigtraderError::insufficient(
            symbol,
            format!(
                "no daily bars between {} and {}",
                config.start_date, config.end_date
            ),
        ));
    }
    debug!("{}: {} daily bars", symbol, daily.len());

    let volatility = if !config.needs_volatility_index() {
        None
    } else if symbol.eq_ignore_ascii_case(&config.volatility_symbol) {
        Some(daily.clone())
    } else {
        Some(data_port.fetch_volatility_index(
            &config.volatility_symbol,
            config.start_date,
            config.end_date,
        )?)
    };

    let runs = config
        .variants
        .iter()
        .map(|&variant| run_strategy(symbol, &daily, volatility.as_deref(), variant, config))
        .collect::<Result<Vec<_>, _>>()?;

    let analysis = SymbolAnalysis::new(symbol, runs).ok_or_else(|| SigtraderError::Pipeline {
        code: symbol.to_string(),
        reason: "no strategies configured".into(),
    })?;

    let best = analysis.best_run();
    info!(
        "{}: best strategy {} (sharpe {:.3}, total return {:.2}%)",
        symbol,
        best.variant,
        best.metrics.sharpe_ratio,
        best.metrics.total_return * 100.0
    );
    Ok(analysis)
}

/// One line of the cross-symbol summary: the symbol's best strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Best Strategy")]
    pub strategy: String,
    #[serde(rename = "Sharpe Ratio")]
    pub sharpe_ratio: f64,
    #[serde(rename = "Total Return")]
    pub total_return: f64,
    #[serde(rename = "Annual Return")]
    pub annual_return: f64,
    #[serde(rename = "Max Drawdown")]
    pub max_drawdown: f64,
    #[serde(rename = "Number of Trades")]
    pub position_changes: usize,
    #[serde(rename = "Win Ratio")]
    pub win_ratio: f64,
    #[serde(rename = "Start Date")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "End Date")]
    pub end_date: Option<NaiveDate>,
}

impl SummaryRow {
    fn from_analysis(analysis: &SymbolAnalysis) -> Self {
        let run = analysis.best_run();
        let m = &run.metrics;
        SummaryRow {
            symbol: analysis.symbol.clone(),
            strategy: run.variant.name().to_string(),
            sharpe_ratio: m.sharpe_ratio,
            total_return: m.total_return,
            annual_return: m.annual_return,
            max_drawdown: m.max_drawdown,
            position_changes: m.position_changes,
            win_ratio: m.win_ratio,
            start_date: run.portfolio.first_date(),
            end_date: run.portfolio.last_date(),
        }
    }
}

/// Best-strategy rows sorted by Sharpe, highest first.
pub fn summarize(analyses: &[SymbolAnalysis]) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = analyses.iter().map(SummaryRow::from_analysis).collect();
    rows.sort_by(|a, b| {
        b.sharpe_ratio
            .partial_cmp(&a.sharpe_ratio)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

/// How many symbols each strategy won, most frequent first. Ties keep the
/// order in which the strategy first appears in `rows`.
pub fn strategy_distribution(rows: &[SummaryRow]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in rows {
        match counts.iter_mut().find(|(name, _)| *name == row.strategy) {
            Some((_, n)) => *n += 1,
            None => counts.push((row.strategy.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
