//! CSV and plain-text report adapter implementing ReportPort.
//!
//! Layout under the output directory:
//! - `<SYMBOL>/trade_info_<strategy>.csv`
//! - `<SYMBOL>/weekly_<strategy>.csv` (when weekly tables are enabled)
//! - `<SYMBOL>/strategy_comparison.txt`
//! - `summary/etf_summary.csv`
//! - `summary/summary_report.txt`
//! - `summary/all_trades_summary.csv`
//! - `summary/trade_statistics_report.txt`

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::domain::analysis::{strategy_distribution, SummaryRow, SymbolAnalysis};
use crate::domain::backtest::StrategyRun;
use crate::domain::batch::SymbolFailure;
use crate::domain::error::SigtraderError;
use crate::domain::metrics::Metrics;
use crate::domain::trade_log::{grouped_stats, TradeLogEntry, TradeStats};
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter {
    output_dir: PathBuf,
    write_weekly: bool,
}

#[derive(Serialize)]
struct WeeklyRow {
    #[serde(rename = "Date")]
    date: chrono::NaiveDate,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: i64,
    #[serde(rename = "Indicator")]
    line: Option<f64>,
    #[serde(rename = "Signal")]
    signal: Option<f64>,
    #[serde(rename = "Histogram")]
    histogram: Option<f64>,
    #[serde(rename = "Position")]
    position: i8,
    #[serde(rename = "Stopped")]
    stopped: bool,
    #[serde(rename = "Returns")]
    returns: f64,
    #[serde(rename = "Strategy_Returns")]
    strategy_returns: f64,
    #[serde(rename = "Portfolio_Value")]
    portfolio_value: f64,
    #[serde(rename = "Position_Change")]
    position_change: i8,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf, write_weekly: bool) -> Self {
        Self {
            output_dir,
            write_weekly,
        }
    }

    fn ensure_dir(&self, name: &str) -> Result<PathBuf, SigtraderError> {
        let dir = self.output_dir.join(name.trim_start_matches('^'));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

fn report_err(path: &Path, e: impl std::fmt::Display) -> SigtraderError {
    SigtraderError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), SigtraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| report_err(path, e))?;
    for row in rows {
        wtr.serialize(row).map_err(|e| report_err(path, e))?;
    }
    wtr.flush().map_err(|e| report_err(path, e))
}

fn write_text(path: &Path, content: &str) -> Result<(), SigtraderError> {
    fs::write(path, content)?;
    Ok(())
}

fn weekly_rows(run: &StrategyRun) -> Vec<WeeklyRow> {
    run.bars
        .iter()
        .zip(&run.indicator.values)
        .zip(&run.portfolio.weeks)
        .map(|((bar, point), week)| {
            let pair = point.pair();
            WeeklyRow {
                date: bar.period_end,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: week.close,
                volume: bar.volume,
                line: pair.map(|(l, _)| l),
                signal: pair.map(|(_, s)| s),
                histogram: point.valid.then_some(point.value.histogram),
                position: week.position.signum(),
                stopped: week.stopped,
                returns: week.returns,
                strategy_returns: week.strategy_returns,
                portfolio_value: week.portfolio_value,
                position_change: week.position_change,
            }
        })
        .collect()
}

fn format_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn format_metrics(metrics: &Metrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Total Return:      {}\n", format_pct(metrics.total_return)));
    out.push_str(&format!("  Annual Return:     {}\n", format_pct(metrics.annual_return)));
    out.push_str(&format!("  Sharpe Ratio:      {:.2}\n", metrics.sharpe_ratio));
    out.push_str(&format!("  Max Drawdown:      {}\n", format_pct(metrics.max_drawdown)));
    out.push_str(&format!("  Position Changes:  {}\n", metrics.position_changes));
    out.push_str(&format!("  Win Ratio:         {}\n", format_pct(metrics.win_ratio)));
    out.push_str(&format!(
        "  Closed Trades:     {} ({} stopped out)\n",
        metrics.trade_count, metrics.stopped_trades
    ));
    out.push_str(&format!("  Avg Trade PnL:     {:.2}%\n", metrics.avg_trade_pnl_pct));
    out.push_str(&format!("  Initial Value:     {:.2}\n", metrics.initial_value));
    out.push_str(&format!("  Final Value:       {:.2}\n", metrics.final_value));
    out.push_str(&format!(
        "  Portfolio Return:  {}\n",
        format_pct(metrics.portfolio_return)
    ));
    out
}

pub fn format_strategy_comparison(analysis: &SymbolAnalysis) -> String {
    let best = analysis.best_run();
    let title = format!("Strategy Comparison for {}", analysis.symbol);

    let mut out = String::new();
    out.push_str(&title);
    out.push('\n');
    out.push_str(&"=".repeat(title.len()));
    out.push_str("\n\n");
    out.push_str(&format!(
        "Best strategy: {} (Sharpe {:.2})\n\n",
        best.variant, best.metrics.sharpe_ratio
    ));

    for run in &analysis.runs {
        let marker = if run.variant == best.variant { " *" } else { "" };
        out.push_str(&format!("{} [{}]{}\n", run.variant, run.indicator.indicator_type, marker));
        out.push_str(&format_metrics(&run.metrics));
        out.push('\n');
    }
    out
}

pub fn format_summary_report(
    rows: &[SummaryRow],
    failures: &[SymbolFailure],
    requested: usize,
) -> String {
    let mut out = String::from("Backtest Summary\n================\n\n");
    out.push_str(&format!(
        "Processed {} of {} symbols\n\n",
        rows.len(),
        requested
    ));

    if rows.is_empty() {
        out.push_str("No symbols completed.\n");
    } else {
        out.push_str(&format!(
            "{:<4} {:<8} {:<18} {:>8} {:>10} {:>10} {:>10} {:>7} {:>8}\n",
            "#", "Symbol", "Best Strategy", "Sharpe", "Total", "Annual", "MaxDD", "Trades", "Win"
        ));
        for (i, row) in rows.iter().enumerate() {
            out.push_str(&format!(
                "{:<4} {:<8} {:<18} {:>8.2} {:>10} {:>10} {:>10} {:>7} {:>8}\n",
                i + 1,
                row.symbol,
                row.strategy,
                row.sharpe_ratio,
                format_pct(row.total_return),
                format_pct(row.annual_return),
                format_pct(row.max_drawdown),
                row.position_changes,
                format_pct(row.win_ratio)
            ));
        }
    }

    if !rows.is_empty() {
        out.push_str("\nTop Performing Symbols by Sharpe Ratio:\n");
        for row in rows.iter().take(5) {
            out.push_str(&format!(
                "  {}: {} (Sharpe: {:.2})\n",
                row.symbol, row.strategy, row.sharpe_ratio
            ));
        }

        out.push_str("\nStrategy Distribution:\n");
        for (strategy, count) in strategy_distribution(rows) {
            out.push_str(&format!(
                "  {}: {} symbols ({:.1}%)\n",
                strategy,
                count,
                count as f64 / rows.len() as f64 * 100.0
            ));
        }

        let n = rows.len() as f64;
        let mean = |f: fn(&SummaryRow) -> f64| rows.iter().map(f).sum::<f64>() / n;
        out.push_str("\nPerformance Statistics:\n");
        out.push_str(&format!(
            "  Average Sharpe Ratio:  {:.2}\n",
            mean(|r| r.sharpe_ratio)
        ));
        out.push_str(&format!(
            "  Average Annual Return: {}\n",
            format_pct(mean(|r| r.annual_return))
        ));
        out.push_str(&format!(
            "  Average Max Drawdown:  {}\n",
            format_pct(mean(|r| r.max_drawdown))
        ));
        out.push_str(&format!(
            "  Average Win Ratio:     {}\n",
            format_pct(mean(|r| r.win_ratio))
        ));
    }

    if !failures.is_empty() {
        out.push_str("\nFailed symbols:\n");
        for failure in failures {
            out.push_str(&format!("  {}: {}\n", failure.symbol, failure.error));
        }
    }
    out
}

fn rate(count: usize, stats: &TradeStats) -> String {
    format!("{} ({:.1}%)", count, count as f64 / stats.total as f64 * 100.0)
}

pub fn format_trade_statistics(entries: &[TradeLogEntry]) -> String {
    let mut out = String::from("Trade Statistics Report\n=======================\n\n");
    let Some(overall) = TradeStats::from_entries(entries) else {
        out.push_str("No closed trades.\n");
        return out;
    };

    out.push_str("Overall Statistics:\n");
    out.push_str(&format!("  Total Trades:      {}\n", overall.total));
    out.push_str(&format!("  Winning Trades:    {}\n", rate(overall.winning, &overall)));
    out.push_str(&format!("  Losing Trades:     {}\n", rate(overall.losing, &overall)));
    out.push_str(&format!("  Average PnL:       {:.2}%\n", overall.avg_pnl_pct));
    out.push_str(&format!(
        "  Average Duration:  {:.1} days\n",
        overall.avg_duration_days
    ));

    out.push_str("\nStatistics by ETF:\n");
    for (symbol, stats) in grouped_stats(entries, |e| e.symbol.as_str()) {
        out.push_str(&format!("{}:\n", symbol));
        out.push_str(&format!("  Total Trades:      {}\n", stats.total));
        out.push_str(&format!("  Winning Trades:    {}\n", rate(stats.winning, &stats)));
        out.push_str(&format!("  Average PnL:       {:.2}%\n", stats.avg_pnl_pct));
        out.push_str(&format!("  Best Trade:        {:.2}%\n", stats.best_pnl_pct));
        out.push_str(&format!("  Worst Trade:       {:.2}%\n", stats.worst_pnl_pct));
    }

    out.push_str("\nStatistics by Strategy:\n");
    for (strategy, stats) in grouped_stats(entries, |e| e.strategy.as_str()) {
        out.push_str(&format!("{}:\n", strategy));
        out.push_str(&format!("  Total Trades:      {}\n", stats.total));
        out.push_str(&format!("  Winning Trades:    {}\n", rate(stats.winning, &stats)));
        out.push_str(&format!("  Average PnL:       {:.2}%\n", stats.avg_pnl_pct));
        out.push_str(&format!(
            "  Average Duration:  {:.1} days\n",
            stats.avg_duration_days
        ));
    }
    out
}

impl ReportPort for CsvReportAdapter {
    fn write_symbol(&self, analysis: &SymbolAnalysis) -> Result<Vec<PathBuf>, SigtraderError> {
        let dir = self.ensure_dir(&analysis.symbol)?;
        let mut written = Vec::new();

        for run in &analysis.runs {
            let slug = run.variant.slug();

            let trades_path = dir.join(format!("trade_info_{}.csv", slug));
            write_csv(&trades_path, &run.trades)?;
            written.push(trades_path);

            if self.write_weekly {
                let weekly_path = dir.join(format!("weekly_{}.csv", slug));
                write_csv(&weekly_path, &weekly_rows(run))?;
                written.push(weekly_path);
            }
        }

        let comparison_path = dir.join("strategy_comparison.txt");
        write_text(&comparison_path, &format_strategy_comparison(analysis))?;
        written.push(comparison_path);

        info!("{}: wrote {} report files to {}", analysis.symbol, written.len(), dir.display());
        Ok(written)
    }

    fn write_summary(
        &self,
        rows: &[SummaryRow],
        failures: &[SymbolFailure],
        requested: usize,
    ) -> Result<Vec<PathBuf>, SigtraderError> {
        let dir = self.ensure_dir("summary")?;

        let csv_path = dir.join("etf_summary.csv");
        write_csv(&csv_path, rows)?;

        let report_path = dir.join("summary_report.txt");
        write_text(&report_path, &format_summary_report(rows, failures, requested))?;

        info!("summary written to {}", dir.display());
        Ok(vec![csv_path, report_path])
    }

    fn write_trade_log(&self, entries: &[TradeLogEntry]) -> Result<Vec<PathBuf>, SigtraderError> {
        let dir = self.ensure_dir("summary")?;

        let csv_path = dir.join("all_trades_summary.csv");
        write_csv(&csv_path, entries)?;

        let stats_path = dir.join("trade_statistics_report.txt");
        write_text(&stats_path, &format_trade_statistics(entries))?;

        info!("{} trades logged to {}", entries.len(), csv_path.display());
        Ok(vec![csv_path, stats_path])
    }
}
