//! Report generation port trait.

use std::path::PathBuf;

use crate::domain::analysis::{SummaryRow, SymbolAnalysis};
use crate::domain::batch::SymbolFailure;
use crate::domain::error::SigtraderError;
use crate::domain::trade_log::TradeLogEntry;

/// Port for writing backtest reports. Each call returns the files it wrote.
pub trait ReportPort {
    /// Per-symbol outputs: trade lists, weekly tables, strategy comparison.
    fn write_symbol(&self, analysis: &SymbolAnalysis) -> Result<Vec<PathBuf>, SigtraderError>;

    /// Cross-symbol ranking plus the symbols that failed.
    fn write_summary(
        &self,
        rows: &[SummaryRow],
        failures: &[SymbolFailure],
        requested: usize,
    ) -> Result<Vec<PathBuf>, SigtraderError>;

    /// Every symbol's best-strategy trades and their aggregate statistics.
    fn write_trade_log(&self, entries: &[TradeLogEntry]) -> Result<Vec<PathBuf>, SigtraderError>;
}
