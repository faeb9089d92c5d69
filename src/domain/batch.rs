//! Multi-symbol fan-out over a fixed pool of worker threads.
//!
//! Each symbol is an independent task that owns its own fetched data; a
//! failing or panicking symbol is recorded and the rest carry on.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{info, warn};

use crate::domain::analysis::{analyze_symbol, SymbolAnalysis};
use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SigtraderError;
use crate::ports::data_port::DataPort;

#[derive(Debug)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: SigtraderError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successful symbols, in request order.
    pub analyses: Vec<SymbolAnalysis>,
    pub failures: Vec<SymbolFailure>,
    pub requested: usize,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.analyses.len()
    }
}

struct SymbolTask {
    index: usize,
    symbol: String,
}

struct SymbolResult {
    index: usize,
    symbol: String,
    outcome: Result<SymbolAnalysis, SigtraderError>,
}

/// Worker count: `requested` (0 means one per CPU), never more than `tasks`.
pub fn worker_count(requested: usize, tasks: usize) -> usize {
    let wanted = if requested == 0 {
        num_cpus::get()
    } else {
        requested
    };
    std::cmp::min(tasks, std::cmp::max(1, wanted))
}

pub fn run_batch(
    data_port: Arc<dyn DataPort>,
    symbols: &[String],
    config: &BacktestConfig,
    workers: usize,
) -> BatchReport {
    let total = symbols.len();
    let mut report = BatchReport {
        requested: total,
        ..BatchReport::default()
    };
    if total == 0 {
        return report;
    }

    let num_workers = worker_count(workers, total);
    info!(
        "Backtesting {} symbols on {} worker threads",
        total, num_workers
    );

    let (task_tx, task_rx): (Sender<SymbolTask>, Receiver<SymbolTask>) = bounded(total);
    let (result_tx, result_rx): (Sender<SymbolResult>, Receiver<SymbolResult>) = bounded(total);

    let config = Arc::new(config.clone());
    let mut handles = Vec::with_capacity(num_workers);
    for _ in 0..num_workers {
        let rx = task_rx.clone();
        let result_tx = result_tx.clone();
        let data_port = Arc::clone(&data_port);
        let config = Arc::clone(&config);

        handles.push(thread::spawn(move || {
            while let Ok(SymbolTask { index, symbol }) = rx.recv() {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    analyze_symbol(data_port.as_ref(), &symbol, &config)
                }))
                .unwrap_or_else(|payload| {
                    Err(SigtraderError::Pipeline {
                        code: symbol.clone(),
                        reason: panic_message(payload.as_ref()),
                    })
                });
                if result_tx
                    .send(SymbolResult {
                        index,
                        symbol,
                        outcome,
                    })
                    .is_err()
                {
                    break;
                }
            }
        }));
    }
    drop(task_rx);
    drop(result_tx);

    for (index, symbol) in symbols.iter().enumerate() {
        let task = SymbolTask {
            index,
            symbol: symbol.clone(),
        };
        if task_tx.send(task).is_err() {
            warn!("worker pool closed before all symbols were queued");
            break;
        }
    }
    drop(task_tx);

    let mut slots: Vec<Option<SymbolResult>> = (0..total).map(|_| None).collect();
    for result in result_rx.iter() {
        let index = result.index;
        slots[index] = Some(result);
    }

    for handle in handles {
        if handle.join().is_err() {
            warn!("batch worker thread terminated abnormally");
        }
    }

    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(SymbolResult {
                outcome: Ok(analysis),
                ..
            }) => report.analyses.push(analysis),
            Some(SymbolResult {
                symbol,
                outcome: Err(e),
                ..
            }) => {
                warn!("{}: {}", symbol, e);
                report.failures.push(SymbolFailure { symbol, error: e });
            }
            None => {
                let symbol = symbols[index].clone();
                warn!("{}: no result returned", symbol);
                report.failures.push(SymbolFailure {
                    error: SigtraderError::Pipeline {
                        code: symbol.clone(),
                        reason: "no result returned".into(),
                    },
                    symbol,
                });
            }
        }
    }

    info!("processed {} of {} symbols", report.processed(), total);
    report
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_bounds() {
        assert_eq!(worker_count(4, 2), 2);
        assert_eq!(worker_count(2, 10), 2);
        assert_eq!(worker_count(0, 1), 1);
        assert!(worker_count(0, 1000) >= 1);
    }

    #[test]
    fn panic_messages() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "panicked: boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "panicked: bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "panicked");
    }
}
