//! Core domain types and logic.

pub mod ohlcv;
pub mod resample;
pub mod indicator;
pub mod position;
pub mod stop_loss;
pub mod portfolio;
pub mod trade;
pub mod metrics;
pub mod strategy;
pub mod backtest;
pub mod analysis;
pub mod trade_log;
pub mod batch;
pub mod universe;
pub mod config_validation;
pub mod error;
