//! sigtrader: weekly signal backtester for MACD and volatility-weighted
//! VPVMA strategies with a per-trade stop-loss.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
