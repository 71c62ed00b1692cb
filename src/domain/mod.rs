//! Core domain types and logic.

pub mod backtest;
pub mod calendar;
pub mod config_validation;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod ohlcv;
pub mod rolling;
pub mod run;
pub mod strategy;
pub mod universe;
