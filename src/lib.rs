//! weightbt: weight-based portfolio backtester.
//!
//! Strategies turn a price panel into target weights; the engine applies
//! them with a one-period lag, charges turnover costs and tracks NAV.
//! Hexagonal architecture: domain logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`], the command line
//! in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
