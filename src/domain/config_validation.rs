//! Configuration validation.
//!
//! Checks every key the backtest reads before anything runs. A key that is
//! present but does not parse is reported as invalid rather than silently
//! replaced by its default.

use crate::domain::error::BacktestError;
use crate::domain::universe::{parse_codes, validate_instrument_id};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_data_config(config)?;
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_dates(config)?;
    validate_assets(config)?;
    validate_baseline(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_cost(config)?;
    validate_periods_per_year(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_sma(config)?;
    validate_momentum(config)?;
    validate_lowvol(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BacktestError {
    BacktestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Value of `[section] key` parsed as `T`, or `default` when absent.
fn parsed<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, BacktestError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, format!("cannot parse {raw:?}"))),
    }
}

fn validate_cost(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value: f64 = parsed(config, "backtest", "cost_bps", 10.0)?;
    if !(value >= 0.0) {
        return Err(invalid("backtest", "cost_bps", "cost_bps must be non-negative"));
    }
    Ok(())
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value: f64 = parsed(config, "backtest", "periods_per_year", 252.0)?;
    if !(value > 0.0) {
        return Err(invalid(
            "backtest",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value: f64 = parsed(config, "backtest", "risk_free_rate", 0.0)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

/// Required `[data]` date in `YYYY-MM-DD` form.
pub fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<NaiveDate, BacktestError> {
    match config.get_string("data", field) {
        None => Err(BacktestError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "data",
                field,
                format!("invalid {field} format, expected YYYY-MM-DD"),
            )
        }),
    }
}

fn validate_assets(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let raw = match config.get_string("data", "assets") {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            return Err(BacktestError::ConfigMissing {
                section: "data".to_string(),
                key: "assets".to_string(),
            });
        }
    };
    let codes = parse_codes(&raw).map_err(|e| invalid("data", "assets", e.to_string()))?;
    for code in &codes {
        validate_instrument_id(code).map_err(|e| invalid("data", "assets", e.to_string()))?;
    }
    Ok(())
}

fn validate_baseline(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match config.get_string("data", "baseline") {
        Some(s) if !s.trim().is_empty() => validate_instrument_id(&s)
            .map(|_| ())
            .map_err(|e| invalid("data", "baseline", e.to_string())),
        _ => Err(BacktestError::ConfigMissing {
            section: "data".to_string(),
            key: "baseline".to_string(),
        }),
    }
}

fn validate_sma(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let short: i64 = parsed(config, "sma", "short", 20)?;
    let long: i64 = parsed(config, "sma", "long", 60)?;
    if short < 1 {
        return Err(invalid("sma", "short", "short must be at least 1"));
    }
    if long <= short {
        return Err(invalid("sma", "long", "long must be greater than short"));
    }
    Ok(())
}

fn validate_momentum(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let lookback: i64 = parsed(config, "momentum", "lookback", 12)?;
    let skip: i64 = parsed(config, "momentum", "skip", 1)?;
    let top_n: i64 = parsed(config, "momentum", "top_n", 2)?;
    if lookback < 1 {
        return Err(invalid("momentum", "lookback", "lookback must be at least 1"));
    }
    if skip < 0 || skip >= lookback {
        return Err(invalid(
            "momentum",
            "skip",
            "skip must be non-negative and less than lookback",
        ));
    }
    if top_n < 1 {
        return Err(invalid("momentum", "top_n", "top_n must be at least 1"));
    }
    Ok(())
}

fn validate_lowvol(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let lookback: i64 = parsed(config, "lowvol", "lookback", 60)?;
    let top_n: i64 = parsed(config, "lowvol", "top_n", 1)?;
    if lookback < 2 {
        return Err(invalid("lowvol", "lookback", "lookback must be at least 2"));
    }
    if top_n < 1 {
        return Err(invalid("lowvol", "top_n", "top_n must be at least 1"));
    }
    Ok(())
}
