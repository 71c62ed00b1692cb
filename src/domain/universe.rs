//! Instrument universe: the assets ranked by the cross-sectional strategies,
//! the baseline instrument, and the backtest window.
//!
//! Instrument ids are a six-digit code plus an exchange suffix, `.SH` or
//! `.SZ`, e.g. `510300.SH`.

use crate::domain::error::BacktestError;
use chrono::NaiveDate;
use std::collections::HashSet;

const EXCHANGES: [&str; 2] = ["SH", "SZ"];

#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    pub assets: Vec<String>,
    pub baseline: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.assets.len()
    }

    /// Assets followed by the baseline if it is not one of them.
    pub fn all_codes(&self) -> Vec<String> {
        let mut codes = self.assets.clone();
        if !codes.contains(&self.baseline) {
            codes.push(self.baseline.clone());
        }
        codes
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

impl From<UniverseError> for BacktestError {
    fn from(err: UniverseError) -> Self {
        BacktestError::invalid_input(err.to_string())
    }
}

/// Normalize an instrument id to upper case and check its shape.
pub fn validate_instrument_id(code: &str) -> Result<String, BacktestError> {
    let upper = code.trim().to_uppercase();
    let valid = match upper.split_once('.') {
        Some((digits, exchange)) => {
            digits.len() == 6
                && digits.bytes().all(|b| b.is_ascii_digit())
                && EXCHANGES.contains(&exchange)
        }
        None => false,
    };
    if valid {
        Ok(upper)
    } else {
        Err(BacktestError::UnknownInstrument {
            code: code.to_string(),
        })
    }
}

/// Split a comma-separated list into upper-cased codes. Empty tokens and
/// repeated codes are rejected.
pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}
