//! Moving-average crossover on a single instrument.
//!
//! Fully invested while the short mean is above the long mean, otherwise in
//! cash. Until the long window fills, the comparison is undefined and the
//! position is cash.

use super::CASH;
use crate::domain::error::BacktestError;
use crate::domain::frame::Frame;
use crate::domain::rolling::rolling_mean;

#[derive(Debug, Clone, PartialEq)]
pub struct SmaParams {
    pub short: usize,
    pub long: usize,
}

impl Default for SmaParams {
    fn default() -> Self {
        Self { short: 20, long: 60 }
    }
}

/// Weights with two columns, the instrument and [`CASH`], summing to 1 on
/// every date on which the instrument has a price.
pub fn generate(prices: &Frame, params: &SmaParams) -> Result<Frame, BacktestError> {
    if prices.width() != 1 {
        return Err(BacktestError::invalid_input(format!(
            "moving-average crossover needs exactly one price column, got {}",
            prices.width()
        )));
    }
    if params.short == 0 || params.short >= params.long {
        return Err(BacktestError::invalid_input(format!(
            "moving-average windows must satisfy 0 < short < long, got {}/{}",
            params.short, params.long
        )));
    }

    let name = prices.columns()[0].clone();
    let (dates, closes): (Vec<_>, Vec<_>) = prices
        .index()
        .iter()
        .zip(prices.column_at(0))
        .filter(|(_, v)| !v.is_nan())
        .map(|(d, v)| (*d, *v))
        .unzip();

    let short = rolling_mean(&closes, params.short);
    let long = rolling_mean(&closes, params.long);

    // NaN > x is false, so the warm-up stays in cash.
    let invested: Vec<f64> = short
        .iter()
        .zip(&long)
        .map(|(s, l)| if s > l { 1.0 } else { 0.0 })
        .collect();
    let cash = invested.iter().map(|w| 1.0 - w).collect();

    Ok(Frame::new(dates, vec![name, CASH.to_string()], vec![invested, cash])?)
}
