//! Cross-sectional low-volatility selection.
//!
//! At each month-end, holds the `top_n` instruments whose trailing
//! `lookback` daily returns have the smallest sample standard deviation.

use super::{clean_panel, equal_weight_row, expand_to_calendar};
use crate::domain::error::BacktestError;
use crate::domain::frame::Frame;
use crate::domain::rolling::sample_std;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct LowVolParams {
    /// Daily returns in the volatility window.
    pub lookback: usize,
    pub top_n: usize,
}

impl Default for LowVolParams {
    fn default() -> Self {
        Self {
            lookback: 60,
            top_n: 1,
        }
    }
}

/// Indices of the `top_n` smallest defined volatilities. Ties keep column
/// order.
pub fn select_lowest(vols: &[Option<f64>], top_n: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..vols.len()).filter(|&i| vols[i].is_some()).collect();
    ranked.sort_by(|&a, &b| {
        let va = vols[a].unwrap_or(f64::INFINITY);
        let vb = vols[b].unwrap_or(f64::INFINITY);
        va.total_cmp(&vb)
    });
    ranked.truncate(top_n);
    ranked
}

/// Month-end decisions. The window is the `lookback` returns dated strictly
/// before the month-end label; a month-end with no more than `lookback` rows
/// before it is skipped, so the previous decision stays in force.
pub fn decisions(prices: &Frame, params: &LowVolParams) -> Result<Frame, BacktestError> {
    let clean = clean_panel(prices);
    let returns = clean.pct_change(1);
    let dates = clean.index();

    let mut rows = Vec::new();
    for &rebalance in clean.month_end().index() {
        // Rows dated strictly before the rebalance date.
        let end = dates.partition_point(|d| *d < rebalance);
        if end <= params.lookback {
            debug!(%rebalance, rows = end, "low-vol: not enough history, skipping");
            continue;
        }
        let start = end - params.lookback;

        let vols: Vec<Option<f64>> = (0..returns.width())
            .map(|c| sample_std(&returns.column_at(c)[start..end]))
            .collect();
        let picks = select_lowest(&vols, params.top_n);
        if picks.is_empty() {
            debug!(%rebalance, "low-vol: no instrument has a defined volatility");
        }
        rows.push((rebalance, equal_weight_row(returns.width(), &picks)));
    }

    Ok(Frame::from_rows(prices.columns().to_vec(), rows)?)
}

pub fn generate(prices: &Frame, params: &LowVolParams) -> Result<Frame, BacktestError> {
    if params.lookback < 2 || params.top_n == 0 {
        return Err(BacktestError::invalid_input(
            "low-volatility lookback must be at least 2 and top_n positive",
        ));
    }

    let calendar = clean_panel(prices);
    let decisions = decisions(prices, params)?;
    expand_to_calendar(&decisions, calendar.index())
}
