//! Cross-sectional momentum rotation.
//!
//! At each month-end the score of an instrument is its `lookback`-month
//! return minus its `skip`-month return, taken from the *previous* month-end
//! so a decision never sees the month it is made in. The `top_n` highest
//! scores are held in equal weight until the next month-end.

use super::{clean_panel, equal_weight_row, expand_to_calendar};
use crate::domain::error::BacktestError;
use crate::domain::frame::Frame;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct MomentumParams {
    /// Months in the long return.
    pub lookback: usize,
    /// Most recent months removed from the score.
    pub skip: usize,
    pub top_n: usize,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            lookback: 12,
            skip: 1,
            top_n: 2,
        }
    }
}

/// Month-end scores, already lagged one month. Undefined where either
/// return is undefined.
pub fn scores(prices: &Frame, params: &MomentumParams) -> Result<Frame, BacktestError> {
    let monthly = clean_panel(prices).month_end();
    let long = monthly.pct_change(params.lookback);
    let short = monthly.pct_change(params.skip);

    let data = (0..monthly.width())
        .map(|c| {
            long.column_at(c)
                .iter()
                .zip(short.column_at(c))
                .map(|(l, s)| l - s)
                .collect()
        })
        .collect();
    let raw = Frame::new(monthly.index().to_vec(), monthly.columns().to_vec(), data)?;
    Ok(raw.shift(1))
}

/// Indices of the `top_n` highest defined scores. Ties keep column order.
pub fn select_top(scores: &[f64], top_n: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..scores.len())
        .filter(|&i| !scores[i].is_nan())
        .collect();
    // sort_by is stable.
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    ranked.truncate(top_n);
    ranked
}

pub fn generate(prices: &Frame, params: &MomentumParams) -> Result<Frame, BacktestError> {
    if params.lookback == 0 || params.top_n == 0 {
        return Err(BacktestError::invalid_input(
            "momentum lookback and top_n must be positive",
        ));
    }

    let calendar = clean_panel(prices);
    let monthly_scores = scores(prices, params)?;

    let rows = (0..monthly_scores.len())
        .map(|m| {
            let month = monthly_scores.index()[m];
            let picks = select_top(&monthly_scores.row(m), params.top_n);
            if picks.is_empty() {
                debug!(%month, "momentum: no instrument has a score");
            }
            (month, equal_weight_row(monthly_scores.width(), &picks))
        })
        .collect();
    let decisions = Frame::from_rows(prices.columns().to_vec(), rows)?;

    expand_to_calendar(&decisions, calendar.index())
}
