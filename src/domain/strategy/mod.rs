//! Target-weight generators.
//!
//! Each generator is a pure function from a price panel to a weight series
//! on the panel's (cleaned) trading calendar. Cross-sectional generators
//! decide at month-end and hold until the next decision.

pub mod low_volatility;
pub mod momentum;
pub mod sma_crossover;

use crate::domain::error::BacktestError;
use crate::domain::frame::Frame;
use chrono::NaiveDate;
use std::fmt;

pub use low_volatility::LowVolParams;
pub use momentum::MomentumParams;
pub use sma_crossover::SmaParams;

/// Column name of the residual cash weight.
pub const CASH: &str = "CASH";

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    SmaCrossover(SmaParams),
    Momentum(MomentumParams),
    LowVolatility(LowVolParams),
}

impl Strategy {
    /// Short identifier used in file names and on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            Strategy::SmaCrossover(_) => "sma",
            Strategy::Momentum(_) => "momentum",
            Strategy::LowVolatility(_) => "lowvol",
        }
    }

    /// Ranks several instruments against each other (as opposed to timing one).
    pub fn is_cross_sectional(&self) -> bool {
        !matches!(self, Strategy::SmaCrossover(_))
    }

    pub fn generate(&self, prices: &Frame) -> Result<Frame, BacktestError> {
        match self {
            Strategy::SmaCrossover(p) => sma_crossover::generate(prices, p),
            Strategy::Momentum(p) => momentum::generate(prices, p),
            Strategy::LowVolatility(p) => low_volatility::generate(prices, p),
        }
    }

    /// The panel the engine should price the weights against. The crossover
    /// strategy holds a `CASH` column, priced at a constant 1.0.
    pub fn simulation_prices(&self, prices: &Frame) -> Result<Frame, BacktestError> {
        match self {
            Strategy::SmaCrossover(_) => Ok(prices.with_column(CASH, vec![1.0; prices.len()])?),
            _ => Ok(prices.clone()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SmaCrossover(p) => {
                write!(f, "SMA crossover ({}/{})", p.short, p.long)
            }
            Strategy::Momentum(p) => write!(
                f,
                "Momentum {}-{} top {}",
                p.lookback, p.skip, p.top_n
            ),
            Strategy::LowVolatility(p) => write!(
                f,
                "Low volatility {}d top {}",
                p.lookback, p.top_n
            ),
        }
    }
}

/// Forward-fill gaps and drop rows with no price at all.
pub(crate) fn clean_panel(prices: &Frame) -> Frame {
    prices.forward_fill().drop_empty_rows()
}

/// Equal weight over `picks`, zero elsewhere. Empty picks give an all-zero row.
pub(crate) fn equal_weight_row(width: usize, picks: &[usize]) -> Vec<f64> {
    let mut row = vec![0.0; width];
    if picks.is_empty() {
        return row;
    }
    let weight = 1.0 / picks.len() as f64;
    for &i in picks {
        row[i] = weight;
    }
    row
}

/// Spread month-end decisions over the trading calendar: every trading day
/// holds the latest decision dated on or before it, zero before the first.
pub(crate) fn expand_to_calendar(
    decisions: &Frame,
    calendar: &[NaiveDate],
) -> Result<Frame, BacktestError> {
    Ok(decisions.as_of(calendar)?.fill_missing(0.0))
}
