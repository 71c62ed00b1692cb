//! Weight-driven backtest engine.
//!
//! [`simulate`] turns a price panel and a target-weight series into daily
//! gross/net returns, turnover, cost, NAV and drawdown. The weight decided on
//! day `t - 1` earns the return of day `t`; the trade that moves the book to
//! the weight of day `t` is charged on day `t`.

use crate::domain::error::BacktestError;
use crate::domain::frame::Frame;
use chrono::NaiveDate;

pub const GROSS_RETURN: &str = "gross_return";
pub const TURNOVER: &str = "turnover";
pub const COST: &str = "cost";
pub const NET_RETURN: &str = "net_return";
pub const NAV: &str = "nav";
pub const DRAWDOWN: &str = "drawdown";

pub const RESULT_COLUMNS: [&str; 6] = [GROSS_RETURN, TURNOVER, COST, NET_RETURN, NAV, DRAWDOWN];

const BPS_PER_UNIT: f64 = 10_000.0;

/// Run-wide parameters shared by the engine and the metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// One-way cost in basis points per unit of turnover.
    pub cost_bps: f64,
    pub periods_per_year: f64,
    /// Annual risk-free rate subtracted in the Sharpe ratio.
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            cost_bps: 10.0,
            periods_per_year: 252.0,
            risk_free_rate: 0.0,
        }
    }
}

/// Daily output of one simulation, indexed by the cleaned price calendar.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub dates: Vec<NaiveDate>,
    pub gross_return: Vec<f64>,
    pub turnover: Vec<f64>,
    pub cost: Vec<f64>,
    pub net_return: Vec<f64>,
    pub nav: Vec<f64>,
    pub drawdown: Vec<f64>,
}

impl BacktestResult {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn final_nav(&self) -> Option<f64> {
        self.nav.last().copied()
    }

    /// Tabular view with [`RESULT_COLUMNS`] for reporting.
    pub fn to_frame(&self) -> Result<Frame, BacktestError> {
        let frame = Frame::new(
            self.dates.clone(),
            RESULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![
                self.gross_return.clone(),
                self.turnover.clone(),
                self.cost.clone(),
                self.net_return.clone(),
                self.nav.clone(),
                self.drawdown.clone(),
            ],
        )?;
        Ok(frame)
    }
}

/// Simulate a daily-rebalanced long-only book.
///
/// 1. Prices are forward-filled and rows that are still entirely missing are
///    dropped (the frame's index is already sorted and deduplicated). Fewer
///    than two remaining rows is [`BacktestError::InvalidInput`].
/// 2. Weights are reindexed onto that calendar by exact date, forward-filled,
///    and remaining gaps (including dates before the first weight) become 0.
/// 3. Per-instrument returns are `p[t] / p[t-1] - 1`, 0 where undefined.
///
/// Weight columns without a price column are cash-like: they count toward
/// turnover and cost but earn nothing. Price columns without a weight column
/// are never held.
pub fn simulate(
    prices: &Frame,
    weights: &Frame,
    cost_bps: f64,
) -> Result<BacktestResult, BacktestError> {
    if !(cost_bps >= 0.0) {
        return Err(BacktestError::invalid_input(format!(
            "cost_bps must be non-negative, got {cost_bps}"
        )));
    }

    let prices = prices.forward_fill().drop_empty_rows();
    if prices.is_empty() {
        return Err(BacktestError::invalid_input(
            "price panel is empty after cleaning",
        ));
    }
    // A return needs two prices.
    if prices.len() < 2 {
        return Err(BacktestError::invalid_input(format!(
            "price panel needs at least 2 rows after cleaning, got {}",
            prices.len()
        )));
    }

    // (weight column, price column) pairs that can earn a return.
    let held: Vec<(usize, usize)> = weights
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(wi, name)| prices.column_position(name).map(|pi| (wi, pi)))
        .collect();
    if held.is_empty() {
        return Err(BacktestError::invalid_input(
            "weights share no columns with prices",
        ));
    }

    let weights = weights
        .reindex(prices.index())?
        .forward_fill()
        .fill_missing(0.0);
    let effective = weights.shift(1).fill_missing(0.0);
    let returns = prices.pct_change(1).fill_missing(0.0);

    let n = prices.len();
    let mut result = BacktestResult {
        dates: prices.index().to_vec(),
        gross_return: Vec::with_capacity(n),
        turnover: Vec::with_capacity(n),
        cost: Vec::with_capacity(n),
        net_return: Vec::with_capacity(n),
        nav: Vec::with_capacity(n),
        drawdown: Vec::with_capacity(n),
    };

    let mut nav = 1.0_f64;
    let mut peak = f64::NEG_INFINITY;
    for t in 0..n {
        let turnover: f64 = (0..weights.width())
            .map(|c| (weights.value(t, c) - effective.value(t, c)).abs())
            .sum();
        let cost = turnover * cost_bps / BPS_PER_UNIT;
        let gross: f64 = held
            .iter()
            .map(|&(wi, pi)| effective.value(t, wi) * returns.value(t, pi))
            .sum();
        let net = gross - cost;

        nav *= 1.0 + net;
        peak = peak.max(nav);

        result.gross_return.push(gross);
        result.turnover.push(turnover);
        result.cost.push(cost);
        result.net_return.push(net);
        result.nav.push(nav);
        result.drawdown.push(nav / peak - 1.0);
    }

    Ok(result)
}

/// Buy-and-hold growth of one unit in each column: the cumulative product of
/// `1 + return`, with the first and any undefined return taken as 0.
pub fn buy_and_hold_nav(prices: &Frame) -> Frame {
    prices
        .forward_fill()
        .pct_change(1)
        .fill_missing(0.0)
        .map_values(|col| {
            let mut growth = 1.0;
            col.iter()
                .map(|r| {
                    growth *= 1.0 + r;
                    growth
                })
                .collect()
        })
}

/// Strategy NAV minus benchmark NAV, date by date.
pub fn excess_nav(nav: &[f64], benchmark: &[f64]) -> Vec<f64> {
    nav.iter().zip(benchmark).map(|(s, b)| s - b).collect()
}
