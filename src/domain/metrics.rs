//! Performance metrics over a backtest result.
//!
//! Statistics that cannot be computed from the data (no observations, zero
//! volatility, no drawdown) are `None` rather than `NaN` or `0.0`.

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::calendar::{month_end, month_key};
use crate::domain::rolling::{mean, sample_std};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub annualized_return: Option<f64>,
    pub annualized_volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub calmar_ratio: Option<f64>,
    pub win_rate: Option<f64>,
    pub avg_turnover: Option<f64>,
}

impl Metrics {
    /// Column names of the summary table, in [`Metrics::values`] order.
    pub const LABELS: [&'static str; 7] = [
        "annualized_return",
        "annualized_volatility",
        "sharpe_ratio",
        "max_drawdown",
        "calmar_ratio",
        "win_rate",
        "avg_turnover",
    ];

    pub fn compute(result: &BacktestResult, config: &BacktestConfig) -> Self {
        let returns = &result.net_return;
        let ppy = config.periods_per_year;

        let annualized_return = annualized_return(returns, ppy);
        let max_drawdown = max_drawdown(&result.nav);

        Metrics {
            annualized_return,
            annualized_volatility: annualized_volatility(returns, ppy),
            sharpe_ratio: sharpe_ratio(returns, config.risk_free_rate, ppy),
            max_drawdown,
            calmar_ratio: calmar_ratio(annualized_return, max_drawdown),
            win_rate: win_rate(returns),
            avg_turnover: mean(&result.turnover),
        }
    }

    pub fn values(&self) -> [Option<f64>; 7] {
        [
            self.annualized_return,
            self.annualized_volatility,
            self.sharpe_ratio,
            self.max_drawdown,
            self.calmar_ratio,
            self.win_rate,
            self.avg_turnover,
        ]
    }
}

/// Compound growth raised to `periods_per_year / n`, minus 1.
///
/// `None` with no observations, or when the compounded growth is negative
/// (a fractional power of a negative number has no real value).
pub fn annualized_return(returns: &[f64], periods_per_year: f64) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
    if growth < 0.0 {
        return None;
    }
    Some(growth.powf(periods_per_year / returns.len() as f64) - 1.0)
}

pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> Option<f64> {
    sample_std(returns).map(|sd| sd * periods_per_year.sqrt())
}

/// `(mean * periods_per_year - risk_free_rate) / annualized volatility`.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> Option<f64> {
    let vol = annualized_volatility(returns, periods_per_year)?;
    if vol == 0.0 {
        return None;
    }
    let excess = mean(returns)? * periods_per_year - risk_free_rate;
    Some(excess / vol)
}

/// `nav / running_max(nav) - 1`.
pub fn drawdown_series(nav: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    nav.iter()
        .map(|&v| {
            peak = peak.max(v);
            v / peak - 1.0
        })
        .collect()
}

/// Most negative drawdown.
pub fn max_drawdown(nav: &[f64]) -> Option<f64> {
    drawdown_series(nav).into_iter().reduce(f64::min)
}

pub fn calmar_ratio(annualized_return: Option<f64>, max_drawdown: Option<f64>) -> Option<f64> {
    match (annualized_return, max_drawdown) {
        (Some(ret), Some(mdd)) if mdd != 0.0 => Some(ret / mdd.abs()),
        _ => None,
    }
}

/// Fraction of periods with a strictly positive return.
pub fn win_rate(returns: &[f64]) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let wins = returns.iter().filter(|&&r| r > 0.0).count();
    Some(wins as f64 / returns.len() as f64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyReturn {
    /// Calendar month-end date of the month.
    pub month_end: NaiveDate,
    pub value: f64,
}

impl MonthlyReturn {
    pub fn year(&self) -> i32 {
        month_key(self.month_end).0
    }

    pub fn month(&self) -> u32 {
        month_key(self.month_end).1
    }
}

/// Compound daily returns within each observed month. `dates` must be
/// sorted; months without observations are absent.
pub fn monthly_returns(dates: &[NaiveDate], returns: &[f64]) -> Vec<MonthlyReturn> {
    let mut months: Vec<MonthlyReturn> = Vec::new();
    for (&date, &r) in dates.iter().zip(returns) {
        let label = month_end(date);
        match months.last_mut() {
            Some(last) if last.month_end == label => {
                last.value = (1.0 + last.value) * (1.0 + r) - 1.0;
            }
            _ => months.push(MonthlyReturn {
                month_end: label,
                value: r,
            }),
        }
    }
    months
}
