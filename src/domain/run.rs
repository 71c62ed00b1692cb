//! One strategy, end to end: weights, simulation, metrics and monthly returns.

use crate::domain::backtest::{self, BacktestConfig, BacktestResult};
use crate::domain::error::BacktestError;
use crate::domain::frame::Frame;
use crate::domain::metrics::{self, Metrics, MonthlyReturn};
use crate::domain::strategy::Strategy;
use tracing::info;

#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub strategy: Strategy,
    /// Target weights on the price calendar, before the engine's lag.
    pub weights: Frame,
    pub result: BacktestResult,
    pub metrics: Metrics,
    pub monthly: Vec<MonthlyReturn>,
    /// Buy-and-hold NAV of the benchmark on `result.dates`.
    pub benchmark_nav: Option<Vec<f64>>,
}

impl StrategyRun {
    /// Strategy NAV minus benchmark NAV, if a benchmark was supplied.
    pub fn excess_nav(&self) -> Option<Vec<f64>> {
        self.benchmark_nav
            .as_ref()
            .map(|bench| backtest::excess_nav(&self.result.nav, bench))
    }
}

/// Run `strategy` over `prices`. `benchmark` is a single-column price frame;
/// its buy-and-hold NAV is aligned to the result calendar as of each date,
/// `NaN` before the benchmark's first price.
pub fn run_strategy(
    strategy: &Strategy,
    prices: &Frame,
    benchmark: Option<&Frame>,
    config: &BacktestConfig,
) -> Result<StrategyRun, BacktestError> {
    let weights = strategy.generate(prices)?;
    let sim_prices = strategy.simulation_prices(prices)?;
    let result = backtest::simulate(&sim_prices, &weights, config.cost_bps)?;
    let metrics = Metrics::compute(&result, config);
    let monthly = metrics::monthly_returns(&result.dates, &result.net_return);

    let benchmark_nav = match benchmark {
        Some(bench) if bench.width() > 0 => {
            let nav = backtest::buy_and_hold_nav(bench).as_of(&result.dates)?;
            Some(nav.column_at(0).to_vec())
        }
        _ => None,
    };

    info!(
        strategy = strategy.slug(),
        days = result.len(),
        final_nav = result.final_nav().unwrap_or(f64::NAN),
        "backtest finished"
    );

    Ok(StrategyRun {
        strategy: strategy.clone(),
        weights,
        result,
        metrics,
        monthly,
        benchmark_nav,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::{MomentumParams, SmaParams};
    use chrono::NaiveDate;

    fn daily(name: &str, values: &[f64]) -> Frame {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Frame::from_series(
            name,
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (start + chrono::Duration::days(i as i64), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn sma_run_produces_aligned_outputs() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let prices = daily("510300.SH", &values);
        let strategy = Strategy::SmaCrossover(SmaParams { short: 3, long: 5 });

        let run = run_strategy(&strategy, &prices, Some(&prices), &BacktestConfig::default())
            .unwrap();

        assert_eq!(run.result.len(), 40);
        assert_eq!(run.benchmark_nav.as_ref().unwrap().len(), 40);
        assert_eq!(run.excess_nav().unwrap().len(), 40);
        assert_eq!(run.monthly.len(), 2);
        assert!(run.result.final_nav().unwrap() > 1.0);
    }

    #[test]
    fn benchmark_starting_late_is_undefined_until_it_starts() {
        let prices = daily("A", &[1.0, 2.0, 3.0, 4.0]);
        let late = Frame::from_series(
            "B",
            vec![
                (NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), 10.0),
                (NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(), 11.0),
            ],
        )
        .unwrap();
        let strategy = Strategy::Momentum(MomentumParams::default());

        let run = run_strategy(&strategy, &prices, Some(&late), &BacktestConfig::default()).unwrap();
        let bench = run.benchmark_nav.clone().unwrap();

        assert!(bench[..2].iter().all(|v| v.is_nan()));
        assert_eq!(bench[2], 1.0);
        assert!((bench[3] - 1.1).abs() < 1e-12);
        assert!(run.excess_nav().unwrap()[0].is_nan());
    }

    #[test]
    fn without_benchmark_there_is_no_excess() {
        let prices = daily("A", &[1.0, 2.0, 3.0]);
        let strategy = Strategy::Momentum(MomentumParams::default());
        let run = run_strategy(&strategy, &prices, None, &BacktestConfig::default()).unwrap();
        assert!(run.excess_nav().is_none());
    }

    #[test]
    fn generator_errors_propagate() {
        let prices = daily("A", &[1.0, 2.0, 3.0]);
        let strategy = Strategy::SmaCrossover(SmaParams { short: 5, long: 3 });
        assert!(run_strategy(&strategy, &prices, None, &BacktestConfig::default()).is_err());
    }
}
