//! Delimited-text reports.
//!
//! Per strategy, under `<output_dir>/reports/`:
//! `<slug>_results.csv`, `<slug>_weights.csv`, `<slug>_summary.csv` and
//! `<slug>_monthly.csv`. The overview is `overview_summary.csv`. Undefined
//! values are written as empty cells.

use crate::domain::error::BacktestError;
use crate::domain::frame::Frame;
use crate::domain::metrics::Metrics;
use crate::domain::run::StrategyRun;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORTS_DIR: &str = "reports";

fn cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn opt_cell(value: Option<f64>) -> String {
    value.map(cell).unwrap_or_default()
}

fn reports_dir(output_dir: &Path) -> Result<PathBuf, BacktestError> {
    let dir = output_dir.join(REPORTS_DIR);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Date column followed by every column of `frame`.
    fn write_frame(frame: &Frame, path: &Path) -> Result<(), BacktestError> {
        let mut wtr = csv::Writer::from_path(path)?;

        let mut header = vec!["date".to_string()];
        header.extend(frame.columns().iter().cloned());
        wtr.write_record(&header)?;

        for (i, date) in frame.index().iter().enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            record.extend(frame.row(i).into_iter().map(cell));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_results(run: &StrategyRun, path: &Path) -> Result<(), BacktestError> {
        let mut table = run.result.to_frame()?;
        if let (Some(bench), Some(excess)) = (&run.benchmark_nav, run.excess_nav()) {
            table = table
                .with_column("benchmark_nav", bench.clone())?
                .with_column("excess_nav", excess)?;
        }
        Self::write_frame(&table, path)
    }

    fn write_summary(metrics: &Metrics, path: &Path) -> Result<(), BacktestError> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(Metrics::LABELS)?;
        wtr.write_record(metrics.values().map(opt_cell))?;
        wtr.flush()?;
        Ok(())
    }

    fn write_monthly(run: &StrategyRun, path: &Path) -> Result<(), BacktestError> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["month_end", "year", "month", "return"])?;
        for m in &run.monthly {
            wtr.write_record([
                m.month_end.format("%Y-%m-%d").to_string(),
                m.year().to_string(),
                m.month().to_string(),
                cell(m.value),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_run(
        &self,
        run: &StrategyRun,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, BacktestError> {
        let dir = reports_dir(output_dir)?;
        let slug = run.strategy.slug();

        let results = dir.join(format!("{slug}_results.csv"));
        Self::write_results(run, &results)?;
        let weights = dir.join(format!("{slug}_weights.csv"));
        Self::write_frame(&run.weights, &weights)?;
        let summary = dir.join(format!("{slug}_summary.csv"));
        Self::write_summary(&run.metrics, &summary)?;
        let monthly = dir.join(format!("{slug}_monthly.csv"));
        Self::write_monthly(run, &monthly)?;

        Ok(vec![results, weights, summary, monthly])
    }

    fn write_overview(
        &self,
        runs: &[StrategyRun],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, BacktestError> {
        let path = reports_dir(output_dir)?.join("overview_summary.csv");
        let mut wtr = csv::Writer::from_path(&path)?;

        let mut header = vec!["strategy"];
        header.extend(Metrics::LABELS);
        wtr.write_record(&header)?;
        for run in runs {
            let mut record = vec![run.strategy.to_string()];
            record.extend(run.metrics.values().map(opt_cell));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(vec![path])
    }
}
