//! SVG figures for a strategy run.
//!
//! Writes to `<output_dir>/figures/`: `<slug>_equity.svg` (with the benchmark
//! when there is one) and `<slug>_drawdown.svg` for every strategy; the
//! cross-sectional strategies also get `<slug>_excess.svg`,
//! `<slug>_weights.svg` and `<slug>_monthly_heatmap.svg`.

pub mod chart_svg;
pub mod heatmap;

use crate::domain::error::BacktestError;
use crate::domain::run::StrategyRun;
use crate::ports::report_port::ReportPort;
use chart_svg::{Series, line_chart, stacked_area_chart};
use std::fs;
use std::path::{Path, PathBuf};

pub const FIGURES_DIR: &str = "figures";

#[derive(Debug, Default)]
pub struct SvgReportAdapter;

impl SvgReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn save(dir: &Path, name: String, svg: String) -> Result<PathBuf, BacktestError> {
    let path = dir.join(name);
    fs::write(&path, svg)?;
    Ok(path)
}

impl ReportPort for SvgReportAdapter {
    fn write_run(
        &self,
        run: &StrategyRun,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, BacktestError> {
        let dir = output_dir.join(FIGURES_DIR);
        fs::create_dir_all(&dir)?;

        let slug = run.strategy.slug();
        let name = run.strategy.to_string();
        let dates = &run.result.dates;
        let mut written = Vec::new();

        let mut equity = vec![Series {
            label: "Strategy",
            values: &run.result.nav,
        }];
        if let Some(bench) = &run.benchmark_nav {
            equity.push(Series {
                label: "Benchmark",
                values: bench,
            });
        }
        written.push(save(
            &dir,
            format!("{slug}_equity.svg"),
            line_chart(&format!("{name}: NAV"), dates, &equity, false, false),
        )?);

        let drawdown = [Series {
            label: "Drawdown",
            values: &run.result.drawdown,
        }];
        written.push(save(
            &dir,
            format!("{slug}_drawdown.svg"),
            line_chart(&format!("{name}: drawdown"), dates, &drawdown, true, true),
        )?);

        if !run.strategy.is_cross_sectional() {
            return Ok(written);
        }

        if let Some(excess) = run.excess_nav() {
            let series = [Series {
                label: "Strategy - benchmark",
                values: &excess,
            }];
            written.push(save(
                &dir,
                format!("{slug}_excess.svg"),
                line_chart(&format!("{name}: excess NAV"), dates, &series, false, true),
            )?);
        }

        let weights = &run.weights;
        let columns: Vec<Series> = weights
            .columns()
            .iter()
            .enumerate()
            .map(|(c, label)| Series {
                label,
                values: weights.column_at(c),
            })
            .collect();
        written.push(save(
            &dir,
            format!("{slug}_weights.svg"),
            stacked_area_chart(&format!("{name}: weights"), weights.index(), &columns),
        )?);

        written.push(save(
            &dir,
            format!("{slug}_monthly_heatmap.svg"),
            heatmap::monthly_heatmap(&format!("{name}: monthly returns"), &run.monthly),
        )?);

        Ok(written)
    }
}
