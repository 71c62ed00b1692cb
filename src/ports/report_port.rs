//! Report generation port.

use crate::domain::error::BacktestError;
use crate::domain::run::StrategyRun;
use std::path::{Path, PathBuf};

/// Port for writing backtest reports under an output directory.
pub trait ReportPort {
    /// Write the artifacts of one strategy run; returns the files written.
    fn write_run(&self, run: &StrategyRun, output_dir: &Path)
    -> Result<Vec<PathBuf>, BacktestError>;

    /// Cross-strategy artifacts. Default: nothing.
    fn write_overview(
        &self,
        _runs: &[StrategyRun],
        _output_dir: &Path,
    ) -> Result<Vec<PathBuf>, BacktestError> {
        Ok(Vec::new())
    }
}
