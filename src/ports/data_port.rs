//! Price data port.

use crate::domain::error::BacktestError;
use crate::domain::frame::Frame;
use crate::domain::ohlcv::{OhlcvBar, adjusted_closes};
use chrono::NaiveDate;
use tracing::warn;

pub trait DataPort {
    /// Bars for `code` dated in `[start_date, end_date]`, sorted ascending.
    /// May return fewer rows at the edges of the range.
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, BacktestError>;

    /// First date, last date and bar count available for `code`.
    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BacktestError>;

    /// Adjusted-close series named after `code`. Fails with
    /// [`BacktestError::NoData`] when nothing falls in the range.
    fn get_series(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Frame, BacktestError> {
        let bars = self.fetch_ohlcv(code, start_date, end_date)?;
        if bars.is_empty() {
            return Err(BacktestError::NoData {
                code: code.to_string(),
            });
        }
        Ok(Frame::from_series(code, adjusted_closes(&bars))?)
    }

    /// Outer join of the series of every code, with rows that have no price
    /// at all dropped. Codes that fail or have no data in the window are
    /// skipped with a warning; the call fails only if none loads.
    fn get_panel(
        &self,
        codes: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Frame, BacktestError> {
        let mut series = Vec::new();
        for code in codes {
            match self.get_series(code, start_date, end_date) {
                Ok(s) => series.push(s),
                Err(e) => warn!(%code, error = %e, "skipping instrument"),
            }
        }

        if series.is_empty() {
            return Err(BacktestError::NoData {
                code: codes.join(","),
            });
        }
        if series.len() < codes.len() {
            warn!(
                loaded = series.len(),
                requested = codes.len(),
                "building a reduced panel"
            );
        }
        Ok(Frame::outer_join(&series)?.drop_empty_rows())
    }
}
