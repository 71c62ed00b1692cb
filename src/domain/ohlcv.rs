//! Daily OHLCV bar.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Dividend/split adjusted close. Equal to `close` when the source has no
    /// adjustment.
    pub adj_close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// A bar carrying only a closing price; every other price field is the
    /// close and volume is zero.
    pub fn close_only(code: impl Into<String>, date: NaiveDate, close: f64) -> Self {
        Self {
            code: code.into(),
            date,
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume: 0.0,
        }
    }
}

/// `(date, adjusted close)` points, the price series every backtest runs on.
pub fn adjusted_closes(bars: &[OhlcvBar]) -> Vec<(NaiveDate, f64)> {
    bars.iter().map(|b| (b.date, b.adj_close)).collect()
}
