#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use weightbt::domain::error::BacktestError;
use weightbt::domain::frame::Frame;
pub use weightbt::domain::ohlcv::OhlcvBar;
use weightbt::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, BacktestError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(BacktestError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BacktestError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(BacktestError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(code: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar::close_only(
        code,
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        close,
    )
}

/// One bar per calendar day starting at `start_date`, one close per entry.
pub fn bars_from_closes(code: &str, start_date: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar::close_only(code, start + chrono::Duration::days(i as i64), close))
        .collect()
}

/// Linear price path: `start_price + step * i` for `count` consecutive days.
pub fn generate_bars(
    code: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
    step: f64,
) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + step * i as f64).collect();
    bars_from_closes(code, start_date, &closes)
}

/// Daily calendar of `n` dates from 2024-01-01.
pub fn calendar(n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|i| date(2024, 1, 1) + chrono::Duration::days(i as i64))
        .collect()
}

/// Frame on [`calendar`] with one column per (name, values) pair.
pub fn frame(columns: &[(&str, Vec<f64>)]) -> Frame {
    let n = columns.first().map_or(0, |(_, v)| v.len());
    Frame::new(
        calendar(n),
        columns.iter().map(|(name, _)| name.to_string()).collect(),
        columns.iter().map(|(_, v)| v.clone()).collect(),
    )
    .unwrap()
}
