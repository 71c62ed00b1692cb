//! CSV price cache, one file per instrument.
//!
//! Files live at `<base_path>/<code>.csv` with the header
//! `Date,Open,High,Low,Close,Adj Close,Volume`. Only `Date` and `Close` are
//! required columns. A blank close reads as `NaN` (a gap the engine
//! forward-fills), other missing prices fall back to the close and a missing
//! volume reads as zero. `NaN` values are written back as blank cells.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize)]
struct CacheRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open", default)]
    open: Option<f64>,
    #[serde(rename = "High", default)]
    high: Option<f64>,
    #[serde(rename = "Low", default)]
    low: Option<f64>,
    #[serde(rename = "Close", default)]
    close: Option<f64>,
    #[serde(rename = "Adj Close", default)]
    adj_close: Option<f64>,
    #[serde(rename = "Volume", default)]
    volume: Option<f64>,
}

impl CacheRow {
    fn into_bar(self, code: &str) -> Result<OhlcvBar, BacktestError> {
        let date = parse_cache_date(&self.date)?;
        let close = self.close.unwrap_or(f64::NAN);
        Ok(OhlcvBar {
            code: code.to_string(),
            date,
            open: self.open.unwrap_or(close),
            high: self.high.unwrap_or(close),
            low: self.low.unwrap_or(close),
            close,
            adj_close: self.adj_close.unwrap_or(close),
            volume: self.volume.unwrap_or(0.0),
        })
    }

    fn from_bar(bar: &OhlcvBar) -> Self {
        Self {
            date: bar.date.format("%Y-%m-%d").to_string(),
            open: present(bar.open),
            high: present(bar.high),
            low: present(bar.low),
            close: present(bar.close),
            adj_close: present(bar.adj_close),
            volume: present(bar.volume),
        }
    }
}

fn present(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

/// Dates are `YYYY-MM-DD`, optionally followed by a time which is ignored.
fn parse_cache_date(raw: &str) -> Result<NaiveDate, BacktestError> {
    let day = raw
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| BacktestError::DataSource {
        reason: format!("invalid date {raw:?}: {e}"),
    })
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{code}.csv"))
    }

    /// Whether a cache file exists for `code`.
    pub fn has(&self, code: &str) -> bool {
        self.csv_path(code).is_file()
    }

    /// Every cached bar for `code`, sorted by date. A repeated date keeps
    /// the last row.
    pub fn read_all(&self, code: &str) -> Result<Vec<OhlcvBar>, BacktestError> {
        let path = self.csv_path(code);
        if !path.is_file() {
            return Err(BacktestError::NoData {
                code: code.to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for row in rdr.deserialize::<CacheRow>() {
            bars.push(row?.into_bar(code)?);
        }

        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<OhlcvBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Ok(deduped)
    }

    /// Replace the cache file for `code` with `bars`.
    pub fn store(&self, code: &str, bars: &[OhlcvBar]) -> Result<PathBuf, BacktestError> {
        fs::create_dir_all(&self.base_path)?;
        let path = self.csv_path(code);
        let mut wtr = csv::Writer::from_path(&path)?;
        for bar in bars {
            wtr.serialize(CacheRow::from_bar(bar))?;
        }
        wtr.flush()?;
        Ok(path)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, BacktestError> {
        let mut bars = self.read_all(code)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BacktestError> {
        if !self.has(code) {
            return Ok(None);
        }
        let bars = self.read_all(code)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
