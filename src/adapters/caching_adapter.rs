//! Read-through cache in front of an upstream data source.

use crate::adapters::csv_adapter::CsvAdapter;
use crate::domain::error::BacktestError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use tracing::debug;

/// Full history requested from upstream on a cache miss.
const HISTORY_START: Option<NaiveDate> = NaiveDate::from_ymd_opt(1990, 1, 1);
const HISTORY_END: Option<NaiveDate> = NaiveDate::from_ymd_opt(2100, 12, 31);

/// Serves bars from the local CSV cache. On a miss the full history is
/// fetched from `upstream`, written to the cache, then filtered to the
/// requested range. Later calls for the same instrument never reach upstream.
pub struct CachingDataPort<U> {
    cache: CsvAdapter,
    upstream: U,
}

impl<U: DataPort> CachingDataPort<U> {
    pub fn new(cache: CsvAdapter, upstream: U) -> Self {
        Self { cache, upstream }
    }

    pub fn cache(&self) -> &CsvAdapter {
        &self.cache
    }

    fn fill(&self, code: &str) -> Result<(), BacktestError> {
        let (Some(start), Some(end)) = (HISTORY_START, HISTORY_END) else {
            return Err(BacktestError::invalid_input("history bounds out of range"));
        };
        let bars = self.upstream.fetch_ohlcv(code, start, end)?;
        if bars.is_empty() {
            return Err(BacktestError::NoData {
                code: code.to_string(),
            });
        }
        let path = self.cache.store(code, &bars)?;
        debug!(%code, bars = bars.len(), path = %path.display(), "cache filled");
        Ok(())
    }
}

impl<U: DataPort> DataPort for CachingDataPort<U> {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, BacktestError> {
        if self.cache.has(code) {
            debug!(%code, "cache hit");
        } else {
            debug!(%code, "cache miss");
            self.fill(code)?;
        }
        self.cache.fetch_ohlcv(code, start_date, end_date)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BacktestError> {
        match self.cache.get_data_range(code)? {
            Some(range) => Ok(Some(range)),
            None => self.upstream.get_data_range(code),
        }
    }
}
