//! Bar provider port trait.
//!
//! Implementations own symbol resolution (including exchange-suffix fallback)
//! and return bars sorted by timestamp. An empty vector means "no data".

use crate::domain::error::BreakoutError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::period::Period;
use chrono::NaiveDateTime;

pub trait DataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: &str,
        period: Period,
    ) -> Result<Vec<OhlcvBar>, BreakoutError>;

    fn list_symbols(&self, interval: &str) -> Result<Vec<String>, BreakoutError>;

    fn get_data_range(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, BreakoutError>;
}
