#![allow(dead_code)]

use breakout::domain::error::BreakoutError;
pub use breakout::domain::ohlcv::OhlcvBar;
use breakout::domain::period::Period;
use breakout::ports::data_port::DataPort;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

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

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        _interval: &str,
        _period: Period,
    ) -> Result<Vec<OhlcvBar>, BreakoutError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BreakoutError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self, _interval: &str) -> Result<Vec<String>, BreakoutError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
        _interval: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, BreakoutError> {
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => Ok(Some((
                bars[0].timestamp,
                bars[bars.len() - 1].timestamp,
                bars.len(),
            ))),
            _ => Ok(None),
        }
    }
}

/// Session start of the synthetic series; bars are five minutes apart.
pub fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap()
        + Duration::minutes(5 * i as i64)
}

pub fn make_bar(i: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: ts(i),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// Bars from `(open, high, low, close)` rows, volume 100.
pub fn bars_from(rows: &[(f64, f64, f64, f64)]) -> Vec<OhlcvBar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| make_bar(i, o, h, l, c, 100.0))
        .collect()
}

/// One high-side VRZ breakout failure with window 3 and k 1.0.
///
/// Bar 10 is the only local maximum before the spike, so the zone from bar 11
/// on is `110 + ATR[10]`. Bar 14 closes above it and bar 16 closes back below.
pub fn vrz_failure_series() -> Vec<OhlcvBar> {
    let mut rows = Vec::with_capacity(30);
    rows.extend(std::iter::repeat_n((100.0, 101.0, 99.0, 100.0), 10));
    rows.push((100.0, 110.0, 99.0, 100.0));
    rows.extend(std::iter::repeat_n((101.0, 104.0, 99.0, 102.0), 3));
    rows.push((102.0, 118.0, 101.0, 117.0));
    rows.push((117.0, 119.0, 116.0, 118.0));
    rows.push((100.0, 100.0, 94.0, 95.0));
    rows.extend(std::iter::repeat_n((96.0, 97.0, 95.0, 96.0), 13));
    bars_from(&rows)
}

/// Flat closes at 100 with a single jump above the band at `spike_at` and a
/// return on the next bar.
pub fn band_spike_series(len: usize, spike_at: usize) -> Vec<OhlcvBar> {
    (0..len)
        .map(|i| {
            let c = if i == spike_at { 130.0 } else { 100.0 };
            make_bar(i, c, c + 0.5, c - 0.5, c, 100.0)
        })
        .collect()
}
