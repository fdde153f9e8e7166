//! OHLCV bar representation and series validation.

use crate::domain::error::BreakoutError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Canonical text form used when timestamps leave the process.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// high - low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Rejects a series that would produce silently wrong indicators.
///
/// Checks, per bar: finite prices, non-negative finite volume,
/// `high >= max(open, close, low)`, `low <= min(open, close, high)`, and
/// strictly increasing timestamps.
pub fn validate_series(bars: &[OhlcvBar]) -> Result<(), BreakoutError> {
    for (index, bar) in bars.iter().enumerate() {
        let invalid = |reason: String| BreakoutError::InvalidBar { index, reason };

        for (name, value) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ] {
            if !value.is_finite() {
                return Err(invalid(format!("{name} is not finite")));
            }
        }
        if !bar.volume.is_finite() || bar.volume < 0.0 {
            return Err(invalid(format!("volume {} is negative or not finite", bar.volume)));
        }
        if bar.high < bar.open.max(bar.close).max(bar.low) {
            return Err(invalid(format!(
                "high {} is below open/close/low",
                bar.high
            )));
        }
        if bar.low > bar.open.min(bar.close).min(bar.high) {
            return Err(invalid(format!("low {} is above open/close/high", bar.low)));
        }
        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(invalid(format!(
                "timestamp {} does not follow {}",
                bar.timestamp,
                bars[index - 1].timestamp
            )));
        }
    }
    Ok(())
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(ISO_FORMAT).to_string()
}

/// Parses the timestamp shapes bar providers emit. Offsets are dropped and the
/// exchange wall-clock time is kept.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", ISO_FORMAT, "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(ts.naive_local());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
