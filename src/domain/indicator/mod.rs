//! Indicator types shared by the zone and band builders.
//!
//! - `IndicatorPoint`: a single point in an indicator time series
//! - `IndicatorValue`: the output shape of an indicator at one bar
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a bar-aligned series of indicator values
//!
//! Every series produced here has exactly one point per input bar, so index
//! `i` of a series always refers to bar `i`. Points that lack enough history
//! are marked `valid: false`.

pub mod vwap;
pub mod vwap_band;

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Band { upper: f64, middle: f64, lower: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorType {
    TrueRange,
    Atr(usize),
    Vwap,
    RangeAvg(usize),
    VwapBand { window: usize, k: f64 },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at bar `index` for single-valued indicators; `None` when the point
    /// is invalid or out of range.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Simple(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    /// (upper, lower) at bar `index` for band indicators.
    pub fn band_at(&self, index: usize) -> Option<(f64, f64)> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Band { upper, lower, .. },
                ..
            }) => Some((*upper, *lower)),
            _ => None,
        }
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|p| p.valid).count()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::TrueRange => write!(f, "TR"),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Vwap => write!(f, "VWAP"),
            IndicatorType::RangeAvg(window) => write!(f, "RANGE_AVG({})", window),
            IndicatorType::VwapBand { window, k } => write!(f, "VWAP_BAND({},{})", window, k),
        }
    }
}
