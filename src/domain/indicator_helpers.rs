//! True range, ATR and rolling range average.
//!
//! Rolling averages here use a warm-start window: before `period` bars are
//! available, index `i` averages all values in `0..=i` instead of being
//! invalid. Zones and bands near the start of short intraday series depend on
//! this, so it must not be replaced with invalid-until-full semantics.

use crate::domain::indicator::vwap::calculate_vwap;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDateTime;

/// Trailing mean of `values` with the warm-start window described above.
/// A zero period yields an empty vector.
pub fn trailing_mean(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![];
    }

    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(period);
            let window = &values[start..=i];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// Per-bar true range. Bar 0 has no previous close and uses high - low.
pub fn true_range_values(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.range()
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calc_true_range(bars: &[OhlcvBar]) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::TrueRange,
        values: simple_points(bars, &true_range_values(bars)),
    }
}

/// Simple moving average of true range over `period` bars (warm-start).
pub fn calc_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: simple_points(bars, &trailing_mean(&true_range_values(bars), period)),
    }
}

/// Simple moving average of high - low over `window` bars (warm-start).
pub fn calc_range_avg(bars: &[OhlcvBar], window: usize) -> IndicatorSeries {
    let ranges: Vec<f64> = bars.iter().map(OhlcvBar::range).collect();
    IndicatorSeries {
        indicator_type: IndicatorType::RangeAvg(window),
        values: simple_points(bars, &trailing_mean(&ranges, window)),
    }
}

fn simple_points(bars: &[OhlcvBar], values: &[f64]) -> Vec<IndicatorPoint> {
    values
        .iter()
        .zip(bars)
        .map(|(&v, bar)| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: true,
            value: IndicatorValue::Simple(v),
        })
        .collect()
}

/// The per-bar indicator values attached to a series.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub timestamp: NaiveDateTime,
    pub true_range: Option<f64>,
    pub atr: Option<f64>,
    pub vwap: Option<f64>,
}

pub fn compute_indicator_rows(bars: &[OhlcvBar], atr_period: usize) -> Vec<IndicatorRow> {
    let tr = calc_true_range(bars);
    let atr = calc_atr(bars, atr_period);
    let vwap = calculate_vwap(bars);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| IndicatorRow {
            timestamp: bar.timestamp,
            true_range: tr.simple_at(i),
            atr: atr.simple_at(i),
            vwap: vwap.simple_at(i),
        })
        .collect()
}
