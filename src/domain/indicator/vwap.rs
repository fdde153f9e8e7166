//! Cumulative VWAP.
//!
//! VWAP[i] = Σ(volume × typical_price) / Σ(volume) over bars `0..=i`, with
//! typical_price = (high + low + close) / 3.
//!
//! Points stay invalid until cumulative volume becomes positive, so an
//! all-zero-volume series has no valid VWAP at all.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_vwap(bars: &[OhlcvBar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut cum_pv = 0.0;
    let mut cum_volume = 0.0;

    for bar in bars {
        cum_pv += bar.volume * bar.typical_price();
        cum_volume += bar.volume;

        let valid = cum_volume > 0.0;
        let vwap = if valid { cum_pv / cum_volume } else { 0.0 };
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: IndicatorValue::Simple(vwap),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Vwap,
        values,
    }
}
