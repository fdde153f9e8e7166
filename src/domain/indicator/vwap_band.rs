//! VWAP bands.
//!
//! - Middle: cumulative VWAP
//! - Upper: VWAP + k × range_avg
//! - Lower: VWAP − k × range_avg
//!
//! where range_avg is the warm-start trailing mean of (high − low) over
//! `window` bars. A point is valid wherever VWAP is valid.

use crate::domain::indicator::vwap::calculate_vwap;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::calc_range_avg;
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_vwap_bands(bars: &[OhlcvBar], window: usize, k: f64) -> IndicatorSeries {
    let vwap = calculate_vwap(bars);
    let range_avg = calc_range_avg(bars, window);
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let point = match (vwap.simple_at(i), range_avg.simple_at(i)) {
            (Some(middle), Some(spread)) => IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Band {
                    upper: middle + k * spread,
                    middle,
                    lower: middle - k * spread,
                },
            },
            _ => IndicatorPoint {
                timestamp: bar.timestamp,
                valid: false,
                value: IndicatorValue::Band {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                },
            },
        };
        values.push(point);
    }

    IndicatorSeries {
        indicator_type: IndicatorType::VwapBand { window, k },
        values,
    }
}
