//! Per-bar overlay for charting a series alongside its detected events.

use crate::domain::detector::{DEFAULT_ATR_PERIOD, vrz_zones};
use crate::domain::error::BreakoutError;
use crate::domain::indicator::vwap_band::calculate_vwap_bands;
use crate::domain::indicator_helpers::compute_indicator_rows;
use crate::domain::ohlcv::{OhlcvBar, validate_series};
use crate::domain::strategy::DetectionStrategy;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRow {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub true_range: Option<f64>,
    pub atr: Option<f64>,
    pub vwap: Option<f64>,
    pub vrz_high: Option<f64>,
    pub vrz_low: Option<f64>,
    pub band_upper: Option<f64>,
    pub band_lower: Option<f64>,
}

/// Indicator values plus the levels `strategy` scans against. Columns of the
/// other strategy are left empty.
pub fn build_overlay(
    bars: &[OhlcvBar],
    strategy: &DetectionStrategy,
) -> Result<Vec<OverlayRow>, BreakoutError> {
    strategy.validate()?;
    validate_series(bars)?;

    let atr_period = match strategy {
        DetectionStrategy::Vrz(p) => p.atr_period,
        DetectionStrategy::Band(_) => DEFAULT_ATR_PERIOD,
    };
    let mut rows: Vec<OverlayRow> = compute_indicator_rows(bars, atr_period)
        .into_iter()
        .zip(bars)
        .map(|(row, bar)| OverlayRow {
            timestamp: row.timestamp,
            close: bar.close,
            true_range: row.true_range,
            atr: row.atr,
            vwap: row.vwap,
            vrz_high: None,
            vrz_low: None,
            band_upper: None,
            band_lower: None,
        })
        .collect();

    match strategy {
        DetectionStrategy::Vrz(params) => {
            let zones = vrz_zones(bars, params);
            let high = zones.high.forward_filled(rows.len());
            let low = zones.low.forward_filled(rows.len());
            for (row, (high, low)) in rows.iter_mut().zip(high.into_iter().zip(low)) {
                row.vrz_high = high;
                row.vrz_low = low;
            }
        }
        DetectionStrategy::Band(params) => {
            let bands = calculate_vwap_bands(bars, params.window, params.k);
            for (i, row) in rows.iter_mut().enumerate() {
                if let Some((upper, lower)) = bands.band_at(i) {
                    row.band_upper = Some(upper);
                    row.band_lower = Some(lower);
                }
            }
        }
    }

    Ok(rows)
}
