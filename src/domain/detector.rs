//! Breakout-failure detectors.
//!
//! Two policies with different semantics:
//!
//! - VRZ: a close beyond a forward-filled zone is a breakout origin; the first
//!   close back through the same zone value within `lookahead` bars is its
//!   failure. Every origin is considered, and each yields at most one event.
//! - Band: only adjacent bars are compared. A close above the upper band
//!   followed by a close below it on the next bar is a failure at the second
//!   bar; the lower band mirrors this.
//!
//! Both detectors validate the series and parameters first. A series that is
//! too short or has no defined zones or bands produces no events.

use crate::domain::error::BreakoutError;
use crate::domain::failure::{FailureEvent, FailureLocation};
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::vwap_band::calculate_vwap_bands;
use crate::domain::indicator_helpers::calc_atr;
use crate::domain::ohlcv::{OhlcvBar, validate_series};
use crate::domain::zone::{VrzZones, Zone, build_vrz_zones};
use tracing::debug;

pub const DEFAULT_LOOKAHEAD: usize = 10;
pub const DEFAULT_ATR_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct VrzParams {
    pub k: f64,
    pub window: usize,
    pub lookahead: usize,
    pub atr_period: usize,
}

impl Default for VrzParams {
    fn default() -> Self {
        Self {
            k: 1.5,
            window: 5,
            lookahead: DEFAULT_LOOKAHEAD,
            atr_period: DEFAULT_ATR_PERIOD,
        }
    }
}

impl VrzParams {
    pub fn validate(&self) -> Result<(), BreakoutError> {
        validate_k(self.k)?;
        require_positive("window", self.window)?;
        require_positive("lookahead", self.lookahead)?;
        require_positive("atr_period", self.atr_period)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandParams {
    pub k: f64,
    pub window: usize,
}

impl Default for BandParams {
    fn default() -> Self {
        Self { k: 2.0, window: 20 }
    }
}

impl BandParams {
    pub fn validate(&self) -> Result<(), BreakoutError> {
        validate_k(self.k)?;
        require_positive("window", self.window)
    }
}

fn validate_k(k: f64) -> Result<(), BreakoutError> {
    if !k.is_finite() || k < 0.0 {
        return Err(BreakoutError::invalid_parameter(
            "k",
            format!("must be a finite non-negative number, got {k}"),
        ));
    }
    Ok(())
}

fn require_positive(name: &str, value: usize) -> Result<(), BreakoutError> {
    if value == 0 {
        return Err(BreakoutError::invalid_parameter(name, "must be at least 1"));
    }
    Ok(())
}

/// Zones the VRZ detector scans against. The series is assumed valid.
pub fn vrz_zones(bars: &[OhlcvBar], params: &VrzParams) -> VrzZones {
    let atr = calc_atr(bars, params.atr_period);
    build_vrz_zones(bars, &atr, params.k, params.window)
}

pub fn detect_vrz_failures(
    bars: &[OhlcvBar],
    company: &str,
    ticker: &str,
    params: &VrzParams,
) -> Result<Vec<FailureEvent>, BreakoutError> {
    params.validate()?;
    validate_series(bars)?;
    if bars.len() < 2 {
        return Ok(vec![]);
    }

    let zones = vrz_zones(bars, params);
    debug!(
        ticker,
        high_anchors = zones.high.anchors().len(),
        low_anchors = zones.low.anchors().len(),
        "built VRZ zones"
    );

    let mut events = Vec::new();
    for (origin, failure, location) in zone_failures(bars, &zones.high, params.lookahead, Side::High)
        .chain(zone_failures(bars, &zones.low, params.lookahead, Side::Low))
    {
        events.push(FailureEvent {
            company: company.to_string(),
            ticker: ticker.to_string(),
            location,
            failure_time: bars[failure].timestamp,
            break_time: Some(bars[origin].timestamp),
            close_at_failure: Some(bars[failure].close),
        });
    }

    debug!(ticker, events = events.len(), "VRZ scan complete");
    Ok(events)
}

pub fn detect_band_failures(
    bars: &[OhlcvBar],
    company: &str,
    ticker: &str,
    params: &BandParams,
) -> Result<Vec<FailureEvent>, BreakoutError> {
    params.validate()?;
    validate_series(bars)?;
    if bars.len() < 2 {
        return Ok(vec![]);
    }

    let bands = calculate_vwap_bands(bars, params.window, params.k);
    debug!(
        ticker,
        series = %bands.indicator_type,
        valid_points = bands.valid_count(),
        "built VWAP bands"
    );

    let events: Vec<FailureEvent> = band_failures(bars, &bands)
        .into_iter()
        .map(|(i, location)| FailureEvent {
            company: company.to_string(),
            ticker: ticker.to_string(),
            location,
            failure_time: bars[i].timestamp,
            break_time: None,
            close_at_failure: Some(bars[i].close),
        })
        .collect();

    debug!(ticker, events = events.len(), "band scan complete");
    Ok(events)
}

#[derive(Debug, Clone, Copy)]
enum Side {
    High,
    Low,
}

impl Side {
    fn broke_out(self, close: f64, level: f64) -> bool {
        match self {
            Side::High => close > level,
            Side::Low => close < level,
        }
    }

    fn reverted(self, close: f64, level: f64) -> bool {
        match self {
            Side::High => close < level,
            Side::Low => close > level,
        }
    }

    fn location(self) -> FailureLocation {
        match self {
            Side::High => FailureLocation::VrzHigh,
            Side::Low => FailureLocation::VrzLow,
        }
    }
}

/// Yields `(origin, failure, location)` index triples in origin order.
fn zone_failures<'a>(
    bars: &'a [OhlcvBar],
    zone: &'a Zone,
    lookahead: usize,
    side: Side,
) -> impl Iterator<Item = (usize, usize, FailureLocation)> + 'a {
    let last = bars.len().saturating_sub(1);
    (0..bars.len()).filter_map(move |i| {
        let level = zone.value_at(i)?;
        if !side.broke_out(bars[i].close, level) {
            return None;
        }
        let end = i.saturating_add(lookahead).min(last);
        (i + 1..=end)
            .find(|&j| side.reverted(bars[j].close, level))
            .map(|j| (i, j, side.location()))
    })
}

/// Indices of adjacent-pair band crossings, upper band checked first.
fn band_failures(bars: &[OhlcvBar], bands: &IndicatorSeries) -> Vec<(usize, FailureLocation)> {
    let mut out = Vec::new();
    for i in 1..bars.len() {
        let (Some((prev_upper, prev_lower)), Some((upper, lower))) =
            (bands.band_at(i - 1), bands.band_at(i))
        else {
            continue;
        };
        let prev_close = bars[i - 1].close;
        let close = bars[i].close;

        if prev_close > prev_upper && close < upper {
            out.push((i, FailureLocation::UpperBand));
        }
        if prev_close < prev_lower && close > lower {
            out.push((i, FailureLocation::LowerBand));
        }
    }
    out
}
