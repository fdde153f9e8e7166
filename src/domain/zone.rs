//! Volatility range zones (VRZ).
//!
//! A zone is a sparse, index-ordered table of anchors. Querying an index
//! returns the value of the latest anchor at or before it; indices before the
//! first anchor have no zone.
//!
//! High anchors sit at local maxima of the highs with value `high + k·ATR`;
//! low anchors sit at local minima of the lows with value `low − k·ATR`.

use crate::domain::extremum::{local_maxima, local_minima};
use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneAnchor {
    pub index: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Zone {
    anchors: Vec<ZoneAnchor>,
}

impl Zone {
    /// Builds a zone from anchors given in ascending index order.
    pub fn from_anchors(anchors: Vec<ZoneAnchor>) -> Self {
        debug_assert!(anchors.windows(2).all(|w| w[0].index < w[1].index));
        Self { anchors }
    }

    pub fn anchors(&self) -> &[ZoneAnchor] {
        &self.anchors
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Carry-forward value at `index`.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        let after = self.anchors.partition_point(|a| a.index <= index);
        after.checked_sub(1).map(|i| self.anchors[i].value)
    }

    /// Dense per-bar view of the zone over `len` bars.
    pub fn forward_filled(&self, len: usize) -> Vec<Option<f64>> {
        (0..len).map(|i| self.value_at(i)).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VrzZones {
    pub high: Zone,
    pub low: Zone,
}

/// Anchors high and low zones at the local extrema of `bars`.
///
/// `atr` must be bar-aligned with `bars`; extrema whose ATR point is invalid
/// are skipped.
pub fn build_vrz_zones(bars: &[OhlcvBar], atr: &IndicatorSeries, k: f64, window: usize) -> VrzZones {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let high = local_maxima(&highs, window)
        .into_iter()
        .filter_map(|i| {
            atr.simple_at(i).map(|a| ZoneAnchor {
                index: i,
                value: highs[i] + k * a,
            })
        })
        .collect();

    let low = local_minima(&lows, window)
        .into_iter()
        .filter_map(|i| {
            atr.simple_at(i).map(|a| ZoneAnchor {
                index: i,
                value: lows[i] - k * a,
            })
        })
        .collect();

    VrzZones {
        high: Zone::from_anchors(high),
        low: Zone::from_anchors(low),
    }
}
