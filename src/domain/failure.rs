//! Breakout-failure events.
//!
//! Events are plain immutable records. Detectors return them in discovery
//! order, which is not necessarily sorted by `failure_time`.

use crate::domain::ohlcv::format_timestamp;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureLocation {
    /// Close above a VRZ high zone, then back below it within the lookahead.
    VrzHigh,
    /// Close below a VRZ low zone, then back above it within the lookahead.
    VrzLow,
    /// Adjacent-bar cross from above the upper VWAP band to below it.
    UpperBand,
    /// Adjacent-bar cross from below the lower VWAP band to above it.
    LowerBand,
}

impl FailureLocation {
    pub const ALL: [FailureLocation; 4] = [
        FailureLocation::VrzHigh,
        FailureLocation::VrzLow,
        FailureLocation::UpperBand,
        FailureLocation::LowerBand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureLocation::VrzHigh => "VRZ High",
            FailureLocation::VrzLow => "VRZ Low",
            FailureLocation::UpperBand => "Above → Below Upper Band",
            FailureLocation::LowerBand => "Below → Above Lower Band",
        }
    }
}

impl fmt::Display for FailureLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FailureLocation::ALL
            .into_iter()
            .find(|loc| loc.as_str() == s)
            .ok_or_else(|| format!("unknown failure location: {s}"))
    }
}

impl Serialize for FailureLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureEvent {
    pub company: String,
    pub ticker: String,
    pub location: FailureLocation,
    #[serde(serialize_with = "serialize_timestamp")]
    pub failure_time: NaiveDateTime,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub break_time: Option<NaiveDateTime>,
    pub close_at_failure: Option<f64>,
}

fn serialize_timestamp<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

fn serialize_optional_timestamp<S: Serializer>(
    ts: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.serialize_some(&format_timestamp(ts)),
        None => serializer.serialize_none(),
    }
}
