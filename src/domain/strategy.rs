//! Caller-selected detection strategy.

use crate::domain::detector::{BandParams, VrzParams, detect_band_failures, detect_vrz_failures};
use crate::domain::error::BreakoutError;
use crate::domain::failure::FailureEvent;
use crate::domain::ohlcv::OhlcvBar;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Vrz,
    Band,
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vrz" => Ok(StrategyKind::Vrz),
            "band" | "vwap" => Ok(StrategyKind::Band),
            other => Err(format!("unknown strategy '{other}' (expected vrz or band)")),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Vrz => write!(f, "vrz"),
            StrategyKind::Band => write!(f, "band"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionStrategy {
    Vrz(VrzParams),
    Band(BandParams),
}

impl DetectionStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            DetectionStrategy::Vrz(_) => StrategyKind::Vrz,
            DetectionStrategy::Band(_) => StrategyKind::Band,
        }
    }

    pub fn validate(&self) -> Result<(), BreakoutError> {
        match self {
            DetectionStrategy::Vrz(p) => p.validate(),
            DetectionStrategy::Band(p) => p.validate(),
        }
    }

    pub fn detect(
        &self,
        bars: &[OhlcvBar],
        company: &str,
        ticker: &str,
    ) -> Result<Vec<FailureEvent>, BreakoutError> {
        match self {
            DetectionStrategy::Vrz(p) => detect_vrz_failures(bars, company, ticker, p),
            DetectionStrategy::Band(p) => detect_band_failures(bars, company, ticker, p),
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionStrategy::Vrz(p) => write!(
                f,
                "VRZ(k={}, window={}, lookahead={}, atr_period={})",
                p.k, p.window, p.lookahead, p.atr_period
            ),
            DetectionStrategy::Band(p) => write!(f, "VWAP_BAND(k={}, window={})", p.k, p.window),
        }
    }
}
