//! Configuration validation.
//!
//! Validates every field an analysis run reads before any data is fetched.
//! Absent numeric keys fall back to the detector defaults, so only present
//! values can be rejected.

use crate::domain::detector::{BandParams, VrzParams};
use crate::domain::error::BreakoutError;
use crate::domain::period::Period;
use crate::domain::strategy::StrategyKind;
use crate::domain::tickers::parse_tickers;
use crate::ports::config_port::ConfigPort;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), BreakoutError> {
    validate_data_path(config)?;
    validate_interval(config)?;
    validate_period(config)?;
    Ok(())
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), BreakoutError> {
    validate_strategy(config)?;
    validate_tickers(config)?;
    validate_vrz_k(config)?;
    validate_count(config, "vrz", "window", VrzParams::default().window)?;
    validate_count(config, "vrz", "lookahead", VrzParams::default().lookahead)?;
    validate_count(config, "vrz", "atr_period", VrzParams::default().atr_period)?;
    validate_band_k(config)?;
    validate_count(config, "band", "window", BandParams::default().window)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BreakoutError {
    BreakoutError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), BreakoutError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(BreakoutError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), BreakoutError> {
    match config.get_string("data", "interval") {
        Some(s) if s.trim().is_empty() => {
            Err(invalid("data", "interval", "interval must not be empty"))
        }
        _ => Ok(()),
    }
}

fn validate_period(config: &dyn ConfigPort) -> Result<(), BreakoutError> {
    match config.get_string("data", "period") {
        Some(s) => s
            .parse::<Period>()
            .map(|_| ())
            .map_err(|reason| invalid("data", "period", reason)),
        None => Ok(()),
    }
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), BreakoutError> {
    match config.get_string("analysis", "strategy") {
        Some(s) => s
            .parse::<StrategyKind>()
            .map(|_| ())
            .map_err(|reason| invalid("analysis", "strategy", reason)),
        None => Ok(()),
    }
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), BreakoutError> {
    match config.get_string("analysis", "tickers") {
        Some(s) => parse_tickers(&s)
            .map(|_| ())
            .map_err(|e| invalid("analysis", "tickers", e.to_string())),
        None => Ok(()),
    }
}

fn validate_multiplier(
    config: &dyn ConfigPort,
    section: &str,
    default: f64,
) -> Result<(), BreakoutError> {
    let value = config.get_double(section, "k", default);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(section, "k", "k must be a finite non-negative number"));
    }
    Ok(())
}

fn validate_vrz_k(config: &dyn ConfigPort) -> Result<(), BreakoutError> {
    validate_multiplier(config, "vrz", VrzParams::default().k)
}

fn validate_band_k(config: &dyn ConfigPort) -> Result<(), BreakoutError> {
    validate_multiplier(config, "band", BandParams::default().k)
}

fn validate_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<(), BreakoutError> {
    let value = config.get_int(section, key, default as i64);
    if value < 1 {
        return Err(invalid(section, key, format!("{key} must be at least 1")));
    }
    Ok(())
}
