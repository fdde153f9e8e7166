//! Core domain types and detection logic.

pub mod ohlcv;
pub mod error;
pub mod indicator;
pub mod indicator_helpers;
pub mod extremum;
pub mod zone;
pub mod failure;
pub mod detector;
pub mod strategy;
pub mod period;
pub mod tickers;
pub mod batch;
pub mod overlay;
pub mod config_validation;
