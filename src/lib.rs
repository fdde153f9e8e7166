//! breakout: breakout-failure detection over OHLCV series.
//!
//! Hexagonal architecture: detection logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`], command dispatch in
//! [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
