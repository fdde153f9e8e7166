//! Multi-ticker analysis.
//!
//! Tickers are independent, so they are fetched and scanned in parallel. The
//! report keeps the input ticker order regardless of completion order. A
//! ticker that cannot be analysed is skipped with a reason and never aborts
//! the batch.

use crate::domain::failure::FailureEvent;
use crate::domain::period::Period;
use crate::domain::strategy::DetectionStrategy;
use crate::domain::tickers::TickerSpec;
use crate::ports::data_port::DataPort;
use rayon::prelude::*;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub strategy: DetectionStrategy,
    pub interval: String,
    pub period: Period,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    FetchFailed(String),
    NoData,
    InvalidSeries(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InvalidSeries(reason) => write!(f, "invalid series: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerOutcome {
    pub ticker: String,
    pub bars: usize,
    pub events: usize,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub events: Vec<FailureEvent>,
    pub analysed: Vec<TickerOutcome>,
    pub skipped: Vec<SkippedTicker>,
}

pub fn analyze_ticker(
    data_port: &(dyn DataPort + Sync),
    spec: &TickerSpec,
    request: &BatchRequest,
) -> Result<(usize, Vec<FailureEvent>), SkipReason> {
    let bars = data_port
        .fetch_ohlcv(&spec.ticker, &request.interval, request.period)
        .map_err(|e| SkipReason::FetchFailed(e.to_string()))?;
    if bars.is_empty() {
        return Err(SkipReason::NoData);
    }

    let events = request
        .strategy
        .detect(&bars, &spec.company, &spec.ticker)
        .map_err(|e| SkipReason::InvalidSeries(e.to_string()))?;
    Ok((bars.len(), events))
}

pub fn analyze_batch(
    data_port: &(dyn DataPort + Sync),
    tickers: &[TickerSpec],
    request: &BatchRequest,
) -> BatchReport {
    info!(
        tickers = tickers.len(),
        strategy = %request.strategy,
        interval = %request.interval,
        period = %request.period,
        "analysing batch"
    );

    let results: Vec<_> = tickers
        .par_iter()
        .map(|spec| (spec, analyze_ticker(data_port, spec, request)))
        .collect();

    let mut report = BatchReport::default();
    for (spec, result) in results {
        match result {
            Ok((bars, events)) => {
                info!(ticker = %spec.ticker, bars, events = events.len(), "analysed");
                report.analysed.push(TickerOutcome {
                    ticker: spec.ticker.clone(),
                    bars,
                    events: events.len(),
                });
                report.events.extend(events);
            }
            Err(reason) => {
                warn!(ticker = %spec.ticker, %reason, "skipping ticker");
                report.skipped.push(SkippedTicker {
                    ticker: spec.ticker.clone(),
                    reason,
                });
            }
        }
    }
    report
}
