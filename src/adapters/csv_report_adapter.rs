//! CSV writers for detected events and chart overlays.

use crate::domain::error::BreakoutError;
use crate::domain::failure::FailureEvent;
use crate::domain::ohlcv::format_timestamp;
use crate::domain::overlay::OverlayRow;
use crate::ports::event_port::EventSink;
use std::io::Write;
use std::path::{Path, PathBuf};

const EVENT_HEADER: [&str; 6] = [
    "company",
    "ticker",
    "location",
    "failure_time",
    "break_time",
    "close_at_failure",
];

const OVERLAY_HEADER: [&str; 9] = [
    "timestamp",
    "close",
    "true_range",
    "atr",
    "vwap",
    "vrz_high",
    "vrz_low",
    "band_upper",
    "band_lower",
];

fn sink_error(path: &Path, e: impl std::fmt::Display) -> BreakoutError {
    BreakoutError::Sink {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

/// Writes each batch to a CSV file, replacing whatever the file held.
pub struct CsvEventSink {
    path: PathBuf,
}

impl CsvEventSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

pub fn write_events<W: Write>(writer: W, events: &[FailureEvent]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(EVENT_HEADER)?;
    for event in events {
        wtr.serialize(event)?;
    }
    wtr.flush()?;
    Ok(())
}

impl EventSink for CsvEventSink {
    fn insert_failures(&self, events: &[FailureEvent]) -> Result<usize, BreakoutError> {
        let file = std::fs::File::create(&self.path).map_err(|e| sink_error(&self.path, e))?;
        write_events(file, events).map_err(|e| sink_error(&self.path, e))?;
        Ok(events.len())
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_overlay<W: Write>(writer: W, rows: &[OverlayRow]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(OVERLAY_HEADER)?;
    for row in rows {
        wtr.write_record([
            format_timestamp(&row.timestamp),
            row.close.to_string(),
            cell(row.true_range),
            cell(row.atr),
            cell(row.vwap),
            cell(row.vrz_high),
            cell(row.vrz_low),
            cell(row.band_upper),
            cell(row.band_lower),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_overlay_csv(path: &Path, rows: &[OverlayRow]) -> Result<(), BreakoutError> {
    let file = std::fs::File::create(path).map_err(|e| sink_error(path, e))?;
    write_overlay(file, rows).map_err(|e| sink_error(path, e))
}
