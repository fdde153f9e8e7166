//! CSV file data adapter.
//!
//! Bars live in `{base}/{symbol}{suffix}_{interval}.csv` with the columns
//! `datetime,open,high,low,close,volume`. Suffixes are tried in order and the
//! first file holding at least one bar wins.

use crate::domain::error::BreakoutError;
use crate::domain::ohlcv::{OhlcvBar, parse_timestamp};
use crate::domain::period::Period;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Bare symbol first, then NSE, then BSE.
pub const DEFAULT_SUFFIXES: [&str; 3] = ["", ".NS", ".BO"];

pub struct CsvAdapter {
    base_path: PathBuf,
    suffixes: Vec<String>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self::with_suffixes(base_path, DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_suffixes(base_path: PathBuf, suffixes: Vec<String>) -> Self {
        Self {
            base_path,
            suffixes,
        }
    }

    /// Reads `[data] path` and the optional `[data] suffixes` list.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BreakoutError> {
        let path = config
            .get_string("data", "path")
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| BreakoutError::ConfigMissing {
                section: "data".to_string(),
                key: "path".to_string(),
            })?;
        Ok(match config.get_list("data", "suffixes") {
            Some(suffixes) => Self::with_suffixes(PathBuf::from(path), suffixes),
            None => Self::new(PathBuf::from(path)),
        })
    }

    fn csv_path(&self, symbol: &str, suffix: &str, interval: &str) -> PathBuf {
        self.base_path
            .join(format!("{}{}_{}.csv", symbol, suffix, interval))
    }

    /// First non-empty candidate wins. An unreadable candidate is skipped; its
    /// error is returned only when no other candidate holds bars.
    fn resolve(&self, symbol: &str, interval: &str) -> Result<Vec<OhlcvBar>, BreakoutError> {
        let mut last_error = None;
        for suffix in &self.suffixes {
            let path = self.csv_path(symbol, suffix, interval);
            if !path.is_file() {
                continue;
            }
            match read_bars(&path) {
                Ok(bars) if bars.is_empty() => {}
                Ok(bars) => {
                    debug!(symbol, suffix = suffix.as_str(), bars = bars.len(), "resolved bar file");
                    return Ok(bars);
                }
                Err(e) => {
                    warn!(symbol, suffix = suffix.as_str(), error = %e, "bar file attempt failed");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => {
                debug!(symbol, interval, "no bar file with data");
                Ok(Vec::new())
            }
        }
    }
}

fn parse_price(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, BreakoutError> {
    record
        .get(idx)
        .ok_or_else(|| BreakoutError::Database {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| BreakoutError::Database {
            reason: format!("invalid {} value: {}", name, e),
        })
}

fn read_bars(path: &Path) -> Result<Vec<OhlcvBar>, BreakoutError> {
    let content = fs::read_to_string(path).map_err(|e| BreakoutError::Database {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| BreakoutError::Database {
            reason: format!("CSV parse error: {}", e),
        })?;

        let raw = record.get(0).ok_or_else(|| BreakoutError::Database {
            reason: "missing datetime column".into(),
        })?;
        let timestamp = parse_timestamp(raw).ok_or_else(|| BreakoutError::Database {
            reason: format!("invalid datetime '{}' in {}", raw, path.display()),
        })?;

        bars.push(OhlcvBar {
            timestamp,
            open: parse_price(&record, 1, "open")?,
            high: parse_price(&record, 2, "high")?,
            low: parse_price(&record, 3, "low")?,
            close: parse_price(&record, 4, "close")?,
            volume: parse_price(&record, 5, "volume")?,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: &str,
        period: Period,
    ) -> Result<Vec<OhlcvBar>, BreakoutError> {
        let mut bars = self.resolve(symbol, interval)?;
        let timestamps: Vec<NaiveDateTime> = bars.iter().map(|b| b.timestamp).collect();
        let first = period.first_kept(&timestamps);
        bars.drain(..first);
        Ok(bars)
    }

    fn list_symbols(&self, interval: &str) -> Result<Vec<String>, BreakoutError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| BreakoutError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", interval);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| BreakoutError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(&suffix) {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, BreakoutError> {
        let bars = self.resolve(symbol, interval)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, bars.len())),
            _ => None,
        })
    }
}
