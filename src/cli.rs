//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::{CsvEventSink, write_overlay_csv};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::batch::{BatchReport, BatchRequest, analyze_batch};
use crate::domain::config_validation::{validate_analysis_config, validate_data_config};
use crate::domain::detector::{BandParams, VrzParams};
use crate::domain::error::BreakoutError;
use crate::domain::failure::FailureEvent;
use crate::domain::ohlcv::format_timestamp;
use crate::domain::overlay::build_overlay;
use crate::domain::period::Period;
use crate::domain::strategy::{DetectionStrategy, StrategyKind};
use crate::domain::tickers::{TickerSpec, parse_tickers};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::event_port::EventSink;

pub const DEFAULT_INTERVAL: &str = "5m";
pub const DEFAULT_PERIOD: &str = "1d";

#[derive(Parser, Debug)]
#[command(name = "breakout", about = "Breakout-failure detection over OHLCV bars")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Command-line values that take precedence over the config file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct StrategyOverrides {
    /// Detection strategy: vrz or band
    #[arg(long)]
    pub strategy: Option<String>,
    /// Zone/band multiplier
    #[arg(long)]
    pub k: Option<f64>,
    /// Extremum half-window (vrz) or range-average window (band)
    #[arg(long)]
    pub window: Option<usize>,
    /// Bars scanned for a failure after a VRZ break
    #[arg(long)]
    pub lookahead: Option<usize>,
    #[arg(long)]
    pub interval: Option<String>,
    /// Lookback period, e.g. 1d, 5d, 1mo, max
    #[arg(long)]
    pub period: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect breakout failures for one ticker or the configured list
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[command(flatten)]
        overrides: StrategyOverrides,
        /// Store events in the configured database
        #[arg(long)]
        save: bool,
        /// Also write events to a CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Write per-bar indicators and zone/band levels as CSV
    Overlay {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        overrides: StrategyOverrides,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols with bar files for an interval
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        interval: Option<String>,
    },
    /// Show data range for ticker(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        interval: Option<String>,
    },
    /// Show stored events
    History {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            ticker,
            company,
            overrides,
            save,
            output,
            format,
        } => run_analyze(
            &config,
            ticker.as_deref(),
            company.as_deref(),
            &overrides,
            save,
            output.as_deref(),
            format,
        ),
        Command::Overlay {
            config,
            ticker,
            output,
            overrides,
        } => run_overlay(&config, &ticker, &output, &overrides),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, interval } => run_list_symbols(&config, interval.as_deref()),
        Command::Info {
            config,
            ticker,
            interval,
        } => run_info(&config, ticker.as_deref(), interval.as_deref()),
        Command::History { config, ticker } => run_history(&config, ticker.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = BreakoutError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn report(e: BreakoutError) -> ExitCode {
    eprintln!("error: {e}");
    (&e).into()
}

fn config_count(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    usize::try_from(config.get_int(section, key, default as i64)).unwrap_or(0)
}

pub fn build_strategy(
    config: &dyn ConfigPort,
    overrides: &StrategyOverrides,
) -> Result<DetectionStrategy, BreakoutError> {
    let kind = match &overrides.strategy {
        Some(s) => s
            .parse::<StrategyKind>()
            .map_err(|reason| BreakoutError::invalid_parameter("strategy", reason))?,
        None => match config.get_string("analysis", "strategy") {
            Some(s) => s
                .parse::<StrategyKind>()
                .map_err(|reason| BreakoutError::ConfigInvalid {
                    section: "analysis".into(),
                    key: "strategy".into(),
                    reason,
                })?,
            None => StrategyKind::Vrz,
        },
    };

    let strategy = match kind {
        StrategyKind::Vrz => {
            let d = VrzParams::default();
            DetectionStrategy::Vrz(VrzParams {
                k: overrides.k.unwrap_or_else(|| config.get_double("vrz", "k", d.k)),
                window: overrides
                    .window
                    .unwrap_or_else(|| config_count(config, "vrz", "window", d.window)),
                lookahead: overrides
                    .lookahead
                    .unwrap_or_else(|| config_count(config, "vrz", "lookahead", d.lookahead)),
                atr_period: config_count(config, "vrz", "atr_period", d.atr_period),
            })
        }
        StrategyKind::Band => {
            let d = BandParams::default();
            DetectionStrategy::Band(BandParams {
                k: overrides.k.unwrap_or_else(|| config.get_double("band", "k", d.k)),
                window: overrides
                    .window
                    .unwrap_or_else(|| config_count(config, "band", "window", d.window)),
            })
        }
    };

    strategy.validate()?;
    Ok(strategy)
}

pub fn build_batch_request(
    config: &dyn ConfigPort,
    overrides: &StrategyOverrides,
) -> Result<BatchRequest, BreakoutError> {
    let strategy = build_strategy(config, overrides)?;

    let interval = overrides
        .interval
        .clone()
        .or_else(|| config.get_string("data", "interval"))
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string());

    let period = match &overrides.period {
        Some(p) => p
            .parse::<Period>()
            .map_err(|reason| BreakoutError::invalid_parameter("period", reason))?,
        None => config
            .get_string("data", "period")
            .unwrap_or_else(|| DEFAULT_PERIOD.to_string())
            .parse::<Period>()
            .map_err(|reason| BreakoutError::ConfigInvalid {
                section: "data".into(),
                key: "period".into(),
                reason,
            })?,
    };

    Ok(BatchRequest {
        strategy,
        interval,
        period,
    })
}

/// `--ticker` wins over `[analysis] tickers`.
pub fn resolve_tickers(
    ticker: Option<&str>,
    company: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<TickerSpec>, BreakoutError> {
    if let Some(t) = ticker.filter(|t| !t.trim().is_empty()) {
        return Ok(vec![TickerSpec::new(t, company)]);
    }

    let list = config
        .get_string("analysis", "tickers")
        .ok_or_else(|| BreakoutError::ConfigMissing {
            section: "analysis".into(),
            key: "tickers".into(),
        })?;
    parse_tickers(&list).map_err(|e| BreakoutError::ConfigInvalid {
        section: "analysis".into(),
        key: "tickers".into(),
        reason: e.to_string(),
    })
}

/// Database sink for `--save`. A store that cannot be opened is reported and
/// skipped.
pub fn open_event_sink(config: &dyn ConfigPort) -> Option<Box<dyn EventSink>> {
    #[cfg(feature = "postgres")]
    {
        use crate::adapters::postgres_adapter::PostgresAdapter;

        if config.get_string("postgres", "connection_string").is_some() {
            let opened = PostgresAdapter::from_config(config).and_then(|adapter| {
                adapter.initialize_schema()?;
                Ok(adapter)
            });
            return match opened {
                Ok(adapter) => Some(Box::new(adapter) as Box<dyn EventSink>),
                Err(e) => {
                    warn!(error = %e, "postgres event store unavailable");
                    None
                }
            };
        }
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let opened = SqliteAdapter::from_config(config).and_then(|adapter| {
            adapter.initialize_schema()?;
            Ok(adapter)
        });
        match opened {
            Ok(adapter) => Some(Box::new(adapter) as Box<dyn EventSink>),
            Err(e) => {
                warn!(error = %e, "sqlite event store unavailable");
                None
            }
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        warn!("no event store available; events are not saved");
        None
    }
}

pub fn write_events_table<W: Write>(mut out: W, events: &[FailureEvent]) -> io::Result<()> {
    writeln!(
        out,
        "{:<14} {:<28} {:<19} {:<19} {:>12}  {}",
        "TICKER", "LOCATION", "BREAK", "FAILURE", "CLOSE", "COMPANY"
    )?;
    for e in events {
        let break_time = e
            .break_time
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());
        let close = e
            .close_at_failure
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{:<14} {:<28} {:<19} {:<19} {:>12}  {}",
            e.ticker,
            e.location.as_str(),
            break_time,
            format_timestamp(&e.failure_time),
            close,
            e.company
        )?;
    }
    Ok(())
}

fn print_events(events: &[FailureEvent], format: OutputFormat) -> Result<(), BreakoutError> {
    let stdout = io::stdout();
    match format {
        OutputFormat::Table => write_events_table(stdout.lock(), events)?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(events).map_err(|e| BreakoutError::Sink {
                reason: e.to_string(),
            })?;
            writeln!(stdout.lock(), "{json}")?;
        }
    }
    Ok(())
}

fn run_analyze(
    config_path: &Path,
    ticker: Option<&str>,
    company: Option<&str>,
    overrides: &StrategyOverrides,
    save: bool,
    output: Option<&Path>,
    format: OutputFormat,
) -> ExitCode {
    info!(config = %config_path.display(), "loading config");
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_data_config(&config).and_then(|_| validate_analysis_config(&config)) {
        return report(e);
    }

    let request = match build_batch_request(&config, overrides) {
        Ok(r) => r,
        Err(e) => return report(e),
    };
    let tickers = match resolve_tickers(ticker, company, &config) {
        Ok(t) => t,
        Err(e) => return report(e),
    };
    let data_port = match CsvAdapter::from_config(&config) {
        Ok(a) => a,
        Err(e) => return report(e),
    };

    let sink = if save || config.get_bool("analysis", "save", false) {
        open_event_sink(&config)
    } else {
        None
    };

    run_analysis_pipeline(&data_port, &request, &tickers, sink.as_deref(), output, format)
}

/// Fetch, detect, print, then persist. Persistence failures are logged and do
/// not change the exit code.
pub fn run_analysis_pipeline(
    data_port: &(dyn DataPort + Sync),
    request: &BatchRequest,
    tickers: &[TickerSpec],
    sink: Option<&dyn EventSink>,
    output: Option<&Path>,
    format: OutputFormat,
) -> ExitCode {
    let BatchReport {
        events,
        analysed,
        skipped,
    } = analyze_batch(data_port, tickers, request);

    if analysed.is_empty() {
        let e = BreakoutError::NoData {
            symbol: tickers
                .iter()
                .map(|t| t.ticker.as_str())
                .collect::<Vec<_>>()
                .join(","),
            interval: request.interval.clone(),
        };
        return report(e);
    }

    if let Err(e) = print_events(&events, format) {
        return report(e);
    }

    if let Some(path) = output {
        if let Err(e) = CsvEventSink::new(path.to_path_buf()).insert_failures(&events) {
            return report(e);
        }
        info!(path = %path.display(), events = events.len(), "events written");
    }

    if let Some(sink) = sink {
        match sink.insert_failures(&events) {
            Ok(stored) => info!(stored, "events saved"),
            Err(e) => warn!(error = %e, "failed to save events"),
        }
    }

    info!(
        events = events.len(),
        analysed = analysed.len(),
        skipped = skipped.len(),
        "analysis complete"
    );
    ExitCode::SUCCESS
}

fn run_overlay(
    config_path: &Path,
    ticker: &str,
    output: &Path,
    overrides: &StrategyOverrides,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_data_config(&config) {
        return report(e);
    }

    let request = match build_batch_request(&config, overrides) {
        Ok(r) => r,
        Err(e) => return report(e),
    };
    let data_port = match CsvAdapter::from_config(&config) {
        Ok(a) => a,
        Err(e) => return report(e),
    };

    let symbol = ticker.trim().to_string();
    let bars = match data_port.fetch_ohlcv(&symbol, &request.interval, request.period) {
        Ok(b) if b.is_empty() => {
            return report(BreakoutError::NoData {
                symbol,
                interval: request.interval,
            });
        }
        Ok(b) => b,
        Err(e) => return report(e),
    };

    let rows = match build_overlay(&bars, &request.strategy) {
        Ok(r) => r,
        Err(e) => return report(e),
    };
    if let Err(e) = write_overlay_csv(output, &rows) {
        return report(e);
    }

    info!(
        ticker = %symbol,
        strategy = %request.strategy.kind(),
        rows = rows.len(),
        path = %output.display(),
        "overlay written"
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_data_config(&config).and_then(|_| validate_analysis_config(&config)) {
        return report(e);
    }

    let request = match build_batch_request(&config, &StrategyOverrides::default()) {
        Ok(r) => r,
        Err(e) => return report(e),
    };

    eprintln!("\nStrategy: {}", request.strategy);
    eprintln!("Interval: {}", request.interval);
    eprintln!("Period:   {}", request.period);

    match config.get_string("analysis", "tickers") {
        Some(_) => match resolve_tickers(None, None, &config) {
            Ok(tickers) => {
                eprintln!("Tickers:");
                for t in &tickers {
                    eprintln!("  {} ({})", t.ticker, t.company);
                }
            }
            Err(e) => return report(e),
        },
        None => eprintln!("Tickers:  none configured (use --ticker)"),
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path, interval: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let adapter = match CsvAdapter::from_config(&config) {
        Ok(a) => a,
        Err(e) => return report(e),
    };

    let interval = interval
        .map(str::to_string)
        .or_else(|| config.get_string("data", "interval"))
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string());

    let symbols = match adapter.list_symbols(&interval) {
        Ok(s) => s,
        Err(e) => return report(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found for interval {}", interval);
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, ticker: Option<&str>, interval: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let adapter = match CsvAdapter::from_config(&config) {
        Ok(a) => a,
        Err(e) => return report(e),
    };
    let tickers = match resolve_tickers(ticker, None, &config) {
        Ok(t) => t,
        Err(e) => return report(e),
    };

    let interval = interval
        .map(str::to_string)
        .or_else(|| config.get_string("data", "interval"))
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string());

    for t in &tickers {
        match adapter.get_data_range(&t.ticker, &interval) {
            Ok(Some((first, last, count))) => {
                println!(
                    "{} [{}]: {} bars, {} to {}",
                    t.ticker,
                    interval,
                    count,
                    format_timestamp(&first),
                    format_timestamp(&last)
                );
            }
            Ok(None) => eprintln!("{} [{}]: no data found", t.ticker, interval),
            Err(e) => eprintln!("error querying {}: {}", t.ticker, e),
        }
    }
    ExitCode::SUCCESS
}

fn run_history(config_path: &Path, ticker: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let adapter = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => return report(e),
        };
        if let Err(e) = adapter.initialize_schema() {
            return report(e);
        }

        let ticker = ticker.map(str::trim);
        let events = match adapter.fetch_failures(ticker) {
            Ok(e) => e,
            Err(e) => return report(e),
        };

        if events.is_empty() {
            eprintln!("No stored events");
        } else if let Err(e) = write_events_table(io::stdout().lock(), &events) {
            return report(e.into());
        }
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, ticker);
        eprintln!("error: sqlite feature is required for history");
        ExitCode::from(1)
    }
}
