//! CLI integration tests.
//!
//! Tests cover:
//! - Strategy and request construction from INI files and flag overrides
//! - Ticker resolution
//! - The analysis pipeline with MockDataPort and in-test event sinks
//! - Full commands against bar CSV files and a SQLite store on disk

mod common;

use breakout::adapters::file_config_adapter::FileConfigAdapter;
use breakout::cli::{self, Cli, OutputFormat, StrategyOverrides};
use breakout::domain::batch::BatchRequest;
use breakout::domain::detector::{BandParams, VrzParams};
use breakout::domain::error::BreakoutError;
use breakout::domain::failure::{FailureEvent, FailureLocation};
use breakout::domain::period::Period;
use breakout::domain::strategy::DetectionStrategy;
use breakout::domain::tickers::TickerSpec;
use breakout::ports::event_port::EventSink;
use clap::Parser;
use common::*;
use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ExitCode has no PartialEq; compare the Debug rendering instead
fn assert_exit(actual: ExitCode, expected: u8) {
    assert_eq!(
        format!("{actual:?}"),
        format!("{:?}", ExitCode::from(expected)),
        "expected exit code {expected}"
    );
}

const VALID_INI: &str = r#"
[data]
path = /srv/bars
interval = 5m
period = 5d

[analysis]
strategy = vrz
tickers = RELIANCE.NS:Reliance Industries, TCS.NS

[vrz]
k = 1.0
window = 3
lookahead = 8
atr_period = 10

[band]
k = 2.5
window = 15
"#;

mod strategy_building {
    use super::*;

    #[test]
    fn vrz_from_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let strategy = cli::build_strategy(&adapter, &StrategyOverrides::default()).unwrap();

        assert_eq!(
            strategy,
            DetectionStrategy::Vrz(VrzParams {
                k: 1.0,
                window: 3,
                lookahead: 8,
                atr_period: 10,
            })
        );
    }

    #[test]
    fn defaults_when_sections_missing() {
        let adapter = FileConfigAdapter::from_string("[data]\npath = bars\n").unwrap();
        let strategy = cli::build_strategy(&adapter, &StrategyOverrides::default()).unwrap();
        assert_eq!(strategy, DetectionStrategy::Vrz(VrzParams::default()));
    }

    #[test]
    fn flag_switches_to_band_and_overrides_k() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let overrides = StrategyOverrides {
            strategy: Some("band".into()),
            k: Some(1.0),
            ..StrategyOverrides::default()
        };
        let strategy = cli::build_strategy(&adapter, &overrides).unwrap();
        assert_eq!(
            strategy,
            DetectionStrategy::Band(BandParams { k: 1.0, window: 15 })
        );
    }

    #[test]
    fn unknown_strategy_flag_is_invalid_parameter() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let overrides = StrategyOverrides {
            strategy: Some("fibonacci".into()),
            ..StrategyOverrides::default()
        };
        let err = cli::build_strategy(&adapter, &overrides).unwrap_err();
        assert!(matches!(err, BreakoutError::InvalidParameter { name, .. } if name == "strategy"));
    }

    #[test]
    fn negative_window_in_config_fails_validation() {
        let adapter = FileConfigAdapter::from_string("[vrz]\nwindow = -2\n").unwrap();
        let err = cli::build_strategy(&adapter, &StrategyOverrides::default()).unwrap_err();
        assert!(matches!(err, BreakoutError::InvalidParameter { name, .. } if name == "window"));
    }

    #[test]
    fn batch_request_reads_interval_and_period() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let request = cli::build_batch_request(&adapter, &StrategyOverrides::default()).unwrap();
        assert_eq!(request.interval, "5m");
        assert_eq!(request.period, Period::Days(5));

        let overrides = StrategyOverrides {
            interval: Some("15m".into()),
            period: Some("1mo".into()),
            ..StrategyOverrides::default()
        };
        let request = cli::build_batch_request(&adapter, &overrides).unwrap();
        assert_eq!(request.interval, "15m");
        assert_eq!(request.period, Period::Months(1));
    }

    #[test]
    fn batch_request_defaults() {
        let adapter = FileConfigAdapter::from_string("").unwrap();
        let request = cli::build_batch_request(&adapter, &StrategyOverrides::default()).unwrap();
        assert_eq!(request.interval, cli::DEFAULT_INTERVAL);
        assert_eq!(request.period, Period::Days(1));
    }

    #[test]
    fn bad_period_flag_fails() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let overrides = StrategyOverrides {
            period: Some("fortnight".into()),
            ..StrategyOverrides::default()
        };
        let err = cli::build_batch_request(&adapter, &overrides).unwrap_err();
        assert!(matches!(err, BreakoutError::InvalidParameter { name, .. } if name == "period"));
    }
}

mod ticker_resolution {
    use super::*;

    #[test]
    fn ticker_flag_wins_over_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let tickers = cli::resolve_tickers(Some(" INFY.NS "), Some("Infosys"), &adapter).unwrap();
        assert_eq!(tickers, vec![TickerSpec::new("INFY.NS", Some("Infosys"))]);
    }

    #[test]
    fn company_defaults_to_ticker() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let tickers = cli::resolve_tickers(Some("INFY"), None, &adapter).unwrap();
        assert_eq!(tickers[0].company, "INFY");
    }

    #[test]
    fn list_from_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let tickers = cli::resolve_tickers(None, None, &adapter).unwrap();
        assert_eq!(tickers.len(), 2);
        assert_eq!(tickers[0].company, "Reliance Industries");
        assert_eq!(tickers[1].ticker, "TCS.NS");
    }

    #[test]
    fn missing_list_is_config_error() {
        let adapter = FileConfigAdapter::from_string("[data]\npath = bars\n").unwrap();
        let err = cli::resolve_tickers(None, None, &adapter).unwrap_err();
        assert!(matches!(err, BreakoutError::ConfigMissing { key, .. } if key == "tickers"));
    }
}

mod pipeline_mock {
    use super::*;

    struct RecordingSink {
        stored: RefCell<Vec<FailureEvent>>,
    }

    impl EventSink for RecordingSink {
        fn insert_failures(&self, events: &[FailureEvent]) -> Result<usize, BreakoutError> {
            self.stored.borrow_mut().extend_from_slice(events);
            Ok(events.len())
        }
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        fn insert_failures(&self, _events: &[FailureEvent]) -> Result<usize, BreakoutError> {
            Err(BreakoutError::Sink {
                reason: "connection refused".into(),
            })
        }
    }

    fn vrz_request() -> BatchRequest {
        BatchRequest {
            strategy: DetectionStrategy::Vrz(VrzParams {
                k: 1.0,
                window: 3,
                ..VrzParams::default()
            }),
            interval: "5m".into(),
            period: Period::Days(1),
        }
    }

    #[test]
    fn events_reach_sink_and_output_file() {
        let mock = MockDataPort::new().with_bars("ACME", vrz_failure_series());
        let sink = RecordingSink {
            stored: RefCell::new(Vec::new()),
        };
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("events.csv");

        let exit = cli::run_analysis_pipeline(
            &mock,
            &vrz_request(),
            &[TickerSpec::new("ACME", Some("Acme Ltd"))],
            Some(&sink),
            Some(&output),
            OutputFormat::Json,
        );

        assert_exit(exit, 0);
        let stored = sink.stored.borrow();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].location, FailureLocation::VrzHigh);
        assert_eq!(stored[0].company, "Acme Ltd");

        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("Acme Ltd,ACME,VRZ High"));
    }

    #[test]
    fn sink_failure_is_not_fatal() {
        let mock = MockDataPort::new().with_bars("ACME", vrz_failure_series());
        let exit = cli::run_analysis_pipeline(
            &mock,
            &vrz_request(),
            &[TickerSpec::new("ACME", None)],
            Some(&FailingSink),
            None,
            OutputFormat::Table,
        );
        assert_exit(exit, 0);
    }

    #[test]
    fn partial_failures_still_succeed() {
        let mock = MockDataPort::new()
            .with_bars("ACME", vrz_failure_series())
            .with_error("BROKEN", "timeout");
        let exit = cli::run_analysis_pipeline(
            &mock,
            &vrz_request(),
            &[TickerSpec::new("BROKEN", None), TickerSpec::new("ACME", None)],
            None,
            None,
            OutputFormat::Table,
        );
        assert_exit(exit, 0);
    }

    #[test]
    fn no_data_anywhere_exits_with_no_data_code() {
        let mock = MockDataPort::new().with_error("BROKEN", "timeout");
        let exit = cli::run_analysis_pipeline(
            &mock,
            &vrz_request(),
            &[TickerSpec::new("BROKEN", None), TickerSpec::new("EMPTY", None)],
            None,
            None,
            OutputFormat::Table,
        );
        assert_exit(exit, 5);
    }

    #[test]
    fn quiet_market_is_success_with_no_events() {
        let flat: Vec<OhlcvBar> = (0..40)
            .map(|i| make_bar(i, 100.0, 100.5, 99.5, 100.0, 100.0))
            .collect();
        let mock = MockDataPort::new().with_bars("FLAT", flat);
        let sink = RecordingSink {
            stored: RefCell::new(Vec::new()),
        };
        let exit = cli::run_analysis_pipeline(
            &mock,
            &vrz_request(),
            &[TickerSpec::new("FLAT", None)],
            Some(&sink),
            None,
            OutputFormat::Table,
        );
        assert_exit(exit, 0);
        assert!(sink.stored.borrow().is_empty());
    }

    #[test]
    fn events_table_layout() {
        let events = vec![FailureEvent {
            company: "Acme Ltd".into(),
            ticker: "ACME".into(),
            location: FailureLocation::UpperBand,
            failure_time: ts(3),
            break_time: None,
            close_at_failure: Some(99.5),
        }];
        let mut buf = Vec::new();
        cli::write_events_table(&mut buf, &events).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("TICKER"));
        assert!(lines[1].starts_with("ACME"));
        assert!(lines[1].contains("Above → Below Upper Band"));
        assert!(lines[1].contains("2024-06-03T09:30:00"));
        assert!(lines[1].contains("99.50"));
        assert!(lines[1].ends_with("Acme Ltd"));
    }
}

mod commands {
    use super::*;

    fn write_bars_csv(dir: &Path, name: &str, bars: &[OhlcvBar]) {
        let mut content = String::from("datetime,open,high,low,close,volume\n");
        for b in bars {
            content.push_str(&format!(
                "{},{},{},{},{},{}\n",
                b.timestamp.format("%Y-%m-%d %H:%M:%S"),
                b.open,
                b.high,
                b.low,
                b.close,
                b.volume
            ));
        }
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn run(args: &[&str]) -> ExitCode {
        let mut argv = vec!["breakout"];
        argv.extend_from_slice(args);
        cli::run(Cli::parse_from(argv))
    }

    fn setup() -> (tempfile::TempDir, tempfile::NamedTempFile) {
        let dir = tempfile::TempDir::new().unwrap();
        write_bars_csv(dir.path(), "ACME.NS_5m.csv", &vrz_failure_series());
        let ini = format!(
            "[data]\npath = {bars}\ninterval = 5m\nperiod = 1d\n\n\
             [analysis]\nstrategy = vrz\ntickers = ACME:Acme Ltd\n\n\
             [vrz]\nk = 1.0\nwindow = 3\n\n\
             [sqlite]\npath = {db}\n",
            bars = dir.path().display(),
            db = dir.path().join("events.db").display(),
        );
        let config = write_temp_ini(&ini);
        (dir, config)
    }

    #[test]
    fn validate_accepts_good_config() {
        let (_dir, config) = setup();
        assert_exit(run(&["validate", "-c", config.path().to_str().unwrap()]), 0);
    }

    #[test]
    fn validate_rejects_bad_config() {
        let config = write_temp_ini("[data]\npath = bars\n[vrz]\nlookahead = 0\n");
        assert_exit(run(&["validate", "-c", config.path().to_str().unwrap()]), 2);
    }

    #[test]
    fn missing_config_file_is_config_error() {
        assert_exit(run(&["validate", "-c", "/nonexistent/breakout.ini"]), 2);
    }

    #[test]
    fn analyze_resolves_suffix_and_writes_events() {
        let (dir, config) = setup();
        let output = dir.path().join("out.csv");

        let exit = run(&[
            "analyze",
            "-c",
            config.path().to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);

        assert_exit(exit, 0);
        let csv = std::fs::read_to_string(&output).unwrap();
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("Acme Ltd,ACME,VRZ High,2024-06-03T10:35:00,2024-06-03T10:25:00"));
    }

    #[test]
    fn analyze_band_flag_overrides_strategy() {
        let (dir, config) = setup();
        let output = dir.path().join("band.csv");

        let exit = run(&[
            "analyze",
            "-c",
            config.path().to_str().unwrap(),
            "--strategy",
            "band",
            "--format",
            "json",
            "--output",
            output.to_str().unwrap(),
        ]);

        assert_exit(exit, 0);
        let csv = std::fs::read_to_string(&output).unwrap();
        assert!(csv.lines().skip(1).all(|l| !l.contains("VRZ")));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn save_is_idempotent_and_history_reads_back() {
        use breakout::adapters::sqlite_adapter::SqliteAdapter;

        let (dir, config) = setup();
        let config_path = config.path().to_str().unwrap();

        assert_exit(run(&["analyze", "-c", config_path, "--save"]), 0);
        assert_exit(run(&["analyze", "-c", config_path, "--save"]), 0);
        assert_exit(run(&["history", "-c", config_path, "--ticker", " ACME "]), 0);

        let ini = FileConfigAdapter::from_file(config.path()).unwrap();
        let store = SqliteAdapter::from_config(&ini).unwrap();
        let stored = store.fetch_failures(Some("ACME")).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].break_time, Some(ts(14)));
        drop(dir);
    }

    #[test]
    fn overlay_writes_one_row_per_bar() {
        let (dir, config) = setup();
        let output = dir.path().join("overlay.csv");

        let exit = run(&[
            "overlay",
            "-c",
            config.path().to_str().unwrap(),
            "--ticker",
            "ACME",
            "--output",
            output.to_str().unwrap(),
        ]);

        assert_exit(exit, 0);
        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(csv.lines().count(), 31);
        assert!(csv.starts_with("timestamp,close,true_range,atr,vwap,vrz_high,vrz_low"));
    }

    #[test]
    fn overlay_unknown_ticker_is_no_data() {
        let (dir, config) = setup();
        let output = dir.path().join("overlay.csv");
        let exit = run(&[
            "overlay",
            "-c",
            config.path().to_str().unwrap(),
            "--ticker",
            "NOPE",
            "--output",
            output.to_str().unwrap(),
        ]);
        assert_exit(exit, 5);
    }

    #[test]
    fn lower_case_symbol_files_are_analysed_as_listed() {
        let (dir, config) = setup();
        write_bars_csv(dir.path(), "acme.bo_5m.csv", &vrz_failure_series());
        let output = dir.path().join("lower.csv");

        let exit = run(&[
            "analyze",
            "-c",
            config.path().to_str().unwrap(),
            "--ticker",
            "acme.bo",
            "--output",
            output.to_str().unwrap(),
        ]);

        assert_exit(exit, 0);
        let csv = std::fs::read_to_string(&output).unwrap();
        assert!(csv.contains("acme.bo,acme.bo,VRZ High"));
    }

    #[test]
    fn list_symbols_and_info_succeed() {
        let (_dir, config) = setup();
        let config_path = config.path().to_str().unwrap();
        assert_exit(run(&["list-symbols", "-c", config_path]), 0);
        assert_exit(run(&["info", "-c", config_path, "--ticker", "ACME"]), 0);
    }
}
