//! CLI integration tests.
//!
//! Tests cover:
//! - Config loading into backtest settings, universe and strategies
//! - Validation errors surfaced with the offending key
//! - The backtest pipeline over a mock data port, including strategy isolation
//! - End-to-end `backtest`, `validate` and `info` runs over a CSV cache on disk

mod common;

use chrono::NaiveDate;
use common::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use weightbt::adapters::file_config_adapter::FileConfigAdapter;
use weightbt::cli::{self, Cli, Command, StrategySelection};
use weightbt::domain::error::BacktestError;
use weightbt::domain::strategy::{LowVolParams, MomentumParams, SmaParams, Strategy};

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[data]
cache_dir = data
start_date = 2023-01-01
end_date = 2024-06-30
assets = 510300.sh, 510500.SH,159915.SZ
baseline = 510300.SH

[backtest]
cost_bps = 5
periods_per_year = 250
risk_free_rate = 0.02

[sma]
short = 10
long = 30

[momentum]
lookback = 6
skip = 1
top_n = 1

[lowvol]
lookback = 40
top_n = 2

[report]
output_dir = results
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();

        assert!((config.cost_bps - 5.0).abs() < f64::EPSILON);
        assert!((config.periods_per_year - 250.0).abs() < f64::EPSILON);
        assert!((config.risk_free_rate - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn build_backtest_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();

        assert!((config.cost_bps - 10.0).abs() < f64::EPSILON);
        assert!((config.periods_per_year - 252.0).abs() < f64::EPSILON);
        assert!(config.risk_free_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn build_backtest_config_rejects_negative_cost() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ncost_bps = -1\n").unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "cost_bps"));
    }

    #[test]
    fn build_backtest_config_rejects_unparseable_rate() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nrisk_free_rate = two percent\n").unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "risk_free_rate"));
    }

    #[test]
    fn build_universe_normalizes_codes() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let universe = cli::build_universe(&adapter).unwrap();

        assert_eq!(universe.assets, vec!["510300.SH", "510500.SH", "159915.SZ"]);
        assert_eq!(universe.baseline, "510300.SH");
        assert_eq!(universe.start_date, date(2023, 1, 1));
        assert_eq!(universe.end_date, date(2024, 6, 30));
    }

    #[test]
    fn build_universe_rejects_unknown_instrument() {
        let ini = VALID_INI.replace("assets = 510300.sh,", "assets = AAPL,");
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let err = cli::build_universe(&adapter).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, reason, .. }
            if key == "assets" && reason.contains("AAPL")));
    }

    #[test]
    fn build_universe_missing_assets() {
        let ini = "[data]\nstart_date = 2023-01-01\nend_date = 2024-01-01\nbaseline = 510300.SH\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_universe(&adapter).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigMissing { key, .. } if key == "assets"));
    }

    #[test]
    fn build_universe_rejects_reversed_window() {
        let ini = VALID_INI.replace("end_date = 2024-06-30", "end_date = 2022-06-30");
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let err = cli::build_universe(&adapter).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { .. }));
    }

    #[test]
    fn build_strategies_reads_parameters() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let strategies = cli::build_strategies(&adapter, StrategySelection::All).unwrap();

        assert_eq!(
            strategies,
            vec![
                Strategy::SmaCrossover(SmaParams { short: 10, long: 30 }),
                Strategy::Momentum(MomentumParams {
                    lookback: 6,
                    skip: 1,
                    top_n: 1
                }),
                Strategy::LowVolatility(LowVolParams {
                    lookback: 40,
                    top_n: 2
                }),
            ]
        );
    }

    #[test]
    fn build_strategies_single_selection_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[data]\n").unwrap();
        let strategies = cli::build_strategies(&adapter, StrategySelection::Lowvol).unwrap();
        assert_eq!(
            strategies,
            vec![Strategy::LowVolatility(LowVolParams::default())]
        );
    }

    #[test]
    fn build_strategies_rejects_inverted_windows() {
        let ini = "[sma]\nshort = 30\nlong = 10\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_strategies(&adapter, StrategySelection::Sma).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { section, .. } if section == "sma"));
    }

    #[test]
    fn output_dir_flag_overrides_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert_eq!(cli::output_dir(&adapter, None), PathBuf::from("results"));
        assert_eq!(
            cli::output_dir(&adapter, Some(Path::new("elsewhere"))),
            PathBuf::from("elsewhere")
        );

        let bare = FileConfigAdapter::from_string("[data]\n").unwrap();
        assert_eq!(cli::output_dir(&bare, None), PathBuf::from("output"));
    }

    #[test]
    fn load_config_missing_file() {
        let err = cli::load_config(Path::new("/nonexistent/weightbt.ini")).err().unwrap();
        assert!(matches!(err, BacktestError::ConfigParse { .. }));
    }
}

mod pipeline {
    use super::*;
    use weightbt::domain::backtest::BacktestConfig;
    use weightbt::domain::universe::Universe;

    /// Two years of daily bars: a steady riser, a choppy one and a flat one.
    fn port() -> MockDataPort {
        let n = 500;
        let riser: Vec<f64> = (0..n).map(|i| 100.0 + 0.1 * i as f64).collect();
        let choppy: Vec<f64> = (0..n)
            .map(|i| 50.0 + if i % 3 == 0 { 2.0 } else { -1.0 })
            .collect();
        let flat = vec![10.0; n];
        MockDataPort::new()
            .with_bars("510300.SH", bars_from_closes("510300.SH", "2023-01-01", &riser))
            .with_bars("510500.SH", bars_from_closes("510500.SH", "2023-01-01", &choppy))
            .with_bars("159915.SZ", bars_from_closes("159915.SZ", "2023-01-01", &flat))
    }

    fn universe() -> Universe {
        Universe {
            assets: vec![
                "510300.SH".to_string(),
                "510500.SH".to_string(),
                "159915.SZ".to_string(),
            ],
            baseline: "510300.SH".to_string(),
            start_date: date(2023, 1, 1),
            end_date: date(2024, 12, 31),
        }
    }

    fn all_strategies() -> Vec<Strategy> {
        vec![
            Strategy::SmaCrossover(SmaParams { short: 5, long: 20 }),
            Strategy::Momentum(MomentumParams {
                lookback: 3,
                skip: 1,
                top_n: 1,
            }),
            Strategy::LowVolatility(LowVolParams {
                lookback: 30,
                top_n: 1,
            }),
        ]
    }

    #[test]
    fn runs_every_strategy_and_writes_reports() {
        let out = tempfile::tempdir().unwrap();
        let runs = cli::run_backtest_pipeline(
            &port(),
            &universe(),
            &all_strategies(),
            &BacktestConfig::default(),
            out.path(),
        )
        .unwrap();

        assert_eq!(runs.len(), 3);
        for run in &runs {
            assert_eq!(run.result.len(), 500);
            assert!(run.benchmark_nav.is_some());
        }
        for name in [
            "reports/sma_results.csv",
            "reports/momentum_weights.csv",
            "reports/lowvol_summary.csv",
            "reports/overview_summary.csv",
            "figures/sma_equity.svg",
            "figures/lowvol_monthly_heatmap.svg",
        ] {
            assert!(out.path().join(name).exists(), "{name}");
        }
    }

    #[test]
    fn low_volatility_holds_the_flat_asset() {
        let out = tempfile::tempdir().unwrap();
        let runs = cli::run_backtest_pipeline(
            &port(),
            &universe(),
            &all_strategies()[2..],
            &BacktestConfig::default(),
            out.path(),
        )
        .unwrap();

        let weights = &runs[0].weights;
        let last = weights.len() - 1;
        let flat = weights.column_position("159915.SZ").unwrap();
        assert_eq!(weights.value(last, flat), 1.0);
    }

    #[test]
    fn missing_baseline_only_fails_the_crossover() {
        let out = tempfile::tempdir().unwrap();
        let mut universe = universe();
        universe.baseline = "588000.SH".to_string();

        let runs = cli::run_backtest_pipeline(
            &port(),
            &universe,
            &all_strategies(),
            &BacktestConfig::default(),
            out.path(),
        )
        .unwrap();

        let slugs: Vec<&str> = runs.iter().map(|r| r.strategy.slug()).collect();
        assert_eq!(slugs, vec!["momentum", "lowvol"]);
        assert!(runs.iter().all(|r| r.benchmark_nav.is_none()));
        assert!(!out.path().join("reports/sma_results.csv").exists());
    }

    #[test]
    fn fails_when_every_strategy_fails() {
        let out = tempfile::tempdir().unwrap();
        let port = MockDataPort::new().with_error("510300.SH", "timeout");

        let err = cli::run_backtest_pipeline(
            &port,
            &universe(),
            &all_strategies()[..1],
            &BacktestConfig::default(),
            out.path(),
        )
        .unwrap_err();

        assert!(matches!(err, BacktestError::DataSource { .. }));
    }
}

mod end_to_end {
    use super::*;

    fn write_cache(dir: &Path, code: &str, start: NaiveDate, closes: &[f64]) {
        fs::create_dir_all(dir).unwrap();
        let mut content = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
        for (i, close) in closes.iter().enumerate() {
            let day = start + chrono::Duration::days(i as i64);
            content.push_str(&format!("{day},{close},{close},{close},{close},{close},1000\n"));
        }
        fs::write(dir.join(format!("{code}.csv")), content).unwrap();
    }

    fn config_file(root: &Path, extra_data: &str) -> PathBuf {
        let ini = format!(
            "[data]\ncache_dir = {}\nstart_date = 2023-01-01\nend_date = 2023-12-31\n\
             assets = 510300.SH,159915.SZ\nbaseline = 510300.SH\n{extra_data}\n\
             [sma]\nshort = 5\nlong = 20\n\n[lowvol]\nlookback = 20\ntop_n = 1\n\n\
             [momentum]\nlookback = 3\nskip = 1\ntop_n = 1\n\n\
             [report]\noutput_dir = {}\n",
            root.join("cache").display(),
            root.join("out").display(),
        );
        let path = root.join("weightbt.ini");
        fs::write(&path, ini).unwrap();
        path
    }

    fn seed(dir: &Path) {
        let rising: Vec<f64> = (0..365).map(|i| 3.0 + 0.01 * i as f64).collect();
        let falling: Vec<f64> = (0..365).map(|i| 2.0 - 0.001 * i as f64).collect();
        write_cache(dir, "510300.SH", date(2023, 1, 1), &rising);
        write_cache(dir, "159915.SZ", date(2023, 1, 1), &falling);
    }

    #[test]
    fn backtest_writes_reports_under_configured_output() {
        let root = tempfile::tempdir().unwrap();
        seed(&root.path().join("cache"));
        let config = config_file(root.path(), "");

        cli::execute(Cli {
            verbose: 0,
            command: Command::Backtest {
                config,
                strategy: StrategySelection::All,
                output: None,
            },
        })
        .unwrap();

        let out = root.path().join("out");
        assert!(out.join("reports/overview_summary.csv").exists());
        assert!(out.join("figures/momentum_excess.svg").exists());
        let summary = fs::read_to_string(out.join("reports/overview_summary.csv")).unwrap();
        assert_eq!(summary.lines().count(), 4);
    }

    #[test]
    fn backtest_copies_source_into_cache() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("source");
        seed(&source);
        let config = config_file(root.path(), &format!("source_dir = {}", source.display()));

        cli::execute(Cli {
            verbose: 0,
            command: Command::Backtest {
                config,
                strategy: StrategySelection::Sma,
                output: Some(root.path().join("flag_out")),
            },
        })
        .unwrap();

        assert!(root.path().join("cache/510300.SH.csv").exists());
        assert!(root.path().join("flag_out/reports/sma_results.csv").exists());
        assert!(!root.path().join("out").exists());
    }

    #[test]
    fn backtest_without_cache_is_no_data() {
        let root = tempfile::tempdir().unwrap();
        let config = config_file(root.path(), "");

        let err = cli::execute(Cli {
            verbose: 0,
            command: Command::Backtest {
                config,
                strategy: StrategySelection::All,
                output: None,
            },
        })
        .unwrap_err();

        assert!(matches!(err, BacktestError::NoData { .. }));
    }

    #[test]
    fn validate_accepts_good_config() {
        let file = write_temp_ini(VALID_INI);
        cli::execute(Cli {
            verbose: 0,
            command: Command::Validate {
                config: file.path().to_path_buf(),
            },
        })
        .unwrap();
    }

    #[test]
    fn validate_reports_config_error_class() {
        let file = write_temp_ini(&VALID_INI.replace("top_n = 2", "top_n = 0"));
        let err = cli::execute(Cli {
            verbose: 0,
            command: Command::Validate {
                config: file.path().to_path_buf(),
            },
        })
        .unwrap_err();

        assert!(matches!(err, BacktestError::ConfigInvalid { section, .. } if section == "lowvol"));
    }

    #[test]
    fn info_reports_cached_ranges() {
        let root = tempfile::tempdir().unwrap();
        seed(&root.path().join("cache"));
        let config = config_file(root.path(), "");

        cli::execute(Cli {
            verbose: 0,
            command: Command::Info {
                config: config.clone(),
                code: Some("159915.sz".to_string()),
            },
        })
        .unwrap();

        let err = cli::execute(Cli {
            verbose: 0,
            command: Command::Info {
                config,
                code: Some("BHP".to_string()),
            },
        })
        .unwrap_err();
        assert!(matches!(err, BacktestError::UnknownInstrument { .. }));
    }

    #[test]
    fn info_without_code_covers_the_configured_universe() {
        let root = tempfile::tempdir().unwrap();
        seed(&root.path().join("cache"));
        let config = config_file(root.path(), "");

        cli::execute(Cli {
            verbose: 0,
            command: Command::Info { config, code: None },
        })
        .unwrap();
    }

    #[test]
    fn info_without_code_rejects_a_bad_universe() {
        let root = tempfile::tempdir().unwrap();
        seed(&root.path().join("cache"));
        let path = root.path().join("weightbt.ini");
        fs::write(
            &path,
            format!(
                "[data]\ncache_dir = {}\nstart_date = 2023-01-01\nend_date = 2023-12-31\n\
                 assets = 510300.SH,AAPL\nbaseline = 510300.SH\n",
                root.path().join("cache").display()
            ),
        )
        .unwrap();

        let err = cli::execute(Cli {
            verbose: 0,
            command: Command::Info { config: path, code: None },
        })
        .unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { .. }));
    }
}
