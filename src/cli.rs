//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::adapters::caching_adapter::CachingDataPort;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_report::SvgReportAdapter;
use crate::domain::backtest::BacktestConfig;
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_config, validate_data_config,
    validate_strategy_config,
};
use crate::domain::error::BacktestError;
use crate::domain::frame::Frame;
use crate::domain::run::{StrategyRun, run_strategy};
use crate::domain::strategy::{LowVolParams, MomentumParams, SmaParams, Strategy};
use crate::domain::universe::{Universe, parse_codes, validate_instrument_id};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "weightbt", about = "Weight-based portfolio backtester")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one or all strategies and write reports
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, value_enum, default_value_t = StrategySelection::All)]
        strategy: StrategySelection,
        /// Output directory; overrides [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the cached data range of each instrument
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategySelection {
    Sma,
    Momentum,
    Lowvol,
    All,
}

pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), BacktestError> {
    match cli.command {
        Command::Backtest {
            config,
            strategy,
            output,
        } => run_backtest(&config, strategy, output.as_deref()).map(|_| ()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, code } => run_info(&config, code.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BacktestError> {
    FileConfigAdapter::from_file(path)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    validate_backtest_config(config)?;
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        cost_bps: config.get_double("backtest", "cost_bps", defaults.cost_bps),
        periods_per_year: config.get_double(
            "backtest",
            "periods_per_year",
            defaults.periods_per_year,
        ),
        risk_free_rate: config.get_double("backtest", "risk_free_rate", defaults.risk_free_rate),
    })
}

pub fn build_universe(config: &dyn ConfigPort) -> Result<Universe, BacktestError> {
    validate_data_config(config)?;

    let raw_assets = config.get_string("data", "assets").unwrap_or_default();
    let assets = parse_codes(&raw_assets)?
        .iter()
        .map(|code| validate_instrument_id(code))
        .collect::<Result<Vec<_>, _>>()?;
    let baseline = validate_instrument_id(
        &config.get_string("data", "baseline").unwrap_or_default(),
    )?;

    Ok(Universe {
        assets,
        baseline,
        start_date: parse_date(config, "start_date")?,
        end_date: parse_date(config, "end_date")?,
    })
}

/// Integer key already checked non-negative by validation.
fn get_usize(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    usize::try_from(config.get_int(section, key, default as i64)).unwrap_or(default)
}

pub fn build_strategies(
    config: &dyn ConfigPort,
    selection: StrategySelection,
) -> Result<Vec<Strategy>, BacktestError> {
    validate_strategy_config(config)?;

    let sma = SmaParams::default();
    let momentum = MomentumParams::default();
    let lowvol = LowVolParams::default();

    let sma = Strategy::SmaCrossover(SmaParams {
        short: get_usize(config, "sma", "short", sma.short),
        long: get_usize(config, "sma", "long", sma.long),
    });
    let momentum = Strategy::Momentum(MomentumParams {
        lookback: get_usize(config, "momentum", "lookback", momentum.lookback),
        skip: get_usize(config, "momentum", "skip", momentum.skip),
        top_n: get_usize(config, "momentum", "top_n", momentum.top_n),
    });
    let lowvol = Strategy::LowVolatility(LowVolParams {
        lookback: get_usize(config, "lowvol", "lookback", lowvol.lookback),
        top_n: get_usize(config, "lowvol", "top_n", lowvol.top_n),
    });

    Ok(match selection {
        StrategySelection::Sma => vec![sma],
        StrategySelection::Momentum => vec![momentum],
        StrategySelection::Lowvol => vec![lowvol],
        StrategySelection::All => vec![sma, momentum, lowvol],
    })
}

/// The local cache, read through to `[data] source_dir` when one is set.
pub fn build_data_port(config: &dyn ConfigPort) -> Box<dyn DataPort> {
    let cache_dir = config
        .get_string("data", "cache_dir")
        .unwrap_or_else(|| "data".to_string());
    let cache = CsvAdapter::new(PathBuf::from(cache_dir));

    match config.get_string("data", "source_dir") {
        Some(source) => Box::new(CachingDataPort::new(
            cache,
            CsvAdapter::new(PathBuf::from(source)),
        )),
        None => Box::new(cache),
    }
}

pub fn output_dir(config: &dyn ConfigPort, override_dir: Option<&Path>) -> PathBuf {
    match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from(
            config
                .get_string("report", "output_dir")
                .unwrap_or_else(|| "output".to_string()),
        ),
    }
}

fn run_backtest(
    config_path: &Path,
    selection: StrategySelection,
    output: Option<&Path>,
) -> Result<Vec<StrategyRun>, BacktestError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let universe = build_universe(&config)?;
    let bt_config = build_backtest_config(&config)?;
    let strategies = build_strategies(&config, selection)?;
    let data_port = build_data_port(&config);
    let output_dir = output_dir(&config, output);

    run_backtest_pipeline(
        data_port.as_ref(),
        &universe,
        &strategies,
        &bt_config,
        &output_dir,
    )
}

fn format_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn format_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn print_summary(run: &StrategyRun) {
    let m = &run.metrics;
    eprintln!("\n=== {} ===", run.strategy);
    eprintln!("Annualized:       {}", format_pct(m.annualized_return));
    eprintln!("Volatility:       {}", format_pct(m.annualized_volatility));
    eprintln!("Sharpe Ratio:     {}", format_ratio(m.sharpe_ratio));
    eprintln!("Max Drawdown:     {}", format_pct(m.max_drawdown));
    eprintln!("Calmar Ratio:     {}", format_ratio(m.calmar_ratio));
    eprintln!("Win Rate:         {}", format_pct(m.win_rate));
    eprintln!("Avg Turnover:     {}", format_pct(m.avg_turnover));
    eprintln!("Final NAV:        {}", format_ratio(run.result.final_nav()));
}

/// Run every strategy independently against `data_port` and write reports
/// under `output_dir`. A failing strategy is reported and skipped; the
/// pipeline fails only when none succeeds.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    universe: &Universe,
    strategies: &[Strategy],
    bt_config: &BacktestConfig,
    output_dir: &Path,
) -> Result<Vec<StrategyRun>, BacktestError> {
    eprintln!(
        "Running backtest: {} assets, baseline {}, {} to {}",
        universe.count(),
        universe.baseline,
        universe.start_date,
        universe.end_date
    );

    let baseline = data_port.get_series(&universe.baseline, universe.start_date, universe.end_date);
    if let Err(e) = &baseline {
        warn!(baseline = %universe.baseline, error = %e, "baseline unavailable");
    }
    let panel = if strategies.iter().any(Strategy::is_cross_sectional) {
        Some(data_port.get_panel(&universe.assets, universe.start_date, universe.end_date))
    } else {
        None
    };

    let reporters: [&dyn ReportPort; 2] = [&CsvReportAdapter, &SvgReportAdapter];
    let mut runs = Vec::new();
    let mut first_error = None;

    for strategy in strategies {
        info!(strategy = strategy.slug(), "running");
        let outcome = run_one(strategy, baseline.as_ref(), panel.as_ref(), bt_config)
            .and_then(|run| {
                let mut files = Vec::new();
                for reporter in reporters {
                    files.extend(reporter.write_run(&run, output_dir)?);
                }
                Ok((run, files))
            });

        match outcome {
            Ok((run, files)) => {
                print_summary(&run);
                for file in files {
                    eprintln!("  wrote {}", file.display());
                }
                runs.push(run);
            }
            Err(e) => {
                warn!(strategy = strategy.slug(), error = %e, "strategy failed");
                eprintln!("warning: {} failed: {e}", strategy);
                first_error.get_or_insert(e);
            }
        }
    }

    if runs.is_empty() {
        return Err(first_error.unwrap_or_else(|| BacktestError::invalid_input("no strategies selected")));
    }

    for reporter in reporters {
        for file in reporter.write_overview(&runs, output_dir)? {
            eprintln!("\nOverview written to: {}", file.display());
        }
    }
    Ok(runs)
}

/// Prices for one strategy: the baseline alone for the crossover, the asset
/// panel for the cross-sectional strategies. The baseline doubles as the
/// benchmark.
fn run_one(
    strategy: &Strategy,
    baseline: Result<&Frame, &BacktestError>,
    panel: Option<&Result<Frame, BacktestError>>,
    bt_config: &BacktestConfig,
) -> Result<StrategyRun, BacktestError> {
    let unavailable = |what: &str, e: &BacktestError| match e {
        BacktestError::NoData { code } => BacktestError::NoData { code: code.clone() },
        other => BacktestError::DataSource {
            reason: format!("{what} unavailable: {other}"),
        },
    };

    if !strategy.is_cross_sectional() {
        let prices = baseline.map_err(|e| unavailable("baseline", e))?;
        return run_strategy(strategy, prices, Some(prices), bt_config);
    }

    let prices = match panel {
        Some(Ok(panel)) => panel,
        Some(Err(e)) => return Err(unavailable("asset panel", e)),
        None => return Err(BacktestError::invalid_input("asset panel was not loaded")),
    };
    run_strategy(strategy, prices, baseline.ok(), bt_config)
}

fn run_validate(config_path: &Path) -> Result<(), BacktestError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let universe = build_universe(&config)?;
    let bt_config = build_backtest_config(&config)?;
    let strategies = build_strategies(&config, StrategySelection::All)?;

    eprintln!("Config OK");
    eprintln!(
        "  Window:     {} to {}",
        universe.start_date, universe.end_date
    );
    eprintln!("  Assets:     {}", universe.assets.join(", "));
    eprintln!("  Baseline:   {}", universe.baseline);
    eprintln!(
        "  Cost:       {} bps, {} periods/year, rf {}",
        bt_config.cost_bps, bt_config.periods_per_year, bt_config.risk_free_rate
    );
    for strategy in &strategies {
        eprintln!("  Strategy:   {strategy}");
    }
    Ok(())
}

fn run_info(config_path: &Path, code: Option<&str>) -> Result<(), BacktestError> {
    let config = load_config(config_path)?;

    let codes = match code {
        Some(c) => vec![validate_instrument_id(c)?],
        None => build_universe(&config)?.all_codes(),
    };

    let data_port = build_data_port(&config);
    for c in &codes {
        match data_port.get_data_range(c)? {
            Some((first, last, count)) => eprintln!("{c}: {count} bars, {first} to {last}"),
            None => eprintln!("{c}: no data found"),
        }
    }
    Ok(())
}
