//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::engine::{run_backtest, BacktestResult};
use crate::domain::error::TradesimError;
use crate::domain::params::{BacktestParams, StrategyParams, GRID_TRADING};
use crate::domain::validation::{
    validate_balance, validate_date, validate_limit, validate_symbol, DateBound,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_START_DATE: &str = "2022-01-01";
const DEFAULT_END_DATE: &str = "2099-12-31";
const DEFAULT_INITIAL_BALANCE: f64 = 10_000.0;
const MAX_DATA_LIMIT: i64 = 1000;

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Grid and RSI mean-reversion strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override the configured symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Override the configured start date (YYYY-MM-DD or ISO-8601)
        #[arg(long)]
        start: Option<String>,
        /// Override the configured end date (YYYY-MM-DD or ISO-8601)
        #[arg(long)]
        end: Option<String>,
        /// grid_trading or rsi_mean_reversion
        #[arg(long)]
        strategy: Option<String>,
        /// Override the configured initial balance
        #[arg(long)]
        balance: Option<f64>,
        /// Output path: a JSON file, or a directory with --csv
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write trades/equity/summary CSV files instead of one JSON document
        #[arg(long)]
        csv: bool,
    },
    /// List symbols available in the bar store
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the stored data range for a symbol
    Info {
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the most recent bars for a symbol
    Data {
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value_t = 100)]
        limit: i64,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Import bars from a directory of per-symbol CSV files into the store
    Import {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        dir: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Resolve and validate a config file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Flag overrides applied on top of the config file.
#[derive(Debug, Default)]
pub struct BacktestOverrides {
    pub symbol: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub strategy: Option<String>,
    pub balance: Option<f64>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            start,
            end,
            strategy,
            balance,
            output,
            csv,
        } => {
            let overrides = BacktestOverrides {
                symbol,
                start,
                end,
                strategy,
                balance,
            };
            run_backtest_command(&config, &overrides, output.as_deref(), csv)
        }
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { symbol, config } => run_info(&symbol, &config),
        Command::Data {
            symbol,
            limit,
            config,
        } => run_data(&symbol, limit, &config),
        Command::Import {
            symbol,
            dir,
            config,
        } => run_import(&symbol, &dir, &config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &std::path::Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TradesimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Resolve config values plus flag overrides into validated run parameters.
/// Defaulting happens here: missing dates fall back to a wide-open window
/// and the balance to 10000; only the symbol is required.
pub fn build_backtest_params(
    config: &dyn ConfigPort,
    overrides: &BacktestOverrides,
) -> Result<BacktestParams, TradesimError> {
    let symbol_raw = overrides
        .symbol
        .clone()
        .or_else(|| config.get_string("backtest", "symbol"))
        .ok_or_else(|| TradesimError::ConfigMissing {
            section: "backtest".into(),
            key: "symbol".into(),
        })?;
    let symbol = validate_symbol(&symbol_raw)?;

    let start_raw = overrides
        .start
        .clone()
        .or_else(|| config.get_string("backtest", "start_date"))
        .unwrap_or_else(|| DEFAULT_START_DATE.to_string());
    let end_raw = overrides
        .end
        .clone()
        .or_else(|| config.get_string("backtest", "end_date"))
        .unwrap_or_else(|| DEFAULT_END_DATE.to_string());
    let start = validate_date(&start_raw, DateBound::Start)?;
    let end = validate_date(&end_raw, DateBound::End)?;

    let balance_raw = overrides
        .balance
        .unwrap_or_else(|| config.get_double("backtest", "initial_balance", DEFAULT_INITIAL_BALANCE));
    let initial_balance = validate_balance(balance_raw)?;

    let strategy_type = overrides
        .strategy
        .clone()
        .or_else(|| config.get_string("backtest", "strategy_type"))
        .unwrap_or_else(|| GRID_TRADING.to_string());
    let strategy = StrategyParams::from_config(&strategy_type, config)?;

    Ok(BacktestParams {
        symbol,
        initial_balance,
        start,
        end,
        strategy,
    })
}

fn run_backtest_command(
    config_path: &std::path::Path,
    overrides: &BacktestOverrides,
    output: Option<&std::path::Path>,
    csv: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let params = match build_backtest_params(&config, overrides) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = match open_data_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Running {} backtest: {} from {} to {}",
        params.strategy.type_name(),
        params.symbol,
        params.start.date(),
        params.end.date(),
    );

    let result = match run_backtest(data_port.as_ref(), &params) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_summary(&params, &result);

    let write_result = if csv {
        let out = output.unwrap_or_else(|| std::path::Path::new("report"));
        CsvReportAdapter
            .write(&result, out)
            .map(|()| out.to_path_buf())
    } else {
        let out = output.unwrap_or_else(|| std::path::Path::new("backtest.json"));
        JsonReportAdapter
            .write(&result, out)
            .map(|()| out.to_path_buf())
    };

    match write_result {
        Ok(path) => {
            eprintln!("\nReport written to: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write report: {e}");
            (&e).into()
        }
    }
}

fn print_summary(params: &BacktestParams, result: &BacktestResult) {
    let summary = &result.summary;

    eprintln!("\n=== Backtest Summary ===");
    eprintln!("Symbol:            {}", summary.symbol);
    eprintln!("Strategy:          {}", params.strategy.type_name());
    eprintln!("Initial Balance:   {:.2}", summary.initial_balance);
    eprintln!("Final Value:       {:.2}", summary.final_account_value);
    eprintln!("Realized Profit:   {:.2}", summary.total_profit_realized);
    eprintln!("Cash Balance:      {:.2}", summary.current_cash_balance);
    if summary.unsold_shares > 0.0 {
        eprintln!(
            "Unsold Shares:     {:.6} (avg cost {:.2})",
            summary.unsold_shares, summary.average_price_unsold
        );
    }
    eprintln!("Peak Value:        {:.2}", summary.peak_value);
    match summary.min_equity_time {
        Some(at) => eprintln!("Min Equity:        {:.2} ({})", summary.min_equity, at),
        None => eprintln!("Min Equity:        {:.2}", summary.min_equity),
    }
    eprintln!(
        "Max Drawdown:      {:.2}% ({:.2})",
        summary.max_drawdown_percent, summary.max_drawdown_amount
    );
    eprintln!("Trades:            {}", result.trades.len());
    eprintln!("Equity Samples:    {}", result.equity_history.len());
}

fn run_list_symbols(config_path: &std::path::Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_port = match open_data_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let symbols = match data_port.list_symbols() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if symbols.is_empty() {
        eprintln!("No symbols found in the bar store");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_info(symbol: &str, config_path: &std::path::Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbol = match validate_symbol(symbol) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = match open_data_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match data_port.data_range(&symbol) {
        Ok(Some((min, max, count))) => {
            println!("{}: {} bars, {} to {}", symbol, count, min, max);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", symbol);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_data(symbol: &str, limit: i64, config_path: &std::path::Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbol = match validate_symbol(symbol) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let limit = match validate_limit(limit, MAX_DATA_LIMIT) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = match open_data_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let bars = match data_port.latest_bars(&symbol, limit as usize) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if bars.is_empty() {
        eprintln!("{}: no data found", symbol);
        return ExitCode::SUCCESS;
    }

    println!("datetime,open,high,low,close,volume");
    for bar in &bars {
        println!(
            "{},{},{},{},{},{}",
            bar.datetime.format("%Y-%m-%d %H:%M:%S"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        );
    }
    eprintln!("{} bars", bars.len());
    ExitCode::SUCCESS
}

fn run_import(symbol: &str, dir: &std::path::Path, config_path: &std::path::Path) -> ExitCode {
    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use chrono::NaiveDateTime;

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let symbol = match validate_symbol(symbol) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let source = CsvAdapter::new(dir.to_path_buf());
        let bars = match source.fetch_bars(&symbol, NaiveDateTime::MIN, NaiveDateTime::MAX) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        if bars.is_empty() {
            eprintln!("No bars found for {} in {}", symbol, dir.display());
            return ExitCode::SUCCESS;
        }

        let store = match SqliteAdapter::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        if let Err(e) = store.initialize_schema().and_then(|()| store.insert_bars(&bars)) {
            eprintln!("error: {e}");
            return (&e).into();
        }

        eprintln!("Imported {} bars for {}", bars.len(), symbol);
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (symbol, dir, config_path);
        eprintln!("error: sqlite feature is required for import");
        ExitCode::from(1)
    }
}

fn run_validate(config_path: &std::path::Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let params = match build_backtest_params(&config, &BacktestOverrides::default()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nResolved parameters:");
    eprintln!("  symbol:           {}", params.symbol);
    eprintln!("  initial_balance:  {:.2}", params.initial_balance);
    eprintln!("  window:           {} to {}", params.start, params.end);
    eprintln!("  strategy:         {}", params.strategy.type_name());
    match params.strategy {
        StrategyParams::Grid(p) => {
            eprintln!("  move_down:        {}%", p.move_down_percent);
            eprintln!("  move_up:          {}%", p.move_up_percent);
            eprintln!("  amount_to_buy:    {:.2}", p.amount_to_buy);
        }
        StrategyParams::RsiMeanReversion(p) => {
            eprintln!("  period:           {}", p.period);
            eprintln!("  oversold:         {}", p.oversold_threshold);
            eprintln!("  overbought:       {}", p.overbought_threshold);
        }
    }

    eprintln!("\nConfig is valid");
    ExitCode::SUCCESS
}

/// Pick the bar store adapter from the config. A `[postgres]` section wins
/// when the feature is compiled in; otherwise the sqlite store is used.
fn open_data_port(config: &FileConfigAdapter) -> Result<Box<dyn DataPort>, TradesimError> {
    #[cfg(feature = "postgres")]
    {
        use crate::adapters::postgres_adapter::PostgresAdapter;
        if config.get_string("postgres", "connection_string").is_some() {
            return Ok(Box::new(PostgresAdapter::from_config(config)?));
        }
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        return Ok(Box::new(SqliteAdapter::from_config(config)?));
    }

    #[cfg(not(feature = "sqlite"))]
    {
        if let Some(dir) = config.get_string("csv", "path") {
            return Ok(Box::new(CsvAdapter::new(std::path::PathBuf::from(dir))));
        }
        Err(TradesimError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        })
    }
}
