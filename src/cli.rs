//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_bar_adapter::CsvBarSource;
use crate::adapters::csv_sink_adapter::{CsvSummaryWriter, CsvTradeLog};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, BacktestResult};
use crate::domain::engine::StrategyParams;
use crate::domain::error::MeanrevError;
use crate::domain::session::{segment_sessions, MarketHours};
use crate::ports::bar_port::BarSource;
use crate::ports::config_port::ConfigPort;
use crate::ports::sink_port::{SummarySink, TradeLogSink};

#[derive(Parser, Debug)]
#[command(name = "meanrev", about = "Minute-bar RSI mean-reversion backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a CSV of minute bars
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Minute-bar CSV (timestamp,open,high,low,close,volume)
        #[arg(short, long)]
        data: PathBuf,
        /// Trade log output path
        #[arg(long, default_value = "trades.csv")]
        trades: PathBuf,
        /// Per-session summary output path
        #[arg(long, default_value = "summary.csv")]
        summary: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            trades,
            summary,
            symbol,
        } => run_backtest_cmd(&config, &data, &trades, &summary, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = MeanrevError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn build_strategy_params(config: &dyn ConfigPort) -> Result<StrategyParams, MeanrevError> {
    // Checked before the usize cast: a negative period must not wrap.
    let rsi_period = config.get_int("strategy", "rsi_period", 14);
    if rsi_period < 2 {
        return Err(MeanrevError::ConfigInvalid {
            section: "strategy".into(),
            key: "rsi_period".into(),
            reason: "must be at least 2".into(),
        });
    }
    let params = StrategyParams {
        rsi_period: rsi_period as usize,
        entry_threshold: config.get_double("strategy", "entry_threshold", 20.0),
        exit_threshold: config.get_double("strategy", "exit_threshold", 65.0),
        stop_pct: config.get_double("strategy", "stop_pct", 0.02),
        min_hold_minutes: config.get_int("strategy", "min_hold_minutes", 0),
    };
    params.validate()?;
    Ok(params)
}

pub fn build_market_hours(config: &dyn ConfigPort) -> Result<MarketHours, MeanrevError> {
    let open = config
        .get_string("market", "open")
        .unwrap_or_else(|| "09:30".to_string());
    let close = config
        .get_string("market", "close")
        .unwrap_or_else(|| "16:00".to_string());
    let timezone = config
        .get_string("market", "timezone")
        .unwrap_or_else(|| "America/New_York".to_string());
    MarketHours::new(&open, &close, &timezone)
}

pub fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, MeanrevError> {
    if let Some(s) = symbol_override {
        return Ok(s.to_uppercase());
    }
    config
        .get_string("strategy", "symbol")
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MeanrevError::ConfigMissing {
            section: "strategy".into(),
            key: "symbol".into(),
        })
}

pub fn build_date_range(
    config: &dyn ConfigPort,
) -> Result<(NaiveDate, NaiveDate), MeanrevError> {
    let parse = |key: &str, default: NaiveDate| -> Result<NaiveDate, MeanrevError> {
        match config.get_string("backtest", key) {
            Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                MeanrevError::ConfigInvalid {
                    section: "backtest".into(),
                    key: key.into(),
                    reason: "invalid date format (expected YYYY-MM-DD)".into(),
                }
            }),
            None => Ok(default),
        }
    };

    let start = parse("start_date", NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())?;
    let end = parse("end_date", NaiveDate::from_ymd_opt(9999, 12, 31).unwrap())?;
    if end < start {
        return Err(MeanrevError::ConfigInvalid {
            section: "backtest".into(),
            key: "end_date".into(),
            reason: "end_date is before start_date".into(),
        });
    }
    Ok((start, end))
}

fn run_backtest_cmd(
    config_path: &PathBuf,
    data_path: &PathBuf,
    trades_path: &PathBuf,
    summary_path: &PathBuf,
    symbol_override: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let params = match build_strategy_params(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let hours = match build_market_hours(&adapter) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let symbol = match resolve_symbol(symbol_override, &adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let (start, end) = match build_date_range(&adapter) {
        Ok(range) => range,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Backtesting {symbol}: RSI({}) buy<{} sell>{} stop={:.1}%",
        params.rsi_period,
        params.entry_threshold,
        params.exit_threshold,
        params.stop_pct * 100.0,
    );

    let result = match load_and_replay(data_path, &symbol, start, end, &hours, &params) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\n=== Per-Session Results ===");
    for session in &result.sessions {
        let s = &session.summary;
        let pnl_sign = if s.total_pnl >= 0.0 { "+" } else { "" };
        eprintln!(
            "  {}:  {} trades, {:.0}% win rate, {pnl_sign}{:.2}, max dd {:.2}%",
            s.date,
            s.trade_count,
            s.win_rate * 100.0,
            s.total_pnl,
            s.max_drawdown * 100.0,
        );
    }
    eprintln!(
        "\nTotal: {} trades, {:+.2} across {} sessions",
        result.trade_count(),
        result.total_pnl(),
        result.sessions.len(),
    );

    match write_outputs(&result, trades_path, summary_path) {
        Ok(()) => {
            eprintln!(
                "Saved trades -> {}, summaries -> {}",
                trades_path.display(),
                summary_path.display(),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn load_and_replay(
    data_path: &PathBuf,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    hours: &MarketHours,
    params: &StrategyParams,
) -> Result<BacktestResult, MeanrevError> {
    let source = CsvBarSource::new(data_path.clone(), hours.timezone);
    let bars = source.fetch_bars(symbol, start, end)?;
    if bars.is_empty() {
        return Err(MeanrevError::NoData {
            symbol: symbol.to_string(),
        });
    }
    let sessions = segment_sessions(bars, hours)?;
    eprintln!("  Processing: {} sessions", sessions.len());
    run_backtest(sessions, params)
}

fn write_outputs(
    result: &BacktestResult,
    trades_path: &PathBuf,
    summary_path: &PathBuf,
) -> Result<(), MeanrevError> {
    let all_trades: Vec<_> = result
        .sessions
        .iter()
        .flat_map(|s| s.trades.iter().cloned())
        .collect();
    CsvTradeLog::new(trades_path.clone()).write_trades(&all_trades)?;
    let summaries: Vec<_> = result.sessions.iter().map(|s| s.summary.clone()).collect();
    CsvSummaryWriter::new(summary_path.clone()).write_summaries(&summaries)?;
    Ok(())
}

fn check_config(
    adapter: &FileConfigAdapter,
) -> Result<(String, StrategyParams, MarketHours), MeanrevError> {
    let symbol = resolve_symbol(None, adapter)?;
    let params = build_strategy_params(adapter)?;
    let hours = build_market_hours(adapter)?;
    build_date_range(adapter)?;
    Ok((symbol, params, hours))
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match check_config(&adapter) {
        Ok((symbol, params, hours)) => {
            eprintln!("  symbol:    {symbol}");
            eprintln!(
                "  strategy:  RSI({}) buy<{} sell>{} stop={:.1}% min_hold={}m",
                params.rsi_period,
                params.entry_threshold,
                params.exit_threshold,
                params.stop_pct * 100.0,
                params.min_hold_minutes,
            );
            eprintln!(
                "  market:    {}-{} {}",
                hours.open, hours.close, hours.timezone,
            );
            eprintln!("\nConfiguration is valid");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
