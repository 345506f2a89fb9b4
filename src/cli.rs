//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_bar_adapter::CsvBarAdapter;
use crate::adapters::csv_signal_adapter::CsvSignalSink;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    backtest_dates, build_orb_config, market_timezone, session_times, validate_backtest_config,
    validate_scanner_config,
};
use crate::domain::error::OrbscanError;
use crate::domain::metrics::BacktestSummary;
use crate::domain::replay::{replay_watchlist, BacktestTrade, ReplayResult};
use crate::domain::state_machine::{OrbConfig, SessionState};
use crate::domain::watchlist::{parse_symbols, validate_watchlist};
use crate::ports::bar_port::BarPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::signal_sink::SignalSink;

#[derive(Parser, Debug)]
#[command(name = "orbscan", about = "Opening range breakout scanner and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay the watchlist over a historical date range
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Run a single symbol instead of the configured watchlist
        #[arg(long)]
        symbol: Option<String>,
        /// Write closed trades to a CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Scan one trading day and log any signals
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Trading day to scan, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the bar data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            output,
        } => run_backtest(&config, symbol.as_deref(), output.as_ref()),
        Command::Scan { config, date } => run_scan(&config, date),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = OrbscanError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn bars_dir(config: &dyn ConfigPort) -> Result<PathBuf, OrbscanError> {
    config
        .get_string("data", "bars_dir")
        .map(PathBuf::from)
        .ok_or_else(|| OrbscanError::ConfigMissing {
            section: "data".to_string(),
            key: "bars_dir".to_string(),
        })
}

pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, OrbscanError> {
    if let Some(s) = symbol_override {
        return Ok(vec![s.to_uppercase()]);
    }
    let symbols_str =
        config
            .get_string("scanner", "symbols")
            .ok_or_else(|| OrbscanError::ConfigMissing {
                section: "scanner".to_string(),
                key: "symbols".to_string(),
            })?;
    parse_symbols(&symbols_str).map_err(|e| OrbscanError::ConfigInvalid {
        section: "scanner".to_string(),
        key: "symbols".to_string(),
        reason: e.to_string(),
    })
}

fn run_backtest(
    config_path: &PathBuf,
    symbol_override: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 2: Build scanner config and date range
    let orb_config = match build_orb_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let (start_date, end_date) = match backtest_dates(&adapter) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Resolve symbols and data directory
    let symbols = match resolve_symbols(symbol_override, &adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let bar_port = match bars_dir(&adapter) {
        Ok(dir) => CsvBarAdapter::new(dir),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Validate watchlist
    eprintln!("Validating {} symbols...", symbols.len());
    let validation = match validate_watchlist(&bar_port, symbols, start_date, end_date) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Fetch bars
    let mut data: Vec<(String, Vec<_>)> = Vec::with_capacity(validation.watchlist.count());
    for symbol in &validation.watchlist.symbols {
        match bar_port.fetch_bars(symbol, start_date, end_date) {
            Ok(bars) => data.push((symbol.clone(), bars)),
            Err(e) => {
                eprintln!("warning: skipping {} ({})", symbol, e);
            }
        }
    }

    if data.is_empty() {
        eprintln!("error: no symbols with data to backtest");
        return ExitCode::from(5);
    }

    // Stage 6: Replay
    eprintln!(
        "Running backtest: {} symbols, {} to {}",
        data.len(),
        start_date,
        end_date,
    );
    let results = replay_watchlist(&data, &orb_config);

    // Stage 7: Aggregate and print summary
    let all_trades: Vec<BacktestTrade> = results
        .iter()
        .flat_map(|r| r.trades.iter().cloned())
        .collect();
    let summary = BacktestSummary::compute(&all_trades);
    print_summary(&summary, &results);

    // Stage 8: Optional trade export
    if let Some(output) = output_path {
        match write_trades_csv(output, &all_trades) {
            Ok(()) => eprintln!("\nTrades written to: {}", output.display()),
            Err(e) => {
                eprintln!("error: failed to write trades: {e}");
                return ExitCode::from(1);
            }
        }
    }

    ExitCode::SUCCESS
}

fn print_summary(summary: &BacktestSummary, results: &[ReplayResult]) {
    eprintln!("\n=== Aggregate Results ===");
    eprintln!("Total Trades:     {}", summary.total_trades);
    eprintln!("Win Rate:         {:.1}%", summary.win_rate * 100.0);
    eprintln!("Total PnL:        {:+.2}", summary.total_pnl);
    eprintln!("Avg PnL/Trade:    {:+.2}", summary.avg_pnl);
    eprintln!("Avg R Multiple:   {:+.2}", summary.avg_r_multiple);
    eprintln!("Profit Factor:    {:.2}", summary.profit_factor);
    eprintln!("Max Drawdown:     {:.2}", summary.max_drawdown);
    eprintln!(
        "Long:             {} trades, {:.1}% win rate",
        summary.long_trades,
        summary.long_win_rate * 100.0
    );
    eprintln!(
        "Short:            {} trades, {:.1}% win rate",
        summary.short_trades,
        summary.short_win_rate * 100.0
    );

    eprintln!("\n=== Per-Symbol Summary ===");
    for result in results {
        let symbol_summary = BacktestSummary::compute(&result.trades);
        eprintln!(
            "  {}: {} days, {} signals, {} trades, {:.1}% win rate, {:+.2} pnl",
            result.symbol,
            result.days_replayed,
            result.signals.len(),
            result.trades.len(),
            symbol_summary.win_rate * 100.0,
            symbol_summary.total_pnl,
        );
        for skipped in &result.skipped_days {
            eprintln!("    skipped {}: {}", skipped.date, skipped.reason.as_str());
        }
        if result.rejected_bars > 0 {
            eprintln!("    {} out-of-order bars discarded", result.rejected_bars);
        }
    }
}

fn write_trades_csv(path: &PathBuf, trades: &[BacktestTrade]) -> Result<(), std::io::Error> {
    let mut content = String::from(
        "symbol,direction,triggered_at,entry_price,stop_price,target_price,outcome,exit_time,exit_price,pnl,r_multiple\n",
    );
    for trade in trades {
        content.push_str(&format!(
            "{},{},{},{:.4},{:.4},{:.4},{},{},{:.4},{:.4},{:.4}\n",
            trade.signal.symbol,
            trade.signal.direction,
            trade.signal.triggered_at.format("%Y-%m-%d %H:%M:%S"),
            trade.signal.entry_price,
            trade.signal.stop_price,
            trade.signal.target_price,
            trade.outcome.as_str(),
            trade.exit_time.format("%Y-%m-%d %H:%M:%S"),
            trade.exit_price,
            trade.pnl,
            trade.r_multiple,
        ));
    }
    fs::write(path, content)
}

fn run_scan(config_path: &PathBuf, date: Option<NaiveDate>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_scanner_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let orb_config = match build_orb_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // "Today" is the exchange's today, not the host's.
    let tz = match market_timezone(&adapter) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let date = date.unwrap_or_else(|| chrono::Utc::now().with_timezone(&tz).date_naive());
    let symbols = match resolve_symbols(None, &adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let bar_port = match bars_dir(&adapter) {
        Ok(dir) => CsvBarAdapter::new(dir),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut sink = adapter
        .get_string("signals", "log_path")
        .map(|p| CsvSignalSink::new(PathBuf::from(p)));

    eprintln!("Scanning {} symbols on {}", symbols.len(), date);
    let mut total_signals = 0usize;

    for symbol in &symbols {
        let bars = match bar_port.fetch_bars(symbol, date, date) {
            Ok(bars) => bars,
            Err(e) => {
                eprintln!("warning: skipping {} ({})", symbol, e);
                continue;
            }
        };
        if bars.is_empty() {
            eprintln!("warning: skipping {} (no bars on {})", symbol, date);
            continue;
        }

        let mut machine = SessionState::new(symbol, date);
        for bar in &bars {
            let Some(signal) = machine.on_bar(bar, &orb_config) else {
                continue;
            };
            total_signals += 1;
            print_signal(&signal, &orb_config);
            if let Some(sink) = sink.as_mut() {
                if let Err(e) = sink.publish(&signal) {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            }
        }
    }

    eprintln!("\nScan complete: {} signals", total_signals);
    ExitCode::SUCCESS
}

fn print_signal(signal: &crate::domain::signal::Signal, cfg: &OrbConfig) {
    println!(
        "{} {} {}  entry {:.2}  stop {:.2}  target {:.2}  (OR {:.2}/{:.2}, {:.0}:1)",
        signal.triggered_at.format("%Y-%m-%d %H:%M"),
        signal.symbol,
        signal.direction,
        signal.entry_price,
        signal.stop_price,
        signal.target_price,
        signal.or_high,
        signal.or_low,
        cfg.reward_ratio,
    );
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_scanner_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let symbols = match resolve_symbols(None, &adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let times = match session_times(&adapter) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let tz = match market_timezone(&adapter) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nWatchlist: {}", symbols.join(", "));
    eprintln!(
        "Session: OR {} to {}, close {} ({})",
        times.or_start.format("%H:%M"),
        times.or_end.format("%H:%M"),
        times.session_end.format("%H:%M"),
        tz,
    );
    eprintln!(
        "Breakout distance: {:.2}, reward ratio: {:.1}",
        adapter.get_double("scanner", "breakout_distance", 2.0),
        adapter.get_double("scanner", "reward_ratio", 2.0),
    );

    match backtest_dates(&adapter) {
        Ok((start, end)) => eprintln!("Backtest range: {} to {}", start, end),
        Err(OrbscanError::ConfigMissing { .. }) => {
            eprintln!("Backtest range: not configured (scan only)")
        }
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bar_port = match bars_dir(&adapter) {
        Ok(dir) => CsvBarAdapter::new(dir),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let symbols = match bar_port.list_symbols() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
