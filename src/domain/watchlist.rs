//! Watchlist parsing and validation.
//!
//! Parses symbol lists from configuration and checks that each symbol
//! actually has intraday data before a backtest or scan touches it.

use crate::domain::error::OrbscanError;
use crate::ports::bar_port::BarPort;
use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct Watchlist {
    pub symbols: Vec<String>,
}

impl Watchlist {
    pub fn count(&self) -> usize {
        self.symbols.len()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parse a comma-separated symbol list. Symbols are trimmed and
/// uppercased; duplicates and empty tokens are rejected.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, WatchlistError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(WatchlistError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if seen.contains(&symbol) {
            return Err(WatchlistError::DuplicateSymbol(symbol));
        }
        seen.insert(symbol.clone());
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug)]
pub struct WatchlistValidationResult {
    pub watchlist: Watchlist,
    pub skipped: Vec<SkippedSymbol>,
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Drop symbols with no bars in the requested window. Errors on a
/// single symbol demote it to a skip; an empty surviving watchlist is
/// the only hard failure.
pub fn validate_watchlist(
    bar_port: &dyn BarPort,
    symbols: Vec<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<WatchlistValidationResult, OrbscanError> {
    let mut valid = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let bars = match bar_port.fetch_bars(&symbol, start_date, end_date) {
            Ok(bars) => bars,
            Err(e) => {
                eprintln!("Warning: skipping {} ({})", symbol, e);
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if bars.is_empty() {
            eprintln!("Warning: skipping {} (no bars found)", symbol);
            skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason: "no bars found".to_string(),
            });
            continue;
        }

        eprintln!("  {}: {} bars [OK]", symbol, bars.len());
        valid.push(symbol);
    }

    if valid.is_empty() {
        return Err(OrbscanError::NoData {
            symbol: "all".to_string(),
        });
    }

    if !skipped.is_empty() {
        eprintln!(
            "Running {} of {} symbols",
            valid.len(),
            valid.len() + skipped.len()
        );
    }

    Ok(WatchlistValidationResult {
        watchlist: Watchlist { symbols: valid },
        skipped,
    })
}
