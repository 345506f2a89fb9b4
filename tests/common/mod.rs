#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use orbscan::domain::bar::IntradayBar;
use orbscan::domain::error::OrbscanError;
use orbscan::ports::bar_port::BarPort;
use std::collections::HashMap;

pub struct MockBarPort {
    pub data: HashMap<String, Vec<IntradayBar>>,
    pub errors: HashMap<String, String>,
}

impl MockBarPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<IntradayBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl BarPort for MockBarPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<IntradayBar>, OrbscanError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(OrbscanError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date() >= start_date && b.date() <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, OrbscanError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn ts(date: &str, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn make_bar(symbol: &str, date: &str, h: u32, m: u32, high: f64, low: f64, close: f64) -> IntradayBar {
    IntradayBar {
        symbol: symbol.to_string(),
        timestamp: ts(date, h, m),
        open: close,
        high,
        low,
        close,
        volume: 1000,
    }
}

/// OR 595.00/594.00 captured 09:30-09:44, long breakout close at 10:00,
/// retest through the 594.50 midpoint at 10:05.
pub fn long_signal_day(symbol: &str, date: &str) -> Vec<IntradayBar> {
    vec![
        make_bar(symbol, date, 9, 30, 595.0, 594.2, 594.8),
        make_bar(symbol, date, 9, 35, 594.9, 594.0, 594.1),
        make_bar(symbol, date, 10, 0, 597.2, 596.0, 597.1),
        make_bar(symbol, date, 10, 5, 594.6, 594.4, 594.5),
    ]
}

/// Same shape to the short side: breakout close below 592.00 then a
/// retest back through the midpoint.
pub fn short_signal_day(symbol: &str, date: &str) -> Vec<IntradayBar> {
    vec![
        make_bar(symbol, date, 9, 30, 595.0, 594.2, 594.8),
        make_bar(symbol, date, 9, 35, 594.9, 594.0, 594.1),
        make_bar(symbol, date, 10, 0, 592.3, 591.5, 591.9),
        make_bar(symbol, date, 10, 5, 594.7, 594.3, 594.5),
    ]
}

/// Quiet day: opening range forms, price never leaves the band.
pub fn quiet_day(symbol: &str, date: &str) -> Vec<IntradayBar> {
    vec![
        make_bar(symbol, date, 9, 30, 595.0, 594.2, 594.8),
        make_bar(symbol, date, 9, 35, 594.9, 594.0, 594.1),
        make_bar(symbol, date, 10, 0, 595.3, 594.1, 594.9),
        make_bar(symbol, date, 11, 0, 595.5, 594.3, 595.0),
    ]
}
