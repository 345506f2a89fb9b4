//! CSV file intraday bar adapter.
//!
//! Reads one `SYMBOL.csv` per symbol from a base directory. Columns:
//! `timestamp,open,high,low,close,volume` with timestamps in market-local
//! `YYYY-MM-DD HH:MM:SS`. Rows may arrive in any order; fetch returns
//! them sorted by timestamp.

use crate::domain::bar::IntradayBar;
use crate::domain::error::OrbscanError;
use crate::ports::bar_port::BarPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvBarAdapter {
    base_path: PathBuf,
}

impl CsvBarAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, OrbscanError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| OrbscanError::Data {
            reason: format!("missing {} column", name),
        })?
        .parse()
        .map_err(|e| OrbscanError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl BarPort for CsvBarAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<IntradayBar>, OrbscanError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| OrbscanError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| OrbscanError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let ts_str = record.get(0).ok_or_else(|| OrbscanError::Data {
                reason: "missing timestamp column".into(),
            })?;
            let timestamp =
                NaiveDateTime::parse_from_str(ts_str, TIMESTAMP_FORMAT).map_err(|e| {
                    OrbscanError::Data {
                        reason: format!("invalid timestamp format: {}", e),
                    }
                })?;

            if timestamp.date() < start_date || timestamp.date() > end_date {
                continue;
            }

            bars.push(IntradayBar {
                symbol: symbol.to_string(),
                timestamp,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, OrbscanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| OrbscanError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| OrbscanError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
