//! CSV signal log adapter.
//!
//! Appends one row per emitted signal to a log file, creating it with a
//! header on first use. The scan command uses this as its durable
//! signal record.

use crate::domain::error::OrbscanError;
use crate::domain::signal::Signal;
use crate::ports::signal_sink::SignalSink;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

const HEADER: &str =
    "triggered_at,symbol,direction,entry_price,stop_price,target_price,risk,or_high,or_low";

pub struct CsvSignalSink {
    path: PathBuf,
}

impl CsvSignalSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SignalSink for CsvSignalSink {
    fn publish(&mut self, signal: &Signal) -> Result<(), OrbscanError> {
        let new_file = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| OrbscanError::Sink {
                reason: format!("failed to open {}: {}", self.path.display(), e),
            })?;

        if new_file {
            writeln!(file, "{}", HEADER).map_err(|e| OrbscanError::Sink {
                reason: format!("failed to write header: {}", e),
            })?;
        }

        writeln!(
            file,
            "{},{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}",
            signal.triggered_at.format("%Y-%m-%d %H:%M:%S"),
            signal.symbol,
            signal.direction,
            signal.entry_price,
            signal.stop_price,
            signal.target_price,
            signal.risk,
            signal.or_high,
            signal.or_low,
        )
        .map_err(|e| OrbscanError::Sink {
            reason: format!("failed to write signal row: {}", e),
        })
    }
}
