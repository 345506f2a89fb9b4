//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for orbscan.
#[derive(Debug, thiserror::Error)]
pub enum OrbscanError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no bar data for {symbol}")]
    NoData { symbol: String },

    #[error("zero-width opening range for {symbol} on {date}")]
    InvalidRange { symbol: String, date: NaiveDate },

    #[error("signal sink error: {reason}")]
    Sink { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&OrbscanError> for std::process::ExitCode {
    fn from(err: &OrbscanError) -> Self {
        let code: u8 = match err {
            OrbscanError::Io(_) | OrbscanError::Sink { .. } => 1,
            OrbscanError::ConfigParse { .. }
            | OrbscanError::ConfigMissing { .. }
            | OrbscanError::ConfigInvalid { .. } => 2,
            OrbscanError::Data { .. } => 3,
            OrbscanError::InvalidRange { .. } => 4,
            OrbscanError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
