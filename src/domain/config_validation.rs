//! Configuration validation and loading.
//!
//! Validates every config field before a run starts, then builds the
//! typed [`OrbConfig`] and session settings consumed by the scanner.

use crate::domain::error::OrbscanError;
use crate::domain::state_machine::{OrbConfig, TieBreak};
use crate::domain::session::SessionTimes;
use crate::ports::config_port::ConfigPort;
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

pub fn validate_scanner_config(config: &dyn ConfigPort) -> Result<(), OrbscanError> {
    validate_symbols(config)?;
    validate_breakout_distance(config)?;
    validate_reward_ratio(config)?;
    validate_max_signals(config)?;
    validate_tie_break(config)?;
    validate_market_timezone(config)?;
    validate_session_times(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), OrbscanError> {
    validate_scanner_config(config)?;
    backtest_dates(config)?;
    Ok(())
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), OrbscanError> {
    match config.get_string("scanner", "symbols") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(OrbscanError::ConfigMissing {
            section: "scanner".to_string(),
            key: "symbols".to_string(),
        }),
    }
}

fn validate_breakout_distance(config: &dyn ConfigPort) -> Result<(), OrbscanError> {
    let value = config.get_double("scanner", "breakout_distance", 2.0);
    if value <= 0.0 || !value.is_finite() {
        return Err(OrbscanError::ConfigInvalid {
            section: "scanner".to_string(),
            key: "breakout_distance".to_string(),
            reason: "breakout_distance must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_reward_ratio(config: &dyn ConfigPort) -> Result<(), OrbscanError> {
    let value = config.get_double("scanner", "reward_ratio", 2.0);
    if value <= 0.0 || !value.is_finite() {
        return Err(OrbscanError::ConfigInvalid {
            section: "scanner".to_string(),
            key: "reward_ratio".to_string(),
            reason: "reward_ratio must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_max_signals(config: &dyn ConfigPort) -> Result<(), OrbscanError> {
    let value = config.get_int("scanner", "max_signals_per_direction", 1);
    if value < 1 {
        return Err(OrbscanError::ConfigInvalid {
            section: "scanner".to_string(),
            key: "max_signals_per_direction".to_string(),
            reason: "max_signals_per_direction must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_tie_break(config: &dyn ConfigPort) -> Result<(), OrbscanError> {
    tie_break(config).map(|_| ())
}

fn validate_market_timezone(config: &dyn ConfigPort) -> Result<(), OrbscanError> {
    market_timezone(config).map(|_| ())
}

fn validate_session_times(config: &dyn ConfigPort) -> Result<(), OrbscanError> {
    session_times(config).map(|_| ())
}

/// Tie-break policy for bars where both directions could act.
pub fn tie_break(config: &dyn ConfigPort) -> Result<TieBreak, OrbscanError> {
    match config.get_string("scanner", "tie_break").as_deref() {
        None => Ok(TieBreak::LongFirst),
        Some("long") => Ok(TieBreak::LongFirst),
        Some("short") => Ok(TieBreak::ShortFirst),
        Some(other) => Err(OrbscanError::ConfigInvalid {
            section: "scanner".to_string(),
            key: "tie_break".to_string(),
            reason: format!("unknown tie_break '{}', expected 'long' or 'short'", other),
        }),
    }
}

/// IANA timezone the exchange trades in. Bars are stored in this local
/// time; the zone matters to adapters converting external feeds.
pub fn market_timezone(config: &dyn ConfigPort) -> Result<Tz, OrbscanError> {
    let name = config
        .get_string("scanner", "market_timezone")
        .unwrap_or_else(|| "America/New_York".to_string());
    name.parse::<Tz>().map_err(|_| OrbscanError::ConfigInvalid {
        section: "scanner".to_string(),
        key: "market_timezone".to_string(),
        reason: format!("unknown timezone '{}'", name),
    })
}

pub fn session_times(config: &dyn ConfigPort) -> Result<SessionTimes, OrbscanError> {
    let defaults = SessionTimes::default();
    let or_start = parse_time(config, "or_start", defaults.or_start)?;
    let or_end = parse_time(config, "or_end", defaults.or_end)?;
    let session_end = parse_time(config, "session_end", defaults.session_end)?;

    let times = SessionTimes {
        or_start,
        or_end,
        session_end,
    };
    if !times.is_ordered() {
        return Err(OrbscanError::ConfigInvalid {
            section: "session".to_string(),
            key: "or_start".to_string(),
            reason: "session times must satisfy or_start < or_end < session_end".to_string(),
        });
    }
    Ok(times)
}

fn parse_time(
    config: &dyn ConfigPort,
    key: &str,
    default: NaiveTime,
) -> Result<NaiveTime, OrbscanError> {
    match config.get_string("session", key) {
        None => Ok(default),
        Some(s) => {
            NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| OrbscanError::ConfigInvalid {
                section: "session".to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected HH:MM", key),
            })
        }
    }
}

pub fn backtest_dates(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), OrbscanError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;
    if start > end {
        return Err(OrbscanError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }
    Ok((start, end))
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, OrbscanError> {
    match config.get_string("backtest", key) {
        None => Err(OrbscanError::ConfigMissing {
            section: "backtest".to_string(),
            key: key.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            OrbscanError::ConfigInvalid {
                section: "backtest".to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", key),
            }
        }),
    }
}

/// Assemble the typed scanner config after validation has passed.
pub fn build_orb_config(config: &dyn ConfigPort) -> Result<OrbConfig, OrbscanError> {
    validate_scanner_config(config)?;
    Ok(OrbConfig {
        session: session_times(config)?,
        breakout_distance: config.get_double("scanner", "breakout_distance", 2.0),
        reward_ratio: config.get_double("scanner", "reward_ratio", 2.0),
        max_signals_per_direction: config.get_int("scanner", "max_signals_per_direction", 1) as u32,
        tie_break: tie_break(config)?,
    })
}
