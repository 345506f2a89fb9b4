//! Risk calculator: entry/stop/target pricing from an opening range.
//!
//! Entry is the range midpoint; the stop sits on the far boundary (OR low
//! for longs, OR high for shorts); the target is the entry plus the risk
//! scaled by the configured reward ratio.

use super::error::OrbscanError;
use super::opening_range::OpeningRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeLevels {
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub risk: f64,
}

/// Price the entry/stop/target bracket for a direction.
///
/// Fails on a zero-width range: risk would be zero and no signal can be
/// priced. This is the one validated precondition in the core.
pub fn trade_levels(
    range: &OpeningRange,
    direction: Direction,
    reward_ratio: f64,
) -> Result<TradeLevels, OrbscanError> {
    if range.is_degenerate() {
        return Err(OrbscanError::InvalidRange {
            symbol: range.symbol.clone(),
            date: range.date,
        });
    }

    let entry = range.mid();
    let stop = match direction {
        Direction::Long => range.low,
        Direction::Short => range.high,
    };
    let risk = (entry - stop).abs();
    let target = entry + direction.sign() * risk * reward_ratio;

    Ok(TradeLevels {
        entry,
        stop,
        target,
        risk,
    })
}
