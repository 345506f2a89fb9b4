//! Backtest replay engine.
//!
//! Drives the ORB state machine over historical bars, one fresh
//! [`SessionState`] per trading day, then walks the bars after each
//! signal's trigger bar to a terminal outcome. Replay is deterministic:
//! identical input bars produce identical trades and summary.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;

use super::bar::IntradayBar;
use super::risk::Direction;
use super::signal::Signal;
use super::state_machine::{OrbConfig, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOutcome {
    TargetHit,
    StopHit,
    OpenAtClose,
}

impl TradeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeOutcome::TargetHit => "TARGET_HIT",
            TradeOutcome::StopHit => "STOP_HIT",
            TradeOutcome::OpenAtClose => "OPEN_AT_CLOSE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestTrade {
    pub signal: Signal,
    pub outcome: TradeOutcome,
    pub exit_price: f64,
    pub exit_time: NaiveDateTime,
    pub pnl: f64,
    pub r_multiple: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySkipReason {
    NoBars,
    NoOpeningRange,
    ZeroWidthRange,
}

impl DaySkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DaySkipReason::NoBars => "no bars",
            DaySkipReason::NoOpeningRange => "no bars in opening-range window",
            DaySkipReason::ZeroWidthRange => "zero-width opening range",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedDay {
    pub date: NaiveDate,
    pub reason: DaySkipReason,
}

/// Everything one symbol's replay produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayResult {
    pub symbol: String,
    pub signals: Vec<Signal>,
    pub trades: Vec<BacktestTrade>,
    pub skipped_days: Vec<SkippedDay>,
    pub rejected_bars: u32,
    pub days_replayed: usize,
}

/// Split a bar sequence into per-day chronological groups.
pub fn group_by_day(bars: &[IntradayBar]) -> BTreeMap<NaiveDate, Vec<IntradayBar>> {
    let mut days: BTreeMap<NaiveDate, Vec<IntradayBar>> = BTreeMap::new();
    for bar in bars {
        days.entry(bar.date()).or_default().push(bar.clone());
    }
    days
}

struct DayReplay {
    signals: Vec<Signal>,
    trades: Vec<BacktestTrade>,
    skip: Option<DaySkipReason>,
    rejected_bars: u32,
}

/// Run one symbol-day in isolation: fresh machine, collect signals, then
/// resolve each signal against the bars after its trigger bar.
fn replay_day(symbol: &str, date: NaiveDate, bars: &[IntradayBar], cfg: &OrbConfig) -> DayReplay {
    if bars.is_empty() {
        return DayReplay {
            signals: Vec::new(),
            trades: Vec::new(),
            skip: Some(DaySkipReason::NoBars),
            rejected_bars: 0,
        };
    }

    let mut machine = SessionState::new(symbol, date);
    let mut emitted: Vec<(Signal, usize)> = Vec::new();

    for (idx, bar) in bars.iter().enumerate() {
        if let Some(signal) = machine.on_bar(bar, cfg) {
            emitted.push((signal, idx));
        }
    }

    let skip = match machine.opening_range() {
        None => Some(DaySkipReason::NoOpeningRange),
        Some(range) if range.is_degenerate() => Some(DaySkipReason::ZeroWidthRange),
        Some(_) => None,
    };

    let trades = emitted
        .iter()
        .map(|(signal, idx)| resolve_trade(signal, &bars[idx + 1..], cfg))
        .collect();

    DayReplay {
        signals: emitted.into_iter().map(|(s, _)| s).collect(),
        trades,
        skip,
        rejected_bars: machine.rejected_bars(),
    }
}

/// Walk the bars following the trigger bar until stop or target is
/// touched. A bar spanning both resolves stop-first, the conservative
/// assumption. Neither touched by session end: exit at the last
/// in-session close.
fn resolve_trade(signal: &Signal, later_bars: &[IntradayBar], cfg: &OrbConfig) -> BacktestTrade {
    let mut last_close = signal.entry_price;
    let mut last_time = signal.triggered_at;

    for bar in later_bars {
        if bar.time() >= cfg.session.session_end {
            break;
        }
        let stopped = match signal.direction {
            Direction::Long => bar.low <= signal.stop_price,
            Direction::Short => bar.high >= signal.stop_price,
        };
        if stopped {
            return close_trade(signal, TradeOutcome::StopHit, signal.stop_price, bar.timestamp);
        }
        let target_hit = match signal.direction {
            Direction::Long => bar.high >= signal.target_price,
            Direction::Short => bar.low <= signal.target_price,
        };
        if target_hit {
            return close_trade(
                signal,
                TradeOutcome::TargetHit,
                signal.target_price,
                bar.timestamp,
            );
        }
        last_close = bar.close;
        last_time = bar.timestamp;
    }

    close_trade(signal, TradeOutcome::OpenAtClose, last_close, last_time)
}

fn close_trade(
    signal: &Signal,
    outcome: TradeOutcome,
    exit_price: f64,
    exit_time: NaiveDateTime,
) -> BacktestTrade {
    let pnl = match signal.direction {
        Direction::Long => exit_price - signal.entry_price,
        Direction::Short => signal.entry_price - exit_price,
    };
    // risk is strictly positive: degenerate ranges never arm
    let r_multiple = pnl / signal.risk;
    BacktestTrade {
        signal: signal.clone(),
        outcome,
        exit_price,
        exit_time,
        pnl,
        r_multiple,
    }
}

/// Replay every trading day present in `bars` for one symbol.
pub fn replay_symbol(symbol: &str, bars: &[IntradayBar], cfg: &OrbConfig) -> ReplayResult {
    let mut result = ReplayResult {
        symbol: symbol.to_string(),
        signals: Vec::new(),
        trades: Vec::new(),
        skipped_days: Vec::new(),
        rejected_bars: 0,
        days_replayed: 0,
    };

    for (date, day_bars) in group_by_day(bars) {
        let day = replay_day(symbol, date, &day_bars, cfg);
        result.days_replayed += 1;
        result.rejected_bars += day.rejected_bars;
        result.signals.extend(day.signals);
        result.trades.extend(day.trades);
        if let Some(reason) = day.skip {
            result.skipped_days.push(SkippedDay { date, reason });
        }
    }

    result
}

/// Replay a whole watchlist. Symbols are independent, so this is a
/// parallel fan-out over per-symbol state; output order matches input
/// order regardless of scheduling.
pub fn replay_watchlist(
    data: &[(String, Vec<IntradayBar>)],
    cfg: &OrbConfig,
) -> Vec<ReplayResult> {
    data.par_iter()
        .map(|(symbol, bars)| replay_symbol(symbol, bars, cfg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn bar_on(d: NaiveDate, h: u32, m: u32, high: f64, low: f64, close: f64) -> IntradayBar {
        IntradayBar {
            symbol: "SPY".into(),
            timestamp: d.and_hms_opt(h, m, 0).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    fn bar(h: u32, m: u32, high: f64, low: f64, close: f64) -> IntradayBar {
        bar_on(date(), h, m, high, low, close)
    }

    /// OR 595.00/594.00, long breakout at 10:00, retest signal at 10:05.
    fn signal_day_prefix() -> Vec<IntradayBar> {
        vec![
            bar(9, 30, 595.0, 594.2, 594.8),
            bar(9, 32, 594.9, 594.0, 594.1),
            bar(10, 0, 597.2, 596.0, 597.1),
            bar(10, 5, 594.6, 594.4, 594.5),
        ]
    }

    #[test]
    fn long_target_hit() {
        let mut bars = signal_day_prefix();
        bars.push(bar(10, 10, 595.0, 594.6, 594.9));
        bars.push(bar(10, 15, 595.6, 594.9, 595.4));

        let result = replay_symbol("SPY", &bars, &OrbConfig::default());
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.outcome, TradeOutcome::TargetHit);
        assert_relative_eq!(trade.exit_price, 595.5);
        assert_relative_eq!(trade.pnl, 1.0);
        assert_relative_eq!(trade.r_multiple, 2.0);
    }

    #[test]
    fn long_stop_hit() {
        let mut bars = signal_day_prefix();
        bars.push(bar(10, 10, 594.4, 593.8, 593.9));

        let result = replay_symbol("SPY", &bars, &OrbConfig::default());
        let trade = &result.trades[0];
        assert_eq!(trade.outcome, TradeOutcome::StopHit);
        assert_relative_eq!(trade.exit_price, 594.0);
        assert_relative_eq!(trade.pnl, -0.5);
        assert_relative_eq!(trade.r_multiple, -1.0);
    }

    #[test]
    fn bar_spanning_stop_and_target_resolves_stop_first() {
        let mut bars = signal_day_prefix();
        // Range [593.5, 596.0] contains both stop 594.0 and target 595.5.
        bars.push(bar(10, 10, 596.0, 593.5, 595.0));

        let result = replay_symbol("SPY", &bars, &OrbConfig::default());
        assert_eq!(result.trades[0].outcome, TradeOutcome::StopHit);
    }

    #[test]
    fn open_at_close_exits_on_last_in_session_close() {
        let mut bars = signal_day_prefix();
        bars.push(bar(10, 10, 595.0, 594.6, 594.8));
        bars.push(bar(15, 59, 595.1, 594.7, 594.9));
        // At/after session end: never part of the walk.
        bars.push(bar(16, 0, 599.0, 594.0, 598.0));

        let result = replay_symbol("SPY", &bars, &OrbConfig::default());
        let trade = &result.trades[0];
        assert_eq!(trade.outcome, TradeOutcome::OpenAtClose);
        assert_relative_eq!(trade.exit_price, 594.9);
        assert_eq!(trade.exit_time, date().and_hms_opt(15, 59, 0).unwrap());
        assert_relative_eq!(trade.pnl, 0.4);
    }

    #[test]
    fn signal_with_no_later_bars_closes_at_entry() {
        let bars = signal_day_prefix();
        let result = replay_symbol("SPY", &bars, &OrbConfig::default());
        let trade = &result.trades[0];
        assert_eq!(trade.outcome, TradeOutcome::OpenAtClose);
        assert_relative_eq!(trade.exit_price, trade.signal.entry_price);
        assert_relative_eq!(trade.pnl, 0.0);
    }

    #[test]
    fn short_target_hit() {
        let bars = vec![
            bar(9, 30, 595.0, 594.2, 594.8),
            bar(9, 32, 594.9, 594.0, 594.1),
            bar(10, 0, 592.3, 591.5, 591.9),
            bar(10, 5, 594.7, 594.3, 594.5),
            bar(10, 10, 594.2, 593.4, 593.6),
        ];
        let result = replay_symbol("SPY", &bars, &OrbConfig::default());
        let trade = &result.trades[0];
        assert_eq!(trade.signal.direction, Direction::Short);
        assert_eq!(trade.outcome, TradeOutcome::TargetHit);
        assert_relative_eq!(trade.exit_price, 593.5);
        assert_relative_eq!(trade.pnl, 1.0);
    }

    #[test]
    fn days_are_isolated() {
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let mut bars = signal_day_prefix();
        // Next day: breakout without a prior opening range capture on day
        // one leaking in; day two has its own OR and no breakout.
        bars.push(bar_on(d2, 9, 31, 600.0, 599.0, 599.5));
        bars.push(bar_on(d2, 10, 0, 600.2, 599.4, 599.8));

        let result = replay_symbol("SPY", &bars, &OrbConfig::default());
        assert_eq!(result.days_replayed, 2);
        assert_eq!(result.signals.len(), 1);
        assert_eq!(result.signals[0].triggered_at.date(), date());
    }

    #[test]
    fn skip_reasons_are_reported() {
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        let bars = vec![
            // Day 1: no bars in the OR window.
            bar(10, 0, 600.0, 599.0, 599.5),
            // Day 2: zero-width range.
            bar_on(d2, 9, 31, 594.0, 594.0, 594.0),
            bar_on(d2, 10, 0, 600.0, 599.0, 599.5),
            // Day 3: normal, no breakout.
            bar_on(d3, 9, 31, 595.0, 594.0, 594.5),
            bar_on(d3, 10, 0, 595.2, 594.6, 595.0),
        ];
        let result = replay_symbol("SPY", &bars, &OrbConfig::default());
        assert_eq!(result.trades.len(), 0);
        assert_eq!(
            result.skipped_days,
            vec![
                SkippedDay {
                    date: date(),
                    reason: DaySkipReason::NoOpeningRange
                },
                SkippedDay {
                    date: d2,
                    reason: DaySkipReason::ZeroWidthRange
                },
            ]
        );
    }

    #[test]
    fn replay_is_deterministic() {
        let mut bars = signal_day_prefix();
        bars.push(bar(10, 10, 596.0, 593.5, 595.0));
        let cfg = OrbConfig::default();

        let first = replay_symbol("SPY", &bars, &cfg);
        let second = replay_symbol("SPY", &bars, &cfg);
        assert_eq!(first, second);
    }

    #[test]
    fn watchlist_fan_out_preserves_input_order() {
        let data = vec![
            ("QQQ".to_string(), signal_day_prefix()),
            ("SPY".to_string(), signal_day_prefix()),
        ];
        let results = replay_watchlist(&data, &OrbConfig::default());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].symbol, "QQQ");
        assert_eq!(results[1].symbol, "SPY");
    }

    #[test]
    fn rejected_bars_are_counted_across_days() {
        let mut bars = signal_day_prefix();
        bars.push(bar(10, 5, 594.6, 594.4, 594.5)); // duplicate timestamp
        let result = replay_symbol("SPY", &bars, &OrbConfig::default());
        assert_eq!(result.rejected_bars, 1);
        // The duplicate changed nothing downstream.
        assert_eq!(result.signals.len(), 1);
    }
}
