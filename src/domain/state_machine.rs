//! ORB state machine: one instance per symbol per trading day.
//!
//! Consumes bars in chronological order and emits at most one signal per
//! qualifying retest. Capture the opening range, wait for a close beyond a
//! boundary by the breakout distance, then require a later bar to trade
//! through the range midpoint. Long and short sequences are tracked
//! independently; each direction is capped at
//! `max_signals_per_direction` emissions per day.

use chrono::{NaiveDate, NaiveDateTime};

use super::bar::IntradayBar;
use super::opening_range::{OpeningRange, RangeBuilder};
use super::risk::{trade_levels, Direction};
use super::session::{SessionPhase, SessionTimes};
use super::signal::Signal;

/// Evaluation order of the two directions on each bar. Decides which side
/// wins when both could act on the same bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    #[default]
    LongFirst,
    ShortFirst,
}

impl TieBreak {
    pub fn order(&self) -> [Direction; 2] {
        match self {
            TieBreak::LongFirst => [Direction::Long, Direction::Short],
            TieBreak::ShortFirst => [Direction::Short, Direction::Long],
        }
    }
}

/// Strategy parameters consumed by the core.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbConfig {
    pub session: SessionTimes,
    pub breakout_distance: f64,
    pub reward_ratio: f64,
    pub max_signals_per_direction: u32,
    pub tie_break: TieBreak,
}

impl Default for OrbConfig {
    fn default() -> Self {
        OrbConfig {
            session: SessionTimes::default(),
            breakout_distance: 2.0,
            reward_ratio: 2.0,
            max_signals_per_direction: 1,
            tie_break: TieBreak::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachinePhase {
    AwaitingOpen,
    Capturing,
    Watching,
    Closed,
}

#[derive(Debug, Clone, Default)]
struct DirectionState {
    breakout_active: bool,
    breakout_price: Option<f64>,
    signals_emitted: u32,
}

/// Mutable per symbol-day session state. One evaluator per symbol; all
/// mutation is sequential through [`SessionState::on_bar`].
#[derive(Debug, Clone)]
pub struct SessionState {
    symbol: String,
    date: NaiveDate,
    phase: MachinePhase,
    builder: RangeBuilder,
    range: Option<OpeningRange>,
    armed: bool,
    long: DirectionState,
    short: DirectionState,
    last_seen: Option<NaiveDateTime>,
    rejected_bars: u32,
}

impl SessionState {
    pub fn new(symbol: impl Into<String>, date: NaiveDate) -> Self {
        SessionState {
            symbol: symbol.into(),
            date,
            phase: MachinePhase::AwaitingOpen,
            builder: RangeBuilder::new(),
            range: None,
            armed: false,
            long: DirectionState::default(),
            short: DirectionState::default(),
            last_seen: None,
            rejected_bars: 0,
        }
    }

    pub fn phase(&self) -> MachinePhase {
        self.phase
    }

    pub fn opening_range(&self) -> Option<&OpeningRange> {
        self.range.as_ref()
    }

    /// Bars discarded for arriving out of order or on the wrong date.
    pub fn rejected_bars(&self) -> u32 {
        self.rejected_bars
    }

    pub fn signals_emitted(&self, direction: Direction) -> u32 {
        self.direction(direction).signals_emitted
    }

    pub fn breakout_pending(&self, direction: Direction) -> bool {
        self.direction(direction).breakout_active
    }

    pub fn breakout_price(&self, direction: Direction) -> Option<f64> {
        self.direction(direction).breakout_price
    }

    /// Advance the machine by one bar; returns a signal when a retest
    /// qualifies. Out-of-order bars are discarded and counted; ordering
    /// is the feed's precondition, the machine never reorders.
    pub fn on_bar(&mut self, bar: &IntradayBar, cfg: &OrbConfig) -> Option<Signal> {
        if self.phase == MachinePhase::Closed {
            return None;
        }
        if bar.date() != self.date {
            self.rejected_bars += 1;
            return None;
        }
        if let Some(last) = self.last_seen {
            if bar.timestamp <= last {
                self.rejected_bars += 1;
                return None;
            }
        }
        self.last_seen = Some(bar.timestamp);

        match cfg.session.phase_of(bar.time()) {
            SessionPhase::PreOpen => None,
            SessionPhase::OpeningRange => {
                self.phase = MachinePhase::Capturing;
                self.builder.observe(bar);
                None
            }
            SessionPhase::Active => {
                if self.phase != MachinePhase::Watching {
                    self.seal_range();
                }
                self.evaluate(bar, cfg)
            }
            SessionPhase::Closed => {
                self.phase = MachinePhase::Closed;
                None
            }
        }
    }

    /// Seal the opening range on the first bar past the window. An empty
    /// builder (feed gap) or a zero-width range disarms the day: no
    /// signals, silently.
    fn seal_range(&mut self) {
        self.range = self.builder.seal(&self.symbol, self.date);
        self.armed = matches!(&self.range, Some(r) if !r.is_degenerate());
        self.phase = MachinePhase::Watching;
    }

    fn evaluate(&mut self, bar: &IntradayBar, cfg: &OrbConfig) -> Option<Signal> {
        if !self.armed {
            return None;
        }
        let range = self.range.clone()?;
        let mid = range.mid();

        for direction in cfg.tie_break.order() {
            let cap = cfg.max_signals_per_direction;
            let state = self.direction_mut(direction);

            // Retest is checked before breakout detection so a breakout
            // armed on this bar can only fire on a subsequent bar.
            if state.breakout_active && bar.spans(mid) && state.signals_emitted < cap {
                state.breakout_active = false;
                state.signals_emitted += 1;
                let Ok(levels) = trade_levels(&range, direction, cfg.reward_ratio) else {
                    // armed implies a non-degenerate range
                    return None;
                };
                return Some(Signal {
                    symbol: self.symbol.clone(),
                    direction,
                    entry_price: levels.entry,
                    stop_price: levels.stop,
                    target_price: levels.target,
                    risk: levels.risk,
                    reward_ratio: cfg.reward_ratio,
                    triggered_at: bar.timestamp,
                    or_high: range.high,
                    or_low: range.low,
                });
            }

            if !state.breakout_active && state.signals_emitted < cap {
                let beyond = match direction {
                    Direction::Long => bar.close >= range.high + cfg.breakout_distance,
                    Direction::Short => bar.close <= range.low - cfg.breakout_distance,
                };
                if beyond {
                    state.breakout_active = true;
                    state.breakout_price = Some(bar.close);
                }
            }
        }

        None
    }

    fn direction(&self, direction: Direction) -> &DirectionState {
        match direction {
            Direction::Long => &self.long,
            Direction::Short => &self.short,
        }
    }

    fn direction_mut(&mut self, direction: Direction) -> &mut DirectionState {
        match direction {
            Direction::Long => &mut self.long,
            Direction::Short => &mut self.short,
        }
    }
}
