//! Session clock: maps a time of day to a trading-session phase.
//!
//! Windows are half-open: `[or_start, or_end)` is the opening-range window,
//! `[or_end, session_end)` is the active window.

use chrono::NaiveTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    PreOpen,
    OpeningRange,
    Active,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimes {
    pub or_start: NaiveTime,
    pub or_end: NaiveTime,
    pub session_end: NaiveTime,
}

impl Default for SessionTimes {
    /// US equities regular session: 09:30 open, 15-minute opening range,
    /// 16:00 close.
    fn default() -> Self {
        SessionTimes {
            or_start: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            or_end: NaiveTime::from_hms_opt(9, 45, 0).unwrap(),
            session_end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        }
    }
}

impl SessionTimes {
    pub fn phase_of(&self, t: NaiveTime) -> SessionPhase {
        if t < self.or_start {
            SessionPhase::PreOpen
        } else if t < self.or_end {
            SessionPhase::OpeningRange
        } else if t < self.session_end {
            SessionPhase::Active
        } else {
            SessionPhase::Closed
        }
    }

    /// Ordering invariant checked at config load.
    pub fn is_ordered(&self) -> bool {
        self.or_start < self.or_end && self.or_end < self.session_end
    }
}
