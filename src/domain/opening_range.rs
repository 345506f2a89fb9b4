//! Opening range capture.
//!
//! The range is the high/low band of all bars whose timestamps fall inside
//! the opening-range window. It is sealed once, when the window closes, and
//! immutable afterwards; the midpoint is always derived, never stored.

use chrono::NaiveDate;

use super::bar::IntradayBar;

#[derive(Debug, Clone, PartialEq)]
pub struct OpeningRange {
    pub symbol: String,
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
}

impl OpeningRange {
    pub fn mid(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// A zero-width range makes risk undefined; no signal can be priced.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0
    }
}

/// Accumulates bars during the opening-range window.
#[derive(Debug, Clone, Default)]
pub struct RangeBuilder {
    high: Option<f64>,
    low: Option<f64>,
}

impl RangeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, bar: &IntradayBar) {
        self.high = Some(match self.high {
            Some(h) => h.max(bar.high),
            None => bar.high,
        });
        self.low = Some(match self.low {
            Some(l) => l.min(bar.low),
            None => bar.low,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_none()
    }

    /// Seal the range. Returns `None` when no bar fell inside the window
    /// (feed gap); a silent no-op for the day, not an error.
    pub fn seal(&self, symbol: &str, date: NaiveDate) -> Option<OpeningRange> {
        match (self.high, self.low) {
            (Some(high), Some(low)) => Some(OpeningRange {
                symbol: symbol.to_string(),
                date,
                high,
                low,
            }),
            _ => None,
        }
    }
}
