//! Intraday OHLCV bar representation.
//!
//! Timestamps are market-local; the data adapter owns timezone conversion
//! before bars reach the core.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone, PartialEq)]
pub struct IntradayBar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl IntradayBar {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }

    /// True when the bar's range includes `price`.
    pub fn spans(&self, price: f64) -> bool {
        self.low <= price && price <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> IntradayBar {
        IntradayBar {
            symbol: "SPY".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(9, 31, 0)
                .unwrap(),
            open: 594.2,
            high: 594.8,
            low: 593.9,
            close: 594.5,
            volume: 120_000,
        }
    }

    #[test]
    fn date_and_time_accessors() {
        let bar = sample_bar();
        assert_eq!(bar.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bar.time(), NaiveTime::from_hms_opt(9, 31, 0).unwrap());
    }

    #[test]
    fn spans_inside_range() {
        let bar = sample_bar();
        assert!(bar.spans(594.0));
        assert!(bar.spans(593.9));
        assert!(bar.spans(594.8));
    }

    #[test]
    fn spans_outside_range() {
        let bar = sample_bar();
        assert!(!bar.spans(593.89));
        assert!(!bar.spans(594.81));
    }
}
