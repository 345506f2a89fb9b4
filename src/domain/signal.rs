//! Trading signal value emitted by the state machine.

use chrono::NaiveDateTime;

use super::risk::Direction;

/// Immutable once created; at most one per direction per symbol-day under
/// the default dedup policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub risk: f64,
    pub reward_ratio: f64,
    pub triggered_at: NaiveDateTime,
    pub or_high: f64,
    pub or_low: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn signal_fields() {
        let signal = Signal {
            symbol: "SPY".into(),
            direction: Direction::Long,
            entry_price: 594.5,
            stop_price: 594.0,
            target_price: 595.5,
            risk: 0.5,
            reward_ratio: 2.0,
            triggered_at: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 12, 0)
                .unwrap(),
            or_high: 595.0,
            or_low: 594.0,
        };
        assert_eq!(signal.symbol, "SPY");
        assert_eq!(signal.direction, Direction::Long);
        assert!((signal.target_price - signal.entry_price
            - signal.risk * signal.reward_ratio)
            .abs()
            < f64::EPSILON);
    }
}
