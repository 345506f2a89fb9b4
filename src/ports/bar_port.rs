//! Intraday bar access port trait.

use crate::domain::bar::IntradayBar;
use crate::domain::error::OrbscanError;
use chrono::NaiveDate;

pub trait BarPort {
    /// Fetch bars for one symbol, inclusive of both dates, sorted by
    /// timestamp. Timestamps are market-local.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<IntradayBar>, OrbscanError>;

    fn list_symbols(&self) -> Result<Vec<String>, OrbscanError>;
}
