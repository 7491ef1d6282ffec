//! Market data access port.

use crate::domain::error::SweepError;
use crate::domain::market_data::DateRange;
use crate::domain::price_row::PriceSeries;

pub trait DataPort {
    /// Most recent series for `asset`, ascending by timestamp and already
    /// checked against the row volume implied by `range`.
    fn load_series(&self, asset: &str, range: &DateRange) -> Result<PriceSeries, SweepError>;
}
