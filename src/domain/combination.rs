//! One point of the parameter sweep.

use crate::domain::strategy::{SellCondition, StrategyVariant};

/// Account-wide money settings shared by every combination of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingCosts {
    pub investment: f64,
    pub tax_rate: f64,
    pub fee_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub asset: String,
    pub strategy: StrategyVariant,
    pub sell_condition: SellCondition,
    /// Recorded with the results. Signals read the generic `EMA` column,
    /// so the period does not change signal evaluation.
    pub ema_period: u32,
    pub reinvest_percentage: f64,
    pub min_return: f64,
    /// Magnitude of the drop that opens reserves (0.1 = a 10% fall).
    pub percent_drop: f64,
    pub balance_tripwire: f64,
}

impl Combination {
    /// Short label used in logs: `BTC/MACD/EMA-50/MPBR-0.05_0.1_2_0.5`.
    pub fn label(&self) -> String {
        format!(
            "{}/{}/EMA-{}/MPBR-{}",
            self.asset,
            self.strategy,
            self.ema_period,
            self.parameter_tag()
        )
    }

    /// `minReturn_percentDrop_balanceTripwire_reinvest`, unique within an
    /// asset/strategy/EMA group.
    pub fn parameter_tag(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.min_return, self.percent_drop, self.balance_tripwire, self.reinvest_percentage
        )
    }
}
