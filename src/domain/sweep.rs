//! Sweep configuration and cartesian enumeration of combinations.

use crate::domain::combination::{Combination, TradingCosts};
use crate::domain::error::SweepError;
use crate::domain::market_data::DateRange;
use crate::domain::strategy::{SellCondition, StrategyVariant};

/// Fully resolved, immutable sweep parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub assets: Vec<String>,
    pub strategies: Vec<StrategyVariant>,
    pub ema_periods: Vec<u32>,
    pub reinvest_percentages: Vec<f64>,
    pub min_returns: Vec<f64>,
    pub percent_drops: Vec<f64>,
    pub balance_tripwires: Vec<f64>,
    pub sell_condition: SellCondition,
    pub costs: TradingCosts,
    pub date_range: DateRange,
    /// Worker threads; 0 sizes the pool to the machine.
    pub workers: usize,
}

impl SweepConfig {
    fn domain_sizes(&self) -> [(&'static str, usize); 7] {
        [
            ("assets", self.assets.len()),
            ("strategies", self.strategies.len()),
            ("ema_values", self.ema_periods.len()),
            ("reinvest_percentages", self.reinvest_percentages.len()),
            ("min_returns", self.min_returns.len()),
            ("percent_drops", self.percent_drops.len()),
            ("balance_tripwires", self.balance_tripwires.len()),
        ]
    }

    /// Every swept domain must have at least one value.
    pub fn check_domains(&self) -> Result<(), SweepError> {
        for (key, len) in self.domain_sizes() {
            if len == 0 {
                let section = if key == "assets" { "simulation" } else { "parameters" };
                return Err(SweepError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: "at least one value is required".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Product of all domain sizes.
    pub fn combination_count(&self) -> usize {
        self.domain_sizes().iter().map(|(_, len)| len).product()
    }

    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            config: self,
            next: 0,
            total: self.combination_count(),
        }
    }

    /// Decodes a flat index; balance tripwire varies fastest, asset slowest.
    fn combination_at(&self, index: usize) -> Combination {
        let mut rest = index;
        let mut take = |len: usize| {
            let i = rest % len;
            rest /= len;
            i
        };
        let balance = take(self.balance_tripwires.len());
        let drop = take(self.percent_drops.len());
        let min_return = take(self.min_returns.len());
        let reinvest = take(self.reinvest_percentages.len());
        let ema = take(self.ema_periods.len());
        let strategy = take(self.strategies.len());
        let asset = take(self.assets.len());

        Combination {
            asset: self.assets[asset].clone(),
            strategy: self.strategies[strategy],
            sell_condition: self.sell_condition,
            ema_period: self.ema_periods[ema],
            reinvest_percentage: self.reinvest_percentages[reinvest],
            min_return: self.min_returns[min_return],
            percent_drop: self.percent_drops[drop],
            balance_tripwire: self.balance_tripwires[balance],
        }
    }
}

/// Lazy cartesian product over a [`SweepConfig`].
pub struct Combinations<'a> {
    config: &'a SweepConfig,
    next: usize,
    total: usize,
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        if self.next >= self.total {
            return None;
        }
        let c = self.config.combination_at(self.next);
        self.next += 1;
        Some(c)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Combinations<'_> {}
