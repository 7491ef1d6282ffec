//! Strategy variants and the buy/sell signal evaluator.
//!
//! Every predicate is a pure function of the current row. A row lacking an
//! indicator the predicate needs never produces a signal.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::SweepError;
use crate::domain::price_row::{Indicator, PriceRow};

/// Buy-rule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyVariant {
    MacdChai,
    Macd,
    Psar,
    MacdPsar,
    AltMacd,
}

impl StrategyVariant {
    pub const ALL: [StrategyVariant; 5] = [
        StrategyVariant::MacdChai,
        StrategyVariant::Macd,
        StrategyVariant::Psar,
        StrategyVariant::MacdPsar,
        StrategyVariant::AltMacd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyVariant::MacdChai => "MACD-CHAI",
            StrategyVariant::Macd => "MACD",
            StrategyVariant::Psar => "PSAR",
            StrategyVariant::MacdPsar => "MACD-PSAR",
            StrategyVariant::AltMacd => "alt-MACD",
        }
    }

    /// Indicator columns read by the buy rule and the event snapshot.
    pub fn required_indicators(&self) -> &'static [Indicator] {
        match self {
            StrategyVariant::MacdChai => &[
                Indicator::Ema,
                Indicator::Macd,
                Indicator::Signal,
                Indicator::Chai,
            ],
            StrategyVariant::Macd | StrategyVariant::AltMacd => {
                &[Indicator::Ema, Indicator::Macd, Indicator::Signal]
            }
            StrategyVariant::Psar => &[Indicator::Ema, Indicator::Sar],
            StrategyVariant::MacdPsar => &[
                Indicator::Ema,
                Indicator::Macd,
                Indicator::Signal,
                Indicator::Sar,
            ],
        }
    }
}

impl fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyVariant {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyVariant::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| SweepError::InvalidStrategy { name: s.to_string() })
    }
}

pub fn is_valid_strategy(name: &str) -> bool {
    name.parse::<StrategyVariant>().is_ok()
}

/// Sell-rule family, fixed for a whole sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SellCondition {
    /// return > min
    MinReturn,
    /// (EMA > price and return > min) or return > 2·min
    BelowEmaOrDoubleReturn,
    /// EMA < price and return > min
    AboveEma,
    /// EMA > price and MACD < SIGNAL and return > min
    BelowEmaMacdCross,
    /// EMA > price and return > min
    BelowEma,
    /// price delta < 0 and return > min
    FallingPrice,
}

impl SellCondition {
    pub fn id(&self) -> i64 {
        match self {
            SellCondition::MinReturn => 1,
            SellCondition::BelowEmaOrDoubleReturn => 2,
            SellCondition::AboveEma => 3,
            SellCondition::BelowEmaMacdCross => 4,
            SellCondition::BelowEma => 5,
            SellCondition::FallingPrice => 6,
        }
    }

    pub fn required_indicators(&self) -> &'static [Indicator] {
        match self {
            SellCondition::MinReturn => &[],
            SellCondition::BelowEmaOrDoubleReturn
            | SellCondition::AboveEma
            | SellCondition::BelowEma => &[Indicator::Ema],
            SellCondition::BelowEmaMacdCross => {
                &[Indicator::Ema, Indicator::Macd, Indicator::Signal]
            }
            SellCondition::FallingPrice => &[Indicator::PriceDelta],
        }
    }
}

impl TryFrom<i64> for SellCondition {
    type Error = SweepError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(SellCondition::MinReturn),
            2 => Ok(SellCondition::BelowEmaOrDoubleReturn),
            3 => Ok(SellCondition::AboveEma),
            4 => Ok(SellCondition::BelowEmaMacdCross),
            5 => Ok(SellCondition::BelowEma),
            6 => Ok(SellCondition::FallingPrice),
            _ => Err(SweepError::InvalidSellCondition { id }),
        }
    }
}

impl fmt::Display for SellCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

fn macd_cross(row: &PriceRow) -> Option<bool> {
    Some(row.macd? > row.signal? && row.close > row.ema?)
}

fn sar_trend(row: &PriceRow) -> Option<bool> {
    Some(row.sar? < row.close && row.close > row.ema?)
}

fn buy_rule(variant: StrategyVariant, row: &PriceRow) -> Option<bool> {
    match variant {
        StrategyVariant::Macd => macd_cross(row),
        StrategyVariant::AltMacd => Some(macd_cross(row)? && row.macd? < 0.0),
        StrategyVariant::MacdChai => Some(macd_cross(row)? && row.chai? > 0.0),
        StrategyVariant::Psar => sar_trend(row),
        StrategyVariant::MacdPsar => Some(macd_cross(row)? && sar_trend(row)?),
    }
}

/// Buy signal for `variant` at `row`.
pub fn is_buy(variant: StrategyVariant, row: &PriceRow) -> bool {
    buy_rule(variant, row).unwrap_or(false)
}

fn sell_rule(
    condition: SellCondition,
    min_return: f64,
    current_return: f64,
    row: &PriceRow,
) -> Option<bool> {
    let above_min = current_return > min_return;
    let price = row.close;
    match condition {
        SellCondition::MinReturn => Some(above_min),
        SellCondition::BelowEmaOrDoubleReturn => {
            // the double-return branch holds without EMA
            let below_ema = row.ema.is_some_and(|ema| ema > price);
            Some((below_ema && above_min) || current_return > 2.0 * min_return)
        }
        SellCondition::AboveEma => Some(row.ema? < price && above_min),
        SellCondition::BelowEmaMacdCross => {
            Some(row.ema? > price && row.macd? < row.signal? && above_min)
        }
        SellCondition::BelowEma => Some(row.ema? > price && above_min),
        SellCondition::FallingPrice => Some(row.price_delta? < 0.0 && above_min),
    }
}

/// Sell signal for `condition` given the return since the last buy.
pub fn is_sell(
    condition: SellCondition,
    min_return: f64,
    current_return: f64,
    row: &PriceRow,
) -> bool {
    sell_rule(condition, min_return, current_return, row).unwrap_or(false)
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "NaN".to_string(), |v| v.to_string())
}

/// Indicator values used by `variant`, formatted for the event log.
pub fn indicator_snapshot(variant: StrategyVariant, row: &PriceRow) -> String {
    let fields: Vec<String> = variant
        .required_indicators()
        .iter()
        .map(|ind| {
            let label = match ind {
                Indicator::Signal => "SIG",
                Indicator::Sar => "PSAR",
                other => other.column(),
            };
            format!("{}: {}", label, fmt_value(row.indicator(*ind)))
        })
        .collect();
    format!("Strat: [{}]", fields.join(","))
}
