//! Diagnostic events emitted by the simulation engine.

use std::fmt;

use crate::domain::lot::Lot;
use crate::domain::result::round_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Buy,
    Sell,
    Balance,
    OpenReserve,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Buy => "BUY",
            EventKind::Sell => "SELL",
            EventKind::Balance => "BAL",
            EventKind::OpenReserve => "OR",
        };
        f.write_str(s)
    }
}

/// Account snapshot taken right after an action was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationEvent {
    pub kind: EventKind,
    /// Asset amount liquidated; only set on `Sell`.
    pub amount: Option<f64>,
    pub timestamp: i64,
    pub index: usize,
    pub price: f64,
    pub capital: f64,
    pub asset: f64,
    pub reserves: f64,
    pub revenue: f64,
    pub tax: f64,
    pub fees: f64,
    pub lots: Vec<Lot>,
    pub indicators: String,
}

impl fmt::Display for SimulationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},", self.kind)?;
        if let Some(amount) = self.amount {
            write!(f, "Amount {},", amount)?;
        }
        write!(
            f,
            "Timestamp {},Index {},Price {},Capital {},Asset {},Reserves {},Revenue {},Tax {},Fees {},",
            self.timestamp,
            self.index,
            round_to(self.price, 2),
            round_to(self.capital, 2),
            self.asset,
            round_to(self.reserves, 2),
            round_to(self.revenue, 2),
            round_to(self.tax, 2),
            round_to(self.fees, 2),
        )?;
        f.write_str("Lots [")?;
        for lot in &self.lots {
            write!(f, "{},", lot)?;
        }
        write!(f, "],{}", self.indicators)
    }
}
