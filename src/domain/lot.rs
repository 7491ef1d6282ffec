//! Purchase lots held by a simulation.

use std::fmt;

/// One discrete purchase, liquidated as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub price: f64,
    pub amount: f64,
    pub entry_index: usize,
}

impl Lot {
    /// Fractional return of this lot at `price`.
    pub fn return_at(&self, price: f64) -> f64 {
        (price - self.price) / self.price
    }

    pub fn cost_basis(&self) -> f64 {
        self.amount * self.price
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.amount * price
    }
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(Amount:{} Price:{} Index:{})",
            self.amount, self.price, self.entry_index
        )
    }
}

/// Ascending by entry price; ties keep their relative order.
pub fn sort_by_price(lots: &mut [Lot]) {
    lots.sort_by(|a, b| a.price.total_cmp(&b.price));
}

pub fn total_amount(lots: &[Lot]) -> f64 {
    lots.iter().map(|l| l.amount).sum()
}
