//! Per-combination result record and the buy-and-hold benchmark.

use crate::domain::strategy::StrategyVariant;

/// Column order of a result line.
pub const RESULT_HEADER: [&str; 19] = [
    "start_date",
    "end_date",
    "strategy",
    "ema",
    "reinvest_percentage",
    "min_return",
    "percent_drop",
    "balance_tripwire",
    "buy_hold",
    "final_value",
    "revenue",
    "tax",
    "fees",
    "transactions",
    "buys",
    "sells",
    "balances",
    "open_reserves",
    "data_file",
];

pub fn round_to(value: f64, places: i32) -> f64 {
    let ratio = 10f64.powi(places);
    (value * ratio).round() / ratio
}

/// Profit from buying at `first_price` with the whole investment and
/// selling at `last_price`, net of both fees and of tax on a gain.
pub fn buy_and_hold(
    first_price: f64,
    last_price: f64,
    fee_rate: f64,
    tax_rate: f64,
    investment: f64,
) -> f64 {
    let entry_fee = investment * fee_rate;
    let amount = (investment - entry_fee) / first_price;
    let proceeds = amount * last_price;
    let exit_fee = proceeds * fee_rate;
    let gain = proceeds - investment;
    if gain > 0.0 {
        gain - gain * tax_rate - exit_fee
    } else {
        gain - exit_fee
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub asset: String,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub strategy: StrategyVariant,
    pub ema_period: u32,
    pub reinvest_percentage: f64,
    pub min_return: f64,
    pub percent_drop: f64,
    pub balance_tripwire: f64,
    pub buy_hold: f64,
    pub final_value: f64,
    pub revenue: f64,
    pub tax: f64,
    pub fees: f64,
    pub transactions: usize,
    pub buys: Vec<usize>,
    pub sells: Vec<usize>,
    pub balances: Vec<usize>,
    pub open_reserves: Vec<usize>,
    pub source: String,
}

fn index_list(indices: &[usize]) -> String {
    let items: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
    format!("[{}]", items.join(" "))
}

impl SimulationResult {
    /// Fields in `RESULT_HEADER` order, money rounded to cents.
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.start_timestamp.to_string(),
            self.end_timestamp.to_string(),
            self.strategy.to_string(),
            self.ema_period.to_string(),
            self.reinvest_percentage.to_string(),
            self.min_return.to_string(),
            self.percent_drop.to_string(),
            self.balance_tripwire.to_string(),
            round_to(self.buy_hold, 2).to_string(),
            round_to(self.final_value, 2).to_string(),
            round_to(self.revenue, 2).to_string(),
            round_to(self.tax, 2).to_string(),
            round_to(self.fees, 2).to_string(),
            self.transactions.to_string(),
            index_list(&self.buys),
            index_list(&self.sells),
            index_list(&self.balances),
            index_list(&self.open_reserves),
            self.source.clone(),
        ]
    }
}
