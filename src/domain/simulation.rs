//! Per-combination trading simulation.
//!
//! The engine walks a price series one row at a time. Half of the initial
//! investment starts as trading capital and half as reserves. Each step
//! takes at most one action, in priority order:
//!
//! 1. Sell qualifying lots (then rebalance capital and reserves if the
//!    ratio between them crossed the tripwire)
//! 2. Buy with all available capital
//! 3. Open reserves after a deep enough drop since the last buy
//!
//! Buying is only considered while capital is positive and selling only
//! once capital has been fully deployed.

use crate::domain::combination::{Combination, TradingCosts};
use crate::domain::error::SweepError;
use crate::domain::event::{EventKind, SimulationEvent};
use crate::domain::lot::{self, Lot};
use crate::domain::price_row::{PriceRow, PriceSeries};
use crate::domain::result::{buy_and_hold, SimulationResult};
use crate::domain::strategy::{self, SellCondition, StrategyVariant};
use crate::ports::result_port::EventLog;

/// Fraction of the initial investment below which reserves stay closed.
pub const MIN_RESERVE_FRACTION: f64 = 0.125;

/// Capital below this is treated as fully deployed.
pub const EMPTY_CAPITAL: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Sell,
    Buy,
    OpenReserve,
    Hold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub capital: f64,
    pub reserves: f64,
    pub asset: f64,
    pub last_buy_price: f64,
    pub revenue: f64,
    pub tax: f64,
    pub fees: f64,
    pub transactions: usize,
    /// Most recent purchase first until a sell re-sorts them by price.
    pub lots: Vec<Lot>,
    pub buys: Vec<usize>,
    pub sells: Vec<usize>,
    pub balances: Vec<usize>,
    pub open_reserves: Vec<usize>,
}

impl SimulationState {
    pub fn new(initial_investment: f64) -> Self {
        SimulationState {
            capital: initial_investment / 2.0,
            reserves: initial_investment / 2.0,
            asset: 0.0,
            last_buy_price: 0.0,
            revenue: 0.0,
            tax: 0.0,
            fees: 0.0,
            transactions: 0,
            lots: Vec::new(),
            buys: Vec::new(),
            sells: Vec::new(),
            balances: Vec::new(),
            open_reserves: Vec::new(),
        }
    }

    /// Return since the last buy; `None` before the first buy.
    pub fn current_return(&self, price: f64) -> Option<f64> {
        if self.last_buy_price > 0.0 {
            Some((price - self.last_buy_price) / self.last_buy_price)
        } else {
            None
        }
    }

    pub fn portfolio_value(&self, price: f64) -> f64 {
        self.capital + self.reserves + self.asset * price
    }
}

pub struct Simulation<'a> {
    combination: &'a Combination,
    costs: TradingCosts,
    series: &'a PriceSeries,
    min_reserves: f64,
    state: SimulationState,
    cursor: usize,
}

impl<'a> Simulation<'a> {
    /// Fails with `NoData` on an empty series and with `MissingIndicator`
    /// when the first row lacks a column the strategy or sell rule reads.
    pub fn new(
        combination: &'a Combination,
        costs: TradingCosts,
        series: &'a PriceSeries,
    ) -> Result<Self, SweepError> {
        let first = series.first().ok_or_else(|| SweepError::NoData {
            asset: series.asset.clone(),
        })?;
        check_indicators(
            &series.asset,
            first,
            combination.strategy,
            combination.sell_condition,
        )?;

        Ok(Simulation {
            combination,
            costs,
            series,
            min_reserves: costs.investment * MIN_RESERVE_FRACTION,
            state: SimulationState::new(costs.investment),
            cursor: 0,
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.series.len()
    }

    fn row(&self) -> &'a PriceRow {
        &self.series.rows[self.cursor]
    }

    /// Action the engine would take at the current row.
    pub fn decide(&self) -> Action {
        let row = self.row();
        let state = &self.state;
        let current_return = state.current_return(row.close);

        if state.capital > 0.0 {
            if strategy::is_buy(self.combination.strategy, row) {
                return Action::Buy;
            }
        } else if state.asset > 0.0 {
            let sell = current_return.is_some_and(|r| {
                strategy::is_sell(
                    self.combination.sell_condition,
                    self.combination.min_return,
                    r,
                    row,
                )
            });
            if sell {
                return Action::Sell;
            }
        }

        let dropped = current_return.is_some_and(|r| r < -self.combination.percent_drop);
        if state.capital < EMPTY_CAPITAL && dropped && state.reserves > self.min_reserves {
            return Action::OpenReserve;
        }
        Action::Hold
    }

    /// Applies the decision for the current row and advances the cursor.
    pub fn step(&mut self, log: &mut dyn EventLog) -> Result<Action, SweepError> {
        let action = self.decide();
        match action {
            Action::Sell => {
                self.sell(log)?;
                if self.balance_tripped() {
                    self.balance(log)?;
                }
            }
            Action::Buy => self.buy(log)?,
            Action::OpenReserve => self.open_reserve(log)?,
            Action::Hold => {}
        }
        self.cursor += 1;
        Ok(action)
    }

    /// Runs to the end of the series and builds the result record.
    pub fn run(mut self, log: &mut dyn EventLog) -> Result<SimulationResult, SweepError> {
        while !self.is_finished() {
            self.step(log)?;
        }
        Ok(self.finish())
    }

    fn buy(&mut self, log: &mut dyn EventLog) -> Result<(), SweepError> {
        let price = self.row().close;
        let state = &mut self.state;
        let fee = state.capital * self.costs.fee_rate;
        let amount = (state.capital - fee) / price;

        state.fees += fee;
        state.capital = 0.0;
        state.asset += amount;
        state.lots.insert(
            0,
            Lot {
                price,
                amount,
                entry_index: self.cursor,
            },
        );
        state.last_buy_price = price;
        state.transactions += 1;
        state.buys.push(self.cursor);

        self.emit(log, EventKind::Buy, None)
    }

    /// Liquidates lots cheapest first while each clears the minimum return.
    fn sell(&mut self, log: &mut dyn EventLog) -> Result<(), SweepError> {
        let price = self.row().close;
        let min_return = self.combination.min_return;
        let reinvest = self.combination.reinvest_percentage;
        let TradingCosts {
            tax_rate, fee_rate, ..
        } = self.costs;
        let state = &mut self.state;

        lot::sort_by_price(&mut state.lots);
        let mut sold = 0.0;
        while state
            .lots
            .first()
            .is_some_and(|l| l.return_at(price) > min_return)
        {
            let l = state.lots.remove(0);
            let proceeds = l.market_value(price);
            let fee = proceeds * fee_rate;
            let gain = proceeds - l.cost_basis();
            let tax = if gain > 0.0 { gain * tax_rate } else { 0.0 };
            let reward = gain - fee - tax;
            let to_capital = reward * reinvest;

            state.asset -= l.amount;
            state.capital += proceeds - gain + to_capital;
            state.revenue += reward - to_capital;
            state.tax += tax;
            state.fees += fee;
            sold += l.amount;
        }
        if state.lots.is_empty() {
            state.asset = 0.0;
        }
        state.asset = state.asset.max(0.0);
        state.transactions += 1;
        state.sells.push(self.cursor);

        self.emit(log, EventKind::Sell, Some(sold))
    }

    fn balance_tripped(&self) -> bool {
        let state = &self.state;
        state.reserves > 0.0 && state.capital / state.reserves > self.combination.balance_tripwire
    }

    fn balance(&mut self, log: &mut dyn EventLog) -> Result<(), SweepError> {
        let state = &mut self.state;
        let half = (state.capital + state.reserves) / 2.0;
        state.capital = half;
        state.reserves = half;
        state.balances.push(self.cursor);

        self.emit(log, EventKind::Balance, None)
    }

    /// Moves half the reserves into capital. Only reached with capital
    /// below `EMPTY_CAPITAL`, which is overwritten.
    fn open_reserve(&mut self, log: &mut dyn EventLog) -> Result<(), SweepError> {
        let state = &mut self.state;
        let half = state.reserves / 2.0;
        state.capital = half;
        state.reserves = half;
        state.open_reserves.push(self.cursor);

        self.emit(log, EventKind::OpenReserve, None)
    }

    fn emit(
        &self,
        log: &mut dyn EventLog,
        kind: EventKind,
        amount: Option<f64>,
    ) -> Result<(), SweepError> {
        let row = self.row();
        let state = &self.state;
        let event = SimulationEvent {
            kind,
            amount,
            timestamp: row.timestamp,
            index: self.cursor,
            price: row.close,
            capital: state.capital,
            asset: state.asset,
            reserves: state.reserves,
            revenue: state.revenue,
            tax: state.tax,
            fees: state.fees,
            lots: state.lots.clone(),
            indicators: strategy::indicator_snapshot(self.combination.strategy, row),
        };
        log.record(&event)
    }

    fn finish(self) -> SimulationResult {
        let rows = &self.series.rows;
        // `new` rejects empty series
        let first = &rows[0];
        let last = &rows[rows.len() - 1];
        let c = self.combination;
        let state = self.state;

        SimulationResult {
            asset: self.series.asset.clone(),
            start_timestamp: first.timestamp,
            end_timestamp: last.timestamp,
            strategy: c.strategy,
            ema_period: c.ema_period,
            reinvest_percentage: c.reinvest_percentage,
            min_return: c.min_return,
            percent_drop: c.percent_drop,
            balance_tripwire: c.balance_tripwire,
            buy_hold: buy_and_hold(
                first.close,
                last.close,
                self.costs.fee_rate,
                self.costs.tax_rate,
                self.costs.investment,
            ),
            final_value: state.portfolio_value(last.close),
            revenue: state.revenue,
            tax: state.tax,
            fees: state.fees,
            transactions: state.transactions,
            buys: state.buys,
            sells: state.sells,
            balances: state.balances,
            open_reserves: state.open_reserves,
            source: self.series.source.clone(),
        }
    }
}

/// Verifies `row` carries every indicator `variant` and `condition` read.
pub fn check_indicators(
    asset: &str,
    row: &PriceRow,
    variant: StrategyVariant,
    condition: SellCondition,
) -> Result<(), SweepError> {
    let missing = variant
        .required_indicators()
        .iter()
        .chain(condition.required_indicators())
        .find(|ind| !row.has_indicator(**ind));
    match missing {
        Some(ind) => Err(SweepError::MissingIndicator {
            asset: asset.to_string(),
            indicator: ind.to_string(),
        }),
        None => Ok(()),
    }
}
