#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use sweeptrader::domain::combination::{Combination, TradingCosts};
use sweeptrader::domain::error::SweepError;
use sweeptrader::domain::event::SimulationEvent;
use sweeptrader::domain::market_data::DateRange;
pub use sweeptrader::domain::price_row::{PriceRow, PriceSeries};
use sweeptrader::domain::result::SimulationResult;
use sweeptrader::domain::strategy::{SellCondition, StrategyVariant};
use sweeptrader::domain::sweep::SweepConfig;
use sweeptrader::ports::data_port::DataPort;
use sweeptrader::ports::result_port::{EventLog, ResultSink};

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Row volume outside the tolerated band; skips the combination.
    InvalidData,
    /// Unreadable source; aborts the sweep.
    ReadError,
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceRow>>,
    pub failures: HashMap<String, Failure>,
    pub calls: AtomicUsize,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            failures: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_rows(mut self, asset: &str, rows: Vec<PriceRow>) -> Self {
        self.data.insert(asset.to_string(), rows);
        self
    }

    pub fn with_failure(mut self, asset: &str, failure: Failure) -> Self {
        self.failures.insert(asset.to_string(), failure);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataPort for MockDataPort {
    fn load_series(&self, asset: &str, range: &DateRange) -> Result<PriceSeries, SweepError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures.get(asset) {
            Some(Failure::InvalidData) => {
                return Err(SweepError::InvalidData {
                    asset: asset.to_string(),
                    received: 3,
                    expected: range.expected_rows(),
                });
            }
            Some(Failure::ReadError) => {
                return Err(SweepError::DataRead {
                    reason: format!("cannot open {asset}"),
                });
            }
            None => {}
        }
        match self.data.get(asset) {
            Some(rows) if !rows.is_empty() => {
                Ok(PriceSeries::new(asset, rows.clone(), format!("{asset}.csv")))
            }
            _ => Err(SweepError::NoData {
                asset: asset.to_string(),
            }),
        }
    }
}

/// Collects results and per-combination event counts in memory.
pub struct MemorySink {
    pub results: Mutex<Vec<SimulationResult>>,
    pub logs_opened: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            logs_opened: AtomicUsize::new(0),
        }
    }

    pub fn results(&self) -> Vec<SimulationResult> {
        self.results.lock().unwrap().clone()
    }
}

impl ResultSink for MemorySink {
    fn append_result(&self, result: &SimulationResult) -> Result<(), SweepError> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }

    fn open_event_log(&self, _combination: &Combination) -> Result<Box<dyn EventLog>, SweepError> {
        self.logs_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Vec::<SimulationEvent>::new()))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Row carrying every indicator column. EMA sits below the close, SAR below
/// the close and CHAI positive, so MACD above SIGNAL means a buy for every
/// strategy variant except alt-MACD (which also needs MACD < 0).
pub fn make_row(timestamp: i64, close: f64, macd: f64, signal: f64) -> PriceRow {
    PriceRow {
        ema: Some(close * 0.5),
        macd: Some(macd),
        signal: Some(signal),
        sar: Some(close * 0.5),
        chai: Some(1.0),
        price_delta: Some(0.0),
        ..PriceRow::new(timestamp, close)
    }
}

/// Buy at 100, then climb: every later row is a sell opportunity.
pub fn rising_rows() -> Vec<PriceRow> {
    let mut rows = vec![make_row(0, 100.0, 1.0, 0.0)];
    for i in 1..10 {
        rows.push(make_row(i, 100.0 + 10.0 * i as f64, -1.0, 0.0));
    }
    rows
}

pub fn sample_config(assets: &[&str]) -> SweepConfig {
    SweepConfig {
        assets: assets.iter().map(|a| a.to_string()).collect(),
        strategies: vec![StrategyVariant::Macd, StrategyVariant::MacdPsar],
        ema_periods: vec![20, 50],
        reinvest_percentages: vec![0.5],
        min_returns: vec![0.02, 0.05],
        percent_drops: vec![0.1],
        balance_tripwires: vec![2.0],
        sell_condition: SellCondition::MinReturn,
        costs: TradingCosts {
            investment: 1000.0,
            tax_rate: 0.2,
            fee_rate: 0.001,
        },
        date_range: DateRange::new(date(2021, 1, 1), date(2021, 1, 2)),
        workers: 4,
    }
}
