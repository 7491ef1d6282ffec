//! Price rows with precomputed indicator fields.

use std::fmt;

/// Indicator columns a row may carry alongside its close price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Indicator {
    Ema,
    Macd,
    Signal,
    Sar,
    Chai,
    PriceDelta,
}

impl Indicator {
    /// Column header used in the input CSV files.
    pub fn column(&self) -> &'static str {
        match self {
            Indicator::Ema => "EMA",
            Indicator::Macd => "MACD",
            Indicator::Signal => "SIGNAL",
            Indicator::Sar => "SAR",
            Indicator::Chai => "CHAI",
            Indicator::PriceDelta => "dP",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceRow {
    pub timestamp: i64,
    pub close: f64,
    pub ema: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub sar: Option<f64>,
    pub chai: Option<f64>,
    pub price_delta: Option<f64>,
}

impl PriceRow {
    pub fn new(timestamp: i64, close: f64) -> Self {
        PriceRow {
            timestamp,
            close,
            ..Default::default()
        }
    }

    pub fn indicator(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::Ema => self.ema,
            Indicator::Macd => self.macd,
            Indicator::Signal => self.signal,
            Indicator::Sar => self.sar,
            Indicator::Chai => self.chai,
            Indicator::PriceDelta => self.price_delta,
        }
    }

    pub fn has_indicator(&self, indicator: Indicator) -> bool {
        self.indicator(indicator).is_some()
    }
}

/// An ascending series of rows for one asset plus the file it came from.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub asset: String,
    pub rows: Vec<PriceRow>,
    pub source: String,
}

impl PriceSeries {
    /// Sorts `rows` by timestamp before storing them.
    pub fn new(asset: impl Into<String>, mut rows: Vec<PriceRow>, source: impl Into<String>) -> Self {
        rows.sort_by_key(|r| r.timestamp);
        PriceSeries {
            asset: asset.into(),
            rows,
            source: source.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&PriceRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&PriceRow> {
        self.rows.last()
    }
}
