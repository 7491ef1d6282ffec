//! CSV file market data adapter.
//!
//! Layout: `<base>/<asset>/*.csv`. The most recently modified file of an
//! asset is the current one. Files carry a header row with `Date` (integer
//! timestamp), `Close` and any of the indicator columns.

use crate::domain::error::SweepError;
use crate::domain::market_data::{validate_row_count, DateRange};
use crate::domain::price_row::{Indicator, PriceRow, PriceSeries};
use crate::ports::data_port::DataPort;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const DATE_COLUMN: &str = "Date";
const CLOSE_COLUMN: &str = "Close";

const INDICATORS: [Indicator; 6] = [
    Indicator::Ema,
    Indicator::Macd,
    Indicator::Signal,
    Indicator::Sar,
    Indicator::Chai,
    Indicator::PriceDelta,
];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn asset_dir(&self, asset: &str) -> PathBuf {
        self.base_path.join(asset)
    }

    /// Newest file in the asset directory by modification time.
    pub fn latest_file(&self, asset: &str) -> Result<PathBuf, SweepError> {
        let dir = self.asset_dir(asset);
        let entries = fs::read_dir(&dir).map_err(|e| SweepError::DataRead {
            reason: format!("failed to read directory {}: {}", dir.display(), e),
        })?;

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in entries {
            let entry = entry.map_err(|e| SweepError::DataRead {
                reason: format!("directory entry error: {}", e),
            })?;
            let meta = entry.metadata().map_err(|e| SweepError::DataRead {
                reason: format!("failed to stat {}: {}", entry.path().display(), e),
            })?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().map_err(|e| SweepError::DataRead {
                reason: format!("no modification time for {}: {}", entry.path().display(), e),
            })?;
            if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
                newest = Some((modified, entry.path()));
            }
        }

        newest.map(|(_, path)| path).ok_or_else(|| SweepError::DataRead {
            reason: format!("no data files in {}", dir.display()),
        })
    }

    /// Parses every row of `path`, in file order.
    pub fn read_rows(path: &Path) -> Result<Vec<PriceRow>, SweepError> {
        let mut rdr = csv::Reader::from_path(path).map_err(|e| SweepError::DataRead {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let headers = rdr
            .headers()
            .map_err(|e| SweepError::DataRead {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);

        let date_col = column(DATE_COLUMN).ok_or_else(|| SweepError::DataRead {
            reason: format!("missing {} column in {}", DATE_COLUMN, path.display()),
        })?;
        let close_col = column(CLOSE_COLUMN).ok_or_else(|| SweepError::DataRead {
            reason: format!("missing {} column in {}", CLOSE_COLUMN, path.display()),
        })?;
        let indicator_cols: Vec<(Indicator, usize)> = INDICATORS
            .iter()
            .filter_map(|ind| column(ind.column()).map(|i| (*ind, i)))
            .collect();

        let mut rows = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| SweepError::DataRead {
                reason: format!("CSV parse error: {}", e),
            })?;

            let timestamp = record
                .get(date_col)
                .and_then(parse_timestamp)
                .ok_or_else(|| SweepError::DataRead {
                    reason: format!("invalid {} value on row {}", DATE_COLUMN, line + 1),
                })?;
            let close = record
                .get(close_col)
                .and_then(parse_value)
                .ok_or_else(|| SweepError::DataRead {
                    reason: format!("invalid {} value on row {}", CLOSE_COLUMN, line + 1),
                })?;

            let mut row = PriceRow::new(timestamp, close);
            for (ind, col) in &indicator_cols {
                let value = record.get(*col).and_then(parse_value);
                match ind {
                    Indicator::Ema => row.ema = value,
                    Indicator::Macd => row.macd = value,
                    Indicator::Signal => row.signal = value,
                    Indicator::Sar => row.sar = value,
                    Indicator::Chai => row.chai = value,
                    Indicator::PriceDelta => row.price_delta = value,
                }
            }
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Empty cells and NaN are treated as absent.
fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|v| v as i64))
}

impl DataPort for CsvAdapter {
    fn load_series(&self, asset: &str, range: &DateRange) -> Result<PriceSeries, SweepError> {
        let path = self.latest_file(asset)?;
        let rows = Self::read_rows(&path)?;
        validate_row_count(asset, rows.len(), range)?;
        if rows.is_empty() {
            return Err(SweepError::NoData {
                asset: asset.to_string(),
            });
        }
        Ok(PriceSeries::new(asset, rows, path.display().to_string()))
    }
}
