//! Date ranges and the row-volume sanity check applied to loaded series.

use chrono::NaiveDate;
use std::fmt;

use crate::domain::error::SweepError;

/// Maximum tolerated |actual − expected| row deviation, in days.
pub const MAX_ROW_DEVIATION_DAYS: f64 = 600.0;

/// Accepted date formats: ISO and the compact `02Jan2006` form.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d%b%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Whole hours between start and end; the implied row count.
    pub fn expected_rows(&self) -> i64 {
        (self.end - self.start).num_hours()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%d%b%Y"),
            self.end.format("%d%b%Y")
        )
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Rejects a series whose length is implausible for `range`.
///
/// This is a coarse guard against truncated files, not a calendar check:
/// the row count is compared with the hour count and the difference is
/// scaled to days.
pub fn validate_row_count(asset: &str, actual: usize, range: &DateRange) -> Result<(), SweepError> {
    let expected = range.expected_rows();
    let deviation = (actual as f64 - expected as f64) / 24.0;
    if deviation.abs() > MAX_ROW_DEVIATION_DAYS {
        return Err(SweepError::InvalidData {
            asset: asset.to_string(),
            received: actual,
            expected,
        });
    }
    Ok(())
}
