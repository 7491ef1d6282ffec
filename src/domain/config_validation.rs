//! Configuration reading and validation.
//!
//! Validates all sweep settings before any combination is dispatched.

use crate::domain::error::SweepError;
use crate::domain::market_data::{parse_date, DateRange};
use crate::domain::strategy::{SellCondition, StrategyVariant};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::fmt;

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), SweepError> {
    validate_assets(config)?;
    validate_investment(config)?;
    validate_rates(config)?;
    read_date_range(config)?;
    validate_strategies(config)?;
    validate_ema_values(config)?;
    validate_fractions(config)?;
    validate_drops_and_tripwires(config)?;
    read_sell_condition(config)?;
    validate_files(config)?;
    read_workers(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SweepError {
    SweepError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> SweepError {
    SweepError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// Non-empty list of raw tokens without repeats.
pub fn read_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Vec<String>, SweepError> {
    let values = config
        .get_list(section, key)
        .ok_or_else(|| missing(section, key))?;
    if values.is_empty() {
        return Err(invalid(section, key, "at least one value is required"));
    }
    reject_duplicates(section, key, &values)?;
    Ok(values)
}

/// Repeated values would map two combinations onto one event log.
fn reject_duplicates<T: PartialEq + fmt::Display>(
    section: &str,
    key: &str,
    values: &[T],
) -> Result<(), SweepError> {
    for (i, v) in values.iter().enumerate() {
        if values[..i].contains(v) {
            return Err(invalid(section, key, format!("duplicate value: {v}")));
        }
    }
    Ok(())
}

fn parse_finite(section: &str, key: &str, raw: &str) -> Result<f64, SweepError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(invalid(section, key, format!("not a finite number: {raw}"))),
    }
}

pub fn read_double_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Vec<f64>, SweepError> {
    let values = read_list(config, section, key)?
        .iter()
        .map(|s| parse_finite(section, key, s))
        .collect::<Result<Vec<f64>, SweepError>>()?;
    reject_duplicates(section, key, &values)?;
    Ok(values)
}

pub fn read_int_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Vec<u32>, SweepError> {
    let values = read_list(config, section, key)?
        .iter()
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| invalid(section, key, format!("not a non-negative integer: {s}")))
        })
        .collect::<Result<Vec<u32>, SweepError>>()?;
    reject_duplicates(section, key, &values)?;
    Ok(values)
}

/// Scalar number, `default` when absent. Malformed or non-finite values
/// are rejected rather than replaced by the default.
pub fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SweepError> {
    match config.try_get_double(section, key) {
        Ok(Some(v)) if v.is_finite() => Ok(v),
        Ok(Some(v)) => Err(invalid(section, key, format!("not a finite number: {v}"))),
        Ok(None) => Ok(default),
        Err(reason) => Err(invalid(section, key, format!("not a number ({reason})"))),
    }
}

pub fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, SweepError> {
    match config.try_get_int(section, key) {
        Ok(value) => Ok(value.unwrap_or(default)),
        Err(reason) => Err(invalid(section, key, format!("not an integer ({reason})"))),
    }
}

pub fn read_strategies(config: &dyn ConfigPort) -> Result<Vec<StrategyVariant>, SweepError> {
    read_list(config, "parameters", "strategies")?
        .iter()
        .map(|s| s.parse::<StrategyVariant>())
        .collect()
}

pub fn read_sell_condition(config: &dyn ConfigPort) -> Result<SellCondition, SweepError> {
    let raw = config
        .get_string("parameters", "sell_condition")
        .ok_or_else(|| missing("parameters", "sell_condition"))?;
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("parameters", "sell_condition", "not an integer"))?;
    SellCondition::try_from(id)
}

fn read_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, SweepError> {
    let raw = config
        .get_string("simulation", key)
        .ok_or_else(|| missing("simulation", key))?;
    parse_date(&raw).ok_or_else(|| {
        invalid(
            "simulation",
            key,
            format!("invalid {key} format, expected YYYY-MM-DD or 02Jan2006"),
        )
    })
}

pub fn read_date_range(config: &dyn ConfigPort) -> Result<DateRange, SweepError> {
    let start = read_date(config, "start_date")?;
    let end = read_date(config, "end_date")?;
    if start >= end {
        return Err(invalid(
            "simulation",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(DateRange::new(start, end))
}

fn validate_assets(config: &dyn ConfigPort) -> Result<(), SweepError> {
    read_list(config, "simulation", "assets").map(|_| ())
}

fn validate_investment(config: &dyn ConfigPort) -> Result<(), SweepError> {
    let value = read_double(config, "simulation", "invest_amt", 0.0)?;
    if value <= 0.0 {
        return Err(invalid(
            "simulation",
            "invest_amt",
            "invest_amt must be positive",
        ));
    }
    Ok(())
}

fn validate_rates(config: &dyn ConfigPort) -> Result<(), SweepError> {
    for key in ["tax_rate", "fees"] {
        let value = read_double(config, "simulation", key, 0.0)?;
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "simulation",
                key,
                format!("{key} must be between 0 and 1"),
            ));
        }
    }
    Ok(())
}

/// `[sweep] workers`; 0 or absent sizes the pool to the machine.
pub fn read_workers(config: &dyn ConfigPort) -> Result<usize, SweepError> {
    let workers = read_int(config, "sweep", "workers", 0)?;
    usize::try_from(workers)
        .map_err(|_| invalid("sweep", "workers", "workers must not be negative"))
}

fn validate_strategies(config: &dyn ConfigPort) -> Result<(), SweepError> {
    read_strategies(config).map(|_| ())
}

fn validate_ema_values(config: &dyn ConfigPort) -> Result<(), SweepError> {
    let values = read_int_list(config, "parameters", "ema_values")?;
    if values.contains(&0) {
        return Err(invalid("parameters", "ema_values", "periods must be positive"));
    }
    Ok(())
}

fn validate_fractions(config: &dyn ConfigPort) -> Result<(), SweepError> {
    let values = read_double_list(config, "parameters", "reinvest_percentages")?;
    if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
        return Err(invalid(
            "parameters",
            "reinvest_percentages",
            "values must be between 0 and 1",
        ));
    }
    read_double_list(config, "parameters", "min_returns")?;
    Ok(())
}

fn validate_drops_and_tripwires(config: &dyn ConfigPort) -> Result<(), SweepError> {
    let drops = read_double_list(config, "parameters", "percent_drops")?;
    if drops.iter().any(|v| *v < 0.0) {
        return Err(invalid(
            "parameters",
            "percent_drops",
            "drops are magnitudes and must be non-negative",
        ));
    }
    let trips = read_double_list(config, "parameters", "balance_tripwires")?;
    if trips.iter().any(|v| *v <= 0.0) {
        return Err(invalid(
            "parameters",
            "balance_tripwires",
            "tripwires must be positive",
        ));
    }
    Ok(())
}

fn validate_files(config: &dyn ConfigPort) -> Result<(), SweepError> {
    for key in ["data_dir", "output_dir", "log_dir"] {
        match config.get_string("files", key) {
            Some(s) if !s.trim().is_empty() => {}
            Some(_) => return Err(invalid("files", key, "path must not be empty")),
            None => return Err(missing("files", key)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID: &str = r#"
[simulation]
assets = BTC ETH
invest_amt = 1000
tax_rate = 0.2
fees = 0.001
start_date = 01Jan2021
end_date = 01Jan2022

[parameters]
strategies = MACD PSAR alt-MACD
ema_values = 20 50
reinvest_percentages = 0.25 0.5
min_returns = 0.02 0.05
percent_drops = 0.1
balance_tripwires = 1.5 2
sell_condition = 2

[files]
data_dir = /data
output_dir = /out
log_dir = /logs
"#;

    fn with(replace: &str, by: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(&VALID.replace(replace, by)).unwrap()
    }

    #[test]
    fn valid_config_passes() {
        let adapter = FileConfigAdapter::from_string(VALID).unwrap();
        assert!(validate_sweep_config(&adapter).is_ok());
    }

    #[test]
    fn unknown_strategy_rejected() {
        let adapter = with("MACD PSAR alt-MACD", "MACD RSI");
        match validate_sweep_config(&adapter) {
            Err(SweepError::InvalidStrategy { name }) => assert_eq!(name, "RSI"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn sell_condition_out_of_range() {
        let adapter = with("sell_condition = 2", "sell_condition = 9");
        assert!(matches!(
            validate_sweep_config(&adapter),
            Err(SweepError::InvalidSellCondition { id: 9 })
        ));
    }

    #[test]
    fn missing_sell_condition() {
        let adapter = with("sell_condition = 2", "");
        assert!(matches!(
            validate_sweep_config(&adapter),
            Err(SweepError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn empty_domain_rejected() {
        let adapter = with("percent_drops = 0.1", "percent_drops =");
        match validate_sweep_config(&adapter) {
            Err(SweepError::ConfigInvalid { key, .. }) => assert_eq!(key, "percent_drops"),
            Err(SweepError::ConfigMissing { key, .. }) => assert_eq!(key, "percent_drops"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn malformed_number_rejected() {
        let adapter = with("min_returns = 0.02 0.05", "min_returns = 0.02 lots");
        match validate_sweep_config(&adapter) {
            Err(SweepError::ConfigInvalid { key, reason, .. }) => {
                assert_eq!(key, "min_returns");
                assert!(reason.contains("lots"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn reversed_dates_rejected() {
        let adapter = with("end_date = 01Jan2022", "end_date = 01Jan2020");
        assert!(matches!(
            validate_sweep_config(&adapter),
            Err(SweepError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn iso_dates_accepted() {
        let adapter = with("start_date = 01Jan2021", "start_date = 2021-01-01");
        let range = read_date_range(&adapter).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
    }

    #[test]
    fn non_positive_investment_rejected() {
        let adapter = with("invest_amt = 1000", "invest_amt = 0");
        assert!(validate_sweep_config(&adapter).is_err());
    }

    #[test]
    fn fee_rate_bounds() {
        let adapter = with("fees = 0.001", "fees = 1.5");
        match validate_sweep_config(&adapter) {
            Err(SweepError::ConfigInvalid { key, .. }) => assert_eq!(key, "fees"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_files_section() {
        let adapter = with("log_dir = /logs", "");
        match validate_sweep_config(&adapter) {
            Err(SweepError::ConfigMissing { section, key }) => {
                assert_eq!(section, "files");
                assert_eq!(key, "log_dir");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_tax_rate_rejected() {
        let adapter = with("tax_rate = 0.2", "tax_rate = twenty%");
        match validate_sweep_config(&adapter) {
            Err(SweepError::ConfigInvalid { key, reason, .. }) => {
                assert_eq!(key, "tax_rate");
                assert!(reason.contains("not a number"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_investment_rejected() {
        let adapter = with("invest_amt = 1000", "invest_amt = lots");
        match validate_sweep_config(&adapter) {
            Err(SweepError::ConfigInvalid { key, .. }) => assert_eq!(key, "invest_amt"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn absent_rates_default_to_zero() {
        let adapter = with("fees = 0.001", "");
        assert_eq!(read_double(&adapter, "simulation", "fees", 0.0).unwrap(), 0.0);
        assert!(validate_sweep_config(&adapter).is_ok());
    }

    #[test]
    fn non_finite_list_values_rejected() {
        let adapter = with("min_returns = 0.02 0.05", "min_returns = 0.02 NaN");
        match read_double_list(&adapter, "parameters", "min_returns") {
            Err(SweepError::ConfigInvalid { reason, .. }) => assert!(reason.contains("NaN")),
            other => panic!("unexpected: {other:?}"),
        }
        let adapter = with("balance_tripwires = 1.5 2", "balance_tripwires = inf");
        assert!(validate_sweep_config(&adapter).is_err());
    }

    #[test]
    fn duplicate_values_rejected() {
        let adapter = with("assets = BTC ETH", "assets = BTC BTC");
        match validate_sweep_config(&adapter) {
            Err(SweepError::ConfigInvalid { key, reason, .. }) => {
                assert_eq!(key, "assets");
                assert!(reason.contains("BTC"));
            }
            other => panic!("unexpected: {other:?}"),
        }

        let adapter = with("min_returns = 0.02 0.05", "min_returns = 0.1 0.10");
        match validate_sweep_config(&adapter) {
            Err(SweepError::ConfigInvalid { key, .. }) => assert_eq!(key, "min_returns"),
            other => panic!("unexpected: {other:?}"),
        }

        let adapter = with("ema_values = 20 50", "ema_values = 20 020");
        assert!(read_int_list(&adapter, "parameters", "ema_values").is_err());
    }

    #[test]
    fn malformed_workers_rejected() {
        let adapter = FileConfigAdapter::from_string(&format!("{VALID}\n[sweep]\nworkers = abc\n"))
            .unwrap();
        match validate_sweep_config(&adapter) {
            Err(SweepError::ConfigInvalid { section, key, .. }) => {
                assert_eq!(section, "sweep");
                assert_eq!(key, "workers");
            }
            other => panic!("unexpected: {other:?}"),
        }
        let adapter = FileConfigAdapter::from_string(VALID).unwrap();
        assert_eq!(read_workers(&adapter).unwrap(), 0);
    }

    #[test]
    fn lists_accept_commas() {
        let adapter = with("ema_values = 20 50", "ema_values = 20, 50,100");
        assert_eq!(
            read_int_list(&adapter, "parameters", "ema_values").unwrap(),
            vec![20, 50, 100]
        );
    }
}
