//! Domain error types.

/// Top-level error type for sweeptrader.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid strategy: {name}")]
    InvalidStrategy { name: String },

    #[error("invalid sell condition: {id} (expected 1-6)")]
    InvalidSellCondition { id: i64 },

    #[error("[{asset}] missing indicator column {indicator}")]
    MissingIndicator { asset: String, indicator: String },

    #[error("[{asset}] invalid data: expected [{expected}] received [{received}]")]
    InvalidData {
        asset: String,
        received: usize,
        expected: i64,
    },

    #[error("no data for {asset}")]
    NoData { asset: String },

    #[error("data read error: {reason}")]
    DataRead { reason: String },

    #[error("result write error: {reason}")]
    ResultWrite { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SweepError {
    /// Errors that skip a single combination instead of aborting the sweep.
    pub fn is_data_validity(&self) -> bool {
        matches!(self, SweepError::InvalidData { .. } | SweepError::NoData { .. })
    }
}

impl From<&SweepError> for std::process::ExitCode {
    fn from(err: &SweepError) -> Self {
        let code: u8 = match err {
            SweepError::Io(_) => 1,
            SweepError::ConfigParse { .. }
            | SweepError::ConfigMissing { .. }
            | SweepError::ConfigInvalid { .. } => 2,
            SweepError::DataRead { .. } | SweepError::ResultWrite { .. } => 3,
            SweepError::InvalidStrategy { .. }
            | SweepError::InvalidSellCondition { .. }
            | SweepError::MissingIndicator { .. } => 4,
            SweepError::InvalidData { .. } | SweepError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
