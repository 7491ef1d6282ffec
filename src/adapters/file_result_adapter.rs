//! File-backed result and event sinks.
//!
//! Results: `<output_dir>/<asset>/<run_name>.csv`, one line per
//! combination, shared by every combination of the asset.
//! Events: `<log_dir>/<range>/<asset>/<strategy>/EMA-<period>/MPBR-<tag>.log`,
//! one file per combination.

use crate::domain::combination::Combination;
use crate::domain::error::SweepError;
use crate::domain::event::SimulationEvent;
use crate::domain::market_data::DateRange;
use crate::domain::result::{SimulationResult, RESULT_HEADER};
use crate::ports::result_port::{EventLog, ResultSink};
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

pub struct FileResultSink {
    output_dir: PathBuf,
    log_dir: PathBuf,
    run_name: String,
    date_range: DateRange,
}

/// Result file stem derived from the sweep start time, e.g. `5March2024_1342`.
pub fn run_name(started: DateTime<Local>) -> String {
    started.format("%-d%B%Y_%H%M").to_string()
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> SweepError {
    SweepError::ResultWrite {
        reason: format!("{}: {}", path.display(), e),
    }
}

impl FileResultSink {
    pub fn new(output_dir: PathBuf, log_dir: PathBuf, run_name: String, date_range: DateRange) -> Self {
        Self {
            output_dir,
            log_dir,
            run_name,
            date_range,
        }
    }

    pub fn result_path(&self, asset: &str) -> PathBuf {
        self.output_dir
            .join(asset)
            .join(format!("{}.csv", self.run_name))
    }

    pub fn event_log_path(&self, combination: &Combination) -> PathBuf {
        self.log_dir
            .join(self.date_range.to_string())
            .join(&combination.asset)
            .join(combination.strategy.name())
            .join(format!("EMA-{}", combination.ema_period))
            .join(format!("MPBR-{}.log", combination.parameter_tag()))
    }
}

impl ResultSink for FileResultSink {
    fn append_result(&self, result: &SimulationResult) -> Result<(), SweepError> {
        let path = self.result_path(&result.asset);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| write_error(dir, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| write_error(&path, e))?;
        let is_new = file.metadata().map_err(|e| write_error(&path, e))?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer
                .write_record(RESULT_HEADER)
                .map_err(|e| write_error(&path, e))?;
        }
        writer
            .write_record(result.to_record())
            .map_err(|e| write_error(&path, e))?;
        writer.flush().map_err(|e| write_error(&path, e))
    }

    fn open_event_log(&self, combination: &Combination) -> Result<Box<dyn EventLog>, SweepError> {
        let path = self.event_log_path(combination);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| write_error(dir, e))?;
        }
        let file = File::create(&path).map_err(|e| write_error(&path, e))?;
        Ok(Box::new(FileEventLog {
            path,
            writer: LineWriter::new(file),
        }))
    }
}

/// Writes one event per line to a combination's log file.
pub struct FileEventLog {
    path: PathBuf,
    writer: LineWriter<File>,
}

impl EventLog for FileEventLog {
    fn record(&mut self, event: &SimulationEvent) -> Result<(), SweepError> {
        writeln!(self.writer, "{}", event).map_err(|e| write_error(&self.path, e))
    }
}
