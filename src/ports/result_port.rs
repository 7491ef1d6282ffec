//! Result and diagnostic event sinks.

use crate::domain::combination::Combination;
use crate::domain::error::SweepError;
use crate::domain::event::SimulationEvent;
use crate::domain::result::SimulationResult;

/// Append-only log of one combination's actions.
pub trait EventLog {
    fn record(&mut self, event: &SimulationEvent) -> Result<(), SweepError>;
}

/// Collects events in memory.
impl EventLog for Vec<SimulationEvent> {
    fn record(&mut self, event: &SimulationEvent) -> Result<(), SweepError> {
        self.push(event.clone());
        Ok(())
    }
}

pub trait ResultSink {
    /// Appends one line to the asset's result file. Result files are shared
    /// across workers; the caller serializes calls.
    fn append_result(&self, result: &SimulationResult) -> Result<(), SweepError>;

    /// Opens the private event log of `combination`. Each combination owns
    /// its log, so no locking is needed.
    fn open_event_log(&self, combination: &Combination) -> Result<Box<dyn EventLog>, SweepError>;
}
