//! Parallel sweep over every parameter combination.
//!
//! A bounded pool of worker threads drains a work queue of combinations.
//! Each worker loads the asset's series, runs one simulation and appends
//! its result, then reports the outcome to the aggregator on the calling
//! thread. Market-data reads and result appends each go through their own
//! exclusive section; simulations themselves share nothing.

use crossbeam_channel::{bounded, unbounded};
use indicatif::ProgressBar;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::domain::combination::Combination;
use crate::domain::error::SweepError;
use crate::domain::simulation::Simulation;
use crate::domain::sweep::SweepConfig;
use crate::ports::data_port::DataPort;
use crate::ports::result_port::ResultSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
}

#[derive(Debug)]
enum TaskOutcome {
    Completed,
    Skipped,
    Failed(SweepError),
}

pub struct Orchestrator<'a> {
    config: SweepConfig,
    data: &'a (dyn DataPort + Sync),
    sink: &'a (dyn ResultSink + Sync),
    progress: ProgressBar,
    data_lock: Mutex<()>,
    output_lock: Mutex<()>,
}

fn lock(mutex: &Mutex<()>) -> MutexGuard<'_, ()> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: SweepConfig,
        data: &'a (dyn DataPort + Sync),
        sink: &'a (dyn ResultSink + Sync),
    ) -> Self {
        Self {
            config,
            data,
            sink,
            progress: ProgressBar::hidden(),
            data_lock: Mutex::new(()),
            output_lock: Mutex::new(()),
        }
    }

    /// Reports progress on `progress`; hidden by default.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        progress.set_length(self.config.combination_count() as u64);
        self.progress = progress;
        self
    }

    /// Configured worker count, or available parallelism, never more than
    /// there are combinations.
    pub fn worker_count(&self) -> usize {
        let wanted = match self.config.workers {
            0 => num_cpus::get(),
            n => n,
        };
        wanted.min(self.config.combination_count()).max(1)
    }

    /// Runs every combination. The first fatal error stops dispatch and is
    /// returned once in-flight tasks have drained; results already appended
    /// stay on disk.
    pub fn run(&self) -> Result<SweepSummary, SweepError> {
        self.config.check_domains()?;
        let total = self.config.combination_count();
        let workers = self.worker_count();
        info!(
            "Running {} combinations on {} worker threads",
            total, workers
        );

        let (task_tx, task_rx) = bounded::<Combination>(workers * 2);
        let (outcome_tx, outcome_rx) = unbounded::<TaskOutcome>();
        let abort = AtomicBool::new(false);

        let mut summary = SweepSummary {
            total,
            completed: 0,
            skipped: 0,
        };
        let mut failure: Option<SweepError> = None;

        thread::scope(|scope| {
            let abort = &abort;
            let config = &self.config;

            scope.spawn(move || {
                for combination in config.combinations() {
                    if abort.load(Ordering::Relaxed) || task_tx.send(combination).is_err() {
                        break;
                    }
                }
            });

            for _ in 0..workers {
                let rx = task_rx.clone();
                let tx = outcome_tx.clone();
                scope.spawn(move || {
                    while let Ok(combination) = rx.recv() {
                        if abort.load(Ordering::Relaxed) {
                            break;
                        }
                        if tx.send(self.run_task(&combination)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(task_rx);
            drop(outcome_tx);

            for outcome in outcome_rx.iter() {
                match outcome {
                    TaskOutcome::Completed => summary.completed += 1,
                    TaskOutcome::Skipped => summary.skipped += 1,
                    TaskOutcome::Failed(e) => {
                        error!("Aborting sweep: {}", e);
                        abort.store(true, Ordering::Relaxed);
                        failure.get_or_insert(e);
                    }
                }
                self.progress.inc(1);
            }
        });

        if let Some(e) = failure {
            self.progress.abandon_with_message("Sweep aborted");
            return Err(e);
        }
        self.progress.finish_with_message("Sweep complete");
        info!(
            "Sweep finished: {} completed, {} skipped of {}",
            summary.completed, summary.skipped, summary.total
        );
        Ok(summary)
    }

    fn run_task(&self, combination: &Combination) -> TaskOutcome {
        match self.simulate(combination) {
            Ok(()) => {
                debug!("Completed {}", combination.label());
                TaskOutcome::Completed
            }
            Err(e) if e.is_data_validity() => {
                warn!("Skipping {}: {}", combination.label(), e);
                TaskOutcome::Skipped
            }
            Err(e) => TaskOutcome::Failed(e),
        }
    }

    fn simulate(&self, combination: &Combination) -> Result<(), SweepError> {
        let series = {
            let _guard = lock(&self.data_lock);
            self.data
                .load_series(&combination.asset, &self.config.date_range)?
        };

        let mut log = self.sink.open_event_log(combination)?;
        let result = Simulation::new(combination, self.config.costs, &series)?.run(log.as_mut())?;

        let _guard = lock(&self.output_lock);
        self.sink.append_result(&result)
    }
}
