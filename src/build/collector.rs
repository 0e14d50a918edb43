//! Result collection
//!
//! A single collector thread owns the catalog-wide module list. It records
//! every worker result, reports progress, and then releases the result's
//! completion token, so the barrier opens only after the last result has
//! been recorded.

use crate::build::queue::ModuleTask;
use crate::build::BuildProgress;
use crate::error::{BuildError, WorkerError};
use crate::module::Module;
use crossbeam_channel::Receiver;
use crossbeam_utils::sync::WaitGroup;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// What happened to one candidate directory
#[derive(Debug)]
pub enum WorkOutcome {
    /// Processed and written
    Built(Box<Module>),

    /// No config file
    Inert,

    /// Processing or writing failed
    Failed(BuildError),

    /// Skipped because the build was cancelled
    Cancelled,
}

/// A worker's answer to one task
#[derive(Debug)]
pub struct WorkResult {
    /// Dispatch index of the task
    pub index: usize,

    /// Directory relative to the polyfill root
    pub relative: PathBuf,

    pub outcome: WorkOutcome,

    completion: WaitGroup,
}

impl WorkResult {
    /// Answer `task`, taking over its barrier token
    pub fn new(task: ModuleTask, outcome: WorkOutcome) -> Self {
        Self {
            index: task.index,
            relative: task.relative,
            outcome,
            completion: task.completion,
        }
    }
}

/// Everything the collector gathered
#[derive(Debug, Default)]
pub struct Collected {
    /// Built modules in arrival order
    pub modules: Vec<Module>,

    /// Directories without a config file
    pub inert: usize,

    /// Failures with their dispatch index
    pub failures: Vec<(usize, BuildError)>,

    /// Tasks skipped after cancellation
    pub cancelled: usize,
}

impl Collected {
    /// Number of results recorded
    pub fn completed(&self) -> usize {
        self.modules.len() + self.inert + self.failures.len() + self.cancelled
    }

    fn record(&mut self, outcome: WorkOutcome, index: usize) {
        match outcome {
            WorkOutcome::Built(module) => self.modules.push(*module),
            WorkOutcome::Inert => self.inert += 1,
            WorkOutcome::Failed(error) => self.failures.push((index, error)),
            WorkOutcome::Cancelled => self.cancelled += 1,
        }
    }

    fn progress(&self, total: usize, start: Instant) -> BuildProgress {
        BuildProgress {
            total,
            completed: self.completed(),
            built: self.modules.len(),
            inert: self.inert,
            failed: self.failures.len(),
            elapsed: start.elapsed(),
        }
    }
}

/// Handle to the collector thread
pub struct Collector {
    handle: Option<JoinHandle<Collected>>,
}

impl Collector {
    /// Spawn the collector; it runs until every result sender is dropped
    pub fn spawn<F>(results: Receiver<WorkResult>, total: usize, start: Instant, progress: F) -> Result<Self, WorkerError>
    where
        F: FnMut(&BuildProgress) + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("catalog-collector".into())
            .spawn(move || collect(results, total, start, progress))
            .map_err(|e| WorkerError::InitFailed {
                id: usize::MAX,
                reason: e.to_string(),
            })?;

        Ok(Self { handle: Some(handle) })
    }

    /// Wait for the collector and take its results
    pub fn join(mut self) -> Result<Collected, WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                id: usize::MAX,
                message: "Collector thread panicked".into(),
            }),
            None => Ok(Collected::default()),
        }
    }
}

fn collect<F>(results: Receiver<WorkResult>, total: usize, start: Instant, mut progress: F) -> Collected
where
    F: FnMut(&BuildProgress),
{
    let mut collected = Collected::default();

    for result in results.iter() {
        let WorkResult {
            index,
            outcome,
            completion,
            ..
        } = result;

        collected.record(outcome, index);
        progress(&collected.progress(total, start));

        drop(completion);
    }

    collected
}
