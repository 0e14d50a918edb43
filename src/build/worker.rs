//! Worker thread logic for parallel module processing
//!
//! Each worker:
//! - Pulls candidate directories from the job queue
//! - Runs the module state machine (probe, config, license, sources)
//! - Writes the module's artifacts under its own output directory
//! - Sends exactly one result per task to the collector
//!
//! Workers share no mutable state beyond the cancel flag. Once the flag is
//! set, remaining tasks are answered with [`WorkOutcome::Cancelled`] without
//! being processed.

use crate::build::collector::{WorkOutcome, WorkResult};
use crate::build::queue::{ModuleTask, WorkQueueReceiver};
use crate::config::BuildConfig;
use crate::error::{BuildError, WorkerError};
use crate::module::{BuildContext, Module, ModulePath};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Modules built and written
    pub built: AtomicU64,

    /// Directories without a config file
    pub inert: AtomicU64,

    /// Modules that failed
    pub failed: AtomicU64,

    /// Tasks skipped after cancellation
    pub cancelled: AtomicU64,
}

impl WorkerStats {
    fn record(&self, outcome: &WorkOutcome) {
        let counter = match outcome {
            WorkOutcome::Built(_) => &self.built,
            WorkOutcome::Inert => &self.inert,
            WorkOutcome::Failed(_) => &self.failed,
            WorkOutcome::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// A worker thread that processes module tasks
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<Result<(), WorkerError>>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(
        id: usize,
        config: Arc<BuildConfig>,
        context: BuildContext,
        queue_rx: WorkQueueReceiver,
        results: Sender<WorkResult>,
        cancel: Arc<AtomicBool>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("catalog-{}", id))
            .spawn(move || worker_loop(id, config, context, queue_rx, results, cancel, stats_clone))
            .map_err(|e| WorkerError::InitFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(result) => result,
                Err(_) => Err(WorkerError::Panicked {
                    id: self.id,
                    message: "Worker thread panicked".into(),
                }),
            }
        } else {
            Ok(())
        }
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    config: Arc<BuildConfig>,
    context: BuildContext,
    queue_rx: WorkQueueReceiver,
    results: Sender<WorkResult>,
    cancel: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
) -> Result<(), WorkerError> {
    debug!(worker = id, "Worker starting");

    // Runs until the dispatcher closes the queue
    while let Some(task) = queue_rx.recv() {
        let outcome = if cancel.load(Ordering::Relaxed) {
            WorkOutcome::Cancelled
        } else {
            process_task(id, &task, &config, &context)
        };

        if let WorkOutcome::Failed(error) = &outcome {
            if error.is_fatal() || !config.keep_going {
                cancel.store(true, Ordering::SeqCst);
            }
        }

        stats.record(&outcome);
        results
            .send(WorkResult::new(task, outcome))
            .map_err(|_| WorkerError::ResultChannelClosed)?;
    }

    debug!(
        worker = id,
        built = stats.built.load(Ordering::Relaxed),
        failed = stats.failed.load(Ordering::Relaxed),
        "Worker shutting down"
    );

    Ok(())
}

/// Process a single candidate directory
fn process_task(worker_id: usize, task: &ModuleTask, config: &BuildConfig, context: &BuildContext) -> WorkOutcome {
    let path = match ModulePath::resolve(&config.source_root, &task.relative) {
        Ok(path) => path,
        Err(e) => return WorkOutcome::Failed(BuildError::Io(e)),
    };
    let name = path.name.clone();

    let module = match Module::load(path, context) {
        Ok(Some(module)) => module,
        Ok(None) => {
            trace!(worker = worker_id, dir = %task.relative.display(), "Inert directory");
            return WorkOutcome::Inert;
        }
        Err(e) => {
            warn!(worker = worker_id, module = %name, error = %e, "Module failed");
            return WorkOutcome::Failed(e.into());
        }
    };

    // Output errors are fatal: a half-written catalog is invalid
    if let Err(e) = module.write(&config.output_root) {
        warn!(worker = worker_id, module = %name, error = %e, "Failed to write module");
        return WorkOutcome::Failed(e.into());
    }

    debug!(worker = worker_id, module = %name, size = module.size(), "Module built");
    WorkOutcome::Built(Box::new(module))
}

/// Aggregate statistics from multiple workers: (built, inert, failed, cancelled)
pub fn aggregate_stats(workers: &[Worker]) -> (u64, u64, u64, u64) {
    let mut built = 0u64;
    let mut inert = 0u64;
    let mut failed = 0u64;
    let mut cancelled = 0u64;

    for worker in workers {
        built += worker.stats.built.load(Ordering::Relaxed);
        inert += worker.stats.inert.load(Ordering::Relaxed);
        failed += worker.stats.failed.load(Ordering::Relaxed);
        cancelled += worker.stats.cancelled.load(Ordering::Relaxed);
    }

    (built, inert, failed, cancelled)
}
