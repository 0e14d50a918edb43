//! Build coordinator - orchestrates the catalog build
//!
//! The coordinator is responsible for:
//! - Preparing the output directory
//! - Discovering candidate modules
//! - Setting up the job queue, workers and collector
//! - Waiting on the completion barrier
//! - Running the dependency checks and writing the alias index
//! - Turning collected failures into one deterministic error

use crate::alias::AliasIndex;
use crate::build::collector::{Collected, Collector};
use crate::build::queue::{ModuleTask, WorkQueue};
use crate::build::worker::{aggregate_stats, Worker};
use crate::build::{BuildProgress, BuildResult};
use crate::config::BuildConfig;
use crate::discovery::discover_module_dirs;
use crate::error::{BuildError, OutputError, Result, WorkerError};
use crate::graph;
use crate::module::{BuildContext, Module};
use crossbeam_channel::unbounded;
use crossbeam_utils::sync::WaitGroup;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Coordinates a catalog build
pub struct BuildCoordinator {
    /// Configuration
    config: Arc<BuildConfig>,

    /// Transformer, license registry and baselines shared by workers
    context: BuildContext,

    /// Cancel signal
    cancel: Arc<AtomicBool>,
}

impl BuildCoordinator {
    /// Create a coordinator using the bundled transformer and license registry
    pub fn new(config: BuildConfig) -> Self {
        let context = BuildContext::new(config.baselines.clone());
        Self::with_context(config, context)
    }

    /// Create a coordinator with explicit collaborators
    pub fn with_context(config: BuildConfig, context: BuildContext) -> Self {
        Self {
            config: Arc::new(config),
            context,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the cancel flag (for signal handlers)
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run the build without progress reporting
    pub fn run(self) -> Result<BuildResult> {
        self.run_with_progress(|_| {})
    }

    /// Run the build, calling `progress` after every collected result
    pub fn run_with_progress<F>(self, progress: F) -> Result<BuildResult>
    where
        F: FnMut(&BuildProgress) + Send + 'static,
    {
        let start = Instant::now();

        // Library callers may not have gone through `from_args`
        self.config.validate()?;

        info!(
            source = %self.config.source_root.display(),
            output = %self.config.output_root.display(),
            workers = self.config.worker_count,
            "Starting catalog build"
        );

        self.prepare_output()?;

        let candidates = discover_module_dirs(&self.config.source_root)?;
        let total = candidates.len();
        info!(candidates = total, "Discovered candidate directories");

        let collected = self.process_all(candidates, start, progress)?;
        let inert = collected.inert;
        let mut modules = self.check_failures(collected)?;

        // Arrival order depends on scheduling; output must not
        modules.sort_by(|a, b| a.name().cmp(b.name()));

        graph::validate(&modules)?;
        debug!(modules = modules.len(), "Dependency graph validated");

        let aliases = AliasIndex::build(&modules);
        aliases.write(&self.config.output_root)?;

        let duration = start.elapsed();
        info!(
            modules = modules.len(),
            inert = inert,
            aliases = aliases.len(),
            duration_ms = duration.as_millis() as u64,
            "Catalog build completed"
        );

        Ok(BuildResult {
            modules,
            aliases,
            inert,
            output_root: self.config.output_root.clone(),
            duration,
        })
    }

    /// Clear (unless disabled) and create the output root
    fn prepare_output(&self) -> Result<()> {
        let output = &self.config.output_root;

        if self.config.clean && output.exists() {
            std::fs::remove_dir_all(output).map_err(|source| OutputError::Clean {
                path: output.clone(),
                source,
            })?;
        }

        std::fs::create_dir_all(output).map_err(|source| OutputError::CreateDir {
            path: output.clone(),
            source,
        })?;

        Ok(())
    }

    /// Dispatch every candidate and wait until each has a recorded result
    fn process_all<F>(&self, candidates: Vec<PathBuf>, start: Instant, progress: F) -> Result<Collected>
    where
        F: FnMut(&BuildProgress) + Send + 'static,
    {
        let total = candidates.len();
        let queue = WorkQueue::new(self.config.worker_count);
        let (result_tx, result_rx) = unbounded();

        let collector = Collector::spawn(result_rx, total, start, progress)?;

        let mut workers = Vec::with_capacity(self.config.worker_count);
        for id in 0..self.config.worker_count {
            let worker = Worker::spawn(
                id,
                Arc::clone(&self.config),
                self.context.clone(),
                queue.receiver(),
                result_tx.clone(),
                Arc::clone(&self.cancel),
            );

            match worker {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    // Dropping the queue lets already spawned workers exit
                    self.cancel.store(true, Ordering::SeqCst);
                    return Err(e.into());
                }
            }
        }
        debug!(count = workers.len(), "Workers spawned");

        // Workers hold the only result senders; the collector stops when they exit
        drop(result_tx);

        let sender = queue.into_sender();
        let barrier = WaitGroup::new();
        let mut dispatch_error = None;
        let mut dispatched = 0usize;

        for (index, relative) in candidates.into_iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                debug!(dispatched = dispatched, total = total, "Dispatch stopped early");
                break;
            }

            if sender.send(ModuleTask::new(index, relative, barrier.clone())).is_err() {
                dispatch_error = Some(WorkerError::QueueSendFailed);
                break;
            }
            dispatched += 1;
        }
        drop(sender);

        // Every dispatched task has been recorded once this returns
        barrier.wait();

        let (built, inert, failed, cancelled) = aggregate_stats(&workers);
        debug!(
            dispatched = dispatched,
            built = built,
            inert = inert,
            failed = failed,
            cancelled = cancelled,
            "All dispatched tasks completed"
        );

        let mut worker_error = dispatch_error;
        for worker in workers {
            let id = worker.id();
            if let Err(e) = worker.join() {
                error!(worker = id, error = %e, "Worker failed");
                worker_error.get_or_insert(e);
            }
        }

        let collected = collector.join()?;

        if let Some(e) = worker_error {
            return Err(e.into());
        }

        Ok(collected)
    }

    /// Built modules, or the error the collected failures amount to
    fn check_failures(&self, collected: Collected) -> Result<Vec<Module>> {
        let Collected {
            modules,
            mut failures,
            cancelled,
            ..
        } = collected;

        if failures.is_empty() {
            if self.cancel.load(Ordering::SeqCst) {
                warn!(skipped = cancelled, "Build interrupted");
                return Err(BuildError::Interrupted);
            }
            return Ok(modules);
        }

        // Which worker finished first is not deterministic; dispatch order is
        failures.sort_by_key(|(index, _)| *index);
        let mut errors: Vec<BuildError> = failures.into_iter().map(|(_, e)| e).collect();

        let fatal = errors.iter().position(BuildError::is_fatal);
        if !self.config.keep_going || fatal.is_some() {
            let first = fatal.unwrap_or(0);
            for (i, other) in errors.iter().enumerate() {
                if i != first {
                    warn!(error = %other, "Additional module failure");
                }
            }
            return Err(errors.swap_remove(first));
        }

        if errors.len() == 1 {
            return Err(errors.remove(0));
        }

        Err(BuildError::ModuleFailures(errors))
    }
}
