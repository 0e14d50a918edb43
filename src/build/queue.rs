//! Job queue feeding candidate directories to workers
//!
//! Every task carries a token of the build's completion barrier. The token
//! travels with the task to a worker, then with the worker's result to the
//! collector, which releases it once the result is recorded. A task that is
//! dropped anywhere on the way (failed send, worker panic) releases it too, so
//! the barrier can never wait on a job that no longer exists.

use crossbeam_channel::{bounded, Receiver, Sender};
use crossbeam_utils::sync::WaitGroup;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A candidate directory to process
#[derive(Debug)]
pub struct ModuleTask {
    /// Dispatch order, used to report failures deterministically
    pub index: usize,

    /// Directory relative to the polyfill root
    pub relative: PathBuf,

    /// Completion barrier token
    pub(crate) completion: WaitGroup,
}

impl ModuleTask {
    /// Create a new task holding a barrier token
    pub fn new(index: usize, relative: PathBuf, completion: WaitGroup) -> Self {
        Self {
            index,
            relative,
            completion,
        }
    }
}

/// Statistics for the job queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total tasks enqueued
    pub enqueued: AtomicU64,

    /// Total tasks dequeued
    pub dequeued: AtomicU64,
}

impl QueueStats {
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }
}

/// Bounded job queue
///
/// The dispatcher blocks while the queue is full, so at most `capacity`
/// tasks wait ahead of the workers.
pub struct WorkQueue {
    sender: Sender<ModuleTask>,
    receiver: Receiver<ModuleTask>,
    capacity: usize,
    stats: Arc<QueueStats>,
}

impl WorkQueue {
    /// Create a new work queue with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);

        Self {
            sender,
            receiver,
            capacity,
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// Get a receiver for this queue (clone for each worker)
    pub fn receiver(&self) -> WorkQueueReceiver {
        WorkQueueReceiver {
            receiver: self.receiver.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Give up the queue's own receiver and keep only the sending side
    ///
    /// Once every worker has exited, sends fail instead of blocking forever.
    pub fn into_sender(self) -> WorkQueueSender {
        WorkQueueSender {
            sender: self.sender,
            stats: self.stats,
        }
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Handle for sending tasks to the queue
pub struct WorkQueueSender {
    sender: Sender<ModuleTask>,
    stats: Arc<QueueStats>,
}

impl WorkQueueSender {
    /// Send a task, blocking while the queue is full
    ///
    /// Returns the task back if every receiver is gone.
    pub fn send(&self, task: ModuleTask) -> Result<(), ModuleTask> {
        self.sender.send(task).map_err(|e| e.into_inner())?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// Handle for receiving tasks from the queue
#[derive(Clone)]
pub struct WorkQueueReceiver {
    receiver: Receiver<ModuleTask>,
    stats: Arc<QueueStats>,
}

impl WorkQueueReceiver {
    /// Receive a task from the queue
    ///
    /// Blocks until a task is available; `None` once the queue is closed
    /// and drained.
    pub fn recv(&self) -> Option<ModuleTask> {
        match self.receiver.recv() {
            Ok(task) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Some(task)
            }
            Err(_) => None,
        }
    }
}
