//! Parallel catalog build
//!
//! The coordinator enumerates candidate directories and feeds them through a
//! bounded [`queue`] to a fixed pool of [`worker`] threads. Each worker sends
//! one result per task to the [`collector`], and a completion barrier keeps
//! the whole-catalog checks from starting until every dispatched task has
//! been recorded.

pub mod collector;
pub mod coordinator;
pub mod queue;
pub mod worker;

pub use coordinator::BuildCoordinator;

use crate::alias::AliasIndex;
use crate::module::Module;
use std::path::PathBuf;
use std::time::Duration;

/// Result of a completed build
#[derive(Debug)]
pub struct BuildResult {
    /// Built modules, sorted by name
    pub modules: Vec<Module>,

    /// The alias index that was written
    pub aliases: AliasIndex,

    /// Candidate directories without a config file
    pub inert: usize,

    /// Where the catalog was written
    pub output_root: PathBuf,

    /// Time taken for the build
    pub duration: Duration,
}

impl BuildResult {
    /// Sum of minified module sizes
    pub fn total_size(&self) -> u64 {
        self.modules.iter().map(Module::size).sum()
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules
            .binary_search_by(|m| m.name().cmp(name))
            .ok()
            .map(|i| &self.modules[i])
    }
}

/// Progress information for display
#[derive(Debug, Clone)]
pub struct BuildProgress {
    /// Candidate directories found
    pub total: usize,

    /// Results recorded so far
    pub completed: usize,

    /// Modules built
    pub built: usize,

    /// Inert directories
    pub inert: usize,

    /// Modules that failed
    pub failed: usize,

    /// Elapsed time
    pub elapsed: Duration,
}

impl BuildProgress {
    /// Results per second
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }
}
