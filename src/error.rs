//! Error types for polyfill-catalog
//!
//! This module defines the error hierarchy for a catalog build:
//! - Discovery (directory traversal) errors
//! - Per-module errors raised while processing a single polyfill
//! - Whole-catalog dependency graph errors
//! - Output and configuration errors
//! - Worker pool errors
//!
//! Every message names the module, file, dependency or license involved so a
//! failed build can be fixed without re-running it under a debugger.

use crate::transform::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a catalog build
#[derive(Error, Debug)]
pub enum BuildError {
    /// Directory enumeration failed
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// A single module failed to process
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// The dependency graph is invalid
    #[error("Dependency graph error: {0}")]
    Graph(#[from] GraphError),

    /// Writing the catalog failed
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors outside of module processing (path resolution, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Several modules failed (keep-going mode)
    #[error("{}", format_failures(.0))]
    ModuleFailures(Vec<BuildError>),

    /// Interrupted by signal
    #[error("Build interrupted by signal")]
    Interrupted,
}

impl BuildError {
    /// Fatal errors abort the whole build even in keep-going mode, since a
    /// partially written catalog is invalid output.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BuildError::Output(_) | BuildError::Io(_) | BuildError::Worker(_) | BuildError::Interrupted
        )
    }
}

fn format_failures(failures: &[BuildError]) -> String {
    let mut message = format!("{} modules failed to build:", failures.len());
    for failure in failures {
        message.push_str("\n  - ");
        message.push_str(&failure.to_string());
    }
    message
}

/// Directory traversal errors
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The underlying walk failed (permissions, I/O)
    #[error("Failed to traverse '{path}': {source}")]
    Traversal {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Errors raised while processing a single module
#[derive(Error, Debug)]
pub enum ModuleError {
    /// Config file could not be read
    #[error("Unable to read config from {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has mistyped fields
    #[error("Unable to read config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Internal module does not declare full support for every platform
    #[error("Internal polyfill called {module} is not targeting all supported browsers correctly. It should be: \n{expected}")]
    Policy { module: String, expected: String },

    /// Syntax validation reported errors or warnings
    #[error("Error parsing source code for {label}{}", format_diagnostics(.diagnostics))]
    SourceValidation {
        label: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// The minifier reported problems
    #[error("Error minifying {label}{}", format_diagnostics(.diagnostics))]
    Minify {
        label: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// License identifier is not in the registry
    #[error("The license {license} ({module}) is not on the SPDX list of licenses ( https://spdx.org/licenses/ ).")]
    LicenseUnknown { license: String, module: String },

    /// License is known but not OSI approved
    #[error("The license {license} ({module}) is not OSI approved.")]
    LicenseNotApproved { license: String, module: String },

    /// Polyfill source is missing or unreadable
    #[error("Unable to read polyfill source for {module} from {path}: {source}")]
    SourceRead {
        module: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Feature detect source is unreadable
    #[error("Unable to read detect source for {module} from {path}: {source}")]
    DetectRead {
        module: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("\n    {}", d))
        .collect()
}

/// Whole-catalog dependency graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A module depends on a module that is not in the catalog
    #[error("Polyfill {module} depends on {dependency}, which does not exist within the polyfill-service. Recommended to either add the missing polyfill or remove the dependency.")]
    MissingDependency { module: String, dependency: String },

    /// Two modules share a name
    #[error("Unable to construct dependency graph for {module}: duplicate module name")]
    DuplicateModule { module: String },

    /// An edge could not be added to the graph
    #[error("Unable to construct dependency graph for {module} which depends on {dependency}")]
    Construction { module: String, dependency: String },

    /// The graph has no topological order
    #[error("Unable to construct dependency graph: dependency cycle detected involving {module}")]
    CycleDetected { module: String },
}

/// Errors writing the catalog to disk
#[derive(Error, Debug)]
pub enum OutputError {
    /// Removing a previous catalog failed
    #[error("Failed to clear output directory '{path}': {source}")]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating an output directory failed
    #[error("Failed to create output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing an artifact failed
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing an artifact failed
    #[error("Failed to encode '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Source root missing or not a directory
    #[error("Invalid polyfill directory '{path}': {reason}")]
    InvalidSourceRoot { path: PathBuf, reason: String },

    /// Output path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },

    /// Platform baseline table could not be loaded
    #[error("Invalid baselines file '{path}': {reason}")]
    InvalidBaselines { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Work queue send failed
    #[error("Failed to send module task: queue closed")]
    QueueSendFailed,

    /// Result channel closed
    #[error("Result channel closed unexpectedly")]
    ResultChannelClosed,

    /// Thread could not be spawned
    #[error("Failed to initialize worker {id}: {reason}")]
    InitFailed { id: usize, reason: String },
}

/// Result type alias for BuildError
pub type Result<T> = std::result::Result<T, BuildError>;

/// Result type alias for ModuleError
pub type ModuleResult<T> = std::result::Result<T, ModuleError>;
