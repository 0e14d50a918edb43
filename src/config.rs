//! Configuration types for polyfill-catalog
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use crate::module::baselines::PlatformBaselines;
use clap::Parser;
use std::path::{Component, Path, PathBuf};

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Default polyfill root
pub const DEFAULT_SOURCE_ROOT: &str = "polyfills";

/// Output directory name used when `--output` is not given
pub const DEFAULT_OUTPUT_DIR: &str = "__dist";

/// Build the polyfill catalog
#[derive(Parser, Debug, Clone)]
#[command(
    name = "polyfill-catalog",
    version,
    about = "Build a validated polyfill catalog",
    long_about = "Processes every polyfill module under a directory in parallel, validates and \
                  minifies its sources, checks licenses and the dependency graph, and writes \
                  per-module metadata and bundles plus a catalog-wide alias index.\n\n\
                  Directories whose name starts with '__' are skipped. Directories without a \
                  config.toml are not modules.",
    after_help = "EXAMPLES:\n    \
        polyfill-catalog\n    \
        polyfill-catalog polyfills -o dist -w 8\n    \
        polyfill-catalog polyfills --keep-going -v\n    \
        polyfill-catalog polyfills --baselines baselines.toml"
)]
pub struct CliArgs {
    /// Directory containing polyfill modules
    #[arg(value_name = "POLYFILL_DIR", default_value = DEFAULT_SOURCE_ROOT)]
    pub source: PathBuf,

    /// Catalog output directory (default: <POLYFILL_DIR>/__dist)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Number of worker threads
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Report every failing module instead of stopping at the first
    #[arg(long)]
    pub keep_going: bool,

    /// Do not clear the output directory before building
    #[arg(long)]
    pub no_clean: bool,

    /// TOML table of `platform = "min version"` replacing the built-in baselines
    #[arg(long, value_name = "FILE")]
    pub baselines: Option<PathBuf>,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    // Module processing is CPU bound (parsing, minifying)
    num_cpus::get()
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Polyfill root
    pub source_root: PathBuf,

    /// Catalog output root
    pub output_root: PathBuf,

    /// Number of worker threads
    pub worker_count: usize,

    /// Aggregate module failures instead of stopping at the first
    pub keep_going: bool,

    /// Remove the output root before building
    pub clean: bool,

    /// Platforms internal modules must fully support
    pub baselines: PlatformBaselines,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl BuildConfig {
    /// Defaults for library use: one worker per CPU, fail-fast, clean output
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            worker_count: default_workers(),
            keep_going: false,
            clean: true,
            baselines: PlatformBaselines::default(),
            show_progress: false,
            verbose: false,
        }
    }

    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    pub fn with_baselines(mut self, baselines: PlatformBaselines) -> Self {
        self.baselines = baselines;
        self
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let output_root = args
            .output
            .clone()
            .unwrap_or_else(|| args.source.join(DEFAULT_OUTPUT_DIR));

        let baselines = match &args.baselines {
            Some(path) => PlatformBaselines::from_file(path)?,
            None => PlatformBaselines::default(),
        };

        let config = Self {
            source_root: args.source,
            output_root,
            worker_count: args.workers,
            keep_going: args.keep_going,
            clean: !args.no_clean,
            baselines,
            show_progress: !args.quiet,
            verbose: args.verbose,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check worker count and paths
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate worker count
        if self.worker_count == 0 || self.worker_count > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.worker_count,
                max: MAX_WORKERS,
            });
        }

        // Validate source root
        if !self.source_root.is_dir() {
            return Err(ConfigError::InvalidSourceRoot {
                path: self.source_root.clone(),
                reason: "Not a directory".to_string(),
            });
        }

        // Validate output path
        let source = resolve(&self.source_root);
        let output = resolve(&self.output_root);
        if source.starts_with(&output) {
            return Err(ConfigError::InvalidOutputPath {
                path: self.output_root.clone(),
                reason: "Output directory must not contain the polyfill directory".to_string(),
            });
        }

        if let Some(parent) = self.output_root.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ConfigError::InvalidOutputPath {
                    path: self.output_root.clone(),
                    reason: format!("Parent directory '{}' does not exist", parent.display()),
                });
            }
        }

        Ok(())
    }
}

/// `path` with symlinks, `.` and `..` resolved
///
/// The longest existing prefix is canonicalized; the missing remainder is
/// normalized lexically.
fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();

    let mut resolved = loop {
        if let Ok(canonical) = existing.canonicalize() {
            break canonical;
        }
        match (existing.parent(), existing.components().next_back()) {
            (Some(parent), Some(last)) => {
                missing.push(last);
                existing = parent;
            }
            _ => break PathBuf::new(),
        }
    };

    for component in missing.into_iter().rev() {
        match component {
            Component::ParentDir => {
                resolved.pop();
            }
            Component::CurDir => {}
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved
}
