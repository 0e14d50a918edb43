//! polyfill-catalog - parallel polyfill catalog builder
//!
//! Turns a directory tree of independently authored polyfill modules into a
//! validated catalog: per-module metadata, raw and minified bundles, and a
//! catalog-wide alias index.
//!
//! # Features
//!
//! - **Parallel Processing**: A fixed pool of worker threads validates,
//!   license-checks and minifies modules independently.
//!
//! - **Whole-Catalog Gates**: Dependency existence and cycle checks run only
//!   after every module has been processed, behind a completion barrier.
//!
//! - **Deterministic Output**: The catalog does not depend on the number of
//!   workers or on scheduling. Failures are reported in dispatch order.
//!
//! - **Pluggable Engines**: JavaScript handling and license lookup sit behind
//!   the [`Transformer`] and [`LicenseRegistry`] traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 polyfills/  (walkdir, skips __*)                 │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ relative dirs
//!                               ▼
//!              ┌──────────────────────────┐
//!              │       Job Queue          │
//!              │  (crossbeam bounded)     │
//!              └────────────┬─────────────┘
//!                           │
//! ┌─────────────────────────┼───────────────────────────────────────┐
//! │                      Worker Threads                              │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │Worker 1 │  │Worker 2 │  │Worker 3 │  ...    │Worker N │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       │  probe → config → license → sources → write  │          │
//! │       └────────────┼────────────┼────────────────────┘          │
//! └────────────────────┼────────────┼───────────────────────────────┘
//!                      ▼            ▼
//!              ┌──────────────────────────┐
//!              │       Collector          │
//!              │  - owns the module list  │
//!              │  - releases the barrier  │
//!              └────────────┬─────────────┘
//!                           │ barrier
//!                           ▼
//!              ┌──────────────────────────┐
//!              │  Dependency checks       │
//!              │  existence, then cycles  │
//!              │  (petgraph toposort)     │
//!              └────────────┬─────────────┘
//!                           ▼
//!                __dist/<module>/{meta.json,raw.js,min.js}
//!                __dist/aliases.json
//! ```
//!
//! # Example
//!
//! ```bash
//! # Build polyfills/ into polyfills/__dist
//! polyfill-catalog
//!
//! # Report every failing module, 8 workers
//! polyfill-catalog polyfills --keep-going -w 8
//! ```

pub mod alias;
pub mod build;
pub mod config;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod module;
pub mod progress;
pub mod transform;

pub use alias::AliasIndex;
pub use build::{BuildCoordinator, BuildProgress, BuildResult};
pub use config::{BuildConfig, CliArgs};
pub use error::{BuildError, Result};
pub use module::license::{LicenseRegistry, SpdxRegistry};
pub use module::{BuildContext, Module};
pub use transform::{JsTransformer, Transformer};
