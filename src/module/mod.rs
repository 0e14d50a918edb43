//! Polyfill modules
//!
//! A candidate directory becomes a [`Module`] by running, in order:
//!
//! 1. Probe - no `config.toml` means the directory is inert
//! 2. Load config - decode, apply the internal-module coverage rule, load
//!    and validate the feature detect if there is one
//! 3. Check license
//! 4. Load sources - read, validate and minify `polyfill.js`
//! 5. Write output - `meta.json`, `raw.js`, `min.js` under the module's name
//!
//! Steps 1-4 are [`Module::load`], which either returns a fully populated
//! value or the first error. Step 5 is [`Module::write`].

pub mod baselines;
pub mod license;
pub mod metadata;
pub mod output;
pub mod source;

use crate::alias::UNIVERSAL_ALIAS;
use crate::error::{ModuleResult, OutputError};
use crate::transform::{JsTransformer, Transformer};
use baselines::PlatformBaselines;
use license::{check_license, LicenseRegistry, SpdxRegistry};
use metadata::{load_config, ModuleMeta};
use source::{load_detect, load_polyfill, SourceArtifact};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Module configuration file
pub const CONFIG_FILE: &str = "config.toml";

/// Polyfill body
pub const SOURCE_FILE: &str = "polyfill.js";

/// Optional feature detect
pub const DETECT_FILE: &str = "detect.js";

/// Optional tests, only their presence is recorded
pub const TEST_FILE: &str = "tests.js";

/// Name prefix of internal modules
pub const PRIVATE_PREFIX: &str = "_";

/// Joins path components into a qualified module name
pub const NAME_DELIMITER: &str = ".";

/// Where a module lives and what it is called
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePath {
    /// Absolute module directory
    pub absolute: PathBuf,

    /// Directory relative to the polyfill root
    pub relative: PathBuf,

    /// Qualified name (`Array/from` becomes `Array.from`)
    pub name: String,
}

impl ModulePath {
    pub fn new(absolute: PathBuf, relative: PathBuf) -> Self {
        let name = module_name(&relative);
        Self {
            absolute,
            relative,
            name,
        }
    }

    /// Resolve `relative` against the polyfill root
    pub fn resolve(root: &Path, relative: &Path) -> std::io::Result<Self> {
        let absolute = std::path::absolute(root.join(relative))?;
        Ok(Self::new(absolute, relative.to_path_buf()))
    }

    /// Relative directory with `/` separators
    pub fn base_dir(&self) -> String {
        normal_components(&self.relative).join("/")
    }

    fn file(&self, name: &str) -> PathBuf {
        self.absolute.join(name)
    }
}

/// Qualified module name for a relative directory
pub fn module_name(relative: &Path) -> String {
    normal_components(relative)
        .join(NAME_DELIMITER)
        .replace('\\', NAME_DELIMITER)
}

fn normal_components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Collaborators shared by every worker
#[derive(Clone)]
pub struct BuildContext {
    pub transformer: Arc<dyn Transformer>,
    pub licenses: Arc<dyn LicenseRegistry>,
    pub baselines: Arc<PlatformBaselines>,
}

impl BuildContext {
    /// Bundled transformer and SPDX registry with the given platform table
    pub fn new(baselines: PlatformBaselines) -> Self {
        Self {
            transformer: Arc::new(JsTransformer::new()),
            licenses: Arc::new(SpdxRegistry),
            baselines: Arc::new(baselines),
        }
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn with_licenses(mut self, licenses: Arc<dyn LicenseRegistry>) -> Self {
        self.licenses = licenses;
        self
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(PlatformBaselines::default())
    }
}

/// A fully processed polyfill module
#[derive(Debug, Clone)]
pub struct Module {
    path: ModulePath,
    meta: ModuleMeta,
    sources: SourceArtifact,
}

impl Module {
    /// Process a candidate directory
    ///
    /// Returns `Ok(None)` for an inert directory (no config file). A module
    /// with a config but no detect or tests is a normal, minimal module.
    pub fn load(path: ModulePath, ctx: &BuildContext) -> ModuleResult<Option<Self>> {
        let config_path = path.file(CONFIG_FILE);
        if !config_path.exists() {
            trace!(dir = %path.relative.display(), "No config file, skipping");
            return Ok(None);
        }

        let private = path.name.starts_with(PRIVATE_PREFIX);
        let config = load_config(&config_path, &path.name, private, &ctx.baselines)?;
        let minify = config.minify_enabled();

        let detect_path = path.file(DETECT_FILE);
        let detect_source = if detect_path.exists() {
            load_detect(ctx.transformer.as_ref(), &path.name, &detect_path, minify)?
        } else {
            String::new()
        };

        check_license(&config.license, &path.name, ctx.licenses.as_ref())?;

        let sources = load_polyfill(ctx.transformer.as_ref(), &path.name, &path.file(SOURCE_FILE), minify)?;

        let meta = ModuleMeta {
            size: sources.min_len(),
            detect_source,
            base_dir: path.base_dir(),
            has_tests: path.file(TEST_FILE).exists(),
            is_testable: config.is_testable(),
            is_public: !private,
            config,
        };

        debug!(module = %path.name, size = meta.size, "Module loaded");

        Ok(Some(Self { path, meta, sources }))
    }

    /// Write this module's artifacts under `output_root/<name>/`
    pub fn write(&self, output_root: &Path) -> Result<(), OutputError> {
        output::write_module(&self.output_dir(output_root), &self.meta, &self.sources)
    }

    pub fn output_dir(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.path.name)
    }

    pub fn name(&self) -> &str {
        &self.path.name
    }

    pub fn path(&self) -> &ModulePath {
        &self.path
    }

    /// The universal alias followed by the declared aliases
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        std::iter::once(UNIVERSAL_ALIAS).chain(self.meta.config.aliases.iter().map(String::as_str))
    }

    /// Declared dependency names
    pub fn dependencies(&self) -> &[String] {
        &self.meta.config.dependencies
    }

    pub fn meta(&self) -> &ModuleMeta {
        &self.meta
    }

    pub fn sources(&self) -> &SourceArtifact {
        &self.sources
    }

    /// Minified size in bytes
    pub fn size(&self) -> u64 {
        self.meta.size
    }
}
