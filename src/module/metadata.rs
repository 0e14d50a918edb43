//! Module configuration (authored) and metadata (authored + derived)

use crate::error::{ModuleError, ModuleResult};
use crate::module::baselines::PlatformBaselines;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Key in the `[test]` table that excludes a module from CI runs
pub const TEST_CI_KEY: &str = "ci";

/// Key in the `[build]` table that turns minification off
pub const BUILD_MINIFY_KEY: &str = "minify";

/// Declarative metadata from a module's `config.toml`
///
/// Every field is optional in the file. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub aliases: Vec<String>,
    pub dependencies: Vec<String>,
    pub spec: String,
    pub docs: String,
    pub license: String,

    /// Minimum supported version per platform
    pub browsers: BTreeMap<String, String>,

    /// Test overrides (`ci = false`)
    pub test: BTreeMap<String, bool>,

    /// Build overrides (`minify = false`)
    pub build: BTreeMap<String, bool>,
}

impl ModuleConfig {
    /// Decode config text
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Testable in CI unless `[test] ci = false`
    pub fn is_testable(&self) -> bool {
        self.test.get(TEST_CI_KEY) != Some(&false)
    }

    /// Minified unless `[build] minify = false`
    pub fn minify_enabled(&self) -> bool {
        self.build.get(BUILD_MINIFY_KEY) != Some(&false)
    }
}

/// Everything written to a module's `meta.json`
///
/// Field order here is the field order in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMeta {
    /// Byte length of the minified polyfill
    pub size: u64,

    /// Minified feature detect, empty when the module has none
    pub detect_source: String,

    /// Module directory relative to the polyfill root
    pub base_dir: String,

    pub has_tests: bool,
    pub is_testable: bool,
    pub is_public: bool,

    #[serde(flatten)]
    pub config: ModuleConfig,
}

/// Read and decode `path`, applying the internal-module coverage rule when
/// `private` is set
pub fn load_config(
    path: &Path,
    module: &str,
    private: bool,
    baselines: &PlatformBaselines,
) -> ModuleResult<ModuleConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ModuleError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let config = ModuleConfig::parse(&text).map_err(|source| ModuleError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    if private {
        baselines.check_full_support(module, &config.browsers)?;
    }

    Ok(config)
}
