//! Recognized target platforms and the internal-module coverage rule
//!
//! Internal modules (name starting with `_`) are pulled in by other modules
//! rather than requested directly, so they must claim support for every
//! platform the catalog targets.

use crate::error::{ConfigError, ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Version marker meaning "every version of this platform"
pub const ALL_VERSIONS: &str = "*";

/// Minimum supported version per platform identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformBaselines(BTreeMap<String, String>);

impl Default for PlatformBaselines {
    fn default() -> Self {
        let table = [
            ("android", "4.3"),
            ("bb", "6"),
            ("chrome", "29"),
            ("edge", "*"),
            ("edge_mob", "*"),
            ("firefox", "38"),
            ("firefox_mob", "38"),
            ("ie", "8"),
            ("ie_mob", "11"),
            ("ios_chr", "9"),
            ("ios_saf", "9"),
            ("op_mini", "5"),
            ("op_mob", "10"),
            ("opera", "33"),
            ("safari", "9"),
            ("samsung_mob", "4"),
        ];

        Self(
            table
                .into_iter()
                .map(|(platform, version)| (platform.to_string(), version.to_string()))
                .collect(),
        )
    }
}

impl PlatformBaselines {
    pub fn new(table: BTreeMap<String, String>) -> Self {
        Self(table)
    }

    /// Load a `platform = "version"` TOML table
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidBaselines {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let baselines: Self = toml::from_str(&text).map_err(|e| ConfigError::InvalidBaselines {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if baselines.0.is_empty() {
            return Err(ConfigError::InvalidBaselines {
                path: path.to_path_buf(),
                reason: "no platforms listed".into(),
            });
        }

        Ok(baselines)
    }

    /// Recognized platform identifiers, sorted
    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Require `browsers` to mark every recognized platform as [`ALL_VERSIONS`]
    pub fn check_full_support(
        &self,
        module: &str,
        browsers: &BTreeMap<String, String>,
    ) -> ModuleResult<()> {
        let covered = self
            .platforms()
            .all(|platform| browsers.get(platform).map(String::as_str) == Some(ALL_VERSIONS));

        if covered {
            return Ok(());
        }

        Err(ModuleError::Policy {
            module: module.to_string(),
            expected: self.render_full_support(),
        })
    }

    /// The `[browsers]` table an internal module is expected to declare
    pub fn render_full_support(&self) -> String {
        let mut table = String::from("[browsers]\n");
        for platform in self.platforms() {
            table.push_str(&format!("{} = \"{}\"\n", platform, ALL_VERSIONS));
        }
        table
    }
}
