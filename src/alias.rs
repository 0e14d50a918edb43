//! Alias index
//!
//! Maps every alias to the modules that declare it. Module lists keep the
//! order modules are given in; the coordinator sorts modules by name first,
//! so the written index does not depend on which worker finished first.

use crate::error::OutputError;
use crate::module::output::{encode_json, write_file, ALIAS_FILE};
use crate::module::Module;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Alias every module belongs to
pub const UNIVERSAL_ALIAS: &str = "all";

/// Alias name to module names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AliasIndex(BTreeMap<String, Vec<String>>);

impl AliasIndex {
    /// Index `modules`, including the universal alias
    pub fn build(modules: &[Module]) -> Self {
        Self::from_entries(modules.iter().map(|m| (m.name(), m.aliases())))
    }

    /// Index `(module, aliases)` pairs
    ///
    /// A module that lists the same alias twice appears once under it.
    pub fn from_entries<'a, I, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, A)>,
        A: IntoIterator<Item = &'a str>,
    {
        let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (module, aliases) in entries {
            for alias in aliases {
                let members = index.entry(alias.to_string()).or_default();
                if members.last().map(String::as_str) != Some(module) {
                    members.push(module.to_string());
                }
            }
        }

        Self(index)
    }

    /// Modules declaring `alias`
    pub fn get(&self, alias: &str) -> Option<&[String]> {
        self.0.get(alias).map(Vec::as_slice)
    }

    /// Number of distinct aliases
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(alias, modules)| (alias.as_str(), modules.as_slice()))
    }

    /// Write `aliases.json` into `output_root`
    pub fn write(&self, output_root: &Path) -> Result<PathBuf, OutputError> {
        let path = output_root.join(ALIAS_FILE);
        let encoded = encode_json(self, &path)?;
        write_file(&path, &encoded)?;
        Ok(path)
    }
}
