//! License registry capability and the licensing step

use crate::error::{ModuleError, ModuleResult};

/// Known but not OSI approved identifiers that are still accepted
pub const EXEMPT_LICENSES: [&str; 2] = ["CC0-1.0", "WTFPL"];

/// What the registry knows about an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseInfo {
    pub id: String,
    pub osi_approved: bool,
}

/// Lookup of license identifiers
pub trait LicenseRegistry: Send + Sync {
    /// `None` when the identifier is unknown
    fn lookup(&self, id: &str) -> Option<LicenseInfo>;
}

/// Registry backed by the SPDX license list
#[derive(Debug, Clone, Copy, Default)]
pub struct SpdxRegistry;

impl LicenseRegistry for SpdxRegistry {
    fn lookup(&self, id: &str) -> Option<LicenseInfo> {
        spdx::license_id(id).map(|license| LicenseInfo {
            id: license.name.to_string(),
            osi_approved: license.is_osi_approved(),
        })
    }
}

/// Check a module's declared license; an empty identifier passes
pub fn check_license(license: &str, module: &str, registry: &dyn LicenseRegistry) -> ModuleResult<()> {
    if license.is_empty() {
        return Ok(());
    }

    let info = registry
        .lookup(license)
        .ok_or_else(|| ModuleError::LicenseUnknown {
            license: license.to_string(),
            module: module.to_string(),
        })?;

    if !info.osi_approved && !EXEMPT_LICENSES.iter().any(|&exempt| exempt == license) {
        return Err(ModuleError::LicenseNotApproved {
            license: license.to_string(),
            module: module.to_string(),
        });
    }

    Ok(())
}
