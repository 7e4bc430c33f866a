//! Presence check for static assets the site cannot build without.

use std::path::Path;

/// Which required assets exist under the project root.
#[derive(Debug, Default, PartialEq)]
pub struct AssetReport {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

impl AssetReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check each `required` path relative to `project_root`, keeping list order.
pub fn check_assets(project_root: &Path, required: &[String]) -> AssetReport {
    let mut report = AssetReport::default();
    for asset in required {
        if project_root.join(asset).exists() {
            report.present.push(asset.clone());
        } else {
            report.missing.push(asset.clone());
        }
    }
    report
}
