//! Generated-script persistence
//!
//! The script is the run's only durable output: one file per PR number
//! under the configured directory, overwritten on re-runs.

use std::path::{Path, PathBuf};

use tracing::info;

use surfcheck_utils::error::ReportError;

/// Persist the generated script as `surfcheck-pr-<number>.spec.js`.
///
/// # Errors
///
/// Returns [`ReportError::ArtifactWriteFailed`] if the directory cannot
/// be created or the file cannot be written.
pub fn persist_script(dir: &Path, pr_number: u64, script: &str) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir).map_err(|e| ReportError::ArtifactWriteFailed {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let path = dir.join(format!("surfcheck-pr-{pr_number}.spec.js"));
    std::fs::write(&path, script).map_err(|e| ReportError::ArtifactWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    info!(path = %path.display(), "Persisted generated script");
    Ok(path)
}
