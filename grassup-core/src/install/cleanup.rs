// grassup-core/src/install/cleanup.rs
use std::path::PathBuf;

use grassup_aio::fs::remove_path_recursive;
use tracing::{debug, warn};

/// Outcome of a best-effort cleanup pass. Never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    /// Paths that were already gone.
    pub absent: Vec<PathBuf>,
    /// Paths that could not be removed, with the reason.
    pub warnings: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Removes every path recursively. Missing paths are fine; failures are
/// logged and collected, not returned.
pub fn cleanup_artifacts(paths: &[PathBuf]) -> CleanupReport {
    let mut report = CleanupReport::default();
    for path in paths {
        match remove_path_recursive(path) {
            Ok(true) => {
                debug!("Removed temporary artifact {}", path.display());
                report.removed.push(path.clone());
            }
            Ok(false) => {
                debug!("Temporary artifact {} already gone", path.display());
                report.absent.push(path.clone());
            }
            Err(e) => {
                warn!(
                    "Failed to remove temporary artifact {}: {}",
                    path.display(),
                    e
                );
                report.warnings.push((path.clone(), e.to_string()));
            }
        }
    }
    report
}

/// Async wrapper: removal of large checkouts runs on the blocking pool.
pub async fn cleanup_artifacts_async(paths: Vec<PathBuf>) -> CleanupReport {
    let fallback = paths.clone();
    match tokio::task::spawn_blocking(move || cleanup_artifacts(&paths)).await {
        Ok(report) => report,
        Err(e) => {
            warn!("Cleanup task failed: {}", e);
            CleanupReport {
                warnings: fallback
                    .into_iter()
                    .map(|p| (p, format!("cleanup task failed: {e}")))
                    .collect(),
                ..CleanupReport::default()
            }
        }
    }
}
