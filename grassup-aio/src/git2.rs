/*
File: grassup-aio/src/git2.rs
Purpose: Repository acquisition using git2.
*/
use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::FetchOptions;
use grassup_common::error::{GrassupError, Result};
use grassup_common::model::ClonePolicy;
use tracing::{debug, error, warn};
use url::Url;

use crate::fs::{check_symlink_exists, remove_path_recursive};

/// Local directory name for a clone URL: the last path segment without a
/// trailing `.git`. Plain local paths and scp-style remotes use their last
/// component.
pub fn repo_dir_name(url: &str) -> Result<String> {
    let last = match Url::parse(url) {
        // A one-letter scheme is a Windows drive letter.
        Ok(parsed) if parsed.scheme().len() > 1 => parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(str::to_string),
        _ => url
            .trim_end_matches(['/', '\\'])
            .rsplit(['/', '\\', ':'])
            .next()
            .map(str::to_string),
    };
    let name = last
        .as_deref()
        .map(|s| s.trim_end_matches(".git"))
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        return Err(GrassupError::CloneError(
            url.to_string(),
            "cannot derive a directory name from the URL".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Clones `url` into `<work_dir>/<repo name>` and returns that path.
/// Contains blocking network and filesystem I/O, run on the blocking pool.
pub async fn clone_repo_async(url: &str, work_dir: &Path, policy: ClonePolicy) -> Result<PathBuf> {
    let target = work_dir.join(repo_dir_name(url)?);

    if check_symlink_exists(&target) {
        match policy {
            ClonePolicy::Fail => {
                error!(
                    "Clone target {} already exists; refusing to clone {}",
                    target.display(),
                    url
                );
                return Err(GrassupError::CloneError(
                    url.to_string(),
                    format!(
                        "directory {} already exists (left over from an earlier run?)",
                        target.display()
                    ),
                ));
            }
            ClonePolicy::Replace => {
                warn!("Removing stale clone directory {}", target.display());
                remove_path_recursive(&target).map_err(|e| {
                    GrassupError::CloneError(
                        url.to_string(),
                        format!("failed to remove stale {}: {}", target.display(), e),
                    )
                })?;
            }
        }
    }

    let url_owned = url.to_string();
    let target_owned = target.clone();
    tokio::task::spawn_blocking(move || clone_repo(&url_owned, &target_owned))
        .await
        .map_err(|e| GrassupError::CloneError(url.to_string(), format!("clone task failed: {e}")))??;
    Ok(target)
}

fn clone_repo(url: &str, target: &Path) -> Result<()> {
    debug!("Cloning {} into {}", url, target.display());
    let fetch_options = FetchOptions::new();
    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options);
    builder.clone(url, target).map_err(|e| {
        error!("Failed clone {} into {}: {}", url, target.display(), e);
        GrassupError::CloneError(url.to_string(), e.message().to_string())
    })?;
    debug!("Clone of {} complete", url);
    Ok(())
}
