// grassup-core/src/install/acquire.rs
use futures::future::join_all;
use grassup_aio::clone_repo_async;
use grassup_common::config::Config;
use grassup_common::error::{GrassupError, Result};
use grassup_common::model::{InstallTarget, Source, SourceDescriptor};
use grassup_common::pipeline::InstallEvent;
use grassup_net::{fetch_release_asset, release_asset_url};
use reqwest::Client;
use tracing::{debug, warn};

use super::{Events, StagedSource};

/// Acquires every source of `target` concurrently.
///
/// Returns everything that was staged, including sources acquired alongside
/// a failing one, plus the first error in source order.
pub(crate) async fn acquire_sources(
    client: &Client,
    config: &Config,
    target: &InstallTarget,
    events: &Events,
) -> (Vec<StagedSource>, Option<GrassupError>) {
    let pending = target
        .sources
        .iter()
        .map(|source| acquire_one(client, config, &target.name, source, events));
    let results = join_all(pending).await;

    let mut staged = Vec::with_capacity(results.len());
    let mut first_error = None;
    for (source, result) in target.sources.iter().zip(results) {
        match result {
            Ok(s) => staged.push(s),
            Err(e) => {
                warn!("[{}] Failed to acquire {}: {}", target.name, source.locator, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    (staged, first_error)
}

async fn acquire_one(
    client: &Client,
    config: &Config,
    target_name: &str,
    source: &Source,
    events: &Events,
) -> Result<StagedSource> {
    match &source.locator {
        SourceDescriptor::ReleaseAsset { org, repo, file } => {
            events.emit(InstallEvent::DownloadStarted {
                target: target_name.to_string(),
                url: release_asset_url(&config.release_base_url, org, repo, file),
            });
            let path = fetch_release_asset(client, config, org, repo, file).await?;
            let size_bytes = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
            events.emit(InstallEvent::DownloadFinished {
                target: target_name.to_string(),
                path: path.clone(),
                size_bytes,
            });
            Ok(StagedSource {
                key: source.key.clone(),
                path,
                tree: false,
                temporary: true,
            })
        }
        SourceDescriptor::Repository { url } => {
            events.emit(InstallEvent::CloneStarted {
                target: target_name.to_string(),
                url: url.clone(),
            });
            let path = clone_repo_async(url, config.work_dir(), config.clone_policy).await?;
            events.emit(InstallEvent::CloneFinished {
                target: target_name.to_string(),
                path: path.clone(),
            });
            Ok(StagedSource {
                key: source.key.clone(),
                path,
                tree: true,
                temporary: true,
            })
        }
        SourceDescriptor::Archive { path } => {
            if !path.is_file() {
                return Err(GrassupError::RetrievalError(
                    source.locator.file_name().unwrap_or_default(),
                    path.display().to_string(),
                    "archive not found on disk".to_string(),
                ));
            }
            debug!("[{}] Using local archive {}", target_name, path.display());
            Ok(StagedSource {
                key: source.key.clone(),
                path: path.clone(),
                tree: false,
                temporary: false,
            })
        }
    }
}
