// grassup-net/src/http.rs
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::{Stream, StreamExt};
use grassup_common::config::Config;
use grassup_common::error::{GrassupError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tokio::fs::{self, File as TokioFile};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use crate::validation::validate_url;

const DOWNLOAD_TIMEOUT_SECS: u64 = 600;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_STRING: &str = "grassup installer (Rust)";

/// The stable "latest release" download URL for a release asset.
pub fn release_asset_url(base: &str, org: &str, repo: &str, file: &str) -> String {
    format!(
        "{}/{org}/{repo}/releases/latest/download/{file}",
        base.trim_end_matches('/')
    )
}

pub fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| GrassupError::Generic(format!("Failed to build HTTP client: {e}")))
}

/// Downloads the latest release asset `file` of `org/repo` into the
/// configured temp directory and returns the written path.
///
/// The destination is `<temp_dir>/<file>` and is truncated on every call.
/// If the transfer fails midway the partial file is left behind.
pub async fn fetch_release_asset(
    client: &Client,
    config: &Config,
    org: &str,
    repo: &str,
    file: &str,
) -> Result<PathBuf> {
    let url = release_asset_url(&config.release_base_url, org, repo, file);
    let dest = config.download_path(file);
    debug!(
        "Preparing to fetch release asset '{}' from URL: {}",
        file, url
    );
    download_to(client, &url, &dest).await?;
    Ok(dest)
}

/// Streams the body of `url` into `dest`. Returns the number of bytes written.
pub async fn download_to(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    let file_label = dest
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let retrieval_err =
        |reason: String| GrassupError::RetrievalError(file_label.clone(), url.to_string(), reason);

    validate_url(url)?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            GrassupError::Config(format!(
                "Failed to create download directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let response = client.get(url).send().await.map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        retrieval_err(format!("HTTP request failed: {e}"))
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if !status.is_success() {
        error!("HTTP error {} for URL {}", status, url);
        let reason = match status {
            StatusCode::NOT_FOUND => "Resource not found (404)".to_string(),
            StatusCode::FORBIDDEN => "Access forbidden (403)".to_string(),
            _ => format!("HTTP error {status}"),
        };
        return Err(retrieval_err(reason));
    }

    debug!("Downloading to temporary path: {}", dest.display());
    let mut out = TokioFile::create(dest).await.map_err(|e| {
        retrieval_err(format!("Failed to create {}: {}", dest.display(), e))
    })?;

    let written = write_body(response.bytes_stream(), &mut out, url, dest, retrieval_err).await?;
    debug!(
        "Finished writing {} bytes to {}",
        written,
        dest.display()
    );
    Ok(written)
}

/// Writes every chunk of `stream` into `out` and flushes it.
async fn write_body<S, C, E, W>(
    mut stream: S,
    out: &mut W,
    url: &str,
    dest: &Path,
    retrieval_err: impl Fn(String) -> GrassupError,
) -> Result<u64>
where
    S: Stream<Item = std::result::Result<C, E>> + Unpin,
    C: AsRef<[u8]>,
    E: fmt::Display,
    W: AsyncWrite + Unpin,
{
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            error!(
                "Download of {} interrupted after {} bytes: {}",
                url, written, e
            );
            retrieval_err(format!("Connection interrupted after {written} bytes: {e}"))
        })?;
        let bytes = chunk.as_ref();
        out.write_all(bytes).await.map_err(|e| {
            retrieval_err(format!("Failed to write to {}: {}", dest.display(), e))
        })?;
        written += bytes.len() as u64;
    }
    out.flush()
        .await
        .map_err(|e| retrieval_err(format!("Failed to flush {}: {}", dest.display(), e)))?;
    Ok(written)
}
