// grassup-aio/src/extract.rs
// Handles archive extraction asynchronously.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use grassup_common::config::Config;
use grassup_common::error::{GrassupError, Result};
use grassup_common::model::ArchiveFormat;
use tracing::{debug, error, trace};
use zip::ZipArchive;

use crate::process::run_command_async;

const SEVENZIP_CANDIDATES: &[&str] = &["7zz", "7z", "7za"];

/// External tools the extractor may shell out to.
#[derive(Debug, Clone, Default)]
pub struct ExtractTools {
    /// Explicit 7-Zip binary; searched on `PATH` when unset.
    pub sevenzip_bin: Option<PathBuf>,
}

impl ExtractTools {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sevenzip_bin: config.sevenzip_bin.clone(),
        }
    }

    fn sevenzip(&self) -> Option<PathBuf> {
        if let Some(bin) = &self.sevenzip_bin {
            return Some(bin.clone());
        }
        SEVENZIP_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
    }
}

/// Extracts `archive` into `target_dir` and resolves once every file is on
/// disk, whatever the backing mechanism. Files that already exist under
/// `target_dir` are kept as they are.
pub async fn extract_archive_async(
    archive_path: &Path,
    target_dir: &Path,
    format: ArchiveFormat,
    tools: &ExtractTools,
) -> Result<()> {
    debug!(
        "Async Extracting archive '{}' (type: {}) to '{}'",
        archive_path.display(),
        format,
        target_dir.display()
    );

    if !archive_path.is_file() {
        return Err(extraction_err(archive_path, "archive not found"));
    }
    tokio::fs::create_dir_all(target_dir).await?;

    match format {
        ArchiveFormat::Zip => {
            let archive = archive_path.to_path_buf();
            let target = target_dir.to_path_buf();
            tokio::task::spawn_blocking(move || extract_zip(&archive, &target))
                .await
                .map_err(|e| {
                    extraction_err(archive_path, &format!("JoinError in ZIP extraction: {e}"))
                })?
        }
        ArchiveFormat::SevenZip => extract_sevenzip(archive_path, target_dir, tools).await,
    }
}

fn extraction_err(archive: &Path, reason: &str) -> GrassupError {
    GrassupError::ExtractionError(archive.display().to_string(), reason.to_string())
}

fn extract_zip(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        error!("Failed to open ZIP {}: {}", archive_path.display(), e);
        extraction_err(archive_path, &format!("corrupt or truncated ZIP: {e}"))
    })?;

    let mut written = 0usize;
    let mut kept = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| {
            extraction_err(archive_path, &format!("failed to read ZIP entry {i}: {e}"))
        })?;
        let rel = entry.enclosed_name().ok_or_else(|| {
            extraction_err(
                archive_path,
                &format!("unsafe path in ZIP entry '{}'", entry.name()),
            )
        })?;
        let out_path = target_dir.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = match OpenOptions::new().write(true).create_new(true).open(&out_path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                trace!("Keeping existing {}", out_path.display());
                kept += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = io::copy(&mut entry, &mut out) {
            // A partial file would be skipped as "existing" on the next run.
            drop(out);
            if let Err(rm) = fs::remove_file(&out_path) {
                error!("Failed to remove partial {}: {}", out_path.display(), rm);
            }
            return Err(extraction_err(
                archive_path,
                &format!("failed to write {}: {}", out_path.display(), e),
            ));
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))?;
            }
        }
        written += 1;
    }
    debug!(
        "Finished ZIP extraction of {}: {} written, {} kept",
        archive_path.display(),
        written,
        kept
    );
    Ok(())
}

async fn extract_sevenzip(archive_path: &Path, target_dir: &Path, tools: &ExtractTools) -> Result<()> {
    let bin = tools.sevenzip().ok_or_else(|| {
        extraction_err(
            archive_path,
            &format!(
                "no 7-Zip binary found (looked for {}; set GRASSUP_7Z)",
                SEVENZIP_CANDIDATES.join(", ")
            ),
        )
    })?;

    let mut out_flag = OsString::from("-o");
    out_flag.push(target_dir.as_os_str());
    // -aos: skip files that already exist.
    let args: Vec<OsString> = vec![
        "x".into(),
        archive_path.as_os_str().to_owned(),
        out_flag,
        "-aos".into(),
        "-y".into(),
    ];

    let output = run_command_async(&bin, args).await.map_err(|e| {
        extraction_err(
            archive_path,
            &format!("failed to run {}: {}", bin.display(), e),
        )
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(
            "7-Zip exited with {} for {}",
            output.status,
            archive_path.display()
        );
        return Err(extraction_err(
            archive_path,
            &format!("{} exited with {}: {}", bin.display(), output.status, stderr.trim()),
        ));
    }
    debug!("Finished 7z extraction of {}", archive_path.display());
    Ok(())
}
