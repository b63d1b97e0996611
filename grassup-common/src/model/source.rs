// grassup-common/src/model/source.rs
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A named source belonging to an install target. The key is what the
/// target's procedure refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub key: String,
    #[serde(flatten)]
    pub locator: SourceDescriptor,
}

impl Source {
    pub fn new(key: impl Into<String>, locator: SourceDescriptor) -> Self {
        Self {
            key: key.into(),
            locator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceDescriptor {
    /// Resolves to the `releases/latest/download` URL of a repository.
    ReleaseAsset {
        org: String,
        repo: String,
        file: String,
    },
    /// A clonable repository; materialized as a working copy.
    Repository { url: String },
    /// An archive that already exists on disk.
    Archive { path: PathBuf },
}

impl SourceDescriptor {
    pub fn release_asset(org: &str, repo: &str, file: &str) -> Self {
        SourceDescriptor::ReleaseAsset {
            org: org.to_string(),
            repo: repo.to_string(),
            file: file.to_string(),
        }
    }

    pub fn repository(url: &str) -> Self {
        SourceDescriptor::Repository {
            url: url.to_string(),
        }
    }

    /// True when the staged form of this source is a single file rather
    /// than a directory tree.
    pub fn stages_file(&self) -> bool {
        !matches!(self, SourceDescriptor::Repository { .. })
    }

    /// File name of the staged file, when the source stages one.
    pub fn file_name(&self) -> Option<String> {
        match self {
            SourceDescriptor::ReleaseAsset { file, .. } => Some(file.clone()),
            SourceDescriptor::Archive { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            SourceDescriptor::Repository { .. } => None,
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::ReleaseAsset { org, repo, file } => {
                write!(f, "release {org}/{repo}:{file}")
            }
            SourceDescriptor::Repository { url } => write!(f, "repository {url}"),
            SourceDescriptor::Archive { path } => write!(f, "archive {}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    /// Deflate family, unpacked natively.
    Zip,
    /// 7z family, unpacked by an external tool.
    SevenZip,
}

impl ArchiveFormat {
    /// Infers the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "zip" => Some(ArchiveFormat::Zip),
            "7z" => Some(ArchiveFormat::SevenZip),
            _ => None,
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Zip => f.write_str("zip"),
            ArchiveFormat::SevenZip => f.write_str("7z"),
        }
    }
}

/// What to do when a clone directory is already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClonePolicy {
    /// Report a clone error and leave the directory alone.
    #[default]
    Fail,
    /// Remove the stale directory and clone again.
    Replace,
}
