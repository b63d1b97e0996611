// grassup-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::debug;

use super::error::{GrassupError, Result};
use crate::model::{ClonePolicy, InstallTarget};

const INSTALL_DIR_NAME: &str = "Grasscutters";
const DEFAULT_RELEASE_BASE: &str = "https://github.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub install_root: PathBuf,
    pub temp_dir: PathBuf,
    pub work_dir: PathBuf,
    pub release_base_url: String,
    pub sevenzip_bin: Option<PathBuf>,
    pub clone_policy: ClonePolicy,
    pub targets_file: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading grassup configuration");

        let install_root = match non_empty_var("GRASSUP_ROOT") {
            Some(root) => PathBuf::from(root),
            None => default_install_root()?,
        };
        debug!("Effective install root set to: {}", install_root.display());

        let temp_dir = non_empty_var("GRASSUP_TMP")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        // Clones land next to wherever the installer was started from.
        let work_dir = match non_empty_var("GRASSUP_WORK_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => env::current_dir()?,
        };

        let release_base_url = non_empty_var("GRASSUP_RELEASE_BASE")
            .unwrap_or_else(|| DEFAULT_RELEASE_BASE.to_string());

        let clone_policy = if env::var("GRASSUP_REPLACE_STALE_CLONES").is_ok_and(|v| v == "1") {
            ClonePolicy::Replace
        } else {
            ClonePolicy::Fail
        };

        debug!("Configuration loaded successfully.");
        Ok(Self {
            install_root,
            temp_dir,
            work_dir,
            release_base_url,
            sevenzip_bin: non_empty_var("GRASSUP_7Z").map(PathBuf::from),
            clone_policy,
            targets_file: non_empty_var("GRASSUP_TARGETS").map(PathBuf::from),
        })
    }

    /// A config rooted at explicit directories, with defaults elsewhere.
    pub fn with_dirs(install_root: &Path, temp_dir: &Path, work_dir: &Path) -> Self {
        Self {
            install_root: install_root.to_path_buf(),
            temp_dir: temp_dir.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
            release_base_url: DEFAULT_RELEASE_BASE.to_string(),
            sevenzip_bin: None,
            clone_policy: ClonePolicy::Fail,
            targets_file: None,
        }
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.install_root.join("logs")
    }

    pub fn targets_file(&self) -> Option<&Path> {
        self.targets_file.as_deref()
    }

    pub fn destination_for(&self, target: &InstallTarget) -> PathBuf {
        if target.destination.as_os_str().is_empty() {
            self.install_root.clone()
        } else {
            self.install_root.join(&target.destination)
        }
    }

    /// Temporary path a release asset with this file name is downloaded to.
    pub fn download_path(&self, file: &str) -> PathBuf {
        self.temp_dir.join(file)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn default_install_root() -> Result<PathBuf> {
    if let Some(local) = non_empty_var("LOCALAPPDATA") {
        return Ok(PathBuf::from(local).join(INSTALL_DIR_NAME));
    }
    BaseDirs::new()
        .map(|dirs| dirs.data_local_dir().join(INSTALL_DIR_NAME))
        .ok_or_else(|| {
            GrassupError::Config(
                "Could not determine a data directory; set GRASSUP_ROOT".to_string(),
            )
        })
}
