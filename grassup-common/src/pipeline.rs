// grassup-common/src/pipeline.rs
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::GrassupError;

/// Per-target install state. `Done` and `Errored` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallStage {
    Idle,
    Acquiring,
    Extracting,
    Cloning,
    Merging,
    CleaningUp,
    Done,
    Errored,
}

impl InstallStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstallStage::Done | InstallStage::Errored)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_advance_to(&self, next: InstallStage) -> bool {
        use InstallStage::*;
        match (*self, next) {
            (s, _) if s.is_terminal() => false,
            (_, Errored) => true,
            (Idle, Acquiring)
            | (Acquiring, Extracting)
            | (Acquiring, Cloning)
            | (Acquiring, Merging)
            | (Cloning, Merging)
            | (Cloning, Extracting)
            | (Extracting, CleaningUp)
            | (Extracting, Done)
            | (Merging, CleaningUp)
            | (Merging, Done)
            | (CleaningUp, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstallStage::Idle => "idle",
            InstallStage::Acquiring => "acquiring",
            InstallStage::Extracting => "extracting",
            InstallStage::Cloning => "cloning",
            InstallStage::Merging => "merging",
            InstallStage::CleaningUp => "cleaning up",
            InstallStage::Done => "done",
            InstallStage::Errored => "errored",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InstallEvent {
    StageEntered {
        target: String,
        stage: InstallStage,
    },
    DownloadStarted {
        target: String,
        url: String,
    },
    DownloadFinished {
        target: String,
        path: PathBuf,
        size_bytes: u64,
    },
    CloneStarted {
        target: String,
        url: String,
    },
    CloneFinished {
        target: String,
        path: PathBuf,
    },
    ExtractFinished {
        target: String,
        archive: PathBuf,
        destination: PathBuf,
    },
    EntryMerged {
        target: String,
        destination: PathBuf,
        copied: usize,
        skipped: usize,
    },
    CleanupWarning {
        target: String,
        path: PathBuf,
        error: String,
    },
    InstallFinished {
        target: String,
        duration_secs: f64,
    },
    InstallFailed {
        target: String,
        stage: InstallStage,
        error: String,
    },
}

impl InstallEvent {
    pub fn install_failed(target: String, stage: InstallStage, error: &GrassupError) -> Self {
        InstallEvent::InstallFailed {
            target,
            stage,
            error: error.to_string(),
        }
    }
}
