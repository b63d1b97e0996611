use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::pipeline::InstallStage;

#[derive(Error, Debug, Clone)]
pub enum GrassupError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    /// File name, URL, reason.
    #[error("RetrievalError: Failed to download '{0}' from '{1}': {2}")]
    RetrievalError(String, String, String),

    /// Clone URL, reason.
    #[error("CloneError: Failed to clone '{0}': {1}")]
    CloneError(String, String),

    /// Archive path, reason.
    #[error("ExtractionError: Failed to extract '{0}': {1}")]
    ExtractionError(String, String),

    /// Source subpath, reason.
    #[error("MergeError: Cannot merge '{0}': {1}")]
    MergeError(String, String),

    #[error("Installation of '{target}' failed while {stage}: {source}")]
    InstallFailed {
        target: String,
        stage: InstallStage,
        source: Arc<GrassupError>,
    },

    #[error("Generic Error: {0}")]
    Generic(String),
}

/// Coarse classification used by callers that branch on the failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Retrieval,
    Clone,
    Extraction,
    Merge,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Retrieval => "retrieval",
            ErrorKind::Clone => "clone",
            ErrorKind::Extraction => "extraction",
            ErrorKind::Merge => "merge",
            ErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

impl GrassupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GrassupError::RetrievalError(..) => ErrorKind::Retrieval,
            GrassupError::CloneError(..) => ErrorKind::Clone,
            GrassupError::ExtractionError(..) => ErrorKind::Extraction,
            GrassupError::MergeError(..) => ErrorKind::Merge,
            GrassupError::InstallFailed { source, .. } => source.kind(),
            _ => ErrorKind::Other,
        }
    }

    /// Wraps an error with the target and stage it surfaced from.
    pub fn in_stage(self, target: &str, stage: InstallStage) -> Self {
        GrassupError::InstallFailed {
            target: target.to_string(),
            stage,
            source: Arc::new(self),
        }
    }
}

impl From<std::io::Error> for GrassupError {
    fn from(err: std::io::Error) -> Self {
        GrassupError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for GrassupError {
    fn from(err: serde_json::Error) -> Self {
        GrassupError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, GrassupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_sees_through_install_failed() {
        let err = GrassupError::MergeError("TextMap".into(), "source subtree missing".into())
            .in_stage("grasscutter", InstallStage::Merging);
        assert_eq!(err.kind(), ErrorKind::Merge);
        let msg = err.to_string();
        assert!(msg.contains("grasscutter"));
        assert!(msg.contains("merging"));
        assert!(msg.contains("TextMap"));
    }

    #[test]
    fn io_errors_are_other() {
        let err: GrassupError = std::io::Error::other("boom").into();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
