// grassup-aio/src/process.rs
use std::ffi::{OsStr, OsString};
use std::process::Output as StdOutput;
use std::process::Stdio;
use std::sync::Arc;

use grassup_common::error::{GrassupError, Result};
use tokio::process::Command;
use tracing::{debug, error};

/// Asynchronously runs an external command and captures its output.
/// A non-zero exit is not an error here; callers inspect `status`.
pub async fn run_command_async(
    command: impl AsRef<OsStr>,
    args: Vec<OsString>,
) -> Result<StdOutput> {
    let command = command.as_ref();
    debug!("Async Running command: {:?} {:?}", command, args);

    let mut cmd = Command::new(command);
    cmd.args(&args);
    cmd.kill_on_drop(true);

    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.stdin(Stdio::null());

    match cmd.output().await {
        Ok(output) => {
            if !output.status.success() {
                debug!("Async Command failed with status: {}", output.status);
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stdout.trim().is_empty() {
                    debug!("Stdout:\n{}", stdout.trim());
                }
                if !stderr.trim().is_empty() {
                    debug!("Stderr:\n{}", stderr.trim());
                }
            } else {
                debug!("Async Command finished successfully.");
            }
            Ok(output)
        }
        Err(e) => {
            error!("Async Failed to execute command {:?}: {}", command, e);
            Err(GrassupError::Io(Arc::new(e)))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exit_status_is_reported_not_raised() {
        let output = run_command_async("sh", vec!["-c".into(), "echo hi; exit 3".into()])
            .await
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hi");
    }

    #[tokio::test]
    async fn missing_binary_is_an_io_error() {
        let err = run_command_async("grassup-definitely-not-a-binary", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, GrassupError::Io(_)));
    }

    #[tokio::test]
    async fn child_runs_in_the_callers_directory() {
        let output = run_command_async("sh", vec!["-c".into(), "pwd -P".into()])
            .await
            .unwrap();
        let here = std::env::current_dir().unwrap().canonicalize().unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), here.to_string_lossy());
    }
}
