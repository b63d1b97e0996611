// grassup/src/cli/status.rs
use std::path::Path;

use colored::*;
use grassup_common::pipeline::{InstallEvent, InstallStage};
use tokio::sync::broadcast;
use tracing::warn;

use super::messages::Messages;

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "kB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit_idx = 0;

    while value >= 1000.0 && unit_idx < UNITS.len() - 1 {
        value /= 1000.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{bytes}B")
    } else {
        format!("{:.1}{}", value, UNITS[unit_idx])
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// One rendered status line for `event`, or `None` if it is not shown.
fn describe(event: &InstallEvent, messages: &Messages) -> Option<String> {
    let line = match event {
        InstallEvent::StageEntered { stage, .. } => match stage {
            InstallStage::Idle | InstallStage::Done | InstallStage::Errored => return None,
            stage => format!("{}{}", "==> ".bold().blue(), messages.stage(*stage).bold()),
        },
        InstallEvent::DownloadStarted { url, .. } => format!("  {} {}", "↓".yellow(), url.dimmed()),
        InstallEvent::DownloadFinished {
            path, size_bytes, ..
        } => format!(
            "  {} {} {}",
            "✓".green(),
            file_label(path).cyan(),
            format!("({})", format_bytes(*size_bytes)).dimmed()
        ),
        InstallEvent::CloneStarted { url, .. } => format!("  {} {}", "↓".yellow(), url.dimmed()),
        InstallEvent::CloneFinished { path, .. } => {
            format!("  {} {}", "✓".green(), file_label(path).cyan())
        }
        InstallEvent::ExtractFinished {
            archive,
            destination,
            ..
        } => format!(
            "  {} {} → {}",
            "✓".green(),
            file_label(archive).cyan(),
            destination.display()
        ),
        InstallEvent::EntryMerged {
            destination,
            copied,
            skipped,
            ..
        } => format!(
            "  {} {} {}",
            "→".cyan(),
            destination.display(),
            format!("(+{copied}, ={skipped})").dimmed()
        ),
        InstallEvent::CleanupWarning { path, error, .. } => format!(
            "  {} {} {}: {}",
            "!".yellow().bold(),
            messages.cleanup_warning().yellow(),
            path.display(),
            error
        ),
        InstallEvent::InstallFinished {
            target,
            duration_secs,
        } => format!(
            "{} {}",
            messages.install_finished(target).green().bold(),
            format!("[{duration_secs:.1}s]").dimmed()
        ),
        InstallEvent::InstallFailed {
            target,
            stage,
            error,
        } => format!(
            "{} ({}): {}",
            messages.install_failed(target).red().bold(),
            messages.stage(*stage),
            error.red()
        ),
    };
    Some(line)
}

/// Prints install progress until every sender is gone.
pub async fn handle_events(messages: Messages, mut event_rx: broadcast::Receiver<InstallEvent>) {
    loop {
        match event_rx.recv().await {
            Ok(event) => {
                if let Some(line) = describe(&event, &messages) {
                    println!("{line}");
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Status display lagged, skipped {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::cli::messages::Locale;

    fn plain(event: InstallEvent) -> Option<String> {
        colored::control::set_override(false);
        describe(&event, &Messages::new(Locale::English))
    }

    #[test]
    fn sizes_use_decimal_units() {
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(1_500), "1.5kB");
        assert_eq!(format_bytes(73_400_000), "73.4MB");
    }

    #[test]
    fn terminal_stage_markers_are_not_printed() {
        for stage in [InstallStage::Idle, InstallStage::Done, InstallStage::Errored] {
            assert!(plain(InstallEvent::StageEntered {
                target: "grasscutter".into(),
                stage,
            })
            .is_none());
        }
        assert_eq!(
            plain(InstallEvent::StageEntered {
                target: "grasscutter".into(),
                stage: InstallStage::Merging,
            })
            .unwrap(),
            "==> Copying files"
        );
    }

    #[test]
    fn merge_lines_show_copied_and_kept_counts() {
        let line = plain(InstallEvent::EntryMerged {
            target: "grasscutter".into(),
            destination: PathBuf::from("Grasscutter/resources/TextMap"),
            copied: 12,
            skipped: 3,
        })
        .unwrap();
        assert!(line.contains("resources/TextMap"));
        assert!(line.contains("(+12, =3)"));
    }

    #[test]
    fn failure_line_names_target_and_stage() {
        let line = plain(InstallEvent::InstallFailed {
            target: "grassclipper-x".into(),
            stage: InstallStage::Extracting,
            error: "truncated".into(),
        })
        .unwrap();
        assert_eq!(
            line,
            "Failed to install GrassClipper-X (launcher, preview) (Extracting archive): truncated"
        );
    }
}
