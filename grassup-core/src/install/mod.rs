// grassup-core/src/install/mod.rs
//! Install orchestration: acquire, extract or merge, clean up.

mod acquire;
pub mod cleanup;
pub mod merge;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use grassup_aio::{create_dir_all, extract_archive_async, ExtractTools};
use grassup_common::config::Config;
use grassup_common::error::{GrassupError, Result};
use grassup_common::model::{InstallProcedure, InstallTarget, MergeEntry, RenameRule};
use grassup_common::pipeline::{InstallEvent, InstallStage};
use reqwest::Client;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument};

use self::cleanup::{cleanup_artifacts_async, CleanupReport};
use self::merge::{apply_rename, merge_entries, MergeSummary};

/// A source after acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSource {
    pub key: String,
    pub path: PathBuf,
    /// Directory tree (clone) rather than a single file.
    pub tree: bool,
    /// Created by this run and removed during cleanup.
    pub temporary: bool,
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub target: String,
    pub destination: PathBuf,
    pub staged: Vec<StagedSource>,
    pub merge: Option<MergeSummary>,
    pub cleanup: Option<CleanupReport>,
    pub final_stage: InstallStage,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Events {
    tx: Option<broadcast::Sender<InstallEvent>>,
}

impl Events {
    pub(crate) fn emit(&self, event: InstallEvent) {
        if let Some(tx) = &self.tx {
            // No receivers is fine.
            tx.send(event).ok();
        }
    }
}

/// Tracks one target's progress through the install state machine.
struct InstallRun<'a> {
    target: &'a InstallTarget,
    stage: InstallStage,
    artifacts: Vec<PathBuf>,
    started: Instant,
}

impl<'a> InstallRun<'a> {
    fn new(target: &'a InstallTarget) -> Self {
        Self {
            target,
            stage: InstallStage::Idle,
            artifacts: Vec::new(),
            started: Instant::now(),
        }
    }

    fn enter(&mut self, next: InstallStage, events: &Events) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal transition {} -> {}",
            self.stage,
            next
        );
        debug!("[{}] {} -> {}", self.target.name, self.stage, next);
        self.stage = next;
        events.emit(InstallEvent::StageEntered {
            target: self.target.name.clone(),
            stage: next,
        });
    }
}

pub struct Installer {
    config: Config,
    client: Arc<Client>,
    tools: ExtractTools,
    events: Events,
}

impl Installer {
    /// Prepares an installer. The install root is created if absent.
    pub fn new(config: Config, client: Arc<Client>) -> Result<Self> {
        create_dir_all(config.install_root()).map_err(|e| {
            GrassupError::Config(format!(
                "Failed to create install root {}: {}",
                config.install_root().display(),
                e
            ))
        })?;
        let tools = ExtractTools::from_config(&config);
        Ok(Self {
            config,
            client,
            tools,
            events: Events::default(),
        })
    }

    /// Publishes progress on `tx` for the lifetime of this installer.
    pub fn with_events(mut self, tx: broadcast::Sender<InstallEvent>) -> Self {
        self.events = Events { tx: Some(tx) };
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs `target` to completion or to its first error.
    ///
    /// On error the returned `InstallFailed` names the stage that failed.
    /// Destination files merged before the failure stay in place, and so do
    /// staged artifacts; cleanup only runs once merging has succeeded.
    #[instrument(skip_all, fields(target = %target.name))]
    pub async fn install(&self, target: &InstallTarget) -> Result<InstallReport> {
        let mut run = InstallRun::new(target);
        match self.drive(&mut run).await {
            Ok(report) => {
                let duration_secs = run.started.elapsed().as_secs_f64();
                info!("Installed '{}' in {:.1}s", target.name, duration_secs);
                self.events.emit(InstallEvent::InstallFinished {
                    target: target.name.clone(),
                    duration_secs,
                });
                Ok(report)
            }
            Err(e) => {
                let failed_stage = run.stage;
                error!(
                    "[{}] Install failed while {}: {}",
                    target.name, failed_stage, e
                );
                if !run.artifacts.is_empty() {
                    debug!(
                        "[{}] Leaving {} staged artifact(s) in place",
                        target.name,
                        run.artifacts.len()
                    );
                }
                run.enter(InstallStage::Errored, &self.events);
                self.events.emit(InstallEvent::install_failed(
                    target.name.clone(),
                    failed_stage,
                    &e,
                ));
                Err(e.in_stage(&target.name, failed_stage))
            }
        }
    }

    async fn drive(&self, run: &mut InstallRun<'_>) -> Result<InstallReport> {
        let target = run.target;
        target.validate()?;

        let destination = self.config.destination_for(target);
        create_dir_all(&destination)?;

        run.enter(InstallStage::Acquiring, &self.events);
        let (staged, failure) =
            acquire::acquire_sources(&self.client, &self.config, target, &self.events).await;
        run.artifacts.extend(
            staged
                .iter()
                .filter(|s| s.temporary)
                .map(|s| s.path.clone()),
        );
        if let Some(e) = failure {
            return Err(e);
        }

        if staged.iter().any(|s| s.tree) {
            run.enter(InstallStage::Cloning, &self.events);
        }

        let mut merge = None;
        match &target.procedure {
            InstallProcedure::Extract { source, .. } => {
                run.enter(InstallStage::Extracting, &self.events);
                let archive = staged_path(&staged, source)?;
                let format = target.archive_format().ok_or_else(|| {
                    GrassupError::ExtractionError(
                        archive.display().to_string(),
                        "unsupported archive format".to_string(),
                    )
                })?;
                extract_archive_async(archive, &destination, format, &self.tools).await?;
                self.events.emit(InstallEvent::ExtractFinished {
                    target: target.name.clone(),
                    archive: archive.to_path_buf(),
                    destination: destination.clone(),
                });
            }
            InstallProcedure::Merge { entries, rename } => {
                run.enter(InstallStage::Merging, &self.events);
                merge = Some(
                    self.merge_staged(target, &staged, &destination, entries, rename.as_ref())
                        .await?,
                );
            }
        }

        let cleanup = if run.artifacts.is_empty() {
            None
        } else {
            run.enter(InstallStage::CleaningUp, &self.events);
            let report = cleanup_artifacts_async(run.artifacts.clone()).await;
            for (path, reason) in &report.warnings {
                self.events.emit(InstallEvent::CleanupWarning {
                    target: target.name.clone(),
                    path: path.clone(),
                    error: reason.clone(),
                });
            }
            Some(report)
        };

        run.enter(InstallStage::Done, &self.events);
        Ok(InstallReport {
            target: target.name.clone(),
            destination,
            staged,
            merge,
            cleanup,
            final_stage: InstallStage::Done,
        })
    }

    async fn merge_staged(
        &self,
        target: &InstallTarget,
        staged: &[StagedSource],
        destination: &Path,
        entries: &[MergeEntry],
        rename: Option<&RenameRule>,
    ) -> Result<MergeSummary> {
        // The destination root exists already, so the rename can go first.
        if let Some(rule) = rename {
            let file = staged_path(staged, &rule.source)?;
            apply_rename(file, destination, &rule.to)?;
        }

        let roots: HashMap<String, PathBuf> = staged
            .iter()
            .filter(|s| s.tree)
            .map(|s| (s.key.clone(), s.path.clone()))
            .collect();
        let destination = destination.to_path_buf();
        let entries = entries.to_vec();
        let events = self.events.clone();
        let target_name = target.name.clone();

        tokio::task::spawn_blocking(move || {
            merge_entries(&roots, &destination, &entries, |merged| {
                events.emit(InstallEvent::EntryMerged {
                    target: target_name.clone(),
                    destination: merged.destination.clone(),
                    copied: merged.stats.copied,
                    skipped: merged.stats.skipped,
                });
            })
        })
        .await
        .map_err(|e| GrassupError::Generic(format!("JoinError in merge: {e}")))?
    }
}

fn staged_path<'s>(staged: &'s [StagedSource], key: &str) -> Result<&'s Path> {
    staged
        .iter()
        .find(|s| s.key == key)
        .map(|s| s.path.as_path())
        .ok_or_else(|| GrassupError::Generic(format!("source '{key}' was not staged")))
}
