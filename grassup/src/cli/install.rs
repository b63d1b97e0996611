// grassup/src/cli/install.rs
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use grassup_common::config::Config;
use grassup_common::error::{GrassupError, Result};
use grassup_common::model::{ClonePolicy, InstallTarget};
use grassup_common::targets;
use grassup_core::{InstallReport, Installer};
use grassup_net::build_http_client;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use super::messages::{Locale, Messages};
use super::status;

const EVENT_CHANNEL_SIZE: usize = 256;

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Target to install (see `grassup list`)
    target: String,

    /// Delete clone directories left behind by an earlier run instead of failing
    #[arg(long)]
    replace_stale_clones: bool,

    #[arg(long, value_enum, default_value_t = Locale::English)]
    lang: Locale,
}

impl InstallArgs {
    #[instrument(skip(self, config), fields(target = %self.target))]
    pub async fn run(&self, config: &Config) -> Result<()> {
        let mut config = config.clone();
        if self.replace_stale_clones {
            config.clone_policy = ClonePolicy::Replace;
        }
        let target = targets::find_target(&config, &self.target)?;
        install_target(config, &target, Messages::new(self.lang)).await?;
        Ok(())
    }
}

/// True when the status display has already printed this failure.
pub fn shown_by_status(err: &GrassupError) -> bool {
    matches!(err, GrassupError::InstallFailed { .. })
}

/// Installs one target while printing its progress.
pub async fn install_target(
    config: Config,
    target: &InstallTarget,
    messages: Messages,
) -> Result<InstallReport> {
    println!("{}", messages.install_started(&target.name).bold());

    let client = Arc::new(build_http_client()?);
    let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_SIZE);
    let status_handle = tokio::spawn(status::handle_events(messages, event_rx));

    let installer = Installer::new(config, client)?.with_events(event_tx);
    let result = installer.install(target).await;
    // Closes the channel so the status task drains and exits.
    drop(installer);
    if let Err(e) = status_handle.await {
        debug!("Status task ended abnormally: {}", e);
    }

    if let Ok(report) = &result {
        if let Some(merge) = &report.merge {
            debug!(
                "{} files copied, {} kept into {}",
                merge.total.copied,
                merge.total.skipped,
                report.destination.display()
            );
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use grassup_common::pipeline::InstallStage;

    use super::*;

    #[test]
    fn only_install_failures_are_shown_by_status() {
        let failed = GrassupError::InstallFailed {
            target: "grassclipper".into(),
            stage: InstallStage::Extracting,
            source: Arc::new(GrassupError::Generic("truncated".into())),
        };
        assert!(shown_by_status(&failed));
        assert!(!shown_by_status(&GrassupError::Config(
            "unknown install target 'nope'".into()
        )));
    }
}
