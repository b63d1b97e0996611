// grassup/src/main.rs
use std::fs;
use std::process;

use clap::Parser;
use colored::Colorize;
use grassup_common::config::Config;
use grassup_common::error::{GrassupError, Result as GrassupResult};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::menu::MenuArgs;
use cli::CliArgs;

fn init_logging(config: &Config, verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let max_log_level = level_filter.into_level().unwrap_or(tracing::Level::INFO);

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("GRASSUP_LOG")
        .from_env_lossy();

    let log_dir = config.logs_dir();
    if verbose == 0 {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .without_time()
            .try_init();
        return;
    }

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!(
            "{} Failed to create log directory {}: {}",
            "Error:".red().bold(),
            log_dir.display(),
            e
        );
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .without_time()
            .try_init();
        return;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "grassup.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_writer = std::io::stderr.with_max_level(max_log_level);
    let file_writer = non_blocking_appender.with_max_level(max_log_level);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr_writer.and(file_writer))
        .with_ansi(true)
        .without_time()
        .try_init();

    // The guard flushes the file writer on drop; it must outlive main.
    Box::leak(Box::new(guard));

    debug!(
        "Verbose logging enabled. Writing logs to: {}/grassup.log",
        log_dir.display()
    );
}

#[tokio::main]
async fn main() -> GrassupResult<()> {
    let cli_args = CliArgs::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            process::exit(1);
        }
    };
    init_logging(&config, cli_args.verbose);
    debug!("Install root: {}", config.install_root().display());

    let command_execution_result = match &cli_args.command {
        Some(command) => command.run(&config).await,
        None => MenuArgs::default().run(&config).await,
    };

    if let Err(e) = command_execution_result {
        if cli::install::shown_by_status(&e) {
            debug!("Command failed: {:#}", e);
        } else {
            error!("Command failed: {:#}", e);
            eprintln!("{}: {:#}", "Error".red().bold(), e);
        }
        if let GrassupError::InstallFailed { target, stage, .. } = &e {
            eprintln!(
                "{} '{}' stopped while {}; staged files were left in place.",
                "Note:".yellow(),
                target,
                stage
            );
        }
        process::exit(1);
    }

    debug!("Command completed successfully.");
    Ok(())
}
