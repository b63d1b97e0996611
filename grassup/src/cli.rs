// grassup/src/cli.rs
//! Defines the command-line argument structure using clap.
use clap::{ArgAction, Parser, Subcommand};
use grassup_common::config::Config;
use grassup_common::error::Result;

pub mod install;
pub mod list;
pub mod menu;
pub mod messages;
pub mod status;

use crate::cli::install::InstallArgs;
use crate::cli::list::List;
use crate::cli::menu::MenuArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "grassup", bin_name = "grassup")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Opens the interactive menu when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install one target
    Install(InstallArgs),
    /// Show the available install targets
    List(List),
    /// Interactive installer menu
    Menu(MenuArgs),
}

impl Command {
    pub async fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Install(command) => command.run(config).await,
            Self::List(command) => command.run(config).await,
            Self::Menu(command) => command.run(config).await,
        }
    }
}
