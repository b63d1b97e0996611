// grassup/src/cli/menu.rs
//! Interactive menu: pick a language, then install targets until Exit.
use clap::Args;
use colored::Colorize;
use dialoguer::console::Term;
use dialoguer::{Input, Select};
use grassup_common::config::Config;
use grassup_common::error::{GrassupError, Result};
use grassup_common::model::InstallTarget;
use grassup_common::targets;
use tracing::{debug, error};

use super::install::{install_target, shown_by_status};
use super::messages::{Locale, Messages};

#[derive(Args, Debug, Default)]
pub struct MenuArgs {
    /// Skip the language picker
    #[arg(long, value_enum)]
    lang: Option<Locale>,
}

fn prompt_err(e: dialoguer::Error) -> GrassupError {
    GrassupError::Generic(format!("Menu input failed: {e}"))
}

/// Menu lines: one per target, then Exit.
fn menu_items(targets: &[InstallTarget], messages: &Messages) -> Vec<String> {
    targets
        .iter()
        .map(|t| messages.target_name(&t.name).to_string())
        .chain(std::iter::once(messages.main_install_exit().to_string()))
        .collect()
}

fn pick_locale(term: &Term) -> Result<Option<Locale>> {
    let labels: Vec<&str> = Locale::ALL.iter().map(|l| l.label()).collect();
    let choice = Select::new()
        .with_prompt(Messages::language_prompt())
        .items(&labels)
        .default(0)
        .interact_on_opt(term)
        .map_err(prompt_err)?;
    Ok(choice.map(|i| Locale::ALL[i]))
}

impl MenuArgs {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let term = Term::stderr();
        let locale = match self.lang {
            Some(locale) => locale,
            None => match pick_locale(&term)? {
                Some(locale) => locale,
                None => return Ok(()),
            },
        };
        let messages = Messages::new(locale);
        debug!("Menu running with locale {:?}", messages.locale());

        let targets = targets::all_targets(config)?;
        let items = menu_items(&targets, &messages);

        loop {
            term.clear_screen().ok();
            let choice = Select::new()
                .with_prompt(messages.main_install())
                .items(&items)
                .default(0)
                .interact_on_opt(&term)
                .map_err(prompt_err)?;
            let Some(target) = choice.and_then(|i| targets.get(i)) else {
                return Ok(());
            };

            // A failed install is reported and the menu comes back.
            if let Err(e) = install_target(config.clone(), target, messages).await {
                error!("Menu install of '{}' failed: {:#}", target.name, e);
                if !shown_by_status(&e) {
                    eprintln!("{}: {:#}", "Error".red().bold(), e);
                }
            }

            Input::<String>::new()
                .with_prompt(messages.return_to_menu())
                .allow_empty(true)
                .interact_text_on(&term)
                .map_err(prompt_err)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_is_the_last_entry() {
        let messages = Messages::new(Locale::English);
        let items = menu_items(&targets::builtin_targets(), &messages);
        assert_eq!(items.len(), 4);
        assert_eq!(items[0], "Grasscutter (server)");
        assert_eq!(items[3], "Exit");
    }

    #[test]
    fn entries_follow_the_locale() {
        let messages = Messages::new(Locale::Chinese);
        let items = menu_items(&targets::builtin_targets(), &messages);
        assert_eq!(items.last().map(String::as_str), Some("退出"));
    }
}
