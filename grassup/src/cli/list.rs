use clap::Args;
use colored::Colorize;
use grassup_common::config::Config;
use grassup_common::error::Result;
use grassup_common::model::{InstallProcedure, InstallTarget};
use grassup_common::targets;
use prettytable::{format, Cell, Row, Table};

use super::messages::{Locale, Messages};

#[derive(Args, Debug)]
pub struct List {
    #[arg(long, value_enum, default_value_t = Locale::English)]
    lang: Locale,
}

fn procedure_summary(target: &InstallTarget) -> String {
    match &target.procedure {
        InstallProcedure::Merge { entries, rename } => {
            let mut s = format!("merge {} entries", entries.len());
            if let Some(rule) = rename {
                s.push_str(&format!(" + {}", rule.to.display()));
            }
            s
        }
        InstallProcedure::Extract { .. } => match target.archive_format() {
            Some(format) => format!("extract ({format})"),
            None => "extract".to_string(),
        },
    }
}

impl List {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let targets = targets::all_targets(config)?;
        if targets.is_empty() {
            println!("{}", "No install targets defined".yellow());
            return Ok(());
        }
        let messages = Messages::new(self.lang);

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.add_row(Row::new(vec![
            Cell::new("Target").style_spec("b"),
            Cell::new("Name").style_spec("b"),
            Cell::new("Destination").style_spec("b"),
            Cell::new("Sources").style_spec("b"),
            Cell::new("Procedure").style_spec("b"),
        ]));
        for target in &targets {
            let installed = config.destination_for(target);
            table.add_row(Row::new(vec![
                Cell::new(&target.name).style_spec("Fc"),
                Cell::new(messages.target_name(&target.name)),
                Cell::new(&installed.display().to_string()),
                Cell::new(&target.sources.len().to_string()),
                Cell::new(&procedure_summary(target)),
            ]));
        }
        table.printstd();
        println!(
            "{} {}",
            "Install root:".bold(),
            config.install_root().display()
        );
        Ok(())
    }
}
