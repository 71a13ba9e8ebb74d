use anyhow::{Context, Result};
use cardbatch_core::{GroupBy, Report, build_report};
use cardbatch_export::{ExportFormat, TextTable};
use cardbatch_ingest::{Selector, TransactionStore};
use clap::{Args, Parser, Subcommand};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;
mod logging;
mod state;
mod tasks;

use config::{Config, GroupKey, Order};

#[derive(Parser, Debug)]
#[command(
    name = "cardbatch",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARDBATCH_BUILD_SHA"), ")"),
    about = "Card settlement batch reports"
)]
struct Cli {
    /// Batch folder (default: [data] xml_dir from config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List loaded batch files and their record counts
    Files,

    /// Print the grouped report
    Show {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Emit the report rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the grouped report to a PDF, spreadsheet or CSV file
    Export {
        /// Output format (default: from --out extension, then config)
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Destination file (default: ~/.cardbatch/save_<format>/Report_<millis>.<ext>)
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Copy a batch file into the batch folder and load it
    Import { path: PathBuf },

    /// Manage ~/.cardbatch/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Args, Debug, Clone, Default)]
struct SelectionArgs {
    /// Restrict to one loaded file (default: all files)
    #[arg(long)]
    file: Option<String>,

    #[arg(long, value_enum)]
    group: Option<GroupKey>,

    /// Date order; ignored for card-type grouping
    #[arg(long, value_enum)]
    order: Option<Order>,
}

impl SelectionArgs {
    fn selector(&self) -> Selector {
        self.file
            .as_deref()
            .map(Selector::from)
            .unwrap_or(Selector::AllFiles)
    }

    /// Flags win over the `[report]` config section.
    fn group_by(&self, cfg: &Config) -> GroupBy {
        config::group_by(
            self.group.unwrap_or(cfg.report.group),
            self.order.unwrap_or(cfg.report.order),
        )
    }

    fn report(&self, store: &TransactionStore, cfg: &Config) -> Report {
        build_report(&store.get(&self.selector()), self.group_by(cfg))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let home = state::cardbatch_home()?;
    let cfg = config::load_config(&home)?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| state::resolve_data_dir(&home, &cfg.data.xml_dir));

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(&home)?,
            ConfigCommand::Show => {
                println!("# {}", config::config_path(&home).display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },

        Command::Files => {
            let store = load_store(&data_dir).await?;
            if store.is_empty() {
                println!("No batch files in {}", data_dir.display());
            }
            for entry in store.snapshot().iter() {
                println!("{:>6}  {}", entry.transactions.len(), entry.name);
            }
        }

        Command::Show { selection, json } => {
            let store = load_store(&data_dir).await?;
            let report = selection.report(&store, &cfg);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                if !report.has_data() {
                    println!("No transactions for {}.", selection.selector());
                }
                print!("{}", TextTable::new(&report).render());
            }
        }

        Command::Export {
            format,
            out,
            selection,
        } => {
            let store = load_store(&data_dir).await?;
            let report = selection.report(&store, &cfg);
            if !report.has_data() {
                println!("No transactions for {}; nothing exported.", selection.selector());
                return Ok(());
            }

            let format = format
                .or_else(|| out.as_deref().and_then(ExportFormat::from_path))
                .unwrap_or(cfg.export.default_format);
            let out = match out {
                Some(path) => path,
                None => state::ensure_save_path(&home, format, Local::now())?,
            };
            let summary = tasks::spawn_export(report, format, out.clone(), cfg.export_options())
                .await
                .context("export task failed")?
                .with_context(|| format!("export to {} failed", out.display()))?;

            match summary.pages {
                Some(pages) => println!(
                    "Exported {} rows ({pages} pages) to {}",
                    summary.rows,
                    summary.path.display()
                ),
                None => println!("Exported {} rows to {}", summary.rows, summary.path.display()),
            }
        }

        Command::Import { path } => {
            let store = Arc::new(load_store(&data_dir).await?);
            let outcome = tasks::spawn_import(store, data_dir.clone(), path.clone())
                .await
                .context("import task failed")?
                .with_context(|| format!("import {}", path.display()))?;

            if outcome.added {
                println!(
                    "Imported {} ({} transactions)",
                    outcome.destination.display(),
                    outcome.transactions
                );
            } else {
                println!(
                    "{} was already loaded; copied over the existing file",
                    outcome.destination.display()
                );
            }
        }
    }

    Ok(())
}

async fn load_store(dir: &Path) -> Result<TransactionStore> {
    tasks::spawn_load(dir.to_path_buf())
        .await
        .context("load task failed")?
        .with_context(|| format!("load {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardbatch_core::SortDirection;

    #[test]
    fn test_cli_shape() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_show_flags() {
        let cli = Cli::parse_from([
            "cardbatch", "show", "--file", "jan.xml", "--group", "card-type", "--json",
        ]);
        let Command::Show { selection, json } = cli.command else {
            panic!("expected show");
        };
        assert!(json);
        assert_eq!(selection.selector(), Selector::File("jan.xml".into()));
        assert_eq!(selection.group, Some(GroupKey::CardType));
        assert_eq!(selection.order, None);
    }

    #[test]
    fn test_export_flags() {
        let cli = Cli::parse_from([
            "cardbatch", "--data-dir", "/tmp/b", "export", "--format", "excel", "--out", "r.xlsx",
            "--order", "desc",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/b")));
        let Command::Export { format, out, selection } = cli.command else {
            panic!("expected export");
        };
        assert_eq!(format, Some(ExportFormat::Xlsx));
        assert_eq!(out, Some(PathBuf::from("r.xlsx")));
        assert_eq!(selection.selector(), Selector::AllFiles);
        assert_eq!(selection.order, Some(Order::Desc));
    }

    #[test]
    fn test_export_out_is_optional() {
        let cli = Cli::parse_from(["cardbatch", "export", "--format", "pdf"]);
        let Command::Export { format, out, .. } = cli.command else {
            panic!("expected export");
        };
        assert_eq!(format, Some(ExportFormat::Pdf));
        assert_eq!(out, None);
    }

    #[test]
    fn test_flags_override_config() {
        let mut cfg = Config::default();
        cfg.report.group = GroupKey::CardType;

        assert_eq!(SelectionArgs::default().group_by(&cfg), GroupBy::CardType);

        let args = SelectionArgs {
            group: Some(GroupKey::Date),
            order: Some(Order::Desc),
            ..SelectionArgs::default()
        };
        assert_eq!(args.group_by(&cfg), GroupBy::Date(SortDirection::Descending));
    }

    #[test]
    fn test_unknown_file_is_an_empty_report() {
        let store = TransactionStore::new();
        let args = SelectionArgs {
            file: Some("missing.xml".into()),
            ..SelectionArgs::default()
        };
        let report = args.report(&store, &Config::default());
        assert!(!report.has_data());
        assert_eq!(report.len(), 1);
    }
}
