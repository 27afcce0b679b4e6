#![allow(missing_docs)]

//! Mitsumori CLI — inspect parsing and planning without a live sheet.
//!
//! One-shot subcommands over the library core: parse a message, plan its
//! writes against a snapshot file, or list the registered templates. The
//! usage gate is bypassed here (the CLI has no account store).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mitsumori::config::MitsumoriConfig;
use mitsumori::intake::Intake;
use mitsumori::planner::CellPlanner;
use mitsumori::sheets::Snapshot;
use mitsumori::usage::UsageDecision;

#[derive(Parser)]
#[command(name = "mitsumori", about = "Chat-driven estimate-sheet intake", version)]
struct Cli {
    /// Also write JSON logs to this directory, with daily rotation.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a message and print the field record as JSON.
    Parse {
        /// The chat message text.
        message: String,
    },
    /// Plan the writes for a message and print the outcome as JSON.
    Plan {
        /// The chat message text.
        message: String,
        /// Target template name; defaults to the configured default.
        #[arg(long)]
        template: Option<String>,
        /// JSON file holding the current sheet values as an array of rows.
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// List registered templates and their variants.
    Templates,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logging_guard = match cli.log_dir.as_deref() {
        Some(dir) => Some(
            mitsumori::logging::init_file(dir).context("failed to initialise file logging")?,
        ),
        None => {
            mitsumori::logging::init_cli();
            None
        }
    };
    let config = MitsumoriConfig::load().context("failed to load configuration")?;

    match cli.command {
        Command::Parse { message } => {
            let record = mitsumori::record::parse(&message);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Plan {
            message,
            template,
            snapshot,
        } => {
            let snapshot = match snapshot {
                Some(path) => {
                    let contents = std::fs::read_to_string(&path).with_context(|| {
                        format!("failed to read snapshot file {}", path.display())
                    })?;
                    serde_json::from_str::<Snapshot>(&contents)
                        .context("failed to parse snapshot JSON")?
                }
                None => Snapshot::default(),
            };
            let registry = config.build_registry()?;
            let template = template.unwrap_or_else(|| registry.default_template().to_owned());
            let intake = Intake::new(CellPlanner::new(registry, config.intake.overflow));
            let outcome = intake.handle_message(
                &message,
                &template,
                &snapshot,
                &UsageDecision::Allowed { remaining: None },
            )?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Templates => {
            let registry = config.build_registry()?;
            for (name, layout) in registry.iter() {
                println!("{name}");
                println!("  company: {}  date: {}", layout.company_range, layout.date_range);
                for (variant, plan) in &layout.variants {
                    println!(
                        "  {variant}: name={} rows={}..={}",
                        plan.name_columns.join(","),
                        plan.row_start,
                        plan.row_end
                    );
                }
            }
        }
    }

    Ok(())
}
