//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, OutputFlags};
use crate::commands;
use crate::infra::YamlConfigStore;

/// Converge hosts to declarative roles over ssh
#[derive(Parser)]
#[command(
    name = "stagehand",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply role files to a host
    Apply(commands::apply::ApplyArgs),

    /// Show the merged desired state without touching any host
    Plan(commands::plan::PlanArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be loaded or the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            command,
        } = self;
        let app = AppContext::new(&OutputFlags { no_color, quiet }, &YamlConfigStore::default())?;
        match command {
            Command::Apply(args) => commands::apply::run(&args, &app).await,
            Command::Plan(args) => commands::plan::run(&args, &app),
        }
    }
}
