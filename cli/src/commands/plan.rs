//! `stagehand plan` — print the merged desired state.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::role::Role;
use crate::domain::{FileEntry, merge};
use crate::infra::role_file;

/// Arguments for the plan command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Role files to merge
    #[arg(required = true, value_name = "ROLE_FILE")]
    pub roles: Vec<PathBuf>,
}

/// Run `stagehand plan`.
///
/// # Errors
///
/// Returns an error if a role file cannot be loaded or the roles conflict.
pub fn run(args: &PlanArgs, app: &AppContext) -> Result<()> {
    let roles = role_file::load_roles(&args.roles)?;
    let state = merge(roles.iter().map(Role::manifest)).context("merging roles")?;

    let ctx = &app.output;
    let names: Vec<&str> = roles.iter().map(Role::name).collect();
    ctx.header(&format!("Plan for {} roles", roles.len()));
    ctx.kv("Roles", &names.join(", "));

    ctx.header(&format!("Packages ({})", state.packages().len()));
    for package in state.packages() {
        ctx.item(package);
    }

    ctx.header(&format!("Files ({})", state.files().len()));
    for file in state.files() {
        ctx.item(&describe_file(file));
    }
    Ok(())
}

/// One line per entry: kind, mode, ownership, path, and size for files.
#[must_use]
pub fn describe_file(file: &FileEntry) -> String {
    let kind = if file.is_dir { 'd' } else { 'f' };
    let mut line = format!(
        "{kind} {:04o} {}:{} {}",
        file.mode, file.owner, file.group, file.path
    );
    if !file.is_dir {
        line.push_str(&format!(" ({} bytes)", file.contents.len()));
    }
    line
}
