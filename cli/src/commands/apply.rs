//! `stagehand apply` — converge a host to the given role files.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::Executor;
use crate::application::services::apply::{self as service, ApplyOptions, ApplySummary};
use crate::domain::SshSettings;
use crate::infra::role_file;
use crate::infra::{LocalExecutor, SshExecutor, SshTarget};

/// Arguments for the apply command.
#[derive(Args, Debug, Default)]
pub struct ApplyArgs {
    /// Role files, applied in the order given
    #[arg(required = true, value_name = "ROLE_FILE")]
    pub roles: Vec<PathBuf>,

    /// Host to provision over ssh
    #[arg(long, env = "STAGEHAND_HOST")]
    pub host: Option<String>,

    /// Provision this machine instead of a remote host
    #[arg(long)]
    pub local: bool,

    /// Remote login user [default: from settings, else root]
    #[arg(long, env = "STAGEHAND_USER")]
    pub user: Option<String>,

    /// Remote ssh port [default: from settings, else 22]
    #[arg(long, env = "STAGEHAND_PORT")]
    pub port: Option<u16>,

    /// Extra ssh option, repeatable
    #[arg(long = "ssh-option", value_name = "KEY=VALUE", value_parser = parse_ssh_option)]
    pub ssh_options: Vec<String>,

    /// Do not echo correlated command output
    #[arg(long)]
    pub no_log_output: bool,
}

/// Run `stagehand apply`.
///
/// # Errors
///
/// Returns an error if a role file cannot be loaded, no target is given, the
/// ssh agent is unavailable, or any apply stage fails.
pub async fn run(args: &ApplyArgs, app: &AppContext) -> Result<()> {
    let roles = role_file::load_roles(&args.roles)?;
    let options = ApplyOptions {
        log_output: app.config.output.log_commands && !args.no_log_output,
        log_sink: Box::new(io::stdout()),
        ..ApplyOptions::default()
    };
    let reporter = app.terminal_reporter();

    let (executor, label): (Box<dyn Executor>, String) = if args.local {
        (Box::new(LocalExecutor), "this machine".to_string())
    } else {
        let target = resolve_target(args, &app.config.ssh)?;
        let label = format!("{}@{}", target.user, target.host);
        let ssh = SshExecutor::connect(target).context("cannot open ssh transport")?;
        (Box::new(ssh), label)
    };

    tracing::info!(host = %label, roles = roles.len(), "applying roles");
    let summary = service::apply(executor.as_ref(), roles, options, &reporter).await?;
    print_summary(app, &label, summary);
    Ok(())
}

/// Merge CLI flags over the ssh settings. Flags win; options accumulate.
///
/// # Errors
///
/// Returns an error if no host is given.
pub fn resolve_target(args: &ApplyArgs, settings: &SshSettings) -> Result<SshTarget> {
    let Some(host) = args.host.as_deref().filter(|h| !h.is_empty()) else {
        bail!("no target host: pass --host (or STAGEHAND_HOST), or --local");
    };
    let mut target = SshTarget::new(host, settings);
    if let Some(user) = &args.user {
        target.user.clone_from(user);
    }
    if let Some(port) = args.port {
        target.port = port;
    }
    target.options.extend(args.ssh_options.iter().cloned());
    Ok(target)
}

fn parse_ssh_option(raw: &str) -> Result<String, String> {
    match raw.split_once('=') {
        Some((key, _)) if !key.trim().is_empty() => Ok(raw.to_string()),
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}

fn print_summary(app: &AppContext, target: &str, summary: ApplySummary) {
    app.output.success(&format!(
        "Applied {} packages and {} files to {target} ({} commands).",
        summary.packages, summary.files, summary.invocations
    ));
}
