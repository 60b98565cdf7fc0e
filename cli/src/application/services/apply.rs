//! Application service — apply roles to a host.
//!
//! Imports only from `crate::domain` and `crate::application`.
//! All remote I/O is routed through the injected [`Executor`].
//!
//! The apply runs four stages strictly in order and stops at the first
//! failure; nothing completed before the failure is undone:
//!
//! 1. every role's pre-run hook, in role order
//! 2. one package install covering the merged package list
//! 3. file deployment: a `.tar.gz` streamed into a remote `tar -x`
//! 4. every role's post-run hook, in role order

use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::runtime::Handle;

use crate::application::archive::{self, BlockingWriter};
use crate::application::ports::{Command, Executor, ProgressReporter};
use crate::application::role::Role;
use crate::application::run_context::{LogSink, RunContext};
use crate::domain::{ApplyError, FileEntry, ProvisionError, Stage, merge};

/// Package manager invocation; the merged package list is appended.
pub const INSTALL_PROGRAM: &str = "apt-get";
pub const INSTALL_ARGS: &[&str] = &["-y", "install"];

/// Extraction command reading the archive from stdin into `/`, keeping
/// absolute paths.
pub const EXTRACT_PROGRAM: &str = "tar";
pub const EXTRACT_ARGS: &[&str] = &["-z", "-x", "-v", "-f-", "-P", "-C/"];

/// Default capacity of the in-memory pipe between archive producer and
/// extraction command.
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

/// Knobs for a single apply.
pub struct ApplyOptions<'a> {
    /// Tee every command's output into `log_sink`.
    pub log_output: bool,
    /// Destination of the correlated command log.
    pub log_sink: LogSink<'a>,
    /// Bytes buffered between the archive producer and the extraction command.
    pub pipe_capacity: usize,
}

impl Default for ApplyOptions<'_> {
    fn default() -> Self {
        Self {
            log_output: true,
            log_sink: Box::new(io::stdout()),
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }
}

/// What a successful apply did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplySummary {
    pub packages: usize,
    pub files: usize,
    /// Commands issued through the run context, hooks included.
    pub invocations: u64,
}

/// Merge `roles` and converge the host behind `executor` to the result.
///
/// # Errors
///
/// Returns the first failure, tagged with the stage it happened in. A merge
/// conflict fails before any command is issued.
pub async fn apply<'a>(
    executor: &'a dyn Executor,
    roles: Vec<Role>,
    options: ApplyOptions<'a>,
    reporter: &impl ProgressReporter,
) -> Result<ApplySummary, ApplyError> {
    let state = merge(roles.iter().map(Role::manifest))
        .map_err(|e| ApplyError::new(Stage::Merge, e))?;
    if state.is_empty() {
        reporter.warn("roles declare no packages or files");
    }
    let (packages, files) = state.into_parts();
    tracing::info!(
        roles = roles.len(),
        packages = packages.len(),
        files = files.len(),
        "merged roles"
    );

    let ctx = RunContext::new(executor, options.log_sink);
    ctx.set_log_output(options.log_output);

    for role in &roles {
        if let Some(hook) = role.pre_run() {
            reporter.step(&format!("running pre-run hook of {}", role.name()));
            tracing::info!(stage = "pre-run", role = role.name(), "running hook");
            hook.run(&ctx).await.map_err(|e| {
                ApplyError::new(
                    Stage::PreRun {
                        role: role.name().to_string(),
                    },
                    e,
                )
            })?;
        }
    }

    reporter.step(&format!("installing {} packages", packages.len()));
    tracing::info!(stage = "install", packages = packages.len(), "installing packages");
    ctx.run_command(install_command(&packages))
        .await
        .map_err(|e| ApplyError::new(Stage::Install, e))?;
    reporter.success(&format!("installed {} packages", packages.len()));

    let file_count = files.len();
    reporter.step(&format!("deploying {file_count} files"));
    tracing::info!(stage = "deploy", files = file_count, "streaming archive");
    deploy(&ctx, files, options.pipe_capacity)
        .await
        .map_err(|e| ApplyError::new(Stage::Deploy, e))?;
    reporter.success(&format!("deployed {file_count} files"));

    for role in &roles {
        if let Some(hook) = role.post_run() {
            reporter.step(&format!("running post-run hook of {}", role.name()));
            tracing::info!(stage = "post-run", role = role.name(), "running hook");
            hook.run(&ctx).await.map_err(|e| {
                ApplyError::new(
                    Stage::PostRun {
                        role: role.name().to_string(),
                    },
                    e,
                )
            })?;
        }
    }

    Ok(ApplySummary {
        packages: packages.len(),
        files: file_count,
        invocations: ctx.invocations(),
    })
}

/// `DEBIAN_FRONTEND=noninteractive apt-get -y install <packages...>`.
#[must_use]
pub fn install_command(packages: &[String]) -> Command<'static> {
    Command::new(INSTALL_PROGRAM)
        .args(INSTALL_ARGS.iter().copied())
        .args(packages.iter().cloned())
        .env("DEBIAN_FRONTEND", "noninteractive")
}

/// Stream `files` into the remote extraction command.
///
/// The archive is produced on the blocking pool while the command consumes
/// it. The command owns the read end of the pipe and drops it when it
/// finishes, so a producer still writing gets `BrokenPipe` instead of
/// blocking forever.
async fn deploy(
    ctx: &RunContext<'_>,
    files: Vec<FileEntry>,
    pipe_capacity: usize,
) -> Result<(), ProvisionError> {
    let mtime = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let (archive_reader, archive_writer) = tokio::io::duplex(pipe_capacity);

    let handle = Handle::current();
    let producer = tokio::task::spawn_blocking(move || {
        archive::write_archive(BlockingWriter::new(archive_writer, handle), &files, mtime)
    });

    let extract = Command::new(EXTRACT_PROGRAM)
        .args(EXTRACT_ARGS.iter().copied())
        .stdin(archive_reader);
    let consumed = ctx.run_command(extract).await;
    let produced = producer.await.unwrap_or_else(|e| Err(io::Error::other(e)));

    settle(consumed, produced)
}

/// Pick the error to report once both sides of the deployment have finished.
///
/// A producer failure other than a closed pipe is the root cause of whatever
/// the consumer saw and wins. A `BrokenPipe` from the producer only means
/// the consumer stopped reading, so the consumer's own error wins; if the
/// consumer claims success anyway, the truncated stream is still an error.
fn settle(
    consumed: Result<(), ProvisionError>,
    produced: io::Result<()>,
) -> Result<(), ProvisionError> {
    match (consumed, produced) {
        (Ok(()), Ok(())) => Ok(()),
        (_, Err(source)) if source.kind() != io::ErrorKind::BrokenPipe => {
            Err(ProvisionError::Streaming { source })
        }
        (Err(e), _) => Err(e),
        (Ok(()), Err(source)) => Err(ProvisionError::Streaming { source }),
    }
}
