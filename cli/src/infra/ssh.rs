//! `Executor` over the system `ssh` client.
//!
//! Authentication is left to the user's SSH agent; this module never touches
//! key material. Each command opens its own session in batch mode, so a
//! missing or rejected key fails fast instead of prompting.

use std::ffi::OsString;

use async_trait::async_trait;

use crate::application::ports::{Command, Executor};
use crate::domain::{ProvisionError, SshSettings};
use crate::infra::process::{self, Streams};

/// Client binary used unless overridden.
pub const SSH_PROGRAM: &str = "ssh";

/// `ssh` exits with 255 when the session itself fails.
///
/// The client also passes the remote command's own status through, so a
/// remote command exiting 255 is indistinguishable from a session failure and
/// is reported as Transport too.
const SSH_SESSION_FAILURE: i32 = 255;

/// Where and as whom commands run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub user: String,
    pub port: u16,
    /// Extra `-o` options, each `Key=Value`.
    pub options: Vec<String>,
}

impl SshTarget {
    /// Target `host` with the user, port, and options from `settings`.
    #[must_use]
    pub fn new(host: impl Into<String>, settings: &SshSettings) -> Self {
        Self {
            host: host.into(),
            user: settings.user.clone(),
            port: settings.port,
            options: settings.options.clone(),
        }
    }
}

/// Runs commands on an [`SshTarget`] through the `ssh` client.
///
/// Exit status 255 always maps to a Transport error, including when the
/// remote command itself exited 255.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    target: SshTarget,
    program: String,
}

impl SshExecutor {
    /// Build an executor for `target`, authenticating through the agent in
    /// `SSH_AUTH_SOCK`.
    ///
    /// # Errors
    ///
    /// Returns a Transport error if no agent is advertised or no host is set.
    pub fn connect(target: SshTarget) -> Result<Self, ProvisionError> {
        Self::with_agent(target, std::env::var_os("SSH_AUTH_SOCK"))
    }

    /// Like [`connect`](Self::connect), with the agent socket passed in.
    ///
    /// # Errors
    ///
    /// Returns a Transport error if `agent` is unset or empty, or no host is set.
    pub fn with_agent(target: SshTarget, agent: Option<OsString>) -> Result<Self, ProvisionError> {
        if agent.is_none_or(|sock| sock.is_empty()) {
            return Err(ProvisionError::transport(
                "no SSH agent available (SSH_AUTH_SOCK is not set)",
            ));
        }
        if target.host.is_empty() {
            return Err(ProvisionError::transport("no target host given"));
        }
        Ok(Self {
            target,
            program: SSH_PROGRAM.to_string(),
        })
    }

    /// Use `program` instead of `ssh`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    #[must_use]
    pub fn target(&self) -> &SshTarget {
        &self.target
    }

    /// Client arguments that run `command_line` on the target.
    #[must_use]
    pub fn ssh_args(&self, command_line: &str) -> Vec<String> {
        let mut args = vec!["-o".to_string(), "BatchMode=yes".to_string()];
        for option in &self.target.options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        args.extend([
            "-p".to_string(),
            self.target.port.to_string(),
            "-l".to_string(),
            self.target.user.clone(),
            self.target.host.clone(),
            "--".to_string(),
            command_line.to_string(),
        ]);
        args
    }
}

#[async_trait]
impl Executor for SshExecutor {
    async fn run(&self, cmd: Command<'_>) -> Result<(), ProvisionError> {
        let line = cmd.command_line()?;
        let Command {
            program,
            stdin,
            stdout,
            stderr,
            ..
        } = cmd;
        let streams = Streams {
            stdin,
            stdout,
            stderr,
        };

        tracing::debug!(
            host = %self.target.host,
            user = %self.target.user,
            program = %program,
            "opening ssh session"
        );
        let mut ssh = tokio::process::Command::new(&self.program);
        ssh.args(self.ssh_args(&line));
        let child = process::spawn(&mut ssh, &streams).map_err(|e| {
            ProvisionError::transport(format!("failed to start {}: {e}", self.program))
        })?;

        let finished = process::drive(child, streams)
            .await
            .map_err(|source| ProvisionError::CommandIo {
                program: program.clone(),
                source,
            })?;

        match finished.status.code() {
            Some(0) => finished
                .streams
                .map_err(|source| ProvisionError::CommandIo { program, source }),
            Some(SSH_SESSION_FAILURE) => {
                tracing::warn!(host = %self.target.host, "ssh session failed");
                Err(ProvisionError::transport(format!(
                    "ssh session to {}@{}:{} failed",
                    self.target.user, self.target.host, self.target.port
                )))
            }
            code => Err(ProvisionError::NonZeroExit { program, code }),
        }
    }
}
