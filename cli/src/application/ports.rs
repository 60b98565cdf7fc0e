//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::domain::{ProvisionError, StagehandConfig};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Readable stream attached to a command's standard input.
pub type InputStream<'a> = Box<dyn AsyncRead + Send + Unpin + 'a>;
/// Writable sink receiving a command's standard output or error.
pub type OutputSink<'a> = Box<dyn AsyncWrite + Send + Unpin + 'a>;

/// One command to run on the target host.
///
/// Streams are optional: a missing stdin reads as empty, a missing stdout or
/// stderr is discarded.
#[derive(Default)]
pub struct Command<'a> {
    /// Executable path or name resolved through `$PATH`.
    pub program: String,
    pub args: Vec<String>,
    /// Added to the environment before running.
    pub env: BTreeMap<String, String>,
    pub stdin: Option<InputStream<'a>>,
    pub stdout: Option<OutputSink<'a>>,
    pub stderr: Option<OutputSink<'a>>,
}

impl<'a> Command<'a> {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Build a command from an argv slice; an empty slice yields an empty program.
    #[must_use]
    pub fn from_argv<S: AsRef<str>>(argv: &[S]) -> Self {
        let mut parts = argv.iter().map(|s| s.as_ref().to_string());
        Self {
            program: parts.next().unwrap_or_default(),
            args: parts.collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn stdin(mut self, input: impl AsyncRead + Send + Unpin + 'a) -> Self {
        self.stdin = Some(Box::new(input));
        self
    }

    #[must_use]
    pub fn stdout(mut self, sink: impl AsyncWrite + Send + Unpin + 'a) -> Self {
        self.stdout = Some(Box::new(sink));
        self
    }

    #[must_use]
    pub fn stderr(mut self, sink: impl AsyncWrite + Send + Unpin + 'a) -> Self {
        self.stderr = Some(Box::new(sink));
        self
    }

    /// Render as the quoted `/bin/sh -c` line a string-executing transport runs.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidEnvName`] for a non-identifier env key.
    pub fn command_line(&self) -> Result<String, ProvisionError> {
        crate::domain::command_line(&self.program, &self.args, &self.env)
    }
}

impl fmt::Debug for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &self.env)
            .field("stdin", &self.stdin.is_some())
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .finish()
    }
}

// ── Execution Port ────────────────────────────────────────────────────────────

/// Runs one command to completion against the target host.
///
/// Implementations must drop every stream attached to the command before
/// returning, success or not; callers rely on that to see end-of-stream on
/// pipes they hold the other end of.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run `cmd`, streaming its stdin/stdout/stderr, and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns a Transport-kind error if the session cannot be established,
    /// and an Execution-kind error on non-zero exit or stream I/O failure.
    async fn run(&self, cmd: Command<'_>) -> Result<(), ProvisionError>;
}

// ── Settings Port ─────────────────────────────────────────────────────────────

/// Loads user settings. A missing settings file yields defaults.
pub trait ConfigStore {
    /// Load the settings, or defaults if none are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<StagehandConfig>;

    /// Location of the settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if no location can be determined.
    fn path(&self) -> Result<PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
